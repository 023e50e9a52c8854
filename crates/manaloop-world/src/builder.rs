//! The demo village map and the world factory.
//!
//! The map ships as two raw `u32` layers — terrain underneath, elements on
//! top — run through the same ID decoding a full authoring pipeline would
//! use. Elements sit ahead of their terrain in each cell, so entity costs
//! and hooks take priority over the ground they stand on.

use std::sync::Arc;

use glam::IVec2;
use manaloop_core::cost::AttackPowerFn;
use manaloop_core::{
    CallbackSet, Cell, Character, CostBook, FamiliarityMode, Grid, HookArgs, HookFlow, ManaPool,
    TileInstance, WorldInit, WorldState,
};
use tracing::debug;

use crate::catalog::village_catalog;
use crate::domain::{Terrain, Village, VillageAction};
use crate::entities::{
    entity_definitions, initial_stacks, ALTAR, BARREL, BONFIRE, CARROT_PATCH, CAVE, CRITTER,
    DOUBLE_CRITTER, FENCE, FENCE_GATE, FIREFLIES_ONE, GHOST, OLD_MAN, RATS, SCARECROW,
};
use crate::levels::{attack_rating, items};
use crate::tiles::{
    decode_raw, terrain_definitions, Orientation, CRUSHED_GRASS, FIELD, FLAGSTONES, FLOODED_GRASS,
    GRASS, MOUNTAIN_TRAIL, MUDDY_GRASS, PATH, SNOW, STREAM, WATER, WOODS,
};

/// World construction options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldOptions {
    /// Jitter familiarity gains instead of the exact +60/+20.
    pub random_familiarity: bool,
    /// Seed for the jitter stream when `random_familiarity` is on.
    pub seed: u64,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            random_familiarity: false,
            seed: 0,
        }
    }
}

/// Where the wanderer starts each loop.
pub const START: IVec2 = IVec2::new(2, 2);

const WIDTH: usize = 10;
const HEIGHT: usize = 8;

// Shorthand for the layer literals below.
const W: u32 = WOODS;
const G: u32 = GRASS;
const C: u32 = CRUSHED_GRASS;
const P: u32 = PATH;

/// A fence mirrored in place, exercising the orientation bits.
const FENCE_FLIPPED: u32 = FENCE | ((Orientation::FLIP_X.bits() as u32) << 24);

#[rustfmt::skip]
const TERRAIN_LAYER: [[u32; WIDTH]; HEIGHT] = [
    [W, W, W, W, W, W, W, W, W, W],
    [W, G, G, G, G, G, G, G, G, W],
    [W, G, G, G, G, G, G, G, G, W],
    [W, G, G, G, G, G, G, G, G, W],
    [W, P, P, P, P, P, P, P, P, W],
    [W, C, C, C, C, C, C, C, C, W],
    [W, STREAM, MUDDY_GRASS, FLOODED_GRASS, FIELD, SNOW, MOUNTAIN_TRAIL, FLAGSTONES, WATER, W],
    [W, W, W, W, W, W, W, W, W, W],
];

#[rustfmt::skip]
const ELEMENT_LAYER: [[u32; WIDTH]; HEIGHT] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, FENCE, 0, 0, FENCE_FLIPPED, 0],
    [0, FIREFLIES_ONE, 0, RATS, 0, FENCE_GATE, 0, BARREL, 0, 0],
    [0, 0, ALTAR, OLD_MAN, 0, FENCE, SCARECROW, 0, CARROT_PATCH, 0],
    [0, 0, 0, 0, CAVE, 0, 0, GHOST, 0, 0],
    [0, 0, CRITTER, DOUBLE_CRITTER, 0, 0, BONFIRE, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
];

fn instance_from(raw: u32) -> TileInstance<Village> {
    let (id, orientation) = decode_raw(raw);
    TileInstance::new(id).with_loop_data(Terrain {
        tile_id: id,
        orientation,
        stacks: initial_stacks(id),
    })
}

fn build_grid() -> Grid<Village> {
    let rows = TERRAIN_LAYER
        .iter()
        .zip(ELEMENT_LAYER.iter())
        .map(|(terrain_row, element_row)| {
            terrain_row
                .iter()
                .zip(element_row.iter())
                .map(|(&terrain, &element)| {
                    let mut instances = Vec::new();
                    if element != 0 {
                        instances.push(instance_from(element));
                    }
                    instances.push(instance_from(terrain));
                    Cell::new(instances)
                })
                .collect()
        })
        .collect();
    Grid::from_rows(rows)
}

/// The always-on progress hook: when mana drops below a tenth of the pool,
/// drink a stored potion.
fn drink_potion_hooks() -> CallbackSet<Village> {
    let mut set = CallbackSet::new();
    for kind in [
        VillageAction::Move,
        VillageAction::Attack,
        VillageAction::Interact,
        VillageAction::Speak,
    ] {
        set.push_progress(
            kind,
            Arc::new(|args: &mut HookArgs<'_, Village>, _spent: f64| {
                if args.global.mana.current * 10.0 < args.global.mana.max
                    && args.global.loop_data.take_item(items::POTION)
                {
                    args.global.mana.restore(500.0);
                }
                HookFlow::Continue
            }),
        );
    }
    set
}

fn build_init(options: WorldOptions) -> WorldInit<Village> {
    let power: AttackPowerFn<Village> = Arc::new(attack_rating);
    let costs = CostBook::with_attack_power(power);
    let mut definitions = terrain_definitions(&costs);
    entity_definitions(&costs, &mut definitions);
    let grid = build_grid();
    debug!(
        target: "manaloop::village",
        width = grid.width(),
        height = grid.height(),
        definitions = definitions.len(),
        "village world built"
    );
    let wanderer = Character::new("Wanderer", START);
    let familiarity = if options.random_familiarity {
        FamiliarityMode::Random { seed: options.seed }
    } else {
        FamiliarityMode::Deterministic
    };
    WorldInit::new(grid, definitions, vec![wanderer], village_catalog())
        .with_costs(costs)
        .with_always_callbacks(drink_potion_hooks())
        .with_mana(ManaPool::full(500.0))
        .with_familiarity(familiarity)
}

/// Builds the village world. The initializer is pure, so loop resets and
/// clones reproduce the same fresh map every time.
#[must_use]
pub fn village_world(options: WorldOptions) -> WorldState<Village> {
    WorldState::new(move || build_init(options))
}
