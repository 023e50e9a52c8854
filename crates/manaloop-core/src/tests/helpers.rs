//! The sandbox test domain and world builders shared by the suites.

use std::fmt;
use std::sync::Arc;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::action::{ActionCatalog, ActionDefinition};
use crate::character::Character;
use crate::cost::flat;
use crate::domain::{ActionPayload, Domain, Stacked};
use crate::scheduler::AdvanceOutcome;
use crate::tile::{Cell, DefinitionTable, Grid, TileDefinition, TileInstance};
use crate::world::{ManaPool, WorldInit, WorldState};

// =============================================================================
// Sandbox domain
// =============================================================================

/// Marker for the test domain.
#[derive(Clone, Debug, PartialEq)]
pub struct Sandbox;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Kind {
    Move,
    Strike,
    Chat,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Strike => write!(f, "strike"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Motion {
    Step(IVec2),
    None,
}

impl ActionPayload for Motion {
    fn movement(&self) -> Option<IVec2> {
        match self {
            Self::Step(delta) => Some(*delta),
            Self::None => None,
        }
    }
}

/// Loop-local tile payload carrying an optional stack counter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SandboxTile {
    pub stacks: Option<u32>,
}

impl Stacked for SandboxTile {
    fn stacks(&self) -> Option<u32> {
        self.stacks
    }
}

/// Custom persistent tile payload, for round-trip coverage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SandboxSticker {
    pub tag: u32,
}

/// Persistent global payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SandboxProgress {
    pub marks: u32,
}

/// Loop-local global payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SandboxRun {
    pub gathered: u32,
}

impl Domain for Sandbox {
    type ActionKind = Kind;
    type ActionData = Motion;
    type TilePersistent = SandboxSticker;
    type TileLoop = SandboxTile;
    type CharacterPersistent = ();
    type CharacterLoop = ();
    type GlobalPersistent = SandboxProgress;
    type GlobalLoop = SandboxRun;
}

pub type TestWorld = WorldState<Sandbox>;

// =============================================================================
// Builders
// =============================================================================

pub const RIGHT: u32 = 0;
pub const LEFT: u32 = 1;
pub const UP: u32 = 2;
pub const DOWN: u32 = 3;
pub const STRIKE: u32 = 4;
pub const CHAT: u32 = 5;

pub const FLOOR: u32 = 1;

pub fn sandbox_catalog() -> ActionCatalog<Sandbox> {
    ActionCatalog::new()
        .with(
            RIGHT,
            ActionDefinition::new("Right", Kind::Move, Motion::Step(IVec2::new(1, 0))),
        )
        .with(
            LEFT,
            ActionDefinition::new("Left", Kind::Move, Motion::Step(IVec2::new(-1, 0))),
        )
        .with(
            UP,
            ActionDefinition::new("Up", Kind::Move, Motion::Step(IVec2::new(0, -1))),
        )
        .with(
            DOWN,
            ActionDefinition::new("Down", Kind::Move, Motion::Step(IVec2::new(0, 1))),
        )
        .with(STRIKE, ActionDefinition::new("Strike", Kind::Strike, Motion::None))
        .with(CHAT, ActionDefinition::new("Chat", Kind::Chat, Motion::None))
}

pub fn floor_definition(move_cost: f64) -> TileDefinition<Sandbox> {
    TileDefinition::new("Floor").with_cost(Kind::Move, flat(move_cost))
}

pub fn uniform_grid(width: i32, height: i32, definition: u32) -> Grid<Sandbox> {
    let rows = (0..height)
        .map(|_| {
            (0..width)
                .map(|_| Cell::single(TileInstance::new(definition)))
                .collect()
        })
        .collect();
    Grid::from_rows(rows)
}

/// A world of uniform flat-cost floor with one character at the origin and
/// a 100/100 mana pool.
pub fn flat_world(width: i32, height: i32, move_cost: f64) -> TestWorld {
    WorldState::new(move || {
        let mut definitions = DefinitionTable::<Sandbox>::new();
        definitions.insert(FLOOR, Arc::new(floor_definition(move_cost)));
        WorldInit::new(
            uniform_grid(width, height, FLOOR),
            definitions,
            vec![Character::new("Alpha", IVec2::ZERO)],
            sandbox_catalog(),
        )
        .with_mana(ManaPool::full(100.0))
    })
}

/// Installs a fmt subscriber writing to the test harness, so
/// `RUST_LOG=manaloop=trace` surfaces scheduler activity in test output.
/// Idempotent across tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Advances by exactly the smallest finite remaining cost, like an exact
/// step in a reference trace.
pub fn advance_exact(world: &mut TestWorld) -> AdvanceOutcome {
    let budget = world
        .get_next_actions()
        .expect("resolution")
        .iter()
        .flatten()
        .map(|p| p.remaining_cost)
        .filter(|c| c.is_finite())
        .fold(f64::INFINITY, f64::min);
    assert!(budget.is_finite(), "no character can act");
    world.advance_state(budget).expect("advance")
}
