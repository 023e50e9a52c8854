//! Terrain definitions and numeric map-ID decoding.
//!
//! Map layers are plain `u32` grids. The low 16 bits of a raw value select
//! the definition id; the high byte carries orientation flags (the renderer
//! cares about those, the engine just keeps them on the instance).

use std::sync::Arc;

use bitflags::bitflags;
use manaloop_core::{CostBook, DefinitionTable, TileDefinition};

use crate::domain::{Village, VillageAction};

bitflags! {
    /// Orientation bits in the high byte of a raw map value.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Orientation: u8 {
        /// Mirrored horizontally.
        const FLIP_X = 0b0001_0000;
        /// Mirrored vertically.
        const FLIP_Y = 0b0010_0000;
        /// Rotated a quarter turn.
        const ROTATE_90 = 0b0100_0000;
    }
}

/// Splits a raw map value into `(definition id, orientation)`.
#[must_use]
pub fn decode_raw(raw: u32) -> (u32, Orientation) {
    let id = raw & 0xFFFF;
    let flags = Orientation::from_bits_truncate((raw >> 24) as u8);
    (id, flags)
}

// Terrain definition ids.

/// Nothing there; impassable.
pub const VOID: u32 = 0;
/// Ordinary grass.
pub const GRASS: u32 = 1;
/// Grass already trampled flat; the cheapest footing.
pub const CRUSHED_GRASS: u32 = 2;
/// A packed-dirt path.
pub const PATH: u32 = 3;
/// Paved flagstones.
pub const FLAGSTONES: u32 = 4;
/// A tilled field.
pub const FIELD: u32 = 5;
/// Snow cover.
pub const SNOW: u32 = 6;
/// A shallow stream crossing.
pub const STREAM: u32 = 7;
/// A climbing trail.
pub const MOUNTAIN_TRAIL: u32 = 8;
/// Waterlogged grass.
pub const MUDDY_GRASS: u32 = 9;
/// Fully flooded grass.
pub const FLOODED_GRASS: u32 = 10;
/// Dense woods; impassable.
pub const WOODS: u32 = 20;
/// Open water; impassable.
pub const WATER: u32 = 21;
/// Bare rock; impassable.
pub const ROCK: u32 = 22;
/// A sheer cliff; impassable.
pub const CLIFF: u32 = 23;

fn walkable(
    costs: &CostBook<Village>,
    name: &str,
    move_base: f64,
) -> Arc<TileDefinition<Village>> {
    Arc::new(
        TileDefinition::new(name)
            .with_cost(VillageAction::Move, costs.familiarity(move_base, VillageAction::Move)),
    )
}

/// Builds the terrain half of the definition table. Move base costs follow
/// the footing: trampled grass is cheap, flooded grass is nearly a wall.
#[must_use]
pub fn terrain_definitions(costs: &CostBook<Village>) -> DefinitionTable<Village> {
    let mut table = DefinitionTable::<Village>::new();
    table.insert(GRASS, walkable(costs, "Grass", 75.0));
    table.insert(CRUSHED_GRASS, walkable(costs, "Crushed Grass", 40.0));
    table.insert(PATH, walkable(costs, "Path", 55.0));
    table.insert(FLAGSTONES, walkable(costs, "Flagstones", 70.0));
    table.insert(FIELD, walkable(costs, "Field", 80.0));
    table.insert(SNOW, walkable(costs, "Snow", 100.0));
    table.insert(STREAM, walkable(costs, "Stream", 100.0));
    table.insert(MOUNTAIN_TRAIL, walkable(costs, "Mountain Trail", 150.0));
    table.insert(MUDDY_GRASS, walkable(costs, "Muddy Grass", 300.0));
    table.insert(FLOODED_GRASS, walkable(costs, "Flooded Grass", 2000.0));
    table.insert(WOODS, Arc::new(TileDefinition::blocked("Woods")));
    table.insert(WATER, Arc::new(TileDefinition::blocked("Water")));
    table.insert(ROCK, Arc::new(TileDefinition::blocked("Rock")));
    table.insert(CLIFF, Arc::new(TileDefinition::blocked("Cliff")));
    table.insert(VOID, Arc::new(TileDefinition::blocked("Void")));
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_splits_id_and_flags() {
        let raw = 42 | (u32::from(Orientation::FLIP_X.bits()) << 24);
        let (id, orientation) = decode_raw(raw);
        assert_eq!(id, 42);
        assert_eq!(orientation, Orientation::FLIP_X);

        let (id, orientation) = decode_raw(7);
        assert_eq!(id, 7);
        assert!(orientation.is_empty());
    }

    #[test]
    fn decode_combines_multiple_flags() {
        let bits = Orientation::FLIP_X | Orientation::ROTATE_90;
        let raw = 9 | (u32::from(bits.bits()) << 24);
        let (id, orientation) = decode_raw(raw);
        assert_eq!(id, 9);
        assert!(orientation.contains(Orientation::FLIP_X));
        assert!(orientation.contains(Orientation::ROTATE_90));
        assert!(!orientation.contains(Orientation::FLIP_Y));
    }

    #[test]
    fn blocked_terrain_is_marked() {
        let costs = CostBook::<Village>::new();
        let table = terrain_definitions(&costs);
        assert!(table[&WOODS].blocked);
        assert!(table[&WATER].blocked);
        assert!(!table[&GRASS].blocked);
        assert!(table[&GRASS].costs.contains_key(&VillageAction::Move));
    }
}
