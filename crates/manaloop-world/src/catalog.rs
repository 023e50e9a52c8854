//! The global action catalog: four moves, interact, attack, speak.

use glam::IVec2;
use manaloop_core::{ActionCatalog, ActionDefinition};

use crate::domain::{Maneuver, Village, VillageAction};

/// Catalog id of the "Up" move.
pub const UP: u32 = 0;
/// Catalog id of the "Down" move.
pub const DOWN: u32 = 1;
/// Catalog id of the "Left" move.
pub const LEFT: u32 = 2;
/// Catalog id of the "Right" move.
pub const RIGHT: u32 = 3;
/// Catalog id of "Interact".
pub const INTERACT: u32 = 4;
/// Catalog id of "Attack".
pub const ATTACK: u32 = 5;
/// Catalog id of "Speak".
pub const SPEAK: u32 = 6;

/// Builds the globally available actions.
#[must_use]
pub fn village_catalog() -> ActionCatalog<Village> {
    ActionCatalog::new()
        .with(
            UP,
            ActionDefinition::new("Up", VillageAction::Move, Maneuver::Walk(IVec2::new(0, -1))),
        )
        .with(
            DOWN,
            ActionDefinition::new("Down", VillageAction::Move, Maneuver::Walk(IVec2::new(0, 1))),
        )
        .with(
            LEFT,
            ActionDefinition::new("Left", VillageAction::Move, Maneuver::Walk(IVec2::new(-1, 0))),
        )
        .with(
            RIGHT,
            ActionDefinition::new("Right", VillageAction::Move, Maneuver::Walk(IVec2::new(1, 0))),
        )
        .with(
            INTERACT,
            ActionDefinition::new("Interact", VillageAction::Interact, Maneuver::InPlace),
        )
        .with(
            ATTACK,
            ActionDefinition::new("Attack", VillageAction::Attack, Maneuver::InPlace),
        )
        .with(
            SPEAK,
            ActionDefinition::new("Speak", VillageAction::Speak, Maneuver::InPlace),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use manaloop_core::ActionPayload;

    #[test]
    fn moves_carry_their_deltas() {
        let catalog = village_catalog();
        let up = catalog.get(UP).unwrap();
        assert_eq!(up.data.movement(), Some(IVec2::new(0, -1)));
        let interact = catalog.get(INTERACT).unwrap();
        assert_eq!(interact.data.movement(), None);
    }

    #[test]
    fn catalog_is_searchable_by_name() {
        let catalog = village_catalog();
        assert_eq!(catalog.find(|def| def.name == "Attack"), Some(ATTACK));
        assert_eq!(catalog.len(), 7);
    }
}
