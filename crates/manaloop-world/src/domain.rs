//! The Village domain: action kinds and payload types.

use std::collections::BTreeMap;
use std::fmt;

use glam::IVec2;
use manaloop_core::{ActionPayload, Domain, Stacked};
use serde::{Deserialize, Serialize};

use crate::tiles::Orientation;

/// Marker type plugging the village content into the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Village;

/// The four action types the village knows.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VillageAction {
    /// Step to an adjacent cell.
    Move,
    /// Fight whatever occupies the cell.
    Attack,
    /// Use, harvest, or otherwise touch the cell's occupant.
    Interact,
    /// Talk to the cell's occupant.
    Speak,
}

impl fmt::Display for VillageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Attack => write!(f, "attack"),
            Self::Interact => write!(f, "interact"),
            Self::Speak => write!(f, "speak"),
        }
    }
}

/// Per-action payload: movement actions carry their step.
#[derive(Clone, Debug)]
pub enum Maneuver {
    /// A one-cell step.
    Walk(IVec2),
    /// No built-in effect; everything happens in hooks.
    InPlace,
}

impl ActionPayload for Maneuver {
    fn movement(&self) -> Option<IVec2> {
        match self {
            Self::Walk(delta) => Some(*delta),
            Self::InPlace => None,
        }
    }
}

/// Long-term player progress; survives loop resets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Skill XP by skill name.
    pub skills: BTreeMap<String, f64>,
    /// Buff strength by buff name.
    pub buffs: BTreeMap<String, f64>,
}

impl Progress {
    /// XP accumulated in `skill`, zero if untrained.
    #[must_use]
    pub fn skill_xp(&self, skill: &str) -> f64 {
        self.skills.get(skill).copied().unwrap_or(0.0)
    }

    /// Adds XP to `skill`.
    pub fn train(&mut self, skill: &str, xp: f64) {
        *self.skills.entry(skill.to_string()).or_insert(0.0) += xp;
    }
}

/// The three trainable attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    /// Physical power; feeds the attack formula.
    pub body: u32,
    /// Raises maximum mana.
    pub spirit: u32,
    /// Social strength.
    pub heart: u32,
}

/// One loop's run state; discarded on reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunState {
    /// Attribute levels bought this loop.
    pub stats: Attributes,
    /// How many earned levels have been spent at an altar.
    pub spent_levels: u32,
    /// Player XP earned this loop.
    pub xp: f64,
    /// Item counts by item name.
    pub inventory: BTreeMap<String, u32>,
}

impl RunState {
    /// Count of `item` held, zero if none.
    #[must_use]
    pub fn item(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    /// Adds one `item`.
    pub fn add_item(&mut self, item: &str) {
        *self.inventory.entry(item.to_string()).or_insert(0) += 1;
    }

    /// Removes one `item` if any is held; reports whether it was.
    pub fn take_item(&mut self, item: &str) -> bool {
        match self.inventory.get_mut(item) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Loop-local payload on every tile instance: where it came from in the map
/// data, how it is oriented, and its remaining stacks if it has any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Terrain {
    /// The decoded definition id from the map layer.
    pub tile_id: u32,
    /// Orientation flags from the raw value's high bits.
    pub orientation: Orientation,
    /// Remaining stacks (kills, harvests, charges).
    pub stacks: Option<u32>,
}

impl Stacked for Terrain {
    fn stacks(&self) -> Option<u32> {
        self.stacks
    }
}

impl Domain for Village {
    type ActionKind = VillageAction;
    type ActionData = Maneuver;
    type TilePersistent = ();
    type TileLoop = Terrain;
    type CharacterPersistent = ();
    type CharacterLoop = ();
    type GlobalPersistent = Progress;
    type GlobalLoop = RunState;
}
