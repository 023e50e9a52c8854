//! # Manaloop World
//!
//! The "village" content pack for the manaloop engine: the collaborator
//! side of the core's interfaces. It supplies
//!
//! - the [`Village`](domain::Village) domain (player progression payloads,
//!   terrain loop data),
//! - the action catalog (four moves, interact, attack, speak),
//! - tile and entity definitions with their cost formulas and hooks,
//! - numeric map-ID decoding including orientation flags, and
//! - a [`builder::village_world`] factory producing a ready
//!   [`WorldState`](manaloop_core::WorldState) over a demo map.
//!
//! Everything algorithmic lives in `manaloop-core`; this crate is authoring
//! data plus the glue hooks that express entity behavior.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod catalog;
pub mod domain;
pub mod entities;
pub mod levels;
pub mod tiles;

#[cfg(test)]
mod tests;

pub use builder::{village_world, WorldOptions};
pub use catalog::village_catalog;
pub use domain::{Attributes, Maneuver, Progress, RunState, Terrain, Village, VillageAction};
pub use tiles::Orientation;
