//! # Manaloop Core
//!
//! Deterministic time-loop world simulation engine.
//!
//! One or more characters spend a metered resource ("mana") performing
//! queued actions — move, attack, interact, speak — against the cells of a
//! tile grid. Action costs shrink with accumulated per-target familiarity
//! along a closed-form dampening curve, progress is resumable mid-action,
//! and the world resets to a "new loop" that keeps long-term progress
//! (familiarity, skills, queued intentions) while discarding loop-local
//! state (mana, inventory, position).
//!
//! ## Architecture
//!
//! - **Cost model** ([`cost`]): pure formulas plus an instance-scoped
//!   memoized formula book.
//! - **Callback registry** ([`hooks`]): layered start/progress/complete
//!   hooks with an explicit priority chain and unconditional "always" lists.
//! - **Target resolver** ([`resolver`]): which instance, which action, what
//!   cost, with instance > character > world precedence.
//! - **Mana scheduler** ([`scheduler`]): lockstep advancement of all
//!   characters under a shared budget.
//! - **Persistence codec** ([`codec`]): serializes the permanent subset of
//!   state; `Clone` and loop reset are serialize + reinitialize + replay.
//! - **Path projector** ([`projector`]): best-effort full-route preview.
//!
//! The engine is a single-threaded pure computation over an explicit state
//! value; loading tile tables and rendering are the caller's business.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use manaloop_core::{QueuedAction, WorldState};
//!
//! let mut world = WorldState::new(my_initializer);
//! world.characters[0].queue.push(QueuedAction::global(0, 1));
//! let outcome = world.advance_state(50.0)?;
//! println!("spent {} mana", outcome.spent_mana);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod character;
pub mod codec;
pub mod cost;
pub mod domain;
pub mod error;
pub mod hooks;
pub mod projector;
pub mod resolver;
pub mod scheduler;
pub mod tile;
pub mod world;

#[cfg(test)]
mod tests;

pub use action::{ActionCatalog, ActionDefinition, ActionQueue, ActionScope, QueuedAction};
pub use character::Character;
pub use codec::{CharacterSnapshot, InstanceSnapshot, PermanentState};
pub use cost::{CostArgs, CostBook, CostFn, CostTable, FamiliarityMode};
pub use domain::{ActionPayload, ActionTag, Domain, PerAction, Stacked};
pub use error::{Error, Result};
pub use hooks::{CallbackSet, HookArgs, HookFlow, HookFn, ProgressFn};
pub use projector::PathStep;
pub use resolver::PendingAction;
pub use scheduler::AdvanceOutcome;
pub use tile::{
    ActionCounters, Cell, DefinitionTable, Grid, LoopCounters, TileDefinition, TileInstance,
};
pub use world::{GlobalData, ManaPool, WorldInit, WorldState};
