//! Domain parameterization for the engine.
//!
//! The engine is generic over the data a concrete world attaches to tiles,
//! characters, and the global state. All of those types are bundled into a
//! single [`Domain`] trait so that the engine's own types take one type
//! parameter instead of a parameter per payload.
//!
//! A domain is a zero-sized marker type:
//!
//! ```rust,ignore
//! #[derive(Clone, Debug)]
//! struct Village;
//!
//! impl Domain for Village {
//!     type ActionKind = VillageAction;
//!     type ActionData = VillageActionData;
//!     type TilePersistent = ();
//!     type TileLoop = Terrain;
//!     type CharacterPersistent = ();
//!     type CharacterLoop = ();
//!     type GlobalPersistent = Progress;
//!     type GlobalLoop = RunState;
//! }
//! ```
//!
//! # Persistent vs loop-local
//!
//! Each site carries two payloads. The *persistent* half survives a loop
//! reset and is what the persistence codec serializes; the *loop-local* half
//! is rebuilt from the world initializer on every reset. Familiarity counters
//! are engine-structured and live alongside these payloads (see
//! [`crate::tile::ActionCounters`]).

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use glam::IVec2;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Bound alias for action-kind tags.
///
/// An action kind is a small copyable tag (typically a fieldless enum) used
/// to key cost tables, callback tables, and familiarity counters. `Ord` gives
/// the per-action maps a deterministic iteration order, and the serde bounds
/// let familiarity counters keyed by kind travel through the persistence
/// codec.
pub trait ActionTag:
    Copy
    + Ord
    + Eq
    + Hash
    + fmt::Debug
    + fmt::Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<T> ActionTag for T where
    T: Copy
        + Ord
        + Eq
        + Hash
        + fmt::Debug
        + fmt::Display
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Per-action-type payload attached to an action definition.
///
/// The only payload the engine itself interprets is the movement delta: an
/// action whose data reports `Some(delta)` gets the built-in movement effect
/// on completion (destination validation plus position update). Every other
/// effect goes through completion hooks.
pub trait ActionPayload: Clone + fmt::Debug + Send + Sync + 'static {
    /// The movement delta this action applies on completion, if it is a
    /// movement action.
    fn movement(&self) -> Option<IVec2> {
        None
    }
}

/// Optional stack counter exposed by loop-local tile payloads.
///
/// Some targets carry a finite countable resource ("stacks": remaining
/// enemies, harvests, charges) that gates whether or how an action may
/// repeat. The stack-gated cost variant in [`crate::cost::CostBook`] reads
/// it through this trait; domains without the concept keep the default
/// `None`.
pub trait Stacked {
    /// Remaining stacks on this target, if it tracks any.
    fn stacks(&self) -> Option<u32> {
        None
    }
}

impl Stacked for () {}

/// The bundle of types a concrete world plugs into the engine.
///
/// Implementors are marker types; all the information is in the associated
/// types. Payload types on the persistent side must serialize (they travel
/// through the permanent-state codec); loop-local types only need `Default`
/// because they are rebuilt by the initializer on every loop.
pub trait Domain: Clone + fmt::Debug + Send + Sync + Sized + 'static {
    /// Tag distinguishing action types (move, attack, ...).
    type ActionKind: ActionTag;
    /// Per-definition action payload (movement deltas and the like).
    type ActionData: ActionPayload;
    /// Custom persistent payload on a tile instance.
    type TilePersistent: Clone
        + fmt::Debug
        + Default
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;
    /// Loop-local payload on a tile instance (stacks, orientation, ...).
    type TileLoop: Clone + fmt::Debug + Default + Stacked + Send + Sync + 'static;
    /// Persistent payload on a character.
    type CharacterPersistent: Clone
        + fmt::Debug
        + Default
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;
    /// Loop-local payload on a character.
    type CharacterLoop: Clone + fmt::Debug + Default + Send + Sync + 'static;
    /// Persistent payload on the world (skills, long-term progress).
    type GlobalPersistent: Clone
        + fmt::Debug
        + Default
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;
    /// Loop-local payload on the world (stats, inventory, run state).
    type GlobalLoop: Clone + fmt::Debug + Default + Send + Sync + 'static;
}

/// Map from action kind to some per-kind value.
///
/// `BTreeMap` keeps iteration order deterministic across platforms, which
/// matters for the codec's walk order and for reproducible traces.
pub type PerAction<S, T> = BTreeMap<<S as Domain>::ActionKind, T>;
