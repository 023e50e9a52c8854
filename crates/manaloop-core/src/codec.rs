//! The persistence codec: serializing the permanent subset of state.
//!
//! [`WorldState::serialize_permanent_state`] extracts, in map order, every
//! instance's persistent payload (engine counters plus the custom payload,
//! indexed `[row][col][slot]`), each character's persistent payload and raw
//! queued-action list, the global persistent payload, and the loop counter,
//! into one transport value. [`WorldState::deserialize_permanent_state`]
//! walks a *freshly initialized* state in the same order and overwrites only
//! those pieces, leaving loop-local payloads, positions, cursors, and mana
//! exactly as the initializer produced them.
//!
//! `Clone` and [`WorldState::reset_loop`] are both built on this codec:
//! serialize, re-run the initializer, rehydrate. There is deliberately no
//! structural deep copy — one code path owns the definition of "permanent",
//! so a clone, a reset, and a save file can never disagree about what
//! survives.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{ActionQueue, QueuedAction};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::tile::ActionCounters;
use crate::world::WorldState;

// =============================================================================
// Transport value
// =============================================================================

/// Permanent data of one tile instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct InstanceSnapshot<S: Domain> {
    /// Engine counters (familiarity, total completions).
    pub counters: ActionCounters<S>,
    /// The custom persistent payload.
    pub persistent: S::TilePersistent,
}

/// Permanent data of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct CharacterSnapshot<S: Domain> {
    /// The custom persistent payload.
    pub persistent: S::CharacterPersistent,
    /// The raw queued-action list; the cursor is loop-local and not here.
    pub queued_actions: Vec<QueuedAction>,
}

/// The whole permanent-state transport value.
///
/// Producer and consumer are the same codec version, so the only contract
/// is round-trip symmetry — no fixed byte layout is promised. The JSON
/// helpers exist for callers that want a string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PermanentState<S: Domain> {
    /// Per-instance payloads indexed `[row][col][slot]`.
    pub tiles_state: Vec<Vec<Vec<InstanceSnapshot<S>>>>,
    /// Per-character payloads and queued actions, in character order.
    pub characters: Vec<CharacterSnapshot<S>>,
    /// The global persistent payload.
    pub global_persistent: S::GlobalPersistent,
    /// Completed loop resets.
    pub loop_count: u32,
}

impl<S: Domain> PermanentState<S> {
    /// Serializes the transport value to a JSON string.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures from the custom payloads.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a transport value from a JSON string.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` parse failures.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// Codec operations
// =============================================================================

impl<S: Domain> WorldState<S> {
    /// Extracts the permanent subset of this world.
    #[must_use]
    pub fn serialize_permanent_state(&self) -> PermanentState<S> {
        let tiles_state = self
            .grid
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        cell.instances
                            .iter()
                            .map(|instance| InstanceSnapshot {
                                counters: instance.counters.clone(),
                                persistent: instance.persistent.clone(),
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();
        let characters = self
            .characters
            .iter()
            .map(|character| CharacterSnapshot {
                persistent: character.persistent.clone(),
                queued_actions: character.queue.actions.clone(),
            })
            .collect();
        PermanentState {
            tiles_state,
            characters,
            global_persistent: self.global.persistent.clone(),
            loop_count: self.loop_count,
        }
    }

    /// Overwrites this world's permanent data from a snapshot.
    ///
    /// Intended for a freshly initialized state: loop-local payloads,
    /// positions, queue cursors, and mana are left as the initializer made
    /// them. Queue cursors are reset along with the replaced queues.
    ///
    /// # Errors
    ///
    /// [`Error::SnapshotMismatch`] if the snapshot's grid shape, per-cell
    /// instance counts, or character count differ from this world's.
    pub fn deserialize_permanent_state(&mut self, snapshot: &PermanentState<S>) -> Result<()> {
        self.check_shape(snapshot)?;
        self.rehydrate(snapshot);
        Ok(())
    }

    /// Resets the world to a new loop: permanent data (familiarity, skills,
    /// queued actions, loop counter) survives; everything loop-local is
    /// rebuilt by the initializer. The loop counter increments.
    pub fn reset_loop(&mut self) {
        let mut snapshot = self.serialize_permanent_state();
        snapshot.loop_count += 1;
        let seed = (self.initializer)();
        *self = Self::from_init(Arc::clone(&self.initializer), seed);
        self.rehydrate(&snapshot);
        debug!(
            target: "manaloop::codec",
            loop_count = self.loop_count,
            "loop reset"
        );
    }

    fn check_shape(&self, snapshot: &PermanentState<S>) -> Result<()> {
        let mismatch = |reason: String| Error::SnapshotMismatch { reason };
        let rows = self.grid.rows();
        if snapshot.tiles_state.len() != rows.len() {
            return Err(mismatch(format!(
                "snapshot has {} rows, world has {}",
                snapshot.tiles_state.len(),
                rows.len()
            )));
        }
        for (y, (snap_row, row)) in snapshot.tiles_state.iter().zip(rows).enumerate() {
            if snap_row.len() != row.len() {
                return Err(mismatch(format!(
                    "row {y}: snapshot has {} cells, world has {}",
                    snap_row.len(),
                    row.len()
                )));
            }
            for (x, (snap_cell, cell)) in snap_row.iter().zip(row).enumerate() {
                if snap_cell.len() != cell.instances.len() {
                    return Err(mismatch(format!(
                        "cell ({x}, {y}): snapshot has {} instances, world has {}",
                        snap_cell.len(),
                        cell.instances.len()
                    )));
                }
            }
        }
        if snapshot.characters.len() != self.characters.len() {
            return Err(mismatch(format!(
                "snapshot has {} characters, world has {}",
                snapshot.characters.len(),
                self.characters.len()
            )));
        }
        Ok(())
    }

    /// Applies a shape-compatible snapshot. Infallible: `Clone` and
    /// [`WorldState::reset_loop`] call this directly because a snapshot
    /// taken from the same initializer always matches.
    pub(crate) fn rehydrate(&mut self, snapshot: &PermanentState<S>) {
        for (row, snap_row) in self.grid.rows_mut().iter_mut().zip(&snapshot.tiles_state) {
            for (cell, snap_cell) in row.iter_mut().zip(snap_row) {
                for (instance, snap) in cell.instances.iter_mut().zip(snap_cell) {
                    instance.counters = snap.counters.clone();
                    instance.persistent = snap.persistent.clone();
                }
            }
        }
        for (character, snap) in self.characters.iter_mut().zip(&snapshot.characters) {
            character.persistent = snap.persistent.clone();
            character.queue = ActionQueue::new(snap.queued_actions.clone());
        }
        self.global.persistent = snapshot.global_persistent.clone();
        self.loop_count = snapshot.loop_count;
    }
}

impl<S: Domain> Clone for WorldState<S> {
    /// Clones via the codec: construct fresh from the initializer, then
    /// rehydrate the serialized permanent data. Mutable payloads in the
    /// clone are therefore independent of the original's.
    fn clone(&self) -> Self {
        let snapshot = self.serialize_permanent_state();
        let seed = (self.initializer)();
        let mut fresh = Self::from_init(Arc::clone(&self.initializer), seed);
        fresh.rehydrate(&snapshot);
        fresh
    }
}
