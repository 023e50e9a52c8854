//! Action definitions, queues, and catalogs.
//!
//! An [`ActionDefinition`] is an immutable template (name, kind tag, per-kind
//! payload). Characters never queue definitions directly; they queue
//! [`QueuedAction`] references — a definition id, a scope flag selecting the
//! global or the character-local catalog, and a repetition count. The
//! [`ActionQueue`] tracks progress through those references with a cursor:
//! `index` selects the queued action, `sub_index` the repetition within it,
//! and `spent_action_mana` the partial mana already sunk into the current
//! repetition.
//!
//! Queued references survive a loop reset (what the player intends to do is
//! permanent data); the cursor does not.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;

// =============================================================================
// Definitions
// =============================================================================

/// Immutable action template.
#[derive(Debug, Clone)]
pub struct ActionDefinition<S: Domain> {
    /// Display name ("Up", "Attack", ...).
    pub name: String,
    /// The action-kind tag this definition resolves costs and hooks under.
    pub kind: S::ActionKind,
    /// Per-kind payload; movement actions expose their delta through it.
    pub data: S::ActionData,
}

impl<S: Domain> ActionDefinition<S> {
    /// Creates a definition.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: S::ActionKind, data: S::ActionData) -> Self {
        Self {
            name: name.into(),
            kind,
            data,
        }
    }
}

/// Which catalog a queued reference resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionScope {
    /// The world's shared catalog.
    Global,
    /// The acting character's own catalog.
    Character,
}

impl fmt::Display for ActionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Character => write!(f, "character"),
        }
    }
}

/// A reference to an action definition plus a repetition count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Definition id in the catalog selected by `scope`.
    pub id: u32,
    /// Catalog the id resolves against.
    pub scope: ActionScope,
    /// How many times the action repeats before the cursor moves on.
    pub repetitions: u32,
}

impl QueuedAction {
    /// A reference into the global catalog.
    #[must_use]
    pub const fn global(id: u32, repetitions: u32) -> Self {
        Self {
            id,
            scope: ActionScope::Global,
            repetitions,
        }
    }

    /// A reference into the character-local catalog.
    #[must_use]
    pub const fn local(id: u32, repetitions: u32) -> Self {
        Self {
            id,
            scope: ActionScope::Character,
            repetitions,
        }
    }
}

// =============================================================================
// Queue
// =============================================================================

/// A character's ordered action list plus its progress cursor.
///
/// # Invariants
///
/// - `spent_action_mana` stays in `[0, current action cost)` and resets to
///   zero exactly when a repetition completes.
/// - `index`/`sub_index` only ever advance during play; a loop reset rewinds
///   them by rebuilding the queue from permanent data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionQueue {
    /// The queued references, in execution order.
    pub actions: Vec<QueuedAction>,
    /// Which queued action the character is on.
    pub index: usize,
    /// Which repetition within the current action.
    pub sub_index: u32,
    /// Partial mana already spent on the current repetition.
    pub spent_action_mana: f64,
}

impl ActionQueue {
    /// A fresh queue positioned at its first action.
    #[must_use]
    pub fn new(actions: Vec<QueuedAction>) -> Self {
        Self {
            actions,
            index: 0,
            sub_index: 0,
            spent_action_mana: 0.0,
        }
    }

    /// The queued action under the cursor, or `None` once the queue is
    /// exhausted.
    #[must_use]
    pub fn current(&self) -> Option<QueuedAction> {
        self.actions.get(self.index).copied()
    }

    /// True once the cursor has run past the last queued action.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.actions.len()
    }

    /// Appends a reference to the end of the queue.
    pub fn push(&mut self, action: QueuedAction) {
        self.actions.push(action);
    }

    /// Advances the cursor past one completed repetition.
    pub(crate) fn complete_repetition(&mut self) {
        let repetitions = self.actions.get(self.index).map_or(0, |a| a.repetitions);
        self.sub_index += 1;
        if self.sub_index >= repetitions {
            self.sub_index = 0;
            self.index += 1;
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Table of action definitions keyed by numeric id.
///
/// The world carries one global catalog; characters may carry their own for
/// character-scoped references.
#[derive(Debug, Clone)]
pub struct ActionCatalog<S: Domain> {
    entries: BTreeMap<u32, Arc<ActionDefinition<S>>>,
}

impl<S: Domain> ActionCatalog<S> {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, id: u32, definition: ActionDefinition<S>) -> Self {
        self.insert(id, definition);
        self
    }

    /// Registers a definition under `id`, replacing any previous entry.
    pub fn insert(&mut self, id: u32, definition: ActionDefinition<S>) {
        self.entries.insert(id, Arc::new(definition));
    }

    /// Looks up a definition by id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Arc<ActionDefinition<S>>> {
        self.entries.get(&id)
    }

    /// Iterates `(id, definition)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<ActionDefinition<S>>)> {
        self.entries.iter().map(|(id, def)| (*id, def))
    }

    /// Finds the first id whose definition satisfies the predicate.
    #[must_use]
    pub fn find(&self, mut predicate: impl FnMut(&ActionDefinition<S>) -> bool) -> Option<u32> {
        self.entries
            .iter()
            .find(|(_, def)| predicate(def))
            .map(|(id, _)| *id)
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Domain> Default for ActionCatalog<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_advances_through_repetitions() {
        let mut queue = ActionQueue::new(vec![QueuedAction::global(0, 2), QueuedAction::global(1, 1)]);
        assert_eq!(queue.index, 0);
        assert_eq!(queue.sub_index, 0);

        queue.complete_repetition();
        assert_eq!(queue.index, 0);
        assert_eq!(queue.sub_index, 1);

        queue.complete_repetition();
        assert_eq!(queue.index, 1);
        assert_eq!(queue.sub_index, 0);

        queue.complete_repetition();
        assert!(queue.is_exhausted());
        assert!(queue.current().is_none());
    }

    #[test]
    fn exhausted_queue_reports_no_current_action() {
        let queue = ActionQueue::new(Vec::new());
        assert!(queue.is_exhausted());
        assert!(queue.current().is_none());
    }
}
