//! Characters: position, action queue, and per-character override layers.

use std::fmt;
use std::sync::Arc;

use glam::IVec2;

use crate::action::{ActionCatalog, ActionQueue, QueuedAction};
use crate::cost::CostTable;
use crate::domain::Domain;
use crate::hooks::CallbackSet;

/// An acting character.
///
/// Characters sit between the instance layer and the world layer in both
/// the cost chain and the hook dispatch chain: their optional `costs`,
/// `callbacks`, and `always_callbacks` override the world-level defaults
/// but lose to anything the target instance defines.
#[derive(Clone)]
pub struct Character<S: Domain> {
    /// Display name, used in error messages.
    pub name: String,
    /// Disabled characters are skipped by resolution and the scheduler.
    pub disabled: bool,
    /// Current cell coordinates (`x` = column, `y` = row).
    pub position: IVec2,
    /// Queued actions plus the progress cursor.
    pub queue: ActionQueue,
    /// Character-local action catalog for character-scoped references.
    pub catalog: Option<ActionCatalog<S>>,
    /// Character-level cost overrides.
    pub costs: Option<CostTable<S>>,
    /// Character-level specific hooks.
    pub callbacks: Option<Arc<CallbackSet<S>>>,
    /// Character-level unconditional hooks.
    pub always_callbacks: Option<Arc<CallbackSet<S>>>,
    /// Persistent payload; survives loop resets.
    pub persistent: S::CharacterPersistent,
    /// Loop-local payload; rebuilt by the initializer.
    pub loop_data: S::CharacterLoop,
}

impl<S: Domain> Character<S> {
    /// A character at `position` with an empty queue and no overrides.
    #[must_use]
    pub fn new(name: impl Into<String>, position: IVec2) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            position,
            queue: ActionQueue::default(),
            catalog: None,
            costs: None,
            callbacks: None,
            always_callbacks: None,
            persistent: S::CharacterPersistent::default(),
            loop_data: S::CharacterLoop::default(),
        }
    }

    /// Builder: seeds the action queue.
    #[must_use]
    pub fn with_actions(mut self, actions: Vec<QueuedAction>) -> Self {
        self.queue = ActionQueue::new(actions);
        self
    }

    /// Builder: attaches a character-local action catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: ActionCatalog<S>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Builder: installs character-level cost overrides.
    #[must_use]
    pub fn with_costs(mut self, costs: CostTable<S>) -> Self {
        self.costs = Some(costs);
        self
    }

    /// Builder: installs character-level specific hooks.
    #[must_use]
    pub fn with_callbacks(mut self, callbacks: CallbackSet<S>) -> Self {
        self.callbacks = Some(Arc::new(callbacks));
        self
    }

    /// Builder: installs character-level unconditional hooks.
    #[must_use]
    pub fn with_always_callbacks(mut self, callbacks: CallbackSet<S>) -> Self {
        self.always_callbacks = Some(Arc::new(callbacks));
        self
    }
}

impl<S: Domain> fmt::Debug for Character<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Character")
            .field("name", &self.name)
            .field("disabled", &self.disabled)
            .field("position", &self.position)
            .field("queue", &self.queue)
            .field("persistent", &self.persistent)
            .field("loop_data", &self.loop_data)
            .finish_non_exhaustive()
    }
}
