//! The callback registry and its dispatch routine.
//!
//! Three hook kinds exist — *start* (first increment into a repetition),
//! *progress* (every increment, with the incremental amount), and *complete*
//! (a repetition finished). For each kind there are two chains:
//!
//! - **Specific chain**: target instance definition, then character, then
//!   world. Hooks run in that order until one returns
//!   [`HookFlow::Handled`], which short-circuits everything left in the
//!   chain. For complete hooks, `Handled` also suppresses the action's
//!   built-in default effect.
//! - **Always chain**: the same three levels, fired unconditionally after
//!   the specific chain. Return values of always hooks are ignored; they
//!   can neither short-circuit nor prevent the default.
//!
//! The priority order and the short-circuit rule live in one explicit
//! routine ([`fire_hooks`] / [`fire_progress`]) rather than in any virtual
//! lookup, so they can be tested directly.

use std::fmt;
use std::sync::Arc;

use glam::IVec2;

use crate::action::ActionDefinition;
use crate::character::Character;
use crate::domain::{Domain, PerAction};
use crate::tile::TileInstance;
use crate::world::GlobalData;

// =============================================================================
// Hook signatures
// =============================================================================

/// What a hook tells the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookFlow {
    /// Keep consulting the rest of the chain.
    Continue,
    /// The event is handled: stop the specific chain. From a complete hook
    /// this also prevents the action's default effect.
    Handled,
}

impl HookFlow {
    /// True for [`HookFlow::Handled`].
    #[must_use]
    pub fn handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

/// The mutable slice of the world a hook may touch.
///
/// The borrows are disjoint pieces of the world state: hooks mutate the
/// acting character, the target instance, and the global payloads, but never
/// the grid structure or other characters.
pub struct HookArgs<'a, S: Domain> {
    /// The action being performed.
    pub action: &'a ActionDefinition<S>,
    /// Index of the acting character in the world's character list.
    pub character_index: usize,
    /// The acting character.
    pub character: &'a mut Character<S>,
    /// The resolved target instance.
    pub target: &'a mut TileInstance<S>,
    /// The cell the target occupies.
    pub target_pos: IVec2,
    /// Global mana pool and payloads.
    pub global: &'a mut GlobalData<S>,
}

/// A start or complete hook.
pub type HookFn<S> = Arc<dyn for<'a, 'b> Fn(&'b mut HookArgs<'a, S>) -> HookFlow + Send + Sync>;

/// A progress hook; the second argument is the mana spent this increment.
pub type ProgressFn<S> =
    Arc<dyn for<'a, 'b> Fn(&'b mut HookArgs<'a, S>, f64) -> HookFlow + Send + Sync>;

// =============================================================================
// Callback sets
// =============================================================================

/// One level's worth of hooks, keyed by action kind.
#[derive(Clone)]
pub struct CallbackSet<S: Domain> {
    /// Hooks fired on the first increment into a repetition.
    pub on_start: PerAction<S, Vec<HookFn<S>>>,
    /// Hooks fired on every increment.
    pub on_progress: PerAction<S, Vec<ProgressFn<S>>>,
    /// Hooks fired when a repetition completes.
    pub on_complete: PerAction<S, Vec<HookFn<S>>>,
}

impl<S: Domain> CallbackSet<S> {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_start: PerAction::<S, _>::new(),
            on_progress: PerAction::<S, _>::new(),
            on_complete: PerAction::<S, _>::new(),
        }
    }

    /// True if no hooks are registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_start.is_empty() && self.on_progress.is_empty() && self.on_complete.is_empty()
    }

    /// Appends a start hook for `kind`.
    pub fn push_start(&mut self, kind: S::ActionKind, hook: HookFn<S>) {
        self.on_start.entry(kind).or_default().push(hook);
    }

    /// Appends a progress hook for `kind`.
    pub fn push_progress(&mut self, kind: S::ActionKind, hook: ProgressFn<S>) {
        self.on_progress.entry(kind).or_default().push(hook);
    }

    /// Appends a complete hook for `kind`.
    pub fn push_complete(&mut self, kind: S::ActionKind, hook: HookFn<S>) {
        self.on_complete.entry(kind).or_default().push(hook);
    }

    /// Builder form of [`CallbackSet::push_start`].
    #[must_use]
    pub fn with_start(mut self, kind: S::ActionKind, hook: HookFn<S>) -> Self {
        self.push_start(kind, hook);
        self
    }

    /// Builder form of [`CallbackSet::push_progress`].
    #[must_use]
    pub fn with_progress(mut self, kind: S::ActionKind, hook: ProgressFn<S>) -> Self {
        self.push_progress(kind, hook);
        self
    }

    /// Builder form of [`CallbackSet::push_complete`].
    #[must_use]
    pub fn with_complete(mut self, kind: S::ActionKind, hook: HookFn<S>) -> Self {
        self.push_complete(kind, hook);
        self
    }
}

impl<S: Domain> Default for CallbackSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Domain> fmt::Debug for CallbackSet<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSet")
            .field("on_start", &format!("[{} kinds]", self.on_start.len()))
            .field("on_progress", &format!("[{} kinds]", self.on_progress.len()))
            .field("on_complete", &format!("[{} kinds]", self.on_complete.len()))
            .finish()
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Which non-progress table a dispatch consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    /// `on_start` tables.
    Start,
    /// `on_complete` tables.
    Complete,
}

impl HookStage {
    fn select<S: Domain>(self, set: &CallbackSet<S>) -> &PerAction<S, Vec<HookFn<S>>> {
        match self {
            Self::Start => &set.on_start,
            Self::Complete => &set.on_complete,
        }
    }
}

/// Fires start or complete hooks for `kind` through the specific chain, then
/// the always chain.
///
/// `specific` and `always` are ordered highest priority first (instance
/// definition, character, world). Returns true if any specific hook
/// handled the event.
pub fn fire_hooks<S: Domain>(
    specific: &[&CallbackSet<S>],
    always: &[&CallbackSet<S>],
    stage: HookStage,
    kind: S::ActionKind,
    args: &mut HookArgs<'_, S>,
) -> bool {
    let mut handled = false;
    'chain: for set in specific {
        if let Some(hooks) = stage.select(set).get(&kind) {
            for hook in hooks {
                if hook(args).handled() {
                    handled = true;
                    break 'chain;
                }
            }
        }
    }
    for set in always {
        if let Some(hooks) = stage.select(set).get(&kind) {
            for hook in hooks {
                let _ = hook(args);
            }
        }
    }
    handled
}

/// Fires progress hooks for `kind`; same chain semantics as [`fire_hooks`].
pub fn fire_progress<S: Domain>(
    specific: &[&CallbackSet<S>],
    always: &[&CallbackSet<S>],
    kind: S::ActionKind,
    args: &mut HookArgs<'_, S>,
    spent: f64,
) -> bool {
    let mut handled = false;
    'chain: for set in specific {
        if let Some(hooks) = set.on_progress.get(&kind) {
            for hook in hooks {
                if hook(args, spent).handled() {
                    handled = true;
                    break 'chain;
                }
            }
        }
    }
    for set in always {
        if let Some(hooks) = set.on_progress.get(&kind) {
            for hook in hooks {
                let _ = hook(args, spent);
            }
        }
    }
    handled
}
