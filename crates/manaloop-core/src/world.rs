//! The world state and its initializer.
//!
//! A [`WorldState`] is a single mutable value: the tile grid, the definition
//! table, the characters, the layered cost/callback tables, the global
//! payloads, and the cost book. It is produced exclusively by an
//! **initializer** — a pure factory returning a [`WorldInit`] — which the
//! state keeps hold of. `Clone` and [`WorldState::reset_loop`] both re-run
//! the initializer and replay serialized permanent data on top; that is the
//! only state-construction path, so "reset" and "fresh with known progress"
//! are the same operation (see [`crate::codec`]).
//!
//! # Single-writer discipline
//!
//! The engine is single-threaded and fully synchronous. The scheduler
//! mutates the state in place; callers must not run two scheduler calls
//! concurrently on one state. Clone is the only supported way to get an
//! independent copy for speculative simulation.

use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::action::ActionCatalog;
use crate::character::Character;
use crate::cost::{CostBook, CostTable, FamiliarityMode};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::hooks::CallbackSet;
use crate::tile::{DefinitionTable, Grid, TileDefinition};

// =============================================================================
// Global data
// =============================================================================

/// The shared mana pool.
///
/// The scheduler draws every spent increment from it; hooks may refill or
/// enlarge it. It is loop-local: the initializer rebuilds it on reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManaPool {
    /// Mana currently available.
    pub current: f64,
    /// Upper bound [`ManaPool::restore`] clamps to.
    pub max: f64,
}

impl ManaPool {
    /// A full pool of the given capacity.
    #[must_use]
    pub fn full(max: f64) -> Self {
        Self { current: max, max }
    }

    /// Adds mana, clamped to the pool's maximum.
    pub fn restore(&mut self, amount: f64) {
        self.current = (self.current + amount).min(self.max);
    }
}

impl Default for ManaPool {
    fn default() -> Self {
        Self::full(0.0)
    }
}

/// Global payloads plus the mana pool; handed to hooks as one mutable piece.
#[derive(Debug, Clone)]
pub struct GlobalData<S: Domain> {
    /// The shared mana pool.
    pub mana: ManaPool,
    /// Persistent global payload; survives loop resets.
    pub persistent: S::GlobalPersistent,
    /// Loop-local global payload; rebuilt by the initializer.
    pub loop_data: S::GlobalLoop,
}

// =============================================================================
// Initializer
// =============================================================================

/// Everything the initializer produces for a fresh loop.
pub struct WorldInit<S: Domain> {
    /// The tile grid.
    pub grid: Grid<S>,
    /// The shared tile definition table.
    pub definitions: DefinitionTable<S>,
    /// The characters, in scheduling order.
    pub characters: Vec<Character<S>>,
    /// The global action catalog.
    pub catalog: ActionCatalog<S>,
    /// The formula book used while building `definitions`.
    pub costs: CostBook<S>,
    /// World-level cost fallbacks.
    pub default_costs: CostTable<S>,
    /// World-level specific hooks.
    pub callbacks: Arc<CallbackSet<S>>,
    /// World-level unconditional hooks.
    pub always_callbacks: Arc<CallbackSet<S>>,
    /// The fresh mana pool.
    pub mana: ManaPool,
    /// Fresh persistent global payload (overwritten on rehydration).
    pub global_persistent: S::GlobalPersistent,
    /// Fresh loop-local global payload.
    pub global_loop: S::GlobalLoop,
    /// Familiarity growth mode.
    pub familiarity: FamiliarityMode,
}

impl<S: Domain> WorldInit<S> {
    /// A minimal seed; everything else defaults to empty.
    #[must_use]
    pub fn new(
        grid: Grid<S>,
        definitions: DefinitionTable<S>,
        characters: Vec<Character<S>>,
        catalog: ActionCatalog<S>,
    ) -> Self {
        Self {
            grid,
            definitions,
            characters,
            catalog,
            costs: CostBook::new(),
            default_costs: CostTable::<S>::new(),
            callbacks: Arc::new(CallbackSet::new()),
            always_callbacks: Arc::new(CallbackSet::new()),
            mana: ManaPool::default(),
            global_persistent: S::GlobalPersistent::default(),
            global_loop: S::GlobalLoop::default(),
            familiarity: FamiliarityMode::Deterministic,
        }
    }

    /// Builder: attaches the cost book.
    #[must_use]
    pub fn with_costs(mut self, costs: CostBook<S>) -> Self {
        self.costs = costs;
        self
    }

    /// Builder: world-level cost fallbacks.
    #[must_use]
    pub fn with_default_costs(mut self, default_costs: CostTable<S>) -> Self {
        self.default_costs = default_costs;
        self
    }

    /// Builder: world-level specific hooks.
    #[must_use]
    pub fn with_callbacks(mut self, callbacks: CallbackSet<S>) -> Self {
        self.callbacks = Arc::new(callbacks);
        self
    }

    /// Builder: world-level unconditional hooks.
    #[must_use]
    pub fn with_always_callbacks(mut self, callbacks: CallbackSet<S>) -> Self {
        self.always_callbacks = Arc::new(callbacks);
        self
    }

    /// Builder: the starting mana pool.
    #[must_use]
    pub fn with_mana(mut self, mana: ManaPool) -> Self {
        self.mana = mana;
        self
    }

    /// Builder: the fresh global payloads.
    #[must_use]
    pub fn with_global(mut self, persistent: S::GlobalPersistent, loop_data: S::GlobalLoop) -> Self {
        self.global_persistent = persistent;
        self.global_loop = loop_data;
        self
    }

    /// Builder: familiarity growth mode.
    #[must_use]
    pub fn with_familiarity(mut self, familiarity: FamiliarityMode) -> Self {
        self.familiarity = familiarity;
        self
    }
}

/// The stored world factory.
pub type Initializer<S> = Arc<dyn Fn() -> WorldInit<S> + Send + Sync>;

// =============================================================================
// World state
// =============================================================================

/// The complete simulated world.
///
/// Fields are public in the same spirit as the rest of the data model: the
/// engine's operations live in `impl` blocks spread across the component
/// modules (resolver, scheduler, codec, projector), while hooks and tests
/// reach into the data directly.
pub struct WorldState<S: Domain> {
    /// The tile grid.
    pub grid: Grid<S>,
    /// Shared tile definitions keyed by numeric id.
    pub definitions: DefinitionTable<S>,
    /// Characters in scheduling order. Order is the tie-break for everything.
    pub characters: Vec<Character<S>>,
    /// The global action catalog.
    pub catalog: ActionCatalog<S>,
    /// World-level cost fallbacks (lowest priority layer).
    pub default_costs: CostTable<S>,
    /// World-level specific hooks (lowest priority layer).
    pub callbacks: Arc<CallbackSet<S>>,
    /// World-level unconditional hooks.
    pub always_callbacks: Arc<CallbackSet<S>>,
    /// Mana pool and global payloads.
    pub global: GlobalData<S>,
    /// The instance-scoped cost formula book.
    pub costs: CostBook<S>,
    /// Completed loop resets so far. Permanent data.
    pub loop_count: u32,
    pub(crate) familiarity: FamiliarityMode,
    pub(crate) rng: Option<ChaCha8Rng>,
    pub(crate) initializer: Initializer<S>,
}

impl<S: Domain> WorldState<S> {
    /// Builds the world by running `initializer` once and keeping it for
    /// clones and loop resets.
    #[must_use]
    pub fn new(initializer: impl Fn() -> WorldInit<S> + Send + Sync + 'static) -> Self {
        let initializer: Initializer<S> = Arc::new(initializer);
        let seed = initializer();
        Self::from_init(initializer, seed)
    }

    pub(crate) fn from_init(initializer: Initializer<S>, seed: WorldInit<S>) -> Self {
        let rng = match seed.familiarity {
            FamiliarityMode::Deterministic => None,
            FamiliarityMode::Random { seed } => Some(ChaCha8Rng::seed_from_u64(seed)),
        };
        Self {
            grid: seed.grid,
            definitions: seed.definitions,
            characters: seed.characters,
            catalog: seed.catalog,
            default_costs: seed.default_costs,
            callbacks: seed.callbacks,
            always_callbacks: seed.always_callbacks,
            global: GlobalData {
                mana: seed.mana,
                persistent: seed.global_persistent,
                loop_data: seed.global_loop,
            },
            costs: seed.costs,
            loop_count: 0,
            familiarity: seed.familiarity,
            rng,
            initializer,
        }
    }

    /// Looks up a tile definition by id.
    pub fn definition(&self, id: u32) -> Result<&Arc<TileDefinition<S>>> {
        self.definitions
            .get(&id)
            .ok_or(Error::UnknownTileDefinition { id })
    }

    /// The active familiarity growth mode.
    #[must_use]
    pub fn familiarity_mode(&self) -> FamiliarityMode {
        self.familiarity
    }
}

impl<S: Domain> fmt::Debug for WorldState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldState")
            .field("grid", &(self.grid.width(), self.grid.height()))
            .field("characters", &self.characters.len())
            .field("definitions", &self.definitions.len())
            .field("loop_count", &self.loop_count)
            .field("mana", &self.global.mana)
            .finish_non_exhaustive()
    }
}
