//! Tile definitions, instances, cells, and the grid.
//!
//! A [`TileDefinition`] is a shared, immutable template keyed by a numeric
//! map id: name, per-action cost formulas, callback sets, and a blocked flag.
//! Many cells reference the same definition. A [`TileInstance`] is one
//! concrete occurrence inside a [`Cell`]: it carries the mutable state — the
//! engine-structured familiarity counters, a custom persistent payload, and
//! a loop-local payload — plus a disabled flag for cosmetic-only entries
//! that never participate in resolution.
//!
//! A cell holds an ordered list of instances; the first non-disabled
//! instance is the cell's primary interaction target.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::cost::{CostFn, CostTable};
use crate::domain::{Domain, PerAction};
use crate::hooks::{CallbackSet, HookFn, ProgressFn};

// =============================================================================
// Counters
// =============================================================================

/// Engine-structured persistent counters on a tile instance.
///
/// These survive loop resets and are what the familiarity cost dampening
/// reads. They serialize through the permanent-state codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ActionCounters<S: Domain> {
    /// Accumulated familiarity per action kind.
    pub familiarity: PerAction<S, f64>,
    /// Total completions per action kind, across all loops.
    pub times_performed: PerAction<S, u64>,
}

impl<S: Domain> Default for ActionCounters<S> {
    fn default() -> Self {
        Self {
            familiarity: BTreeMap::new(),
            times_performed: BTreeMap::new(),
        }
    }
}

/// Loop-local counterpart of [`ActionCounters`]; rebuilt every loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopCounters<S: Domain> {
    /// Familiarity gained this loop, per action kind.
    pub familiarity_this_loop: PerAction<S, f64>,
    /// Completions this loop, per action kind. The first completion of a
    /// kind in a loop earns the larger familiarity gain.
    pub times_performed_this_loop: PerAction<S, u64>,
}

impl<S: Domain> Default for LoopCounters<S> {
    fn default() -> Self {
        Self {
            familiarity_this_loop: BTreeMap::new(),
            times_performed_this_loop: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Definitions
// =============================================================================

/// Shared immutable tile template.
///
/// Definitions own the per-action cost formulas and callback sets consulted
/// at the highest-priority layer of resolution and dispatch. They are built
/// once by the world initializer and referenced by id from instances.
#[derive(Clone)]
pub struct TileDefinition<S: Domain> {
    /// Display name, used in error messages and previews.
    pub name: String,
    /// Blocked tiles refuse movement onto their cell.
    pub blocked: bool,
    /// Per-action cost formulas (the instance layer of the cost chain).
    pub costs: CostTable<S>,
    /// Specific hooks, consulted first in the dispatch chain.
    pub callbacks: CallbackSet<S>,
    /// Unconditional hooks; fire regardless of what handled the event.
    pub always_callbacks: CallbackSet<S>,
}

impl<S: Domain> TileDefinition<S> {
    /// A walkable definition with no costs or hooks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocked: false,
            costs: CostTable::<S>::new(),
            callbacks: CallbackSet::new(),
            always_callbacks: CallbackSet::new(),
        }
    }

    /// A blocked definition (refuses movement onto its cell).
    #[must_use]
    pub fn blocked(name: impl Into<String>) -> Self {
        let mut def = Self::new(name);
        def.blocked = true;
        def
    }

    /// Builder: installs a cost formula for `kind`.
    #[must_use]
    pub fn with_cost(mut self, kind: S::ActionKind, cost: CostFn<S>) -> Self {
        self.costs.insert(kind, cost);
        self
    }

    /// Builder: appends a start hook for `kind`.
    #[must_use]
    pub fn with_on_start(mut self, kind: S::ActionKind, hook: HookFn<S>) -> Self {
        self.callbacks.push_start(kind, hook);
        self
    }

    /// Builder: appends a progress hook for `kind`.
    #[must_use]
    pub fn with_on_progress(mut self, kind: S::ActionKind, hook: ProgressFn<S>) -> Self {
        self.callbacks.push_progress(kind, hook);
        self
    }

    /// Builder: appends a complete hook for `kind`.
    #[must_use]
    pub fn with_on_complete(mut self, kind: S::ActionKind, hook: HookFn<S>) -> Self {
        self.callbacks.push_complete(kind, hook);
        self
    }
}

impl<S: Domain> fmt::Debug for TileDefinition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileDefinition")
            .field("name", &self.name)
            .field("blocked", &self.blocked)
            .field("costs", &format!("[{} kinds]", self.costs.len()))
            .finish_non_exhaustive()
    }
}

/// Definition table keyed by numeric map id.
pub type DefinitionTable<S> = BTreeMap<u32, Arc<TileDefinition<S>>>;

// =============================================================================
// Instances
// =============================================================================

/// One concrete tile/entity occurrence inside a cell.
#[derive(Debug, Clone)]
pub struct TileInstance<S: Domain> {
    /// Id of the shared definition in the world's definition table.
    pub definition: u32,
    /// Disabled instances are cosmetic: resolution and blocking skip them.
    pub disabled: bool,
    /// Persistent engine counters (familiarity, completions).
    pub counters: ActionCounters<S>,
    /// Loop-local engine counters.
    pub loop_counters: LoopCounters<S>,
    /// Custom persistent payload.
    pub persistent: S::TilePersistent,
    /// Custom loop-local payload (stacks, orientation flags, ...).
    pub loop_data: S::TileLoop,
}

impl<S: Domain> TileInstance<S> {
    /// A fresh instance of `definition` with default payloads.
    #[must_use]
    pub fn new(definition: u32) -> Self {
        Self {
            definition,
            disabled: false,
            counters: ActionCounters::default(),
            loop_counters: LoopCounters::default(),
            persistent: S::TilePersistent::default(),
            loop_data: S::TileLoop::default(),
        }
    }

    /// Builder: sets the loop-local payload.
    #[must_use]
    pub fn with_loop_data(mut self, loop_data: S::TileLoop) -> Self {
        self.loop_data = loop_data;
        self
    }

    /// Builder: sets the custom persistent payload.
    #[must_use]
    pub fn with_persistent(mut self, persistent: S::TilePersistent) -> Self {
        self.persistent = persistent;
        self
    }

    /// Builder: marks the instance cosmetic.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Accumulated familiarity for `kind` on this instance.
    #[must_use]
    pub fn familiarity(&self, kind: S::ActionKind) -> f64 {
        self.counters.familiarity.get(&kind).copied().unwrap_or(0.0)
    }

    /// Completions of `kind` on this instance during the current loop.
    #[must_use]
    pub fn times_performed_this_loop(&self, kind: S::ActionKind) -> u64 {
        self.loop_counters
            .times_performed_this_loop
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }
}

// =============================================================================
// Cells and grid
// =============================================================================

/// One map cell: an ordered list of instances, primary first.
#[derive(Debug, Clone)]
pub struct Cell<S: Domain> {
    /// The instances occupying this cell, in priority order.
    pub instances: Vec<TileInstance<S>>,
}

impl<S: Domain> Cell<S> {
    /// A cell holding the given instances.
    #[must_use]
    pub fn new(instances: Vec<TileInstance<S>>) -> Self {
        Self { instances }
    }

    /// A cell holding a single instance.
    #[must_use]
    pub fn single(instance: TileInstance<S>) -> Self {
        Self {
            instances: vec![instance],
        }
    }

    /// Iterates `(slot, instance)` over the non-disabled instances in order.
    pub fn active(&self) -> impl Iterator<Item = (usize, &TileInstance<S>)> {
        self.instances
            .iter()
            .enumerate()
            .filter(|(_, instance)| !instance.disabled)
    }

    /// The first non-disabled instance, the cell's default target.
    #[must_use]
    pub fn primary(&self) -> Option<&TileInstance<S>> {
        self.active().next().map(|(_, instance)| instance)
    }
}

impl<S: Domain> Default for Cell<S> {
    fn default() -> Self {
        Self {
            instances: Vec::new(),
        }
    }
}

/// Rectangular grid of cells, indexed `[row][col]` and addressed by
/// `IVec2 { x: col, y: row }`.
#[derive(Debug, Clone)]
pub struct Grid<S: Domain> {
    rows: Vec<Vec<Cell<S>>>,
    width: i32,
    height: i32,
}

impl<S: Domain> Grid<S> {
    /// Builds a grid from row-major cells. Rows must be equal length.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<Cell<S>>>) -> Self {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |row| row.len() as i32);
        debug_assert!(rows.iter().all(|row| row.len() as i32 == width));
        Self {
            rows,
            width,
            height,
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// True if `pos` addresses a cell inside the grid.
    #[must_use]
    pub fn contains(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// The cell at `pos`, if inside the grid.
    #[must_use]
    pub fn cell(&self, pos: IVec2) -> Option<&Cell<S>> {
        if self.contains(pos) {
            Some(&self.rows[pos.y as usize][pos.x as usize])
        } else {
            None
        }
    }

    /// Mutable access to the cell at `pos`, if inside the grid.
    pub fn cell_mut(&mut self, pos: IVec2) -> Option<&mut Cell<S>> {
        if self.contains(pos) {
            Some(&mut self.rows[pos.y as usize][pos.x as usize])
        } else {
            None
        }
    }

    /// Direct cell access for positions already validated by resolution.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside the grid; callers hold a resolved target.
    pub(crate) fn at(&self, pos: IVec2) -> &Cell<S> {
        &self.rows[pos.y as usize][pos.x as usize]
    }

    /// Mutable counterpart of [`Grid::at`].
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside the grid; callers hold a resolved target.
    pub(crate) fn at_mut(&mut self, pos: IVec2) -> &mut Cell<S> {
        &mut self.rows[pos.y as usize][pos.x as usize]
    }

    /// Row-major view of the cells, used by the codec walk.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell<S>>] {
        &self.rows
    }

    /// Mutable row-major view of the cells.
    pub fn rows_mut(&mut self) -> &mut [Vec<Cell<S>>] {
        &mut self.rows
    }
}
