//! The cost model: familiarity dampening, attack scaling, and the
//! instance-scoped formula book.
//!
//! Costs are pure functions from `(world, character, action, target,
//! position)` to `Option<f64>`:
//!
//! - `None` means the formula does not apply to this target; resolution
//!   falls through to the next layer exactly as if the table had no entry.
//! - `f64::INFINITY` is a *valid* cost meaning "currently impossible" (a
//!   gated obstacle, say). Schedulers treat it as non-actionable, never as a
//!   spendable number.
//!
//! # Familiarity dampening
//!
//! `cost = base / divider(f)` with
//! `divider(f) = (1 + level(f)/20)^0.8` and
//! `level(f) = floor(-9.5 + sqrt(8f + 5415) / (2*sqrt(15)))`.
//!
//! The closed form matters: it extrapolates past any finite threshold list,
//! and its breakpoints land exactly at `f = 7.5n² + 142.5n`. It is not
//! replaceable by a lookup table.
//!
//! # The formula book
//!
//! Building a formula closure is cheap for the familiarity variant but the
//! combat variant is rebuilt per base cost and was measurably hot in the
//! original engine, so both are interned in a [`CostBook`] keyed by
//! `(base cost bits, action kind)`. The book is owned by the world state and
//! rebuilt by the initializer on every loop — never a module-level static —
//! so caches cannot leak across worlds or tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use glam::IVec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::action::ActionDefinition;
use crate::character::Character;
use crate::domain::{Domain, PerAction, Stacked};
use crate::tile::TileInstance;
use crate::world::WorldState;

// =============================================================================
// Formula primitives
// =============================================================================

/// Familiarity gained the first time an action kind completes on a target in
/// the current loop.
pub const FIRST_COMPLETION_GAIN: f64 = 60.0;
/// Familiarity gained on every later completion in the loop.
pub const REPEAT_GAIN: f64 = 20.0;

const JITTER_MIN: f64 = 0.7;
const JITTER_MAX: f64 = 1.3;

const HAND_TO_HAND_FACTOR: f64 = 0.1;
const BODY_CONTROL_FACTOR: f64 = 0.1;

/// The familiarity level reached at `familiarity` points.
///
/// Non-decreasing, integer-valued, with breakpoints at
/// `familiarity = 7.5n² + 142.5n` (so 0, 150, 315, 495, 690, ...).
///
/// ```
/// use manaloop_core::cost::familiarity_level;
///
/// assert_eq!(familiarity_level(0.0), 0);
/// assert_eq!(familiarity_level(149.0), 0);
/// assert_eq!(familiarity_level(200.0), 1);
/// assert_eq!(familiarity_level(500.0), 3);
/// ```
#[must_use]
pub fn familiarity_level(familiarity: f64) -> i64 {
    (-9.5 + (8.0 * familiarity + 5415.0).sqrt() / (2.0 * 15.0_f64.sqrt())).floor() as i64
}

/// The cost divider at `familiarity` points: `(1 + level/20)^0.8`.
///
/// ```
/// use manaloop_core::cost::familiarity_divider;
///
/// assert!((familiarity_divider(0.0) - 1.0).abs() < 1e-12);
/// assert!(familiarity_divider(1000.0) > familiarity_divider(200.0));
/// ```
#[must_use]
pub fn familiarity_divider(familiarity: f64) -> f64 {
    (1.0 + familiarity_level(familiarity) as f64 / 20.0).powf(0.8)
}

/// The attack-power divisor for combat costs.
///
/// `((base + body/2) + min(body, body_control) * 0.1) * (1 + weapon)
///  + hand_to_hand * 0.1`
#[must_use]
pub fn attack_power(
    base_attack: f64,
    body_level: f64,
    weapon_bonus: f64,
    body_control_level: f64,
    hand_to_hand_level: f64,
) -> f64 {
    ((base_attack + body_level / 2.0) + body_level.min(body_control_level) * BODY_CONTROL_FACTOR)
        * (1.0 + weapon_bonus)
        + hand_to_hand_level * HAND_TO_HAND_FACTOR
}

/// Sums the familiarity for `kind` across every non-disabled instance in the
/// cell at `pos`.
///
/// A target shares its cell with whatever else stands there (the ground
/// under an entity, say); dampening counts the whole cell's familiarity even
/// though growth lands only on the resolved target.
#[must_use]
pub fn cell_familiarity<S: Domain>(world: &WorldState<S>, pos: IVec2, kind: S::ActionKind) -> f64 {
    world.grid.cell(pos).map_or(0.0, |cell| {
        cell.active()
            .map(|(_, instance)| instance.familiarity(kind))
            .sum()
    })
}

// =============================================================================
// Cost functions
// =============================================================================

/// Everything a cost formula may consult. All borrows are shared; cost
/// evaluation never mutates the world.
pub struct CostArgs<'a, S: Domain> {
    /// The whole world, for formulas that read global stats.
    pub world: &'a WorldState<S>,
    /// The acting character.
    pub character: &'a Character<S>,
    /// The resolved action definition.
    pub action: &'a ActionDefinition<S>,
    /// The candidate target instance.
    pub target: &'a TileInstance<S>,
    /// The cell the target occupies.
    pub target_pos: IVec2,
}

/// A cost formula. `None` skips this layer; `Some(f64::INFINITY)` gates the
/// action.
pub type CostFn<S> = Arc<dyn for<'a> Fn(&CostArgs<'a, S>) -> Option<f64> + Send + Sync>;

/// Per-action-kind table of cost formulas.
pub type CostTable<S> = PerAction<S, CostFn<S>>;

/// A constant cost, mostly useful for tests and simple terrain.
#[must_use]
pub fn flat<S: Domain>(cost: f64) -> CostFn<S> {
    Arc::new(move |_| Some(cost))
}

/// A formula that always gates the action.
#[must_use]
pub fn infinite<S: Domain>() -> CostFn<S> {
    Arc::new(|_| Some(f64::INFINITY))
}

// =============================================================================
// Familiarity growth mode
// =============================================================================

/// How familiarity gains are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamiliarityMode {
    /// Exact +60 / +20 gains. The default; required for replayable traces.
    Deterministic,
    /// Gains jittered by a uniform factor in `[0.7, 1.3]`, reproducible per
    /// seed.
    Random {
        /// Seed for the jitter stream.
        seed: u64,
    },
}

impl Default for FamiliarityMode {
    fn default() -> Self {
        Self::Deterministic
    }
}

/// The familiarity gain for one completion.
pub(crate) fn familiarity_gain(first_this_loop: bool, rng: Option<&mut ChaCha8Rng>) -> f64 {
    let base = if first_this_loop {
        FIRST_COMPLETION_GAIN
    } else {
        REPEAT_GAIN
    };
    match rng {
        Some(rng) => base * rng.gen_range(JITTER_MIN..JITTER_MAX),
        None => base,
    }
}

// =============================================================================
// Cost book
// =============================================================================

/// Extractor producing the attack-power divisor from the current world.
pub type AttackPowerFn<S> = Arc<dyn Fn(&WorldState<S>) -> f64 + Send + Sync>;

/// Instance-scoped intern table for cost formulas.
///
/// The book hands out shared formula closures, memoized by
/// `(base cost bits, action kind)` so that a thousand grass tiles share one
/// closure. Its lifecycle is tied to world construction: the initializer
/// builds a fresh book, uses it while assembling tile definitions, and hands
/// it to the world state. The cache is inspectable ([`CostBook::interned`])
/// and resettable ([`CostBook::clear`]).
pub struct CostBook<S: Domain> {
    familiarity: RefCell<HashMap<(u64, S::ActionKind), CostFn<S>>>,
    attack: RefCell<HashMap<u64, CostFn<S>>>,
    attack_power: AttackPowerFn<S>,
}

impl<S: Domain> CostBook<S> {
    /// A book whose combat formulas divide by a constant power of 1.
    #[must_use]
    pub fn new() -> Self {
        Self::with_attack_power(Arc::new(|_| 1.0))
    }

    /// A book wired to a domain-supplied attack-power extractor.
    #[must_use]
    pub fn with_attack_power(attack_power: AttackPowerFn<S>) -> Self {
        Self {
            familiarity: RefCell::new(HashMap::new()),
            attack: RefCell::new(HashMap::new()),
            attack_power,
        }
    }

    /// The familiarity-dampened formula `base / divider(cell familiarity)`.
    #[must_use]
    pub fn familiarity(&self, base_cost: f64, kind: S::ActionKind) -> CostFn<S> {
        let key = (base_cost.to_bits(), kind);
        if let Some(existing) = self.familiarity.borrow().get(&key) {
            return Arc::clone(existing);
        }
        let formula: CostFn<S> = Arc::new(move |args| {
            let familiarity = cell_familiarity(args.world, args.target_pos, kind);
            Some(base_cost / familiarity_divider(familiarity))
        });
        self.familiarity
            .borrow_mut()
            .insert(key, Arc::clone(&formula));
        formula
    }

    /// The combat formula `base / (divider(cell familiarity) * power)`,
    /// where `power` comes from the book's attack-power extractor.
    #[must_use]
    pub fn attack(&self, base_cost: f64) -> CostFn<S> {
        let key = base_cost.to_bits();
        if let Some(existing) = self.attack.borrow().get(&key) {
            return Arc::clone(existing);
        }
        let power = Arc::clone(&self.attack_power);
        let formula: CostFn<S> = Arc::new(move |args| {
            let familiarity = cell_familiarity(args.world, args.target_pos, args.action.kind);
            Some(base_cost / (familiarity_divider(familiarity) * power(args.world)))
        });
        self.attack.borrow_mut().insert(key, Arc::clone(&formula));
        formula
    }

    /// A stack-gated formula: the base cost is a function of the target's
    /// remaining stacks (absent stacks count as 1), then familiarity
    /// dampening applies. Returning `f64::INFINITY` from `by_stacks` gates
    /// the action until stacks run out.
    #[must_use]
    pub fn stack_scaled(
        &self,
        kind: S::ActionKind,
        by_stacks: impl Fn(u32) -> f64 + Send + Sync + 'static,
    ) -> CostFn<S> {
        Arc::new(move |args| {
            let stacks = args.target.loop_data.stacks().unwrap_or(1);
            let base = by_stacks(stacks);
            let familiarity = cell_familiarity(args.world, args.target_pos, kind);
            Some(base / familiarity_divider(familiarity))
        })
    }

    /// Number of interned formulas.
    #[must_use]
    pub fn interned(&self) -> usize {
        self.familiarity.borrow().len() + self.attack.borrow().len()
    }

    /// Drops every interned formula. Existing tables keep their clones.
    pub fn clear(&self) {
        self.familiarity.borrow_mut().clear();
        self.attack.borrow_mut().clear();
    }
}

impl<S: Domain> Default for CostBook<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Domain> fmt::Debug for CostBook<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CostBook")
            .field("interned", &self.interned())
            .finish_non_exhaustive()
    }
}
