//! The path projector: a best-effort preview of every character's route.
//!
//! [`WorldState::get_paths`] clones the state through the codec (so the
//! projection starts from a fresh loop carrying the current permanent data)
//! and repeatedly advances by the smallest finite remaining cost until no
//! character has a positive remaining cost, recording one entry per
//! completed action per character.
//!
//! The projector is advisory. Any failure during the simulated run-ahead —
//! a dangling action reference, a missing cost, a blocked move — truncates
//! the recorded paths at the last successful point instead of propagating.

use glam::IVec2;

use crate::domain::Domain;
use crate::world::WorldState;

/// One completed action in a projected path.
#[derive(Debug, Clone)]
pub struct PathStep<S: Domain> {
    /// The character's position after the action completed.
    pub position: IVec2,
    /// Index of the queued action that produced this step.
    pub action_index: usize,
    /// The action kind performed.
    pub kind: S::ActionKind,
    /// Full resolved cost of the completed repetition.
    pub cost: f64,
    /// Running total of step costs along this character's path.
    pub total_cost: f64,
}

impl<S: Domain> WorldState<S> {
    /// Projects every character's queued route to completion.
    ///
    /// Returns one path per character, in character order. Paths truncate
    /// at the last recorded step when projection hits any failure; gated
    /// (infinite-cost) and idle characters simply stop extending.
    ///
    /// Per-step costs are the full resolved cost of each repetition at the
    /// time it was scheduled, so totals reflect a fresh run of the queue.
    #[must_use]
    pub fn get_paths(&self) -> Vec<Vec<PathStep<S>>> {
        let mut sim = self.clone();
        let mut paths: Vec<Vec<PathStep<S>>> = vec![Vec::new(); self.characters.len()];
        let mut totals = vec![0.0_f64; self.characters.len()];

        loop {
            let Ok(pending) = sim.get_next_actions() else {
                break;
            };
            let budget = pending
                .iter()
                .flatten()
                .map(|p| p.remaining_cost)
                .filter(|cost| cost.is_finite())
                .fold(f64::INFINITY, f64::min);
            if !budget.is_finite() {
                // No character has a finite remaining cost: projection done.
                break;
            }
            // A remaining cost of zero still needs a positive budget to be
            // completed by the scheduler (zero budget is a no-op).
            let budget = budget.max(f64::MIN_POSITIVE);

            let Ok(outcome) = sim.advance_state(budget) else {
                break;
            };
            if outcome.completed.is_empty() && outcome.spent_mana <= 0.0 {
                break;
            }
            for &index in &outcome.completed {
                let Some(step) = &pending[index] else {
                    continue;
                };
                totals[index] += step.cost;
                paths[index].push(PathStep {
                    position: sim.characters[index].position,
                    action_index: step.queue_index,
                    kind: step.action.kind,
                    cost: step.cost,
                    total_cost: totals[index],
                });
            }
        }

        paths
    }
}
