//! The mana scheduler: lockstep advancement of every character.
//!
//! [`WorldState::advance_state`] spends one mana budget across **all**
//! characters. Each round it resolves everyone, takes the smallest finite
//! remaining cost, and advances every active character by
//! `min(remaining budget, that minimum)`. The lockstep choice guarantees no
//! character ever overspends past its current action's completion within a
//! single increment, and that cheap pending actions complete before more
//! mana sinks into expensive ones.
//!
//! One increment is charged against the budget once while advancing every
//! active character simultaneously: the "concurrency" here is logical
//! simultaneity over a shared resource, not accounting per character.
//!
//! Characters whose resolved remaining cost is infinite are excluded from
//! the minimum and receive no spend; they never stall the others. Idle
//! characters (exhausted queue) are skipped the same way. A dangling action
//! reference or a missing cost aborts the whole call.

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::IVec2;
use tracing::{debug, trace};

use crate::cost::familiarity_gain;
use crate::domain::{ActionPayload, Domain};
use crate::error::{Error, Result};
use crate::hooks::{fire_hooks, fire_progress, CallbackSet, HookArgs, HookStage};
use crate::resolver::PendingAction;
use crate::world::WorldState;

/// What one [`WorldState::advance_state`] call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceOutcome {
    /// Mana actually spent this call.
    pub spent_mana: f64,
    /// Budget left unspent (everyone idle or gated, or the work ran out).
    pub leftover_mana: f64,
    /// True if any repetition completed.
    pub action_completed: bool,
    /// Indices of the characters that completed a repetition this call.
    pub completed: BTreeSet<usize>,
}

impl<S: Domain> WorldState<S> {
    /// Spends up to `mana_budget` advancing all characters in lockstep.
    ///
    /// A zero or negative budget is a no-op returning zero spent, zero
    /// leftover, and no completions — never an error.
    ///
    /// # Errors
    ///
    /// Propagates fatal resolution failures ([`Error::ActionNotFound`],
    /// [`Error::NoCost`], [`Error::UnknownTileDefinition`]) and movement
    /// apply failures ([`Error::MoveOutOfBounds`],
    /// [`Error::DestinationBlocked`]). On error the call aborts mid-way;
    /// mana spent before the failure stays spent.
    pub fn advance_state(&mut self, mana_budget: f64) -> Result<AdvanceOutcome> {
        if mana_budget <= 0.0 {
            return Ok(AdvanceOutcome::default());
        }

        let mut remaining_budget = mana_budget;
        let mut spent_total = 0.0;
        let mut completed = BTreeSet::new();

        while remaining_budget > 0.0 {
            let pending = self.get_next_actions()?;
            let min_remaining = pending
                .iter()
                .flatten()
                .map(|p| p.remaining_cost)
                .filter(|cost| cost.is_finite())
                .fold(f64::INFINITY, f64::min);
            if !min_remaining.is_finite() {
                // Everyone idle or gated; budget stops flowing.
                break;
            }

            let increment = remaining_budget.min(min_remaining);
            remaining_budget -= increment;
            spent_total += increment;
            self.global.mana.current -= increment;
            trace!(
                target: "manaloop::scheduler",
                increment,
                remaining_budget,
                "advancing characters"
            );

            for pending_action in pending.iter().flatten() {
                if !pending_action.remaining_cost.is_finite() {
                    continue;
                }
                self.advance_character(pending_action, increment, &mut completed)?;
            }
        }

        let outcome = AdvanceOutcome {
            spent_mana: spent_total,
            leftover_mana: mana_budget - spent_total,
            action_completed: !completed.is_empty(),
            completed,
        };
        debug!(
            target: "manaloop::scheduler",
            budget = mana_budget,
            spent = outcome.spent_mana,
            leftover = outcome.leftover_mana,
            completions = outcome.completed.len(),
            "advance_state finished"
        );
        Ok(outcome)
    }

    /// Pushes `increment` mana into one character's current repetition,
    /// firing hooks and applying completion when the cost is reached.
    fn advance_character(
        &mut self,
        pending: &PendingAction<S>,
        increment: f64,
        completed: &mut BTreeSet<usize>,
    ) -> Result<()> {
        let kind = pending.action.kind;
        // Exact by construction: `remaining_cost` came from this round's
        // resolution, so no accumulated float comparison is involved.
        let completes = increment >= pending.remaining_cost;

        // Clone the callback tables out so they stay alive while the world
        // is split-borrowed below.
        let definition_id =
            self.grid.at(pending.target_pos).instances[pending.target_slot].definition;
        let definition = Arc::clone(self.definition(definition_id)?);
        let char_callbacks = self.characters[pending.character].callbacks.clone();
        let char_always = self.characters[pending.character].always_callbacks.clone();
        let world_callbacks = Arc::clone(&self.callbacks);
        let world_always = Arc::clone(&self.always_callbacks);

        let mut specific: Vec<&CallbackSet<S>> = vec![&definition.callbacks];
        if let Some(set) = char_callbacks.as_deref() {
            specific.push(set);
        }
        specific.push(&world_callbacks);
        let mut always: Vec<&CallbackSet<S>> = vec![&definition.always_callbacks];
        if let Some(set) = char_always.as_deref() {
            always.push(set);
        }
        always.push(&world_always);

        let mut prevent_default = false;
        {
            let Self {
                grid,
                characters,
                global,
                ..
            } = self;
            let character = &mut characters[pending.character];
            let target = &mut grid.at_mut(pending.target_pos).instances[pending.target_slot];
            let first_increment = character.queue.spent_action_mana == 0.0;
            let mut args = HookArgs {
                action: &pending.action,
                character_index: pending.character,
                character,
                target,
                target_pos: pending.target_pos,
                global,
            };

            if first_increment {
                fire_hooks(&specific, &always, HookStage::Start, kind, &mut args);
            }
            args.character.queue.spent_action_mana += increment;
            fire_progress(&specific, &always, kind, &mut args, increment);

            if completes {
                args.character.queue.spent_action_mana = 0.0;
                prevent_default =
                    fire_hooks(&specific, &always, HookStage::Complete, kind, &mut args);
            }
        }

        if !completes {
            return Ok(());
        }

        if !prevent_default {
            if let Some(delta) = pending.action.data.movement() {
                self.apply_move(pending.character, delta)?;
            }
        }

        self.grow_familiarity(pending);
        self.characters[pending.character].queue.complete_repetition();
        completed.insert(pending.character);
        Ok(())
    }

    /// The built-in movement effect: validate the destination, then step.
    ///
    /// Movement is the only action type with a default effect; everything
    /// else acts purely through hooks.
    fn apply_move(&mut self, character: usize, delta: IVec2) -> Result<()> {
        let from = self.characters[character].position;
        let destination = from + delta;
        if !self.grid.contains(destination) {
            return Err(Error::MoveOutOfBounds {
                from_x: from.x,
                from_y: from.y,
                dx: delta.x,
                dy: delta.y,
            });
        }
        let mut blocked = false;
        if let Some(cell) = self.grid.cell(destination) {
            for (_, instance) in cell.active() {
                if self.definition(instance.definition)?.blocked {
                    blocked = true;
                    break;
                }
            }
        }
        if blocked {
            return Err(Error::DestinationBlocked {
                x: destination.x,
                y: destination.y,
            });
        }
        self.characters[character].position = destination;
        trace!(
            target: "manaloop::scheduler",
            character,
            x = destination.x,
            y = destination.y,
            "moved"
        );
        Ok(())
    }

    /// Credits familiarity and completion counters on the resolved target.
    fn grow_familiarity(&mut self, pending: &PendingAction<S>) {
        let kind = pending.action.kind;
        let Self { grid, rng, .. } = self;
        let target = &mut grid.at_mut(pending.target_pos).instances[pending.target_slot];
        let first_this_loop = target.times_performed_this_loop(kind) == 0;
        let gain = familiarity_gain(first_this_loop, rng.as_mut());
        *target.counters.familiarity.entry(kind).or_insert(0.0) += gain;
        *target
            .loop_counters
            .familiarity_this_loop
            .entry(kind)
            .or_insert(0.0) += gain;
        *target.counters.times_performed.entry(kind).or_insert(0) += 1;
        *target
            .loop_counters
            .times_performed_this_loop
            .entry(kind)
            .or_insert(0) += 1;
    }
}
