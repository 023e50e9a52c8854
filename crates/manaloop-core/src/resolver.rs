//! The target resolver: which target, which action, what cost.
//!
//! For each character independently, resolution finds the entity or tile
//! occupying its action slot, the action it is queued to perform, and the
//! effective cost:
//!
//! 1. Gather the non-disabled instances of the character's current cell, in
//!    cell order.
//! 2. Look up the queued action; a cursor past the end of the queue makes
//!    the character *idle* (`None`), never a batch failure.
//! 3. Resolve the action definition from the catalog selected by the
//!    reference's scope flag; a dangling reference is a hard error.
//! 4. Evaluate the instance-level cost for each candidate; the **first**
//!    instance returning a defined cost is the target, overriding any
//!    character- or world-level cost even when those are defined.
//! 5. Otherwise fall back to the character layer, then the world layer, with
//!    the cell's primary instance as the target; if nothing resolves, fail
//!    with a "no cost" error naming character, action kind, target, and
//!    position.
//!
//! A formula returning `None` and an absent table key are equivalent: the
//! layer is skipped, never read as zero cost.

use std::sync::Arc;

use glam::IVec2;

use crate::action::{ActionDefinition, ActionScope};
use crate::cost::CostArgs;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::world::WorldState;

/// One character's resolved next step.
#[derive(Debug, Clone)]
pub struct PendingAction<S: Domain> {
    /// Index of the character in the world's character list.
    pub character: usize,
    /// The resolved action definition.
    pub action: Arc<ActionDefinition<S>>,
    /// The queue index the action came from.
    pub queue_index: usize,
    /// The cell the target occupies (the character's position).
    pub target_pos: IVec2,
    /// Slot of the target instance within its cell.
    pub target_slot: usize,
    /// Name of the target's definition, for messages and previews.
    pub target_name: String,
    /// Full cost of one repetition at current familiarity.
    pub cost: f64,
    /// Cost still unpaid: `cost - spent_action_mana`, floored at zero.
    /// Infinite when the action is currently gated.
    pub remaining_cost: f64,
}

impl<S: Domain> WorldState<S> {
    /// Resolves every character's pending action.
    ///
    /// Idle characters (queue exhausted or disabled) contribute `None`.
    /// Dangling action references and missing costs are hard errors that
    /// fail the whole batch.
    pub fn get_next_actions(&self) -> Result<Vec<Option<PendingAction<S>>>> {
        (0..self.characters.len())
            .map(|index| self.resolve_character(index))
            .collect()
    }

    /// Strict single-character resolution: errors where the batch form
    /// would report idle or gated.
    pub fn pending_action(&self, character: usize) -> Result<PendingAction<S>> {
        match self.resolve_character(character)? {
            None => Err(Error::NoAction {
                character: self.characters[character].name.clone(),
            }),
            Some(pending) if !pending.remaining_cost.is_finite() => Err(Error::InfiniteCost {
                kind: pending.action.kind.to_string(),
                target: pending.target_name,
                x: pending.target_pos.x,
                y: pending.target_pos.y,
            }),
            Some(pending) => Ok(pending),
        }
    }

    fn resolve_character(&self, index: usize) -> Result<Option<PendingAction<S>>> {
        let character = &self.characters[index];
        if character.disabled {
            return Ok(None);
        }
        let Some(queued) = character.queue.current() else {
            return Ok(None);
        };

        let action = match queued.scope {
            ActionScope::Global => self.catalog.get(queued.id),
            ActionScope::Character => character
                .catalog
                .as_ref()
                .and_then(|catalog| catalog.get(queued.id)),
        }
        .ok_or_else(|| Error::ActionNotFound {
            character: character.name.clone(),
            id: queued.id,
            scope: queued.scope,
        })?;
        let kind = action.kind;
        let position = character.position;

        let no_cost = |target: &str| Error::NoCost {
            character: character.name.clone(),
            kind: kind.to_string(),
            target: target.to_string(),
            x: position.x,
            y: position.y,
        };

        let Some(cell) = self.grid.cell(position) else {
            return Err(no_cost("(outside map)"));
        };

        let pending = |slot: usize, name: &str, cost: f64| PendingAction {
            character: index,
            action: Arc::clone(action),
            queue_index: character.queue.index,
            target_pos: position,
            target_slot: slot,
            target_name: name.to_string(),
            cost,
            remaining_cost: (cost - character.queue.spent_action_mana).max(0.0),
        };

        // Instance layer: first instance with a defined cost wins outright.
        for (slot, instance) in cell.active() {
            let definition = self.definition(instance.definition)?;
            if let Some(cost_fn) = definition.costs.get(&kind) {
                let args = CostArgs {
                    world: self,
                    character,
                    action,
                    target: instance,
                    target_pos: position,
                };
                if let Some(cost) = cost_fn(&args) {
                    return Ok(Some(pending(slot, &definition.name, cost)));
                }
            }
        }

        // Character and world layers fall back onto the primary instance.
        let Some((slot, primary)) = cell.active().next() else {
            return Err(no_cost("(empty cell)"));
        };
        let primary_name = self.definition(primary.definition)?.name.clone();
        let layers = [character.costs.as_ref(), Some(&self.default_costs)];
        for table in layers.into_iter().flatten() {
            if let Some(cost_fn) = table.get(&kind) {
                let args = CostArgs {
                    world: self,
                    character,
                    action,
                    target: primary,
                    target_pos: position,
                };
                if let Some(cost) = cost_fn(&args) {
                    return Ok(Some(pending(slot, &primary_name, cost)));
                }
            }
        }

        Err(no_cost(&primary_name))
    }
}
