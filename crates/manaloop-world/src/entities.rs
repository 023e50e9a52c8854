//! Entity definitions: the interactive occupants of the village map.
//!
//! Entities are ordinary tile definitions placed ahead of their terrain in
//! a cell, so their costs and hooks take priority. Behavior lives entirely
//! in completion hooks over the engine's [`HookArgs`] slice: the target's
//! stacks, the global run state, and the mana pool.

use std::sync::Arc;

use manaloop_core::{CostBook, DefinitionTable, HookArgs, HookFlow, HookFn, TileDefinition};

use crate::domain::{Village, VillageAction};
use crate::levels::{items, max_mana, player_level, skill_level, skills};

// Entity definition ids.

/// Spend an earned level on body, spirit, or heart.
pub const ALTAR: u32 = 101;
/// A swarm worth ten kills.
pub const RATS: u32 = 102;
/// Bats fly out while stacks last.
pub const CAVE: u32 = 103;
/// Trades a bat for a potion.
pub const OLD_MAN: u32 = 104;
/// Holds one potion.
pub const BARREL: u32 = 105;
/// Hand-to-hand training dummy.
pub const SCARECROW: u32 = 106;
/// One harvestable carrot.
pub const CARROT_PATCH: u32 = 107;
/// Blocks movement until beaten open.
pub const FENCE_GATE: u32 = 108;
/// Plain fence; impassable.
pub const FENCE: u32 = 109;
/// A single critter.
pub const CRITTER: u32 = 110;
/// A pair of critters worth a bigger bounty.
pub const DOUBLE_CRITTER: u32 = 111;
/// One resting firefly.
pub const FIREFLIES_ONE: u32 = 112;
/// Two resting fireflies.
pub const FIREFLIES_TWO: u32 = 113;
/// Three resting fireflies.
pub const FIREFLIES_THREE: u32 = 114;
/// Grants spirit freely.
pub const GHOST: u32 = 115;
/// Burns trophies into affinity skill XP.
pub const BONFIRE: u32 = 116;

/// Initial stacks for entities that carry them.
#[must_use]
pub fn initial_stacks(id: u32) -> Option<u32> {
    match id {
        RATS => Some(10),
        SCARECROW => Some(10),
        CAVE => Some(3),
        FIREFLIES_THREE => Some(3),
        DOUBLE_CRITTER => Some(2),
        FIREFLIES_TWO => Some(2),
        BARREL | CARROT_PATCH | FENCE_GATE | CRITTER | FIREFLIES_ONE => Some(1),
        _ => None,
    }
}

/// Wraps a reward in the standard harvest shape: consume one stack if any
/// remain, then mark the event handled either way.
fn stacked_reward<F>(reward: F) -> HookFn<Village>
where
    F: Fn(&mut HookArgs<'_, Village>) + Send + Sync + 'static,
{
    Arc::new(move |args| {
        let stacks = args.target.loop_data.stacks.unwrap_or(0);
        if stacks > 0 {
            args.target.loop_data.stacks = Some(stacks - 1);
            reward(args);
        }
        HookFlow::Handled
    })
}

/// Combat variant: an empty target is not handled at all, a live one pays
/// out and is handled.
fn stacked_combat<F>(reward: F) -> HookFn<Village>
where
    F: Fn(&mut HookArgs<'_, Village>) + Send + Sync + 'static,
{
    Arc::new(move |args| {
        let stacks = args.target.loop_data.stacks.unwrap_or(1);
        if stacks == 0 {
            HookFlow::Continue
        } else {
            args.target.loop_data.stacks = Some(stacks - 1);
            reward(args);
            HookFlow::Handled
        }
    })
}

fn altar(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Attack, Interact, Move, Speak};
    let spend_level = |raise: fn(&mut HookArgs<'_, Village>)| -> HookFn<Village> {
        Arc::new(move |args| {
            let run = &args.global.loop_data;
            if run.spent_levels < player_level(run.xp) {
                raise(args);
                args.global.loop_data.spent_levels += 1;
            }
            HookFlow::Handled
        })
    };
    TileDefinition::new("Altar")
        .with_cost(Move, costs.familiarity(65.0, Move))
        .with_cost(Interact, costs.familiarity(75.0, Interact))
        .with_cost(Attack, costs.attack(75.0))
        .with_cost(Speak, costs.familiarity(75.0, Speak))
        .with_on_complete(
            Interact,
            spend_level(|args| {
                args.global.loop_data.stats.spirit += 1;
                args.global.mana.max = max_mana(args.global.loop_data.stats.spirit);
            }),
        )
        .with_on_complete(
            Attack,
            spend_level(|args| {
                args.global.loop_data.stats.body += 1;
            }),
        )
        .with_on_complete(
            Speak,
            spend_level(|args| {
                args.global.loop_data.stats.heart += 1;
            }),
        )
}

fn ghost(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Attack, Interact, Move, Speak};
    TileDefinition::new("Ghost")
        .with_cost(Move, costs.familiarity(75.0, Move))
        .with_cost(Interact, costs.familiarity(75.0, Interact))
        .with_cost(Attack, costs.attack(75.0))
        .with_cost(Speak, costs.familiarity(75.0, Speak))
        .with_on_complete(
            Interact,
            Arc::new(|args| {
                args.global.loop_data.stats.spirit += 1;
                args.global.mana.max = max_mana(args.global.loop_data.stats.spirit);
                HookFlow::Handled
            }),
        )
}

fn bonfire(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Interact, Move};
    // Burn order and skill payouts per trophy kind.
    const TROPHIES: [(&str, &str, f64); 4] = [
        (items::HAT, skills::VILLAGER_AFFINITY, 115.0),
        (items::TOOTH, skills::BEAST_AFFINITY, 165.0),
        (items::TAIL, skills::CRITTER_AFFINITY, 75.0),
        (items::RODENT, skills::RODENT_AFFINITY, 55.0),
    ];
    TileDefinition::new("Bonfire")
        .with_cost(Move, costs.familiarity(100.0, Move))
        .with_cost(Interact, costs.familiarity(200.0, Interact))
        .with_on_complete(
            Interact,
            Arc::new(|args| {
                for (item, skill, xp) in TROPHIES {
                    if args.global.loop_data.take_item(item) {
                        args.global.persistent.train(skill, xp);
                        args.global.loop_data.xp += 200.0;
                        break;
                    }
                }
                HookFlow::Handled
            }),
        )
}

fn old_man(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Attack, Interact, Move, Speak};
    TileDefinition::new("Old Man")
        .with_cost(Move, costs.familiarity(100.0, Move))
        .with_cost(Attack, costs.attack(350.0))
        .with_cost(Interact, costs.familiarity(200.0, Interact))
        .with_cost(Speak, costs.familiarity(200.0, Speak))
        .with_on_complete(
            Interact,
            Arc::new(|args| {
                if args.global.loop_data.take_item(items::BAT) {
                    args.global.loop_data.add_item(items::POTION);
                }
                HookFlow::Handled
            }),
        )
}

fn barrel(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Interact, Move};
    TileDefinition::new("Barrel")
        .with_cost(Move, costs.familiarity(100.0, Move))
        .with_cost(Interact, costs.familiarity(120.0, Interact))
        .with_on_complete(
            Interact,
            stacked_reward(|args| args.global.loop_data.add_item(items::POTION)),
        )
}

fn scarecrow(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Interact, Move};
    TileDefinition::new("Scarecrow")
        .with_cost(Move, costs.familiarity(100.0, Move))
        .with_cost(Interact, costs.familiarity(250.0, Interact))
        .with_on_complete(
            Interact,
            stacked_reward(|args| {
                args.global.persistent.train(skills::HAND_TO_HAND, 25.0);
                args.global.loop_data.xp += 200.0;
            }),
        )
}

fn carrot_patch(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Interact, Move};
    TileDefinition::new("Carrot")
        .with_cost(Move, costs.familiarity(100.0, Move))
        .with_cost(Interact, costs.familiarity(250.0, Interact))
        .with_on_complete(
            Interact,
            stacked_reward(|args| args.global.loop_data.add_item(items::CARROT)),
        )
}

fn fence_gate(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Attack, Move};
    TileDefinition::new("Fence Gate")
        .with_cost(
            Move,
            costs.stack_scaled(Move, |stacks| if stacks == 0 { 35.0 } else { f64::INFINITY }),
        )
        .with_cost(Attack, costs.attack(350.0))
        .with_on_complete(
            Attack,
            stacked_combat(|args| args.global.loop_data.xp += 200.0),
        )
}

fn rats(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Attack, Move};
    TileDefinition::new("Rats")
        .with_cost(Move, costs.familiarity(50.0, Move))
        .with_cost(Attack, costs.attack(100.0))
        .with_on_complete(
            Attack,
            stacked_combat(|args| {
                let affinity = skill_level(&args.global.persistent, skills::RODENT_AFFINITY);
                args.global.loop_data.xp += 150.0 * (1.0 + 0.1 * f64::from(affinity));
                args.global.loop_data.add_item(items::RODENT);
            }),
        )
}

fn critter(costs: &CostBook<Village>, name: &str, bounty: f64) -> TileDefinition<Village> {
    use VillageAction::{Attack, Move};
    TileDefinition::new(name)
        .with_cost(
            Move,
            costs.stack_scaled(Move, |stacks| {
                if stacks == 0 {
                    75.0
                } else {
                    200.0 * f64::from(stacks)
                }
            }),
        )
        .with_cost(Attack, costs.attack(100.0))
        .with_on_complete(
            Attack,
            stacked_combat(move |args| {
                let affinity = skill_level(&args.global.persistent, skills::CRITTER_AFFINITY);
                args.global.loop_data.xp += bounty * (1.0 + 0.1 * f64::from(affinity));
                args.global.loop_data.add_item(items::TAIL);
            }),
        )
}

fn cave(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Attack, Move};
    TileDefinition::new("Cave")
        .with_cost(Move, costs.familiarity(100.0, Move))
        .with_cost(Attack, costs.attack(300.0))
        .with_on_complete(
            Attack,
            stacked_combat(|args| {
                args.global.loop_data.add_item(items::BAT);
                args.global.loop_data.xp += 150.0;
            }),
        )
}

fn fireflies(costs: &CostBook<Village>) -> TileDefinition<Village> {
    use VillageAction::{Interact, Move};
    TileDefinition::new("Fireflies")
        .with_cost(Move, costs.familiarity(65.0, Move))
        .with_cost(Interact, costs.familiarity(100.0, Interact))
        .with_on_complete(
            Interact,
            stacked_reward(|args| {
                let friend = skill_level(&args.global.persistent, skills::FIREFLY_FRIEND);
                args.global.mana.restore(500.0 + 50.0 * f64::from(friend));
                args.global.loop_data.xp += 75.0 * (1.0 + f64::from(friend));
            }),
        )
}

/// Adds every entity definition to the table.
pub fn entity_definitions(costs: &CostBook<Village>, table: &mut DefinitionTable<Village>) {
    table.insert(ALTAR, Arc::new(altar(costs)));
    table.insert(RATS, Arc::new(rats(costs)));
    table.insert(CAVE, Arc::new(cave(costs)));
    table.insert(OLD_MAN, Arc::new(old_man(costs)));
    table.insert(BARREL, Arc::new(barrel(costs)));
    table.insert(SCARECROW, Arc::new(scarecrow(costs)));
    table.insert(CARROT_PATCH, Arc::new(carrot_patch(costs)));
    table.insert(FENCE_GATE, Arc::new(fence_gate(costs)));
    table.insert(FENCE, Arc::new(TileDefinition::blocked("Fence")));
    table.insert(CRITTER, Arc::new(critter(costs, "Critter", 150.0)));
    table.insert(
        DOUBLE_CRITTER,
        Arc::new(critter(costs, "Double Critter", 1000.0)),
    );
    let shared_fireflies = fireflies(costs);
    table.insert(FIREFLIES_ONE, Arc::new(shared_fireflies.clone()));
    table.insert(FIREFLIES_TWO, Arc::new(shared_fireflies.clone()));
    table.insert(FIREFLIES_THREE, Arc::new(shared_fireflies));
    table.insert(GHOST, Arc::new(ghost(costs)));
    table.insert(BONFIRE, Arc::new(bonfire(costs)));
}
