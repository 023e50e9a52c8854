//! Permanent-state round-trips, clone independence, loop resets, and path
//! projection.

use std::sync::Arc;

use glam::IVec2;

use super::helpers::*;
use crate::action::QueuedAction;
use crate::character::Character;
use crate::codec::PermanentState;
use crate::cost::flat;
use crate::error::Error;
use crate::tile::{Cell, DefinitionTable, Grid, TileDefinition, TileInstance};
use crate::world::{ManaPool, WorldInit, WorldState};

/// A 2x2 world sharing one initializer shape, so snapshots are exchangeable
/// between independently built copies.
fn square_world() -> TestWorld {
    flat_world(2, 2, 10.0)
}

fn instance_at(world: &TestWorld, x: i32, y: i32) -> &TileInstance<Sandbox> {
    world
        .grid
        .cell(IVec2::new(x, y))
        .unwrap()
        .primary()
        .unwrap()
}

mod round_trip_tests {
    use super::*;

    #[test]
    fn deserialize_overwrites_permanent_and_keeps_fresh_loop_state() {
        let mut source = square_world();
        source.global.mana.current = 50.0;
        source.characters[0].position = IVec2::new(1, 0);
        source.characters[0].queue.push(QueuedAction::global(RIGHT, 1));
        source.characters[0].queue.index = 1;
        {
            let cell = source.grid.cell_mut(IVec2::ZERO).unwrap();
            cell.instances[0].counters.familiarity.insert(Kind::Move, 120.0);
            cell.instances[0]
                .loop_counters
                .familiarity_this_loop
                .insert(Kind::Move, 40.0);
            cell.instances[0].persistent.tag = 7;
        }
        source.global.persistent.marks = 3;
        source.global.loop_data.gathered = 9;
        source.loop_count = 2;

        let snapshot = source.serialize_permanent_state();

        let mut target = square_world();
        target.global.mana.current = 80.0;
        target.characters[0].position = IVec2::new(0, 1);
        target.deserialize_permanent_state(&snapshot).unwrap();

        // Permanent data came from the snapshot.
        assert_eq!(instance_at(&target, 0, 0).familiarity(Kind::Move), 120.0);
        assert_eq!(instance_at(&target, 0, 0).persistent.tag, 7);
        assert_eq!(target.global.persistent.marks, 3);
        assert_eq!(target.loop_count, 2);
        assert_eq!(
            target.characters[0].queue.actions,
            vec![QueuedAction::global(RIGHT, 1)]
        );
        // The cursor rewound with the replaced queue.
        assert_eq!(target.characters[0].queue.index, 0);
        // Loop-local state stayed exactly as the target had it.
        assert_eq!(target.global.mana.current, 80.0);
        assert_eq!(target.characters[0].position, IVec2::new(0, 1));
        assert_eq!(
            instance_at(&target, 0, 0)
                .loop_counters
                .familiarity_this_loop
                .get(&Kind::Move),
            None
        );
        assert_eq!(target.global.loop_data.gathered, 0);
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let mut world = square_world();
        world.characters[0].queue.push(QueuedAction::global(DOWN, 2));
        world
            .grid
            .cell_mut(IVec2::new(1, 1))
            .unwrap()
            .instances[0]
            .counters
            .familiarity
            .insert(Kind::Chat, 75.5);
        world.global.persistent.marks = 11;

        let snapshot = world.serialize_permanent_state();
        let json = snapshot.to_json().unwrap();
        let parsed = PermanentState::<Sandbox>::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn mismatched_snapshot_is_rejected() {
        let small = flat_world(1, 1, 10.0);
        let mut big = square_world();
        let err = big
            .deserialize_permanent_state(&small.serialize_permanent_state())
            .unwrap_err();
        assert!(matches!(err, Error::SnapshotMismatch { .. }));
    }
}

mod clone_tests {
    use super::*;

    #[test]
    fn clone_carries_permanent_data_with_fresh_loop_state() {
        let mut world = square_world();
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 1));
        world.advance_state(10.0).unwrap();
        assert_eq!(world.characters[0].position, IVec2::new(1, 0));
        assert_eq!(world.global.mana.current, 90.0);

        let copy = world.clone();
        // Familiarity earned so far travels with the clone...
        assert_eq!(instance_at(&copy, 0, 0).familiarity(Kind::Move), 60.0);
        assert_eq!(copy.characters[0].queue.actions.len(), 1);
        // ...but the loop-local half is freshly initialized.
        assert_eq!(copy.characters[0].position, IVec2::ZERO);
        assert_eq!(copy.global.mana.current, 100.0);
        assert_eq!(copy.characters[0].queue.index, 0);
    }

    #[test]
    fn mutating_the_clone_leaves_the_original_alone() {
        let world = square_world();
        let mut copy = world.clone();
        copy.grid
            .cell_mut(IVec2::ZERO)
            .unwrap()
            .instances[0]
            .counters
            .familiarity
            .insert(Kind::Move, 999.0);
        copy.global.persistent.marks = 42;

        assert_eq!(instance_at(&world, 0, 0).familiarity(Kind::Move), 0.0);
        assert_eq!(world.global.persistent.marks, 0);
    }
}

mod reset_tests {
    use super::*;

    #[test]
    fn reset_discards_loop_local_state_and_keeps_progress() {
        let mut world = square_world();
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 1));
        world.characters[0].queue.push(QueuedAction::global(LEFT, 1));
        world.advance_state(10.0).unwrap();
        world.global.persistent.marks = 5;
        world.global.loop_data.gathered = 4;
        assert_eq!(world.characters[0].position, IVec2::new(1, 0));
        assert_eq!(world.characters[0].queue.index, 1);

        world.reset_loop();

        // Loop-local: rebuilt by the initializer.
        assert_eq!(world.characters[0].position, IVec2::ZERO);
        assert_eq!(world.global.mana.current, 100.0);
        assert_eq!(world.global.loop_data.gathered, 0);
        assert_eq!(world.characters[0].queue.index, 0);
        assert_eq!(world.characters[0].queue.sub_index, 0);
        assert_eq!(world.characters[0].queue.spent_action_mana, 0.0);
        assert_eq!(
            instance_at(&world, 0, 0)
                .loop_counters
                .times_performed_this_loop
                .get(&Kind::Move),
            None
        );

        // Permanent: familiarity, intentions, global progress, loop count.
        assert_eq!(instance_at(&world, 0, 0).familiarity(Kind::Move), 60.0);
        assert_eq!(world.characters[0].queue.actions.len(), 2);
        assert_eq!(world.global.persistent.marks, 5);
        assert_eq!(world.loop_count, 1);
    }

    #[test]
    fn repeat_gain_applies_after_the_first_completion_each_loop() {
        let mut world = square_world();
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 1));
        world.characters[0].queue.push(QueuedAction::global(LEFT, 1));
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 1));
        world.advance_state(30.0).unwrap();
        // Origin cell: first move +60, second move (back onto it) is still
        // the first completion *from* it... the gain keys on the target
        // cell, so origin was completed twice: 60 + 20.
        assert_eq!(instance_at(&world, 0, 0).familiarity(Kind::Move), 80.0);

        world.reset_loop();
        world.advance_state(30.0).unwrap();
        // New loop: the first completion bonus applies again.
        assert_eq!(instance_at(&world, 0, 0).familiarity(Kind::Move), 160.0);
    }
}

mod projector_tests {
    use super::*;

    #[test]
    fn paths_record_each_completion_without_touching_the_original() {
        let mut world = flat_world(3, 1, 10.0);
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 2));

        let paths = world.get_paths();
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].position, IVec2::new(1, 0));
        assert_eq!(path[0].action_index, 0);
        assert_eq!(path[0].cost, 10.0);
        assert_eq!(path[0].total_cost, 10.0);
        assert_eq!(path[1].position, IVec2::new(2, 0));
        assert_eq!(path[1].total_cost, 20.0);

        // Projection ran on a clone; the original did not move or spend.
        assert_eq!(world.characters[0].position, IVec2::ZERO);
        assert_eq!(world.global.mana.current, 100.0);
        assert_eq!(world.characters[0].queue.index, 0);
    }

    #[test]
    fn projection_truncates_on_missing_cost_instead_of_failing() {
        let mut world = flat_world(3, 1, 10.0);
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 1));
        // No layer defines a Chat cost, so projection stops after the move.
        world.characters[0].queue.push(QueuedAction::global(CHAT, 1));
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 1));

        let paths = world.get_paths();
        assert_eq!(paths[0].len(), 1);
        assert_eq!(paths[0][0].position, IVec2::new(1, 0));
    }

    #[test]
    fn projection_truncates_on_blocked_move() {
        let mut world = WorldState::new(|| {
            let mut definitions = DefinitionTable::<Sandbox>::new();
            definitions.insert(FLOOR, Arc::new(floor_definition(10.0)));
            definitions.insert(2, Arc::new(TileDefinition::blocked("Wall")));
            let grid = Grid::from_rows(vec![vec![
                Cell::single(TileInstance::new(FLOOR)),
                Cell::single(TileInstance::new(FLOOR)),
                Cell::single(TileInstance::new(2)),
            ]]);
            let character = Character::new("Alpha", IVec2::ZERO);
            WorldInit::new(grid, definitions, vec![character], sandbox_catalog())
                .with_mana(ManaPool::full(100.0))
        });
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 1));
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 1));

        let paths = world.get_paths();
        assert_eq!(paths[0].len(), 1);
        assert_eq!(paths[0][0].position, IVec2::new(1, 0));
    }

    #[test]
    fn gated_characters_produce_empty_paths() {
        let mut world = WorldState::new(|| {
            let mut definitions = DefinitionTable::<Sandbox>::new();
            definitions.insert(
                FLOOR,
                Arc::new(TileDefinition::new("Floor").with_cost(Kind::Move, flat(f64::INFINITY))),
            );
            let character = Character::new("Alpha", IVec2::ZERO);
            WorldInit::new(
                uniform_grid(2, 1, FLOOR),
                definitions,
                vec![character],
                sandbox_catalog(),
            )
            .with_mana(ManaPool::full(100.0))
        });
        world.characters[0].queue.push(QueuedAction::global(RIGHT, 1));

        let paths = world.get_paths();
        assert!(paths[0].is_empty());
    }
}
