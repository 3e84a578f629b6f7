//! Property tests for registry and tracker invariants

mod fixtures;

use fixtures::{assert_registry_invariants, create_room_body, status_of, TestSystem};
use matchroom::room::{RoomRegistry, StaticSlotProvider};
use matchroom::tracking::RecencyTracker;
use matchroom::types::{RoomSlot, RoomState, User, UserId};
use proptest::prelude::*;
use std::sync::Arc;

const USERS: u64 = 8;

fn user(id: UserId) -> User {
    User::new(id, format!("user{}", id))
}

#[derive(Debug, Clone)]
struct CreateOp {
    host: UserId,
    members: Vec<UserId>,
    slot_type: i32,
}

fn create_op() -> impl Strategy<Value = CreateOp> {
    (
        1..=USERS,
        prop::collection::vec(1..=USERS, 0..5),
        prop_oneof![Just(1), Just(2)],
    )
        .prop_map(|(host, members, slot_type)| CreateOp {
            host,
            members,
            slot_type,
        })
}

fn registry() -> RoomRegistry {
    RoomRegistry::new(Arc::new(StaticSlotProvider::new(4).with_capacity(2, 2)))
}

proptest! {
    #[test]
    fn prop_create_sequences_keep_registry_consistent(
        ops in prop::collection::vec(create_op(), 1..40)
    ) {
        let registry = registry();

        for op in ops {
            let before = registry.snapshot().unwrap();
            let members = op.members.iter().copied().map(user).collect();
            let slot = RoomSlot::new(op.slot_type, 0);
            let result = registry.create_room(&user(op.host), members, slot);

            match result {
                Ok(room) => {
                    let hosted = registry.find_by_host_user(op.host).unwrap().unwrap();
                    prop_assert_eq!(hosted.id(), room.id());
                }
                Err(_) => prop_assert_eq!(registry.snapshot().unwrap(), before),
            }

            let rooms = registry.snapshot().unwrap();
            assert_registry_invariants(&rooms);
            prop_assert!(rooms.iter().all(|r| !r.is_empty()));
        }
    }

    #[test]
    fn prop_non_host_cannot_change_state(
        members in prop::collection::vec(2..=USERS, 1..3),
        caller in 2..=USERS,
        state in 0u8..5
    ) {
        let registry = registry();
        let room = registry
            .create_room(&user(1), members.into_iter().map(user).collect(), RoomSlot::new(1, 0))
            .unwrap();
        let state = RoomState::try_from(state).unwrap();

        prop_assert!(!registry.set_state(room.id(), caller, state).unwrap());
        prop_assert_eq!(registry.get(room.id()).unwrap().unwrap().state(), RoomState::Idle);
    }

    #[test]
    fn prop_recency_window_is_bounded(
        capacity in 1usize..6,
        partners in prop::collection::vec(2..=20u64, 0..30)
    ) {
        let tracker = RecencyTracker::new(capacity);
        tracker.record_pairs(1, &partners).unwrap();

        let window = tracker.partners_of(1).unwrap();
        prop_assert!(window.len() <= capacity);
        if let Some(last) = partners.last() {
            prop_assert!(tracker.contains(1, *last).unwrap());
        }
        prop_assert!(!tracker.contains(1, 1).unwrap());
    }

    #[test]
    fn prop_create_with_unknown_player_is_all_or_nothing(
        known in prop::collection::vec(0usize..4, 0..3),
        unknown_at in 0usize..3
    ) {
        let system = TestSystem::new();
        let names = ["Alice", "Carol", "Dave", "Erin"];
        for name in names {
            system.client(name, "10.0.0.1:3074");
        }
        let bob = system.client("Bob", "10.0.0.2:3074");
        let carol = system.client("Carol", "10.0.0.3:3074");

        tokio_test::block_on(system.create_room(&carol, &["Alice", "Dave"], 1)).unwrap();
        let before = system.rooms();

        let mut players: Vec<&str> = known.iter().map(|i| names[*i]).collect();
        players.insert(unknown_at.min(players.len()), "Nobody");

        let result = tokio_test::block_on(system.send(&bob, &create_room_body(&players, 1)));
        prop_assert_eq!(status_of(&result), 400);
        prop_assert_eq!(system.rooms(), before);
    }
}
