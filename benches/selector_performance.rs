//! Performance benchmarks for best-room selection and command processing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use matchroom::identity::{InMemoryDirectory, InMemoryHeartbeatStore};
use matchroom::metrics::MetricsCollector;
use matchroom::protocol::MatchCodec;
use matchroom::room::{BestRoomSelector, Room, RoomRegistry, StaticSlotProvider};
use matchroom::service::{CommandProcessor, MatchState};
use matchroom::tracking::{LocationTracker, RecencyTracker};
use matchroom::types::{RoomSlot, SessionToken, User};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn bench_rooms(count: u64) -> Vec<Room> {
    (0..count)
        .map(|i| {
            let host = User::new(1000 + i, format!("host_{}", i));
            let members = (0..(i % 3))
                .map(|m| User::new(10_000 + i * 4 + m, format!("member_{}_{}", i, m)))
                .collect();
            Room::new(host, members, RoomSlot::new(1, 0), 4)
        })
        .collect()
}

fn bench_choose(c: &mut Criterion) {
    let selector = BestRoomSelector::default();
    let searcher = User::new(1, "searcher");
    let rooms = bench_rooms(500);
    let recent: HashSet<_> = (1000..1250).collect();
    let host_locations: HashMap<_, _> = rooms
        .iter()
        .map(|r| (r.host().user_id, format!("10.0.{}.1:3074", r.host().user_id % 7)))
        .collect();

    c.bench_function("choose_best_of_500_rooms", |b| {
        b.iter(|| {
            black_box(selector.choose(
                &searcher,
                "10.0.3.1:3074",
                &rooms,
                &recent,
                &host_locations,
            ))
        })
    });
}

fn bench_registry_create(c: &mut Criterion) {
    c.bench_function("create_room_with_100_existing", |b| {
        b.iter_with_setup(
            || {
                let registry = RoomRegistry::new(Arc::new(StaticSlotProvider::default()));
                for room in bench_rooms(100) {
                    let _ = registry.create_room(
                        room.host(),
                        room.members()[1..].to_vec(),
                        room.slot(),
                    );
                }
                registry
            },
            |registry| {
                let host = User::new(1, "bench_host");
                let members = vec![User::new(10_004, "member_1_0")];
                black_box(registry.create_room(&host, members, RoomSlot::new(1, 0)))
            },
        )
    });
}

fn bench_find_best_room_command(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let state = MatchState {
        registry: RoomRegistry::new(Arc::new(StaticSlotProvider::default())),
        locations: Arc::new(LocationTracker::new()),
        recency: Arc::new(RecencyTracker::default()),
    };
    for room in bench_rooms(100) {
        let _ = state
            .registry
            .create_room(room.host(), room.members()[1..].to_vec(), room.slot());
        let _ = state
            .locations
            .set_location(room.host().user_id, "10.0.0.1:3074");
    }

    let processor = CommandProcessor::new(
        state,
        Arc::new(InMemoryDirectory::new()),
        Arc::new(InMemoryHeartbeatStore::new()),
        Arc::new(MetricsCollector::new().unwrap()),
    );
    let searcher = User::new(1, "searcher");
    let session = SessionToken {
        token: "bench".to_string(),
        user_location: "10.0.0.1:3074".to_string(),
    };

    c.bench_function("find_best_room_command", |b| {
        b.iter(|| {
            rt.block_on(async {
                let command = MatchCodec::decode("[FindBestRoom,[\"Players\":[]]]").unwrap();
                black_box(processor.process(&searcher, &session, command).await)
            })
        })
    });
}

criterion_group!(
    benches,
    bench_choose,
    bench_registry_create,
    bench_find_best_room_command
);
criterion_main!(benches);
