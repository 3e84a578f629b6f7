//! Test fixtures shared by the integration test binaries

#![allow(dead_code)]

use matchroom::error::{status_code_for, Result};
use matchroom::identity::{InMemoryDirectory, InMemoryHeartbeatStore};
use matchroom::metrics::MetricsCollector;
use matchroom::protocol::{MatchCodec, MatchResponse};
use matchroom::room::{Room, RoomRegistry, SlotProvider, StaticSlotProvider};
use matchroom::service::{CommandProcessor, MatchState};
use matchroom::tracking::{LocationTracker, RecencyTracker};
use matchroom::types::{SessionToken, User, UserId};
use std::collections::HashSet;
use std::sync::Arc;

/// Slot type whose rooms hold two members
pub const DUO_SLOT_TYPE: i32 = 2;

/// An authenticated caller
#[derive(Debug, Clone)]
pub struct Client {
    pub user: User,
    pub session: SessionToken,
}

impl Client {
    pub fn id(&self) -> UserId {
        self.user.user_id
    }
}

/// Processor wired to in-memory collaborators
pub struct TestSystem {
    pub directory: Arc<InMemoryDirectory>,
    pub heartbeats: Arc<InMemoryHeartbeatStore>,
    pub metrics: Arc<MetricsCollector>,
    pub processor: Arc<CommandProcessor>,
}

impl TestSystem {
    /// Default capacity 4, duo slots hold 2
    pub fn new() -> Self {
        Self::with_slot_provider(StaticSlotProvider::new(4).with_capacity(DUO_SLOT_TYPE, 2))
    }

    pub fn with_slot_provider(provider: impl SlotProvider + 'static) -> Self {
        Self::build(provider, RecencyTracker::default())
    }

    pub fn with_recency_capacity(capacity: usize) -> Self {
        Self::build(
            StaticSlotProvider::new(4).with_capacity(DUO_SLOT_TYPE, 2),
            RecencyTracker::new(capacity),
        )
    }

    fn build(provider: impl SlotProvider + 'static, recency: RecencyTracker) -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let heartbeats = Arc::new(InMemoryHeartbeatStore::new());
        let metrics = Arc::new(MetricsCollector::new().expect("metrics collector"));

        let state = MatchState {
            registry: RoomRegistry::new(Arc::new(provider)),
            locations: Arc::new(LocationTracker::new()),
            recency: Arc::new(recency),
        };
        let processor = Arc::new(CommandProcessor::new(
            state,
            directory.clone(),
            heartbeats.clone(),
            metrics.clone(),
        ));

        Self {
            directory,
            heartbeats,
            metrics,
            processor,
        }
    }

    /// Register a user with a session issued from `location`
    pub fn client(&self, username: &str, location: &str) -> Client {
        let user = self.directory.register_user(username).expect("register user");
        let token = format!("{}-token", username.to_lowercase());
        self.directory
            .issue_token(&user, &token, location)
            .expect("issue token");

        Client {
            user,
            session: SessionToken {
                token,
                user_location: location.to_string(),
            },
        }
    }

    /// Decode `body` and process it as `client`
    pub async fn send(&self, client: &Client, body: &str) -> Result<MatchResponse> {
        let command = MatchCodec::decode(body)?;
        self.processor
            .process(&client.user, &client.session, command)
            .await
    }

    /// Report the client's location (UpdateMyPlayerData without a state)
    pub async fn locate(&self, client: &Client) {
        let body = format!(
            "[UpdateMyPlayerData,[\"Player\":\"{}\"]]",
            client.user.username
        );
        self.send(client, &body).await.expect("update player data");
    }

    /// Host a room as `host` with the named players
    pub async fn create_room(
        &self,
        host: &Client,
        players: &[&str],
        slot_type: i32,
    ) -> Result<MatchResponse> {
        self.send(host, &create_room_body(players, slot_type)).await
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.processor.state().registry
    }

    pub fn locations(&self) -> &LocationTracker {
        &self.processor.state().locations
    }

    pub fn recency(&self) -> &RecencyTracker {
        &self.processor.state().recency
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.registry().snapshot().expect("registry snapshot")
    }
}

pub fn create_room_body(players: &[&str], slot_type: i32) -> String {
    let names: Vec<String> = players.iter().map(|p| format!("\"{}\"", p)).collect();
    format!(
        "[CreateRoom,[\"Players\":[{}],\"RoomSlot\":[{},0]]]",
        names.join(","),
        slot_type
    )
}

pub const FIND_BEST_ROOM: &str = "[FindBestRoom,[\"Players\":[]]]";

/// Status the HTTP layer would send for this outcome
pub fn status_of(result: &Result<MatchResponse>) -> u16 {
    match result {
        Ok(response) => response.status_code,
        Err(e) => status_code_for(e),
    }
}

/// One host per user, disjoint memberships, host listed first
pub fn assert_registry_invariants(rooms: &[Room]) {
    let mut hosts = HashSet::new();
    let mut members = HashSet::new();

    for room in rooms {
        assert!(
            hosts.insert(room.host().user_id),
            "user {} hosts more than one room",
            room.host().user_id
        );
        assert_eq!(
            room.members().first().map(|m| m.user_id),
            Some(room.host().user_id),
            "host of room {} is not its first member",
            room.id()
        );
        assert!(room.members().len() <= room.capacity());
        for member in room.members() {
            assert!(
                members.insert(member.user_id),
                "user {} is in more than one room",
                member.user_id
            );
        }
    }
}
