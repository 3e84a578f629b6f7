//! Command processing for authenticated match requests
//!
//! Every command first refreshes the caller's heartbeat, then dispatches on
//! its kind against the shared registry and trackers.

use crate::error::{status_code_for, MatchmakingError, Result};
use crate::identity::{HeartbeatStore, UserDirectory};
use crate::metrics::MetricsCollector;
use crate::protocol::{CreateRoom, MatchCommand, MatchResponse, UpdateMyPlayerData};
use crate::room::{BestRoomSelector, RoomRegistry};
use crate::tracking::{LocationTracker, RecencyTracker};
use crate::types::{FindBestRoomResponse, MatchedPlayer, SessionToken, User};
use crate::utils::current_timestamp;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Located users required before FindBestRoom runs a search
const MIN_LOCATIONS_FOR_SEARCH: usize = 2;

/// Shared state every command execution works against
#[derive(Clone)]
pub struct MatchState {
    pub registry: RoomRegistry,
    pub locations: Arc<LocationTracker>,
    pub recency: Arc<RecencyTracker>,
}

/// Applies decoded commands on behalf of authenticated users
pub struct CommandProcessor {
    state: MatchState,
    selector: BestRoomSelector,
    users: Arc<dyn UserDirectory>,
    heartbeats: Arc<dyn HeartbeatStore>,
    metrics: Arc<MetricsCollector>,
}

impl CommandProcessor {
    pub fn new(
        state: MatchState,
        users: Arc<dyn UserDirectory>,
        heartbeats: Arc<dyn HeartbeatStore>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            state,
            selector: BestRoomSelector::default(),
            users,
            heartbeats,
            metrics,
        }
    }

    /// Replace the default best-room selector
    pub fn with_selector(mut self, selector: BestRoomSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Process one command for `user`
    pub async fn process(
        &self,
        user: &User,
        session: &SessionToken,
        command: MatchCommand,
    ) -> Result<MatchResponse> {
        let timer = self.metrics.start_timer();
        let kind = command.kind();

        let result = async {
            self.heartbeats
                .upsert(user.user_id, current_timestamp())
                .await?;

            match command {
                MatchCommand::UpdateMyPlayerData(data) => {
                    self.update_player_data(user, session, data)
                }
                MatchCommand::FindBestRoom(_) => self.find_best_room(user, session),
                MatchCommand::CreateRoom(request) => self.create_room(user, request).await,
                MatchCommand::Unrecognized { name } => {
                    debug!("Acknowledging unhandled command '{}' from '{}'", name, user.username);
                    Ok(MatchResponse::ok())
                }
            }
        }
        .await;

        let status = match &result {
            Ok(response) => response.status_code,
            Err(e) => status_code_for(e),
        };
        let duration = timer.stop();
        self.metrics.record_command(kind, status, duration);
        let duration_ms = duration.as_secs_f64() * 1000.0;

        match &result {
            Ok(_) => info!(
                "Processed {} from '{}' - status: {}, duration: {:.2}ms",
                kind,
                user.username,
                status,
                duration_ms
            ),
            Err(e) => warn!(
                "{} from '{}' failed - status: {}, duration: {:.2}ms, error: {}",
                kind,
                user.username,
                status,
                duration_ms,
                e
            ),
        }

        result
    }

    fn update_player_data(
        &self,
        user: &User,
        session: &SessionToken,
        data: UpdateMyPlayerData,
    ) -> Result<MatchResponse> {
        self.state
            .locations
            .set_location(user.user_id, session.user_location.clone())?;
        self.metrics
            .update_tracked_locations(self.state.locations.count()?);

        if let Some(room_state) = data.room_state {
            match self.state.registry.find_by_host_user(user.user_id)? {
                Some(room) => {
                    self.state
                        .registry
                        .set_state(room.id(), user.user_id, room_state)?;
                }
                None => debug!(
                    "'{}' reported room state {} without hosting a room",
                    user.username, room_state
                ),
            }
        }

        Ok(MatchResponse::ok())
    }

    fn find_best_room(&self, user: &User, session: &SessionToken) -> Result<MatchResponse> {
        let located = self.state.locations.count()?;
        if located < MIN_LOCATIONS_FOR_SEARCH {
            debug!(
                "Skipping room search for '{}' - only {} located user(s)",
                user.username, located
            );
            self.metrics.record_room_search("skipped");
            return Ok(MatchResponse::ok());
        }

        let found = self.selector.select_best_room(
            user,
            &session.user_location,
            &self.state.registry,
            &self.state.recency,
            &self.state.locations,
        )?;

        let Some(found) = found else {
            self.metrics.record_room_search("not_found");
            return Err(MatchmakingError::NoRoomFound.into());
        };
        self.metrics.record_room_search("found");

        let member_ids = found.member_ids();
        self.state.recency.record_pairs(user.user_id, &member_ids)?;

        let room = &found.room;
        info!(
            "Matched '{}' to room {} hosted by '{}' (score: {:.1}, recent members: {})",
            user.username,
            room.id(),
            room.host().username,
            found.score,
            found.recent_members
        );

        let response = FindBestRoomResponse {
            room_id: room.id(),
            players: room
                .members()
                .iter()
                .map(|member| MatchedPlayer {
                    player_id: member.username.clone(),
                    matching_res: 0,
                })
                .collect(),
            slots: vec![room.slot()],
            locations: self.state.locations.locations_of(&member_ids)?,
            room_state: room.state(),
        };

        MatchResponse::ok_with(&response)
    }

    async fn create_room(&self, user: &User, request: CreateRoom) -> Result<MatchResponse> {
        let mut members = Vec::with_capacity(request.players.len());
        for username in &request.players {
            match self.users.find_by_username(username).await? {
                Some(member) => members.push(member),
                None => {
                    return Err(MatchmakingError::UnknownUser {
                        username: username.clone(),
                    }
                    .into())
                }
            }
        }

        self.state
            .registry
            .create_room(user, members, request.room_slot)?;

        self.metrics.record_room_created();
        self.metrics
            .update_from_registry_stats(&self.state.registry.stats()?);

        Ok(MatchResponse::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{InMemoryDirectory, MockHeartbeatStore};
    use crate::room::StaticSlotProvider;
    use crate::types::{RoomSlot, RoomState};

    fn state() -> MatchState {
        MatchState {
            registry: RoomRegistry::new(Arc::new(StaticSlotProvider::new(4))),
            locations: Arc::new(LocationTracker::new()),
            recency: Arc::new(RecencyTracker::default()),
        }
    }

    fn session(location: &str) -> SessionToken {
        SessionToken {
            token: "t".to_string(),
            user_location: location.to_string(),
        }
    }

    #[tokio::test]
    async fn test_heartbeat_failure_aborts_before_dispatch() {
        let mut heartbeats = MockHeartbeatStore::new();
        heartbeats
            .expect_upsert()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("heartbeat store offline")));

        let state = state();
        let processor = CommandProcessor::new(
            state.clone(),
            Arc::new(InMemoryDirectory::new()),
            Arc::new(heartbeats),
            Arc::new(MetricsCollector::new().unwrap()),
        );

        let bob = User::new(2, "Bob");
        let result = processor
            .process(
                &bob,
                &session("10.0.0.2:3074"),
                MatchCommand::UpdateMyPlayerData(UpdateMyPlayerData::default()),
            )
            .await;

        assert_eq!(status_code_for(&result.unwrap_err()), 500);
        assert_eq!(state.locations.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_heartbeat_recorded_even_when_validation_fails() {
        let mut heartbeats = MockHeartbeatStore::new();
        heartbeats
            .expect_upsert()
            .withf(|user_id, _| *user_id == 2)
            .times(1)
            .returning(|_, _| Ok(()));

        let processor = CommandProcessor::new(
            state(),
            Arc::new(InMemoryDirectory::new()),
            Arc::new(heartbeats),
            Arc::new(MetricsCollector::new().unwrap()),
        );

        let result = processor
            .process(
                &User::new(2, "Bob"),
                &session(""),
                MatchCommand::CreateRoom(CreateRoom {
                    players: vec!["Nobody".to_string()],
                    room_slot: RoomSlot::new(1, 0),
                }),
            )
            .await;

        assert_eq!(status_code_for(&result.unwrap_err()), 400);
    }

    #[tokio::test]
    async fn test_room_state_update_applies_to_hosted_room() {
        let mut heartbeats = MockHeartbeatStore::new();
        heartbeats.expect_upsert().returning(|_, _| Ok(()));

        let state = state();
        let host = User::new(1, "Host");
        let room = state
            .registry
            .create_room(&host, vec![], RoomSlot::new(1, 0))
            .unwrap();

        let processor = CommandProcessor::new(
            state.clone(),
            Arc::new(InMemoryDirectory::new()),
            Arc::new(heartbeats),
            Arc::new(MetricsCollector::new().unwrap()),
        );

        processor
            .process(
                &host,
                &session("10.0.0.1:3074"),
                MatchCommand::UpdateMyPlayerData(UpdateMyPlayerData {
                    player: Some("Host".to_string()),
                    room_state: Some(RoomState::LookingForPlayersForLevel),
                }),
            )
            .await
            .unwrap();

        let room = state.registry.get(room.id()).unwrap().unwrap();
        assert_eq!(room.state(), RoomState::LookingForPlayersForLevel);
        assert_eq!(
            state.locations.location_of(1).unwrap().as_deref(),
            Some("10.0.0.1:3074")
        );
    }

    #[tokio::test]
    async fn test_search_runs_once_two_users_are_located() {
        let mut heartbeats = MockHeartbeatStore::new();
        heartbeats.expect_upsert().returning(|_, _| Ok(()));

        let state = state();
        let processor = CommandProcessor::new(
            state.clone(),
            Arc::new(InMemoryDirectory::new()),
            Arc::new(heartbeats),
            Arc::new(MetricsCollector::new().unwrap()),
        );
        let alice = User::new(1, "Alice");
        let find = || MatchCommand::FindBestRoom(Default::default());
        state.locations.set_location(1, "10.0.0.1:3074").unwrap();

        let response = processor
            .process(&alice, &session("10.0.0.1:3074"), find())
            .await
            .unwrap();
        assert!(response.payload.is_none());

        state.locations.set_location(2, "10.0.0.2:3074").unwrap();
        let result = processor
            .process(&alice, &session("10.0.0.1:3074"), find())
            .await;
        assert_eq!(status_code_for(&result.unwrap_err()), 404);
    }
}
