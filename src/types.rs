//! Common types used throughout the matchmaking service

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for users
pub type UserId = u64;

/// Unique identifier for rooms
pub type RoomId = Uuid;

/// An authenticated user known to the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
}

impl User {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

/// Session token resolved alongside the user; carries the client's network hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub user_location: String,
}

/// Phase of a room, as reported by its host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RoomState {
    Idle,
    LookingForPlayersForLevel,
    Unknown,
    DivingIn,
    DivingInWaiting,
}

impl TryFrom<u8> for RoomState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RoomState::Idle),
            1 => Ok(RoomState::LookingForPlayersForLevel),
            2 => Ok(RoomState::Unknown),
            3 => Ok(RoomState::DivingIn),
            4 => Ok(RoomState::DivingInWaiting),
            other => Err(format!("unknown room state {}", other)),
        }
    }
}

impl From<RoomState> for u8 {
    fn from(state: RoomState) -> Self {
        match state {
            RoomState::Idle => 0,
            RoomState::LookingForPlayersForLevel => 1,
            RoomState::Unknown => 2,
            RoomState::DivingIn => 3,
            RoomState::DivingInWaiting => 4,
        }
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomState::Idle => write!(f, "Idle"),
            RoomState::LookingForPlayersForLevel => write!(f, "LookingForPlayersForLevel"),
            RoomState::Unknown => write!(f, "Unknown"),
            RoomState::DivingIn => write!(f, "DivingIn"),
            RoomState::DivingInWaiting => write!(f, "DivingInWaiting"),
        }
    }
}

/// Slot descriptor sent by the client as `[slot_type, slot_id]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct RoomSlot {
    pub slot_type: i32,
    pub slot_id: i32,
}

impl RoomSlot {
    pub fn new(slot_type: i32, slot_id: i32) -> Self {
        Self { slot_type, slot_id }
    }
}

impl From<[i32; 2]> for RoomSlot {
    fn from(raw: [i32; 2]) -> Self {
        Self {
            slot_type: raw[0],
            slot_id: raw[1],
        }
    }
}

impl From<RoomSlot> for [i32; 2] {
    fn from(slot: RoomSlot) -> Self {
        [slot.slot_type, slot.slot_id]
    }
}

/// One player entry of a best-room answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPlayer {
    #[serde(rename = "PlayerId")]
    pub player_id: String,
    /// 0 for players already in the room
    pub matching_res: u8,
}

/// Payload returned to the searcher when a room was found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FindBestRoomResponse {
    pub room_id: RoomId,
    pub players: Vec<MatchedPlayer>,
    pub slots: Vec<RoomSlot>,
    pub locations: Vec<String>,
    pub room_state: RoomState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_wire_values() {
        assert_eq!(serde_json::to_string(&RoomState::DivingIn).unwrap(), "3");
        let state: RoomState = serde_json::from_str("1").unwrap();
        assert_eq!(state, RoomState::LookingForPlayersForLevel);
        assert!(serde_json::from_str::<RoomState>("9").is_err());
    }

    #[test]
    fn test_room_slot_is_a_pair() {
        let slot: RoomSlot = serde_json::from_str("[1,5]").unwrap();
        assert_eq!(slot, RoomSlot::new(1, 5));
        assert_eq!(serde_json::to_string(&slot).unwrap(), "[1,5]");
    }

    #[test]
    fn test_find_best_room_response_field_names() {
        let response = FindBestRoomResponse {
            room_id: Uuid::nil(),
            players: vec![MatchedPlayer {
                player_id: "Carol".to_string(),
                matching_res: 0,
            }],
            slots: vec![RoomSlot::new(1, 2)],
            locations: vec!["10.0.0.3:3074".to_string()],
            room_state: RoomState::Idle,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["Players"][0]["PlayerId"], "Carol");
        assert_eq!(json["Players"][0]["matching_res"], 0);
        assert_eq!(json["Slots"][0][1], 2);
        assert_eq!(json["RoomState"], 0);
        assert!(json.get("RoomId").is_some());
    }
}
