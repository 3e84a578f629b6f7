//! Match command definitions and decoding
//!
//! Clients send `[<Command>,[<members>]]` where `<members>` is the body of a
//! JSON object without its braces, e.g.
//! `[CreateRoom,["Players":["Bob","Alice"],"RoomSlot":[1,5]]]`.

use crate::error::{MatchmakingError, Result};
use crate::types::{RoomSlot, RoomState};
use serde::{Deserialize, Serialize};

/// Periodic player update; the location itself comes from the session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateMyPlayerData {
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub room_state: Option<RoomState>,
}

/// Request for the best existing room to join
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FindBestRoom {
    #[serde(default)]
    pub players: Vec<String>,
}

/// Request to host a new room with the listed players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRoom {
    pub players: Vec<String>,
    pub room_slot: RoomSlot,
}

/// Every command a client can send
#[derive(Debug, Clone, PartialEq)]
pub enum MatchCommand {
    UpdateMyPlayerData(UpdateMyPlayerData),
    FindBestRoom(FindBestRoom),
    CreateRoom(CreateRoom),
    /// Well-formed command this service does not act on
    Unrecognized { name: String },
}

impl MatchCommand {
    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            MatchCommand::UpdateMyPlayerData(_) => "UpdateMyPlayerData",
            MatchCommand::FindBestRoom(_) => "FindBestRoom",
            MatchCommand::CreateRoom(_) => "CreateRoom",
            MatchCommand::Unrecognized { .. } => "Unrecognized",
        }
    }
}

/// Match payload encoding and decoding utilities
pub struct MatchCodec;

impl MatchCodec {
    /// Decode a raw request body into a command
    pub fn decode(body: &str) -> Result<MatchCommand> {
        let body = body.trim();
        if !body.starts_with('[') {
            return Err(invalid("body must start with '['"));
        }

        let comma = body
            .find(',')
            .ok_or_else(|| invalid("missing argument list"))?;
        let name = body[1..comma].trim();
        if name.is_empty() {
            return Err(invalid("missing command name"));
        }

        let arguments = body[comma + 1..].trim();
        let members = arguments
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .map(str::trim_end)
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| invalid("arguments must be enclosed in '[...]]'"))?;
        let json = format!("{{{}}}", members);

        let command = match name {
            "UpdateMyPlayerData" => MatchCommand::UpdateMyPlayerData(parse_arguments(name, &json)?),
            "FindBestRoom" => MatchCommand::FindBestRoom(parse_arguments(name, &json)?),
            "CreateRoom" => MatchCommand::CreateRoom(parse_arguments(name, &json)?),
            other => MatchCommand::Unrecognized {
                name: other.to_string(),
            },
        };

        Ok(command)
    }

    /// Encode a command back into the wire format
    pub fn encode(command: &MatchCommand) -> Result<String> {
        let (name, value) = match command {
            MatchCommand::UpdateMyPlayerData(args) => (command.kind(), serde_json::to_value(args)?),
            MatchCommand::FindBestRoom(args) => (command.kind(), serde_json::to_value(args)?),
            MatchCommand::CreateRoom(args) => (command.kind(), serde_json::to_value(args)?),
            MatchCommand::Unrecognized { name } => (name.as_str(), serde_json::json!({})),
        };

        let object = serde_json::to_string(&value)?;
        let members = &object[1..object.len() - 1];
        Ok(format!("[{},[{}]]", name, members))
    }
}

fn parse_arguments<T: serde::de::DeserializeOwned>(name: &str, json: &str) -> Result<T> {
    serde_json::from_str(json)
        .map_err(|e| invalid(&format!("bad {} arguments: {}", name, e)))
}

fn invalid(reason: &str) -> anyhow::Error {
    MatchmakingError::InvalidPayload {
        reason: reason.to_string(),
    }
    .into()
}
