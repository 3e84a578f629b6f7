//! Client wire format for match commands and their responses

pub mod command;
pub mod response;

pub use command::{CreateRoom, FindBestRoom, MatchCodec, MatchCommand, UpdateMyPlayerData};
pub use response::MatchResponse;
