//! Wire protocol between chess clients and the game server
//!
//! Every message travels as one frame: a 4-byte big-endian payload length
//! followed by the bincode encoding of a `ClientCommand` or `ServerMessage`.

use crate::board::{Color, Position};
use crate::game::ChessGame;
use crate::moves::ChessMove;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type GameId = u32;

/// Upper bound on a single frame's payload
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Length prefix size in bytes
pub const FRAME_HEADER_LEN: usize = 4;

/// A game together with its name and seated players; the unit the store keeps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    pub game_id: GameId,
    pub game_name: String,
    pub white_username: Option<String>,
    pub black_username: Option<String>,
    pub game: ChessGame,
}

impl GameData {
    pub fn new(game_id: GameId, game_name: impl Into<String>) -> Self {
        Self {
            game_id,
            game_name: game_name.into(),
            white_username: None,
            black_username: None,
            game: ChessGame::new(),
        }
    }

    /// Username seated on `color`, if any
    pub fn player(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white_username.as_deref(),
            Color::Black => self.black_username.as_deref(),
        }
    }

    pub fn set_player(&mut self, color: Color, username: Option<String>) {
        match color {
            Color::White => self.white_username = username,
            Color::Black => self.black_username = username,
        }
    }

    /// Color seated by `username`, or None for observers
    pub fn color_of(&self, username: &str) -> Option<Color> {
        [Color::White, Color::Black]
            .into_iter()
            .find(|&color| self.player(color) == Some(username))
    }

    /// Name used in notifications: the seated username or the color itself
    pub fn display_name(&self, color: Color) -> String {
        self.player(color)
            .map(str::to_string)
            .unwrap_or_else(|| color.to_string())
    }
}

/// Commands sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientCommand {
    Connect {
        auth_token: String,
        game_id: GameId,
        color: Option<Color>,
    },
    MakeMove {
        auth_token: String,
        game_id: GameId,
        chess_move: ChessMove,
    },
    Resign {
        auth_token: String,
        game_id: GameId,
    },
    Leave {
        auth_token: String,
        game_id: GameId,
    },
    Highlight {
        auth_token: String,
        game_id: GameId,
        positions: Vec<Position>,
    },
}

impl ClientCommand {
    pub fn game_id(&self) -> GameId {
        match self {
            ClientCommand::Connect { game_id, .. }
            | ClientCommand::MakeMove { game_id, .. }
            | ClientCommand::Resign { game_id, .. }
            | ClientCommand::Leave { game_id, .. }
            | ClientCommand::Highlight { game_id, .. } => *game_id,
        }
    }

    pub fn auth_token(&self) -> &str {
        match self {
            ClientCommand::Connect { auth_token, .. }
            | ClientCommand::MakeMove { auth_token, .. }
            | ClientCommand::Resign { auth_token, .. }
            | ClientCommand::Leave { auth_token, .. }
            | ClientCommand::Highlight { auth_token, .. } => auth_token,
        }
    }

    /// Short command name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ClientCommand::Connect { .. } => "CONNECT",
            ClientCommand::MakeMove { .. } => "MAKE_MOVE",
            ClientCommand::Resign { .. } => "RESIGN",
            ClientCommand::Leave { .. } => "LEAVE",
            ClientCommand::Highlight { .. } => "HIGHLIGHT",
        }
    }
}

/// Messages pushed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    LoadGame { game: GameData },
    Notification { text: String },
    Error { text: String },
    Highlight { positions: Vec<Position> },
}

impl ServerMessage {
    pub fn notification(text: impl Into<String>) -> Self {
        ServerMessage::Notification { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        ServerMessage::Error { text: text.into() }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame of {0} bytes exceeds the {} byte limit", MAX_FRAME_LEN)]
    TooLarge(usize),

    #[error("malformed payload: {0}")]
    Codec(#[from] bincode::Error),
}

/// Encodes `message` as a length-prefixed frame
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, FrameError> {
    let payload = bincode::serialize(message)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Reads the payload length out of a frame header, enforcing the size limit
pub fn frame_len(header: [u8; FRAME_HEADER_LEN]) -> Result<usize, FrameError> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }
    Ok(len)
}

/// Decodes a frame payload (without its length prefix)
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, FrameError> {
    Ok(bincode::deserialize(payload)?)
}
