//! Failures a client command can end in
//!
//! Every variant is reported back to the originating connection as an ERROR
//! message and leaves game state untouched. Transport failures are not
//! represented here: the registry absorbs them by pruning the connection.

use crate::store::StoreError;
use shared::{GameError, GameId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Malformed command or out-of-bounds position
    #[error("invalid command: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthenticated,

    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// Caller may not perform this action on this game
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("game {0} does not exist")]
    NotFound(GameId),
}

impl CommandError {
    /// Text sent to the client in an ERROR message
    pub fn client_text(&self) -> String {
        format!("Error: {}", self)
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(game_id) => CommandError::NotFound(game_id),
            StoreError::Unauthenticated => CommandError::Unauthenticated,
            StoreError::SeatTaken(_) => CommandError::Forbidden(err.to_string()),
            StoreError::BadRequest(reason) => CommandError::Validation(reason),
        }
    }
}

impl From<GameError> for CommandError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::IllegalMove(reason) => CommandError::IllegalMove(reason),
            GameError::GameOver => CommandError::Forbidden(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Color;

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            CommandError::from(StoreError::NotFound(4)),
            CommandError::NotFound(4)
        );
        assert_eq!(
            CommandError::from(StoreError::Unauthenticated),
            CommandError::Unauthenticated
        );
        assert_eq!(
            CommandError::from(StoreError::SeatTaken(Color::White)),
            CommandError::Forbidden("WHITE seat already taken".to_string())
        );
    }

    #[test]
    fn test_game_error_mapping() {
        assert_eq!(
            CommandError::from(GameError::GameOver),
            CommandError::Forbidden("game is already over".to_string())
        );
        assert_eq!(
            CommandError::from(GameError::IllegalMove("not your turn".to_string())),
            CommandError::IllegalMove("not your turn".to_string())
        );
    }

    #[test]
    fn test_client_text_prefix() {
        let text = CommandError::NotFound(12).client_text();
        assert_eq!(text, "Error: game 12 does not exist");
    }
}
