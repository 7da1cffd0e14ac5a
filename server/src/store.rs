//! Game storage and authentication lookups
//!
//! The protocol handler only depends on the `GameStore` and `AuthLookup`
//! traits. `InMemoryStore` implements both for the server binary and tests;
//! account management (registration and game creation) lives on it directly
//! since it is not part of the real-time protocol.

use dashmap::DashMap;
use log::info;
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared::{Color, GameData, GameId};
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("game {0} does not exist")]
    NotFound(GameId),

    #[error("unauthorized")]
    Unauthenticated,

    #[error("{0} seat already taken")]
    SeatTaken(Color),

    #[error("bad request: {0}")]
    BadRequest(String),
}

/// Persistent game storage
pub trait GameStore: Send + Sync {
    fn get_game(&self, game_id: GameId) -> Result<GameData, StoreError>;

    /// Replaces the stored game with the same id
    fn update_game(&self, game: GameData) -> Result<(), StoreError>;

    /// Seats `username` on `color` in one step and returns the updated game
    ///
    /// An empty seat is taken, a seat the user already holds is left as is,
    /// and a seat held by someone else fails with `SeatTaken`.
    fn claim_seat(
        &self,
        game_id: GameId,
        color: Color,
        username: &str,
    ) -> Result<GameData, StoreError>;
}

/// Resolves auth tokens to usernames
pub trait AuthLookup: Send + Sync {
    fn username_for_token(&self, token: &str) -> Result<String, StoreError>;
}

/// Process-local store for users, tokens and games
#[derive(Debug)]
pub struct InMemoryStore {
    games: DashMap<GameId, GameData>,
    tokens: DashMap<String, String>,
    next_game_id: AtomicU32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            games: DashMap::new(),
            tokens: DashMap::new(),
            next_game_id: AtomicU32::new(1),
        }
    }

    /// Issues a fresh auth token for `username`
    pub fn register(&self, username: &str) -> Result<String, StoreError> {
        if username.trim().is_empty() {
            return Err(StoreError::BadRequest("username must not be empty".to_string()));
        }

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();

        self.tokens.insert(token.clone(), username.to_string());
        info!("Registered user {}", username);
        Ok(token)
    }

    /// Creates a game in the starting position and returns its id
    pub fn create_game(&self, game_name: &str) -> Result<GameId, StoreError> {
        if game_name.trim().is_empty() {
            return Err(StoreError::BadRequest("game name must not be empty".to_string()));
        }

        let game_id = self.next_game_id.fetch_add(1, Ordering::SeqCst);
        self.games.insert(game_id, GameData::new(game_id, game_name));
        info!("Created game {} ({})", game_id, game_name);
        Ok(game_id)
    }

    /// All games ordered by id
    pub fn list_games(&self) -> Vec<GameData> {
        let mut games: Vec<GameData> = self
            .games
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        games.sort_by_key(|game| game.game_id);
        games
    }
}

impl GameStore for InMemoryStore {
    fn get_game(&self, game_id: GameId) -> Result<GameData, StoreError> {
        self.games
            .get(&game_id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(game_id))
    }

    fn update_game(&self, game: GameData) -> Result<(), StoreError> {
        let mut entry = self
            .games
            .get_mut(&game.game_id)
            .ok_or(StoreError::NotFound(game.game_id))?;
        *entry = game;
        Ok(())
    }

    fn claim_seat(
        &self,
        game_id: GameId,
        color: Color,
        username: &str,
    ) -> Result<GameData, StoreError> {
        let mut entry = self
            .games
            .get_mut(&game_id)
            .ok_or(StoreError::NotFound(game_id))?;

        let seated = entry.player(color).map(str::to_string);
        match seated {
            Some(current) if current != username => return Err(StoreError::SeatTaken(color)),
            Some(_) => {}
            None => {
                entry.set_player(color, Some(username.to_string()));
                info!("{} took the {} seat in game {}", username, color, game_id);
            }
        }
        Ok(entry.value().clone())
    }
}

impl AuthLookup for InMemoryStore {
    fn username_for_token(&self, token: &str) -> Result<String, StoreError> {
        self.tokens
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::Unauthenticated)
    }
}
