//! Protocol handler: turns client commands into game changes and messages
//!
//! Each command is processed while holding its game's lock, so for a single
//! game the load, mutation, persistence and every resulting broadcast finish
//! before the next command for that game starts. Different games never wait
//! on each other.

use crate::error::CommandError;
use crate::registry::{Connection, SessionRegistry};
use crate::store::{AuthLookup, GameStore};
use log::{debug, info};
use shared::{ChessMove, ClientCommand, Color, GameId, GameStatus, Position, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct ProtocolHandler {
    store: Arc<dyn GameStore>,
    auth: Arc<dyn AuthLookup>,
    registry: Arc<SessionRegistry>,
    game_locks: Mutex<HashMap<GameId, Arc<Mutex<()>>>>,
}

impl ProtocolHandler {
    pub fn new(
        store: Arc<dyn GameStore>,
        auth: Arc<dyn AuthLookup>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            store,
            auth,
            registry,
            game_locks: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Processes one command from `conn`. Failures go back to `conn` only.
    pub async fn handle(&self, conn: &Connection, command: ClientCommand) {
        let game_id = command.game_id();
        debug!(
            "Connection {} sent {} for game {}",
            conn.id,
            command.kind(),
            game_id
        );

        if let Err(err) = self.dispatch(conn, command).await {
            debug!("Command from connection {} failed: {}", conn.id, err);
            self.reject(conn, &err).await;
        }
    }

    /// Sends `err` to `conn` as an ERROR message
    pub async fn reject(&self, conn: &Connection, err: &CommandError) {
        self.registry
            .send(conn, ServerMessage::error(err.client_text()))
            .await;
    }

    /// Transport closed: forget the connection but leave every game as it was
    pub async fn disconnect(&self, conn: &Connection) {
        self.registry.remove(conn.id).await;
    }

    async fn dispatch(
        &self,
        conn: &Connection,
        command: ClientCommand,
    ) -> Result<(), CommandError> {
        let username = self.auth.username_for_token(command.auth_token())?;
        let game_id = command.game_id();

        // unknown games are rejected before a lock is ever created for them
        self.store.get_game(game_id)?;

        let lock = self.game_lock(game_id).await;
        let _guard = lock.lock().await;

        match command {
            ClientCommand::Connect { color, .. } => {
                self.connect(conn, &username, game_id, color).await
            }
            ClientCommand::MakeMove { chess_move, .. } => {
                self.make_move(conn, &username, game_id, chess_move).await
            }
            ClientCommand::Resign { .. } => self.resign(&username, game_id).await,
            ClientCommand::Leave { .. } => self.leave(conn, &username, game_id).await,
            ClientCommand::Highlight { positions, .. } => {
                self.highlight(game_id, positions).await
            }
        }
    }

    async fn connect(
        &self,
        conn: &Connection,
        username: &str,
        game_id: GameId,
        color: Option<Color>,
    ) -> Result<(), CommandError> {
        let data = match color {
            Some(color) => self.store.claim_seat(game_id, color, username)?,
            None => self.store.get_game(game_id)?,
        };

        if !self.registry.add(game_id, conn).await {
            return Ok(());
        }
        info!(
            "{} joined game {} ({} connected)",
            username,
            game_id,
            self.registry.connections(game_id).await.len()
        );

        let role = match data.color_of(username) {
            Some(color) => color.to_string(),
            None => "an observer".to_string(),
        };

        self.registry
            .send(conn, ServerMessage::LoadGame { game: data })
            .await;
        self.registry
            .broadcast(
                game_id,
                Some(conn.id),
                &ServerMessage::notification(format!("{} connected as {}", username, role)),
            )
            .await;
        Ok(())
    }

    async fn make_move(
        &self,
        conn: &Connection,
        username: &str,
        game_id: GameId,
        chess_move: ChessMove,
    ) -> Result<(), CommandError> {
        if !chess_move.is_on_board() {
            return Err(CommandError::Validation(format!(
                "move out of bounds: {}",
                chess_move
            )));
        }

        let mut data = self.store.get_game(game_id)?;
        if data.game.is_over() {
            return Err(CommandError::Forbidden("game is already over".to_string()));
        }

        let mover = data.game.turn();
        if data.player(mover) != Some(username) {
            return Err(match data.color_of(username) {
                Some(_) => CommandError::IllegalMove("not your turn".to_string()),
                None => CommandError::Forbidden("observers cannot make moves".to_string()),
            });
        }

        data.game.make_move(chess_move)?;
        self.store.update_game(data.clone())?;
        info!("Game {}: {} played {}", game_id, username, chess_move);

        let opponent = mover.opponent();
        let status = data.game.status();
        let in_check = data.game.is_in_check(opponent);
        let winner_name = data.display_name(mover);
        let opponent_name = data.display_name(opponent);

        self.registry
            .broadcast(game_id, None, &ServerMessage::LoadGame { game: data })
            .await;
        self.registry
            .broadcast(
                game_id,
                Some(conn.id),
                &ServerMessage::notification(format!("{} played {}", username, chess_move)),
            )
            .await;

        match status {
            GameStatus::Checkmate { .. } => {
                info!("Game {}: checkmate, {} wins", game_id, winner_name);
                self.registry
                    .broadcast(
                        game_id,
                        None,
                        &ServerMessage::notification(format!("Checkmate! {} wins!", winner_name)),
                    )
                    .await;
            }
            GameStatus::Active if in_check => {
                self.registry
                    .broadcast(
                        game_id,
                        None,
                        &ServerMessage::notification(format!("{} is in check", opponent_name)),
                    )
                    .await;
            }
            _ => {}
        }
        Ok(())
    }

    async fn resign(&self, username: &str, game_id: GameId) -> Result<(), CommandError> {
        let mut data = self.store.get_game(game_id)?;
        let color = data
            .color_of(username)
            .ok_or_else(|| CommandError::Forbidden("observers cannot resign".to_string()))?;

        data.game.resign(color)?;
        self.store.update_game(data)?;
        info!("Game {}: {} resigned", game_id, username);

        self.registry
            .broadcast(
                game_id,
                None,
                &ServerMessage::notification(format!("{} resigned", username)),
            )
            .await;
        Ok(())
    }

    async fn leave(
        &self,
        conn: &Connection,
        username: &str,
        game_id: GameId,
    ) -> Result<(), CommandError> {
        self.registry.remove(conn.id).await;

        let mut data = self.store.get_game(game_id)?;
        let held: Vec<Color> = [Color::White, Color::Black]
            .into_iter()
            .filter(|&color| data.player(color) == Some(username))
            .collect();

        if !held.is_empty() {
            for color in held {
                data.set_player(color, None);
            }
            self.store.update_game(data)?;
            info!("{} vacated their seat in game {}", username, game_id);
        }

        self.registry
            .broadcast(
                game_id,
                Some(conn.id),
                &ServerMessage::notification(format!("{} left the game", username)),
            )
            .await;
        Ok(())
    }

    async fn highlight(
        &self,
        game_id: GameId,
        positions: Vec<Position>,
    ) -> Result<(), CommandError> {
        if let Some(bad) = positions.iter().find(|pos| !pos.is_on_board()) {
            return Err(CommandError::Validation(format!(
                "position out of bounds: {}",
                bad
            )));
        }

        self.registry
            .broadcast(game_id, None, &ServerMessage::Highlight { positions })
            .await;
        Ok(())
    }

    async fn game_lock(&self, game_id: GameId) -> Arc<Mutex<()>> {
        let mut locks = self.game_locks.lock().await;
        Arc::clone(locks.entry(game_id).or_default())
    }
}
