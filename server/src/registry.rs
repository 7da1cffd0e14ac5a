//! Session registry: which connections are watching which game
//!
//! This module handles the server-side bookkeeping of live game sessions:
//! - Registering a connection with a game on CONNECT
//! - Dropping a connection from every game on LEAVE or transport close
//! - Delivering messages to one connection or broadcasting to a game
//! - Pruning connections whose transport has gone away
//!
//! Each game owns its own connection set behind its own lock, so traffic on
//! one game never waits on another. A send failure is never reported to the
//! caller; the dead connection is simply removed.

use log::{debug, info, warn};
use shared::{GameId, ServerMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

pub type ConnectionId = u32;

/// Handle to one client's outgoing message queue
///
/// The writer task that owns the receiving half forwards queued messages to
/// the socket. Once that task ends the handle reports itself closed and every
/// send fails.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique connection identifier assigned by the server
    pub id: ConnectionId,
    /// Peer address, for logs
    pub addr: SocketAddr,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        Self { id, addr, sender }
    }

    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queues `message`; fails only if the connection is closed
    fn deliver(&self, message: ServerMessage) -> Result<(), ServerMessage> {
        self.sender.send(message).map_err(|e| e.0)
    }
}

type ConnectionSet = Arc<Mutex<HashMap<ConnectionId, Connection>>>;

/// Maps game ids to the connections registered for them
#[derive(Debug, Default)]
pub struct SessionRegistry {
    games: RwLock<HashMap<GameId, ConnectionSet>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `conn` with `game_id` if the connection is still open
    ///
    /// Returns false when the connection was already closed and nothing was
    /// registered.
    pub async fn add(&self, game_id: GameId, conn: &Connection) -> bool {
        if !conn.is_open() {
            debug!("Not registering closed connection {}", conn.id);
            return false;
        }

        let set = self.game_set(game_id).await;
        set.lock().await.insert(conn.id, conn.clone());
        info!("Connection {} joined game {}", conn.id, game_id);
        true
    }

    /// Removes `conn_id` from every game it is registered with
    pub async fn remove(&self, conn_id: ConnectionId) {
        let sets: Vec<(GameId, ConnectionSet)> = {
            let games = self.games.read().await;
            games
                .iter()
                .map(|(id, set)| (*id, Arc::clone(set)))
                .collect()
        };

        for (game_id, set) in sets {
            if set.lock().await.remove(&conn_id).is_some() {
                info!("Connection {} left game {}", conn_id, game_id);
            }
        }
    }

    /// Sends `message` to a single connection, pruning it on failure
    pub async fn send(&self, conn: &Connection, message: ServerMessage) {
        if conn.deliver(message).is_err() {
            warn!("Failed to send to connection {} ({}), removing it", conn.id, conn.addr);
            self.remove(conn.id).await;
        }
    }

    /// Sends `message` to every connection of `game_id` except `excluding`
    ///
    /// Connections that turn out to be closed are dropped from the game and
    /// the rest still receive the message.
    pub async fn broadcast(
        &self,
        game_id: GameId,
        excluding: Option<ConnectionId>,
        message: &ServerMessage,
    ) {
        let Some(set) = self.existing_set(game_id).await else {
            return;
        };

        let mut connections = set.lock().await;
        connections.retain(|id, conn| {
            if Some(*id) == excluding {
                return true;
            }
            match conn.deliver(message.clone()) {
                Ok(()) => true,
                Err(_) => {
                    warn!(
                        "Pruning closed connection {} ({}) from game {}",
                        id, conn.addr, game_id
                    );
                    false
                }
            }
        });
    }

    /// Ids of the connections currently registered for `game_id`
    pub async fn connections(&self, game_id: GameId) -> Vec<ConnectionId> {
        match self.existing_set(game_id).await {
            Some(set) => {
                let mut ids: Vec<ConnectionId> = set.lock().await.keys().copied().collect();
                ids.sort_unstable();
                ids
            }
            None => Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn is_registered(&self, game_id: GameId, conn_id: ConnectionId) -> bool {
        match self.existing_set(game_id).await {
            Some(set) => set.lock().await.contains_key(&conn_id),
            None => false,
        }
    }

    async fn existing_set(&self, game_id: GameId) -> Option<ConnectionSet> {
        self.games.read().await.get(&game_id).map(Arc::clone)
    }

    async fn game_set(&self, game_id: GameId) -> ConnectionSet {
        if let Some(set) = self.existing_set(game_id).await {
            return set;
        }
        let mut games = self.games.write().await;
        Arc::clone(games.entry(game_id).or_default())
    }
}
