//! # Chess Session Server Library
//!
//! This library provides the authoritative server for live chess games. It
//! owns every game's state, validates the commands clients send against the
//! rules engine, and pushes updates to everyone connected to a game.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Rules
//! Moves are checked by the rules engine in the `shared` crate before any
//! state changes. Clients only ever render what the server sends them.
//!
//! ### Session Management
//! Handles the lifecycle of a client's presence in a game:
//! - Joining a game as a player or an observer
//! - Leaving explicitly or by dropping the connection
//! - Pruning connections whose transport has closed
//!
//! ### Broadcasting
//! After every accepted change the new game snapshot goes to all connections
//! registered for that game, followed by a human-readable notification.
//!
//! ## Module Organization
//!
//! - `store`: game storage and token lookup, with an in-memory implementation
//! - `registry`: which connections watch which game, plus message delivery
//! - `handler`: the CONNECT / MAKE_MOVE / RESIGN / LEAVE / HIGHLIGHT commands
//! - `error`: failures a command can end in and how they are reported
//! - `network`: TCP listener, framing and per-connection tasks
//!
//! ## Concurrency
//!
//! Commands for the same game are applied one at a time; commands for
//! different games run in parallel. Each connection's messages are written to
//! the socket in the order they were queued.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::handler::ProtocolHandler;
//! use server::network::{Server, ServerConfig};
//! use server::registry::SessionRegistry;
//! use server::store::InMemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let token = store.register("alice")?;
//!     let game_id = store.create_game("casual")?;
//!     println!("alice may join game {} with token {}", game_id, token);
//!
//!     let registry = Arc::new(SessionRegistry::new());
//!     let handler = Arc::new(ProtocolHandler::new(store.clone(), store, registry));
//!     let server = Server::new(ServerConfig::default(), handler).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handler;
pub mod network;
pub mod registry;
pub mod store;
