use clap::Parser;
use log::{error, info};
use server::handler::ProtocolHandler;
use server::network::{Server, ServerConfig};
use server::registry::SessionRegistry;
use server::store::InMemoryStore;
use std::sync::Arc;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Maximum number of simultaneous connections
    #[arg(short, long, default_value = "256")]
    max_connections: usize,

    /// Register a user at startup; its auth token is logged (repeatable)
    #[arg(short, long = "user")]
    users: Vec<String>,

    /// Number of empty games to create at startup
    #[arg(short, long, default_value = "1")]
    games: u32,
}

/// Parses arguments, seeds the store and runs the server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let store = Arc::new(InMemoryStore::new());
    for username in &args.users {
        let token = store.register(username)?;
        info!("User {} has token {}", username, token);
    }
    for n in 0..args.games {
        store.create_game(&format!("game-{}", n + 1))?;
    }
    for game in store.list_games() {
        info!("Game {} '{}' is open", game.game_id, game.game_name);
    }

    let registry = Arc::new(SessionRegistry::new());
    let handler = Arc::new(ProtocolHandler::new(store.clone(), store, registry));

    let config = ServerConfig {
        addr: format!("{}:{}", args.host, args.port),
        max_connections: args.max_connections,
    };
    let server = Server::new(config, handler).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
