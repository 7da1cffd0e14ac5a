//! Minimal terminal client for poking at a running server.
//!
//! Connects to one game, prints every message the server pushes, and turns
//! lines typed on stdin into commands:
//!
//! ```text
//! move e2e4        move e7e8q
//! resign           leave
//! highlight e2 e4  quit
//! ```

use clap::{Parser, ValueEnum};
use server::network::{read_frame, write_frame};
use shared::{
    decode_payload, ChessMove, ClientCommand, Color, GameData, GameId, Position, ServerMessage,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Seat {
    White,
    Black,
}

impl From<Seat> for Color {
    fn from(seat: Seat) -> Self {
        match seat {
            Seat::White => Color::White,
            Seat::Black => Color::Black,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Auth token printed by the server for your user
    #[arg(short, long)]
    token: String,

    /// Game to join
    #[arg(short, long, default_value = "1")]
    game: GameId,

    /// Seat to claim; omit to watch
    #[arg(short, long, value_enum)]
    color: Option<Seat>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let stream = TcpStream::connect(&args.server).await?;
    println!("Connected to {}", args.server);
    let (mut reader, mut writer) = stream.into_split();

    tokio::spawn(async move {
        loop {
            match read_frame(&mut reader).await {
                Ok(Some(payload)) => match decode_payload::<ServerMessage>(&payload) {
                    Ok(message) => print_message(&message),
                    Err(e) => eprintln!("Undecodable message: {}", e),
                },
                Ok(None) => {
                    println!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    eprintln!("Connection error: {}", e);
                    break;
                }
            }
        }
    });

    let connect = ClientCommand::Connect {
        auth_token: args.token.clone(),
        game_id: args.game,
        color: args.color.map(Color::from),
    };
    write_frame(&mut writer, &connect).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        match parse_command(line, &args.token, args.game) {
            Ok(command) => write_frame(&mut writer, &command).await?,
            Err(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}

fn parse_command(line: &str, token: &str, game_id: GameId) -> Result<ClientCommand, String> {
    let auth_token = token.to_string();
    let mut words = line.split_whitespace();

    match words.next() {
        Some("move") => {
            let text = words.next().ok_or("usage: move e2e4")?;
            let chess_move: ChessMove = text.parse().map_err(|e| format!("{}", e))?;
            Ok(ClientCommand::MakeMove {
                auth_token,
                game_id,
                chess_move,
            })
        }
        Some("resign") => Ok(ClientCommand::Resign {
            auth_token,
            game_id,
        }),
        Some("leave") => Ok(ClientCommand::Leave {
            auth_token,
            game_id,
        }),
        Some("highlight") => {
            let positions = words
                .map(str::parse::<Position>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("{}", e))?;
            Ok(ClientCommand::Highlight {
                auth_token,
                game_id,
                positions,
            })
        }
        _ => Err(format!("unknown command '{}'", line)),
    }
}

fn print_message(message: &ServerMessage) {
    match message {
        ServerMessage::LoadGame { game } => print_game(game),
        ServerMessage::Notification { text } => println!("* {}", text),
        ServerMessage::Error { text } => println!("! {}", text),
        ServerMessage::Highlight { positions } => {
            let squares: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
            println!("Highlighted: {}", squares.join(" "));
        }
    }
}

fn print_game(data: &GameData) {
    println!(
        "Game {} '{}': {} (white) vs {} (black)",
        data.game_id,
        data.game_name,
        data.display_name(Color::White),
        data.display_name(Color::Black)
    );

    let board = data.game.board();
    for row in (1..=8).rev() {
        let mut line = format!("{} ", row);
        for col in 1..=8 {
            let square = match board.piece(Position::new(row, col)) {
                Some(piece) => {
                    let letter = piece.piece_type.to_string();
                    match piece.color {
                        Color::White => letter.to_uppercase(),
                        Color::Black => letter,
                    }
                }
                None => ".".to_string(),
            };
            line.push_str(&square);
            line.push(' ');
        }
        println!("{}", line.trim_end());
    }
    println!("  a b c d e f g h");
    println!("Status: {:?}, {} to move", data.game.status(), data.game.turn());
}
