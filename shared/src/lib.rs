//! # Shared Chess Library
//!
//! Types and rules used by both the game server and its clients.
//!
//! ## Board Model (`board`)
//! Positions, pieces and the 8x8 board. Boards are plain values, so a copy
//! taken for simulation can never disturb the authoritative game.
//!
//! ## Move Generation (`moves`)
//! Geometric candidate moves per piece type: sliding rays for bishops, rooks
//! and queens, single steps for kings and knights, and pawn pushes, captures
//! and promotions. Castling and en passant are not part of the rules here.
//!
//! ## Game Engine (`game`)
//! Turn order, legality filtering, check/checkmate/stalemate detection and
//! resignation. `ChessGame::make_move` is the only way the board of a live
//! game changes.
//!
//! ## Notation (`notation`)
//! Algebraic squares (`e2`) and moves (`e2e4`, `a7a8q`) for user input and
//! notification text.
//!
//! ## Protocol (`protocol`)
//! Client commands, server messages, the `GameData` snapshot and the
//! length-prefixed bincode framing used on the wire.

pub mod board;
pub mod game;
pub mod moves;
pub mod notation;
pub mod protocol;

pub use board::{Board, Color, Piece, PieceType, Position};
pub use game::{ChessGame, GameError, GameStatus};
pub use moves::{piece_moves, ChessMove};
pub use notation::NotationError;
pub use protocol::{
    decode_payload, encode_frame, frame_len, ClientCommand, FrameError, GameData, GameId,
    ServerMessage, FRAME_HEADER_LEN, MAX_FRAME_LEN,
};
