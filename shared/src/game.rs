//! Chess game engine
//!
//! `ChessGame` owns the authoritative board, whose turn it is, and the winner
//! once the game is over. Legality is decided by simulation: a candidate move
//! is applied to a copy of the board and rejected if the mover's king is then
//! attacked.

use crate::board::{Board, Color, Piece, Position};
use crate::moves::{piece_moves, ChessMove};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("game is already over")]
    GameOver,
}

/// Coarse state of a game as seen by the side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    /// The given color delivered checkmate
    Checkmate { winner: Color },
    /// Side to move has no legal moves and is not in check
    Stalemate,
    /// The given color won because the other side resigned
    Resigned { winner: Color },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessGame {
    board: Board,
    turn: Color,
    winner: Option<Color>,
}

impl Default for ChessGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessGame {
    /// New game from the standard layout with White to move
    pub fn new() -> Self {
        Self::from_board(Board::starting_position(), Color::White)
    }

    /// Game starting from an arbitrary position
    pub fn from_board(board: Board, turn: Color) -> Self {
        Self {
            board,
            turn,
            winner: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Legal moves for the piece on `pos`; empty when the square is empty
    pub fn valid_moves(&self, pos: Position) -> Vec<ChessMove> {
        let Some(piece) = self.board.piece(pos) else {
            return Vec::new();
        };

        piece_moves(&self.board, pos, piece)
            .into_iter()
            .filter(|candidate| {
                let mut scratch = self.board.copy();
                apply_move(&mut scratch, candidate);
                !is_attacked(&scratch, piece.color)
            })
            .collect()
    }

    /// Applies `chess_move` for the side to move.
    ///
    /// On success the turn passes to the opponent and, if that leaves the
    /// opponent checkmated, the mover is recorded as winner.
    pub fn make_move(&mut self, chess_move: ChessMove) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }

        let piece = self
            .board
            .piece(chess_move.start)
            .ok_or_else(|| GameError::IllegalMove("no piece at start position".to_string()))?;

        if piece.color != self.turn {
            return Err(GameError::IllegalMove("not your turn".to_string()));
        }

        if !self.valid_moves(chess_move.start).contains(&chess_move) {
            return Err(GameError::IllegalMove("move is not legal".to_string()));
        }

        apply_move(&mut self.board, &chess_move);
        self.turn = self.turn.opponent();

        if self.is_in_checkmate(self.turn) {
            self.winner = Some(piece.color);
        }
        Ok(())
    }

    /// True if any opposing piece can reach `color`'s king
    pub fn is_in_check(&self, color: Color) -> bool {
        is_attacked(&self.board, color)
    }

    pub fn is_in_checkmate(&self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_any_valid_move(color)
    }

    pub fn is_in_stalemate(&self, color: Color) -> bool {
        !self.is_in_check(color) && !self.has_any_valid_move(color)
    }

    /// `color` gives up; the opponent becomes the winner
    pub fn resign(&mut self, color: Color) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        self.winner = Some(color.opponent());
        Ok(())
    }

    pub fn status(&self) -> GameStatus {
        match self.winner {
            Some(winner) if self.is_in_checkmate(winner.opponent()) => {
                GameStatus::Checkmate { winner }
            }
            Some(winner) => GameStatus::Resigned { winner },
            None if self.is_in_stalemate(self.turn) => GameStatus::Stalemate,
            None => GameStatus::Active,
        }
    }

    fn has_any_valid_move(&self, color: Color) -> bool {
        self.board
            .pieces_of(color)
            .any(|(pos, _)| !self.valid_moves(pos).is_empty())
    }
}

/// Moves a piece without any legality checks, applying promotion if present
fn apply_move(board: &mut Board, chess_move: &ChessMove) {
    let Some(moving) = board.piece(chess_move.start) else {
        return;
    };

    let placed = match chess_move.promotion {
        Some(piece_type) => Piece::new(moving.color, piece_type),
        None => moving,
    };

    board.place(chess_move.end, Some(placed));
    board.place(chess_move.start, None);
}

fn is_attacked(board: &Board, color: Color) -> bool {
    let Some(king) = board.find_king(color) else {
        return false;
    };

    board
        .pieces_of(color.opponent())
        .any(|(pos, piece)| piece_moves(board, pos, piece).iter().any(|m| m.end == king))
}
