//! Algebraic coordinates for the user-facing side of the protocol
//!
//! Columns a-h map to 1-8 and row digits map to rows directly, so `e2` is
//! `Position { row: 2, col: 5 }`. Moves are written as two squares followed by
//! an optional promotion letter: `e2e4`, `a7a8q`.

use crate::board::{PieceType, Position};
use crate::moves::ChessMove;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("invalid square '{0}'")]
    InvalidSquare(String),

    #[error("invalid move '{0}'")]
    InvalidMove(String),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_on_board() {
            write!(f, "{}{}", (b'a' + (self.col - 1) as u8) as char, self.row)
        } else {
            write!(f, "({}, {})", self.row, self.col)
        }
    }
}

impl FromStr for Position {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NotationError::InvalidSquare(s.to_string());
        let mut chars = s.trim().chars();

        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid());
        };

        let file = file.to_ascii_lowercase();
        if !('a'..='h').contains(&file) {
            return Err(invalid());
        }
        let row = rank.to_digit(10).filter(|r| (1..=8).contains(r)).ok_or_else(invalid)?;

        Ok(Position::new(row as i8, (file as u8 - b'a' + 1) as i8))
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            PieceType::King => 'k',
            PieceType::Queen => 'q',
            PieceType::Rook => 'r',
            PieceType::Bishop => 'b',
            PieceType::Knight => 'n',
            PieceType::Pawn => 'p',
        };
        write!(f, "{}", letter)
    }
}

fn promotion_from_letter(letter: char) -> Option<PieceType> {
    match letter.to_ascii_lowercase() {
        'q' => Some(PieceType::Queen),
        'r' => Some(PieceType::Rook),
        'b' => Some(PieceType::Bishop),
        'n' => Some(PieceType::Knight),
        _ => None,
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start, self.end)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion)?;
        }
        Ok(())
    }
}

impl FromStr for ChessMove {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || NotationError::InvalidMove(s.to_string());

        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(invalid());
        }

        let start: Position = text[0..2].parse().map_err(|_| invalid())?;
        let end: Position = text[2..4].parse().map_err(|_| invalid())?;
        let promotion = match text[4..].chars().next() {
            Some(letter) => Some(promotion_from_letter(letter).ok_or_else(invalid)?),
            None => None,
        };

        Ok(ChessMove::new(start, end, promotion))
    }
}
