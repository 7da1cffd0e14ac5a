//! Board and piece model
//!
//! Squares are addressed by 1-based `(row, col)` pairs, row 1 being White's
//! back rank and column 1 being the a-file. The board is a fixed 8x8 grid of
//! optional pieces stored by value, so copying it for speculative simulation
//! is a plain `Copy` and never shares state with the original.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_SIZE: i8 = 8;

/// Side of the board a piece belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row direction pawns of this color advance in
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Row pawns of this color start on
    pub fn pawn_home_row(self) -> i8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    /// Row on which pawns of this color promote
    pub fn promotion_row(self) -> i8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "WHITE"),
            Color::Black => write!(f, "BLACK"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceType {
    /// Piece types a pawn may promote into, in the order they are generated
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];
}

/// A piece is just its color and type; it carries no position or history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub piece_type: PieceType,
}

impl Piece {
    pub fn new(color: Color, piece_type: PieceType) -> Self {
        Self { color, piece_type }
    }
}

/// A square on the board, 1-based on both axes
///
/// Positions may be constructed off the board (they arrive that way from the
/// wire); `is_on_board` is the bounds check everything else relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i8,
    pub col: i8,
}

impl Position {
    pub fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    pub fn is_on_board(&self) -> bool {
        (1..=BOARD_SIZE).contains(&self.row) && (1..=BOARD_SIZE).contains(&self.col)
    }

    /// Returns the square shifted by the given deltas, or None if it falls off the board
    pub fn offset(&self, d_row: i8, d_col: i8) -> Option<Position> {
        let next = Position::new(self.row.checked_add(d_row)?, self.col.checked_add(d_col)?);
        next.is_on_board().then_some(next)
    }

    /// Iterates every square of the board, row by row
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=BOARD_SIZE).flat_map(|row| (1..=BOARD_SIZE).map(move |col| Position::new(row, col)))
    }

    fn index(&self) -> Option<(usize, usize)> {
        self.is_on_board()
            .then(|| ((self.row - 1) as usize, (self.col - 1) as usize))
    }
}

/// Piece placement for one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    squares: [[Option<Piece>; BOARD_SIZE as usize]; BOARD_SIZE as usize],
}

impl Default for Board {
    fn default() -> Self {
        Self::starting_position()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; BOARD_SIZE as usize]; BOARD_SIZE as usize],
        }
    }

    /// Standard chess starting layout
    pub fn starting_position() -> Self {
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        let mut board = Self::empty();
        for (i, piece_type) in BACK_RANK.iter().enumerate() {
            let col = i as i8 + 1;
            board.place(Position::new(1, col), Some(Piece::new(Color::White, *piece_type)));
            board.place(Position::new(2, col), Some(Piece::new(Color::White, PieceType::Pawn)));
            board.place(Position::new(7, col), Some(Piece::new(Color::Black, PieceType::Pawn)));
            board.place(Position::new(8, col), Some(Piece::new(Color::Black, *piece_type)));
        }
        board
    }

    /// Returns the piece at `pos`; off-board squares are always empty
    pub fn piece(&self, pos: Position) -> Option<Piece> {
        let (r, c) = pos.index()?;
        self.squares[r][c]
    }

    /// Puts `piece` on `pos`, or clears the square when `piece` is None.
    /// Off-board positions are ignored.
    pub fn place(&mut self, pos: Position, piece: Option<Piece>) {
        if let Some((r, c)) = pos.index() {
            self.squares[r][c] = piece;
        }
    }

    /// Independent copy for speculative moves
    pub fn copy(&self) -> Board {
        *self
    }

    /// All occupied squares belonging to `color`
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| {
            self.piece(pos)
                .filter(|piece| piece.color == color)
                .map(|piece| (pos, piece))
        })
    }

    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces_of(color)
            .find(|(_, piece)| piece.piece_type == PieceType::King)
            .map(|(pos, _)| pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position_layout() {
        let board = Board::starting_position();

        assert_eq!(
            board.piece(Position::new(1, 5)),
            Some(Piece::new(Color::White, PieceType::King))
        );
        assert_eq!(
            board.piece(Position::new(8, 4)),
            Some(Piece::new(Color::Black, PieceType::Queen))
        );
        for col in 1..=8 {
            assert_eq!(
                board.piece(Position::new(2, col)),
                Some(Piece::new(Color::White, PieceType::Pawn))
            );
            assert_eq!(
                board.piece(Position::new(7, col)),
                Some(Piece::new(Color::Black, PieceType::Pawn))
            );
            for row in 3..=6 {
                assert_eq!(board.piece(Position::new(row, col)), None);
            }
        }
        assert_eq!(board.pieces_of(Color::White).count(), 16);
        assert_eq!(board.pieces_of(Color::Black).count(), 16);
    }

    #[test]
    fn test_place_and_clear() {
        let mut board = Board::empty();
        let pos = Position::new(4, 4);
        let knight = Piece::new(Color::Black, PieceType::Knight);

        board.place(pos, Some(knight));
        assert_eq!(board.piece(pos), Some(knight));

        board.place(pos, None);
        assert_eq!(board.piece(pos), None);
    }

    #[test]
    fn test_copy_is_independent() {
        let original = Board::starting_position();
        let mut copy = original.copy();

        copy.place(Position::new(2, 5), None);
        copy.place(Position::new(4, 5), Some(Piece::new(Color::White, PieceType::Pawn)));

        assert!(original.piece(Position::new(2, 5)).is_some());
        assert!(original.piece(Position::new(4, 5)).is_none());
        assert_ne!(original, copy);
    }

    #[test]
    fn test_off_board_positions() {
        let mut board = Board::starting_position();
        assert!(!Position::new(0, 1).is_on_board());
        assert!(!Position::new(9, 1).is_on_board());
        assert!(!Position::new(1, 0).is_on_board());
        assert!(Position::new(8, 8).is_on_board());

        assert_eq!(board.piece(Position::new(0, 0)), None);
        board.place(Position::new(9, 9), Some(Piece::new(Color::White, PieceType::Queen)));
        assert_eq!(board, Board::starting_position());
    }

    #[test]
    fn test_offset_stays_in_bounds() {
        let corner = Position::new(1, 1);
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(1, 1), Some(Position::new(2, 2)));
        assert_eq!(Position::new(8, 8).offset(1, 0), None);
        assert_eq!(Position::new(i8::MAX, 1).offset(1, 0), None);
    }

    #[test]
    fn test_find_king() {
        let board = Board::starting_position();
        assert_eq!(board.find_king(Color::White), Some(Position::new(1, 5)));
        assert_eq!(board.find_king(Color::Black), Some(Position::new(8, 5)));
        assert_eq!(Board::empty().find_king(Color::White), None);
    }
}
