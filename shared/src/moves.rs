//! Per-piece candidate move generation
//!
//! Generation is purely geometric: it knows about board edges and occupancy
//! but not about check. Filtering out moves that expose the mover's king is
//! done by the game engine.

use crate::board::{Board, Color, Piece, PieceType, Position};
use serde::{Deserialize, Serialize};

/// A move from one square to another, with the piece a pawn promotes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChessMove {
    pub start: Position,
    pub end: Position,
    pub promotion: Option<PieceType>,
}

impl ChessMove {
    pub fn new(start: Position, end: Position, promotion: Option<PieceType>) -> Self {
        Self {
            start,
            end,
            promotion,
        }
    }

    pub fn is_on_board(&self) -> bool {
        self.start.is_on_board() && self.end.is_on_board()
    }
}

const DIAGONALS: [(i8, i8); 4] = [(1, -1), (-1, -1), (1, 1), (-1, 1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, -1),
    (2, 1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (-1, 2),
    (1, -2),
    (-1, -2),
];

/// Enumerates every geometrically reachable move for `piece` standing on `from`
pub fn piece_moves(board: &Board, from: Position, piece: Piece) -> Vec<ChessMove> {
    let mut moves = Vec::new();

    match piece.piece_type {
        PieceType::Bishop => walk_all(board, from, piece.color, &DIAGONALS, true, &mut moves),
        PieceType::Rook => walk_all(board, from, piece.color, &ORTHOGONALS, true, &mut moves),
        PieceType::Queen => {
            walk_all(board, from, piece.color, &DIAGONALS, true, &mut moves);
            walk_all(board, from, piece.color, &ORTHOGONALS, true, &mut moves);
        }
        PieceType::King => {
            walk_all(board, from, piece.color, &DIAGONALS, false, &mut moves);
            walk_all(board, from, piece.color, &ORTHOGONALS, false, &mut moves);
        }
        PieceType::Knight => walk_all(board, from, piece.color, &KNIGHT_JUMPS, false, &mut moves),
        PieceType::Pawn => pawn_moves(board, from, piece.color, &mut moves),
    }

    moves
}

fn walk_all(
    board: &Board,
    from: Position,
    color: Color,
    directions: &[(i8, i8)],
    slide: bool,
    moves: &mut Vec<ChessMove>,
) {
    for &(d_row, d_col) in directions {
        walk(board, from, color, d_row, d_col, slide, moves);
    }
}

/// Walks one ray outward. Empty squares are added and the walk continues
/// (if sliding); an enemy square is added and ends the ray; a friendly square
/// ends the ray without being added.
fn walk(
    board: &Board,
    from: Position,
    color: Color,
    d_row: i8,
    d_col: i8,
    slide: bool,
    moves: &mut Vec<ChessMove>,
) {
    let mut current = from;
    while let Some(next) = current.offset(d_row, d_col) {
        match board.piece(next) {
            None => moves.push(ChessMove::new(from, next, None)),
            Some(occupant) => {
                if occupant.color != color {
                    moves.push(ChessMove::new(from, next, None));
                }
                break;
            }
        }

        if !slide {
            break;
        }
        current = next;
    }
}

fn pawn_moves(board: &Board, from: Position, color: Color, moves: &mut Vec<ChessMove>) {
    let forward = color.forward();

    if let Some(one_step) = from.offset(forward, 0) {
        if board.piece(one_step).is_none() {
            push_pawn_move(from, one_step, color, moves);

            if from.row == color.pawn_home_row() {
                if let Some(two_step) = one_step.offset(forward, 0) {
                    if board.piece(two_step).is_none() {
                        moves.push(ChessMove::new(from, two_step, None));
                    }
                }
            }
        }
    }

    for d_col in [-1, 1] {
        if let Some(target) = from.offset(forward, d_col) {
            if matches!(board.piece(target), Some(occupant) if occupant.color != color) {
                push_pawn_move(from, target, color, moves);
            }
        }
    }
}

/// Adds a pawn move, expanding it into the four promotion choices on the far rank
fn push_pawn_move(from: Position, to: Position, color: Color, moves: &mut Vec<ChessMove>) {
    if to.row == color.promotion_row() {
        moves.extend(
            PieceType::PROMOTIONS
                .iter()
                .map(|&promotion| ChessMove::new(from, to, Some(promotion))),
        );
    } else {
        moves.push(ChessMove::new(from, to, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pos(row: i8, col: i8) -> Position {
        Position::new(row, col)
    }

    fn ends(moves: &[ChessMove]) -> HashSet<Position> {
        moves.iter().map(|m| m.end).collect()
    }

    fn board_with(pieces: &[(Position, Color, PieceType)]) -> Board {
        let mut board = Board::empty();
        for &(p, color, piece_type) in pieces {
            board.place(p, Some(Piece::new(color, piece_type)));
        }
        board
    }

    #[test]
    fn test_rook_on_empty_board() {
        let board = board_with(&[(pos(4, 4), Color::White, PieceType::Rook)]);
        let moves = piece_moves(&board, pos(4, 4), Piece::new(Color::White, PieceType::Rook));

        assert_eq!(moves.len(), 14);
        assert!(ends(&moves).contains(&pos(4, 1)));
        assert!(ends(&moves).contains(&pos(8, 4)));
    }

    #[test]
    fn test_bishop_stops_at_blockers() {
        let board = board_with(&[
            (pos(4, 4), Color::White, PieceType::Bishop),
            (pos(6, 6), Color::White, PieceType::Pawn),
            (pos(2, 2), Color::Black, PieceType::Pawn),
        ]);
        let moves = piece_moves(&board, pos(4, 4), Piece::new(Color::White, PieceType::Bishop));
        let targets = ends(&moves);

        assert!(targets.contains(&pos(5, 5)));
        assert!(!targets.contains(&pos(6, 6)));
        assert!(!targets.contains(&pos(7, 7)));
        assert!(targets.contains(&pos(3, 3)));
        assert!(targets.contains(&pos(2, 2)));
        assert!(!targets.contains(&pos(1, 1)));
    }

    #[test]
    fn test_queen_combines_rook_and_bishop() {
        let board = board_with(&[(pos(4, 4), Color::Black, PieceType::Queen)]);
        let moves = piece_moves(&board, pos(4, 4), Piece::new(Color::Black, PieceType::Queen));
        assert_eq!(moves.len(), 27);
    }

    #[test]
    fn test_king_single_steps() {
        let board = board_with(&[(pos(1, 1), Color::White, PieceType::King)]);
        let moves = piece_moves(&board, pos(1, 1), Piece::new(Color::White, PieceType::King));
        assert_eq!(ends(&moves), HashSet::from([pos(1, 2), pos(2, 1), pos(2, 2)]));
    }

    #[test]
    fn test_knight_jumps_over_pieces() {
        let board = Board::starting_position();
        let moves = piece_moves(&board, pos(1, 2), Piece::new(Color::White, PieceType::Knight));
        assert_eq!(ends(&moves), HashSet::from([pos(3, 1), pos(3, 3)]));
    }

    #[test]
    fn test_pawn_initial_double_step() {
        let board = Board::starting_position();
        let moves = piece_moves(&board, pos(2, 5), Piece::new(Color::White, PieceType::Pawn));
        assert_eq!(ends(&moves), HashSet::from([pos(3, 5), pos(4, 5)]));

        let moves = piece_moves(&board, pos(7, 5), Piece::new(Color::Black, PieceType::Pawn));
        assert_eq!(ends(&moves), HashSet::from([pos(6, 5), pos(5, 5)]));
    }

    #[test]
    fn test_pawn_blocked() {
        let board = board_with(&[
            (pos(2, 5), Color::White, PieceType::Pawn),
            (pos(3, 5), Color::Black, PieceType::Knight),
        ]);
        let moves = piece_moves(&board, pos(2, 5), Piece::new(Color::White, PieceType::Pawn));
        assert!(moves.is_empty());

        let board = board_with(&[
            (pos(2, 5), Color::White, PieceType::Pawn),
            (pos(4, 5), Color::Black, PieceType::Knight),
        ]);
        let moves = piece_moves(&board, pos(2, 5), Piece::new(Color::White, PieceType::Pawn));
        assert_eq!(ends(&moves), HashSet::from([pos(3, 5)]));
    }

    #[test]
    fn test_pawn_captures_only_enemies() {
        let board = board_with(&[
            (pos(4, 4), Color::White, PieceType::Pawn),
            (pos(5, 3), Color::Black, PieceType::Rook),
            (pos(5, 5), Color::White, PieceType::Rook),
        ]);
        let moves = piece_moves(&board, pos(4, 4), Piece::new(Color::White, PieceType::Pawn));
        assert_eq!(ends(&moves), HashSet::from([pos(5, 4), pos(5, 3)]));
    }

    #[test]
    fn test_pawn_promotion_expands_to_four() {
        let board = board_with(&[
            (pos(7, 2), Color::White, PieceType::Pawn),
            (pos(8, 1), Color::Black, PieceType::Rook),
        ]);
        let moves = piece_moves(&board, pos(7, 2), Piece::new(Color::White, PieceType::Pawn));

        assert_eq!(moves.len(), 8);
        assert!(moves.iter().all(|m| m.promotion.is_some()));
        for target in [pos(8, 2), pos(8, 1)] {
            let promotions: HashSet<_> = moves
                .iter()
                .filter(|m| m.end == target)
                .filter_map(|m| m.promotion)
                .collect();
            assert_eq!(promotions, HashSet::from(PieceType::PROMOTIONS));
        }
    }

    #[test]
    fn test_black_pawn_promotes_on_row_one() {
        let board = board_with(&[(pos(2, 8), Color::Black, PieceType::Pawn)]);
        let moves = piece_moves(&board, pos(2, 8), Piece::new(Color::Black, PieceType::Pawn));
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(|m| m.end == pos(1, 8) && m.promotion.is_some()));
    }

    #[test]
    fn test_generated_moves_stay_on_board() {
        let board = Board::starting_position();
        for piece_type in [
            PieceType::King,
            PieceType::Queen,
            PieceType::Rook,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Pawn,
        ] {
            for from in Position::all() {
                let mut scratch = board.copy();
                let piece = Piece::new(Color::White, piece_type);
                scratch.place(from, Some(piece));
                for m in piece_moves(&scratch, from, piece) {
                    assert!(m.is_on_board(), "{:?} left the board", m);
                }
            }
        }
    }

    #[test]
    fn test_move_equality_includes_promotion() {
        let plain = ChessMove::new(pos(7, 1), pos(8, 1), None);
        let queen = ChessMove::new(pos(7, 1), pos(8, 1), Some(PieceType::Queen));
        assert_ne!(plain, queen);
        assert_eq!(queen, ChessMove::new(pos(7, 1), pos(8, 1), Some(PieceType::Queen)));
    }
}
