use chess::{BoardStatus, ChessMove, Color, MoveGen, Piece, Rank, Square, ALL_SQUARES, EMPTY};

use crate::error::IllegalMove;
use crate::game::position::Position;

/// Half-move clock value at which the fifty-move rule draws the game.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// The rules of chess as the session consumes them.
///
/// Implementations must be deterministic and must never mutate their inputs.
pub trait Rules {
    /// Plays `mv` on `position`, or rejects it when it is not legal there.
    fn apply_move(&self, position: &Position, mv: ChessMove) -> Result<Position, IllegalMove>;

    fn turn(&self, position: &Position) -> Color;

    fn is_checkmate(&self, position: &Position) -> bool;

    fn is_draw(&self, position: &Position) -> bool;

    fn is_check(&self, position: &Position) -> bool;
}

/// Standard chess backed by the `chess` crate's legal move generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl Rules for StandardRules {
    fn apply_move(&self, position: &Position, mv: ChessMove) -> Result<Position, IllegalMove> {
        if position.board().legal(mv) {
            Ok(position.after(mv))
        } else {
            Err(IllegalMove(mv))
        }
    }

    fn turn(&self, position: &Position) -> Color {
        position.side_to_move()
    }

    fn is_checkmate(&self, position: &Position) -> bool {
        position.board().status() == BoardStatus::Checkmate
    }

    fn is_draw(&self, position: &Position) -> bool {
        position.board().status() == BoardStatus::Stalemate
            || position.halfmove_clock() >= FIFTY_MOVE_PLIES
            || has_insufficient_material(position)
    }

    fn is_check(&self, position: &Position) -> bool {
        *position.board().checkers() != EMPTY
    }
}

/// True when a pawn of the side to move on `from` would land on its last rank.
pub fn is_promotion_eligible(position: &Position, from: Square, to: Square) -> bool {
    let board = position.board();
    let side = board.side_to_move();
    let last_rank = match side {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    };
    board.piece_on(from) == Some(Piece::Pawn) && board.color_on(from) == Some(side) && to.get_rank() == last_rank
}

/// Legal destination squares for the piece on `from`, promotions collapsed.
pub fn legal_targets(position: &Position, from: Square) -> Vec<Square> {
    let mut targets: Vec<Square> = MoveGen::new_legal(position.board())
        .filter(|m| m.get_source() == from)
        .map(|m| m.get_dest())
        .collect();
    targets.sort_by_key(|sq| sq.to_index());
    targets.dedup();
    targets
}

#[derive(Default)]
struct Material {
    minors: u32,
    majors_or_pawns: u32,
    bishop_square_colors: Vec<bool>,
}

/// Check if neither side has enough material left to deliver checkmate
pub fn has_insufficient_material(position: &Position) -> bool {
    let board = position.board();
    let mut white = Material::default();
    let mut black = Material::default();

    for square in ALL_SQUARES {
        let (piece, color) = match (board.piece_on(square), board.color_on(square)) {
            (Some(piece), Some(color)) => (piece, color),
            _ => continue,
        };
        let side = match color {
            Color::White => &mut white,
            Color::Black => &mut black,
        };
        match piece {
            Piece::Knight => side.minors += 1,
            Piece::Bishop => {
                side.minors += 1;
                let light = (square.get_rank().to_index() + square.get_file().to_index()) % 2 == 1;
                side.bishop_square_colors.push(light);
            }
            Piece::Pawn | Piece::Rook | Piece::Queen => side.majors_or_pawns += 1,
            Piece::King => {}
        }
    }

    if white.majors_or_pawns > 0 || black.majors_or_pawns > 0 {
        return false;
    }

    match (white.minors, black.minors) {
        // King vs king, or king and a single minor vs king
        (0, 0) | (1, 0) | (0, 1) => true,
        // King and bishop vs king and bishop with both bishops on the same color
        (1, 1) => {
            white.bishop_square_colors.len() == 1
                && black.bishop_square_colors.len() == 1
                && white.bishop_square_colors[0] == black.bishop_square_colors[0]
        }
        _ => false,
    }
}
