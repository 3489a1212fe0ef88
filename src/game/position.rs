use chess::{Board, ChessMove, Color, Piece};
use std::fmt;
use std::str::FromStr;

use crate::error::InvalidFen;

/// Full board state: placement, side to move, castling and en passant rights
/// (held by the `chess` board) plus the move clocks FEN carries.
///
/// Positions are values. Applying a move yields a new one.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    pub fn new(board: Board, halfmove_clock: u32, fullmove_number: u32) -> Self {
        Self {
            board,
            halfmove_clock,
            fullmove_number: fullmove_number.max(1),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Position after `mv`. Legality is the caller's concern.
    pub(crate) fn after(&self, mv: ChessMove) -> Position {
        let mover = self.board.side_to_move();
        let irreversible = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();

        Position {
            board: self.board.make_move_new(mv),
            halfmove_clock: if irreversible { 0 } else { self.halfmove_clock.saturating_add(1) },
            fullmove_number: match mover {
                Color::White => self.fullmove_number,
                Color::Black => self.fullmove_number.saturating_add(1),
            },
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(Board::default(), 0, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The board's own FEN always ends in "0 1"; swap in the real clocks.
        let fen = self.board.to_string();
        let fields: Vec<&str> = fen.split_whitespace().take(4).collect();
        write!(
            f,
            "{} {} {}",
            fields.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self)
    }
}

impl FromStr for Position {
    type Err = InvalidFen;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidFen(s.to_string());
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(invalid());
        }

        let board = Board::from_str(&format!("{} 0 1", fields[..4].join(" "))).map_err(|_| invalid())?;
        let halfmove_clock = match fields.get(4) {
            Some(v) => v.parse().map_err(|_| invalid())?,
            None => 0,
        };
        let fullmove_number = match fields.get(5) {
            Some(v) => v.parse::<u32>().map_err(|_| invalid())?,
            None => 1,
        };
        if fullmove_number == 0 {
            return Err(invalid());
        }

        Ok(Self::new(board, halfmove_clock, fullmove_number))
    }
}
