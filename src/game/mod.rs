//! Chess rules, game state and status text for a single session

pub mod applier;
pub mod position;
pub mod rules;
pub mod state;
pub mod status;

use chess::{Color, Piece, Square};
use std::str::FromStr;

pub use applier::{try_move, MoveOutcome};
pub use position::Position;
pub use rules::{Rules, StandardRules};
pub use state::{GameState, Outcome};
pub use status::{derive_status, Status};

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Capitalized color name used in status text.
pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Parse "white"/"black" (or "w"/"b"), case-insensitive.
pub fn parse_color(value: &str) -> Option<Color> {
    match value.to_ascii_lowercase().as_str() {
        "white" | "w" => Some(Color::White),
        "black" | "b" => Some(Color::Black),
        _ => None,
    }
}

/// Parse a square label such as "e4", case-insensitive.
pub fn parse_square(label: &str) -> Option<Square> {
    let label = label.trim().to_ascii_lowercase();
    if label.len() != 2 {
        return None;
    }
    Square::from_str(&label).ok()
}

/// Parse a promotion code: one of q, r, b, n (case-insensitive).
pub fn parse_promotion(code: &str) -> Option<Piece> {
    match code.trim().to_ascii_lowercase().as_str() {
        "q" => Some(Piece::Queen),
        "r" => Some(Piece::Rook),
        "b" => Some(Piece::Bishop),
        "n" => Some(Piece::Knight),
        _ => None,
    }
}

pub fn promotion_code(piece: Piece) -> &'static str {
    match piece {
        Piece::Queen => "q",
        Piece::Rook => "r",
        Piece::Bishop => "b",
        Piece::Knight => "n",
        Piece::Pawn => "p",
        Piece::King => "k",
    }
}
