use serde::Serialize;

use crate::game::position::Position;
use crate::game::rules::Rules;

/// Classification of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Check,
    Checkmate,
    Draw,
}

impl Outcome {
    /// Checkmate and draw end the game; check does not.
    pub fn is_terminal(self) -> bool {
        matches!(self, Outcome::Checkmate | Outcome::Draw)
    }
}

/// A position together with its outcome.
///
/// The outcome is derived from the position when the state is built and cannot be
/// set any other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    position: Position,
    outcome: Outcome,
}

impl GameState {
    pub fn from_position<R: Rules + ?Sized>(rules: &R, position: Position) -> Self {
        Self {
            position,
            outcome: classify(rules, &position),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_terminal()
    }
}

/// Checkmate is tested before check since a mated king is also in check.
pub fn classify<R: Rules + ?Sized>(rules: &R, position: &Position) -> Outcome {
    if rules.is_checkmate(position) {
        Outcome::Checkmate
    } else if rules.is_draw(position) {
        Outcome::Draw
    } else if rules.is_check(position) {
        Outcome::Check
    } else {
        Outcome::InProgress
    }
}
