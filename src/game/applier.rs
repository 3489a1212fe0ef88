use chess::ChessMove;
use log::debug;

use crate::game::rules::Rules;
use crate::game::state::GameState;

/// Result of offering a move to the current game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted(GameState),
    Rejected,
}

impl MoveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted(_))
    }
}

/// Validate `mv` against `state` and build the successor state.
///
/// Nothing outside the returned value changes; committing it is up to the caller.
pub fn try_move<R: Rules + ?Sized>(rules: &R, state: &GameState, mv: ChessMove) -> MoveOutcome {
    match rules.apply_move(state.position(), mv) {
        Ok(position) => MoveOutcome::Accepted(GameState::from_position(rules, position)),
        Err(e) => {
            debug!("Rejected {}: {}", mv, e);
            MoveOutcome::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IllegalMove;
    use crate::game::position::Position;
    use crate::game::rules::StandardRules;
    use crate::game::state::Outcome;
    use chess::{Color, Square};

    /// Accepts every move and answers the outcome queries with fixed flags.
    struct FixedRules {
        checkmate: bool,
        draw: bool,
        check: bool,
    }

    impl Rules for FixedRules {
        fn apply_move(&self, position: &Position, mv: ChessMove) -> Result<Position, IllegalMove> {
            StandardRules.apply_move(position, mv)
        }

        fn turn(&self, position: &Position) -> Color {
            position.side_to_move()
        }

        fn is_checkmate(&self, _: &Position) -> bool {
            self.checkmate
        }

        fn is_draw(&self, _: &Position) -> bool {
            self.draw
        }

        fn is_check(&self, _: &Position) -> bool {
            self.check
        }
    }

    fn e2e4() -> ChessMove {
        ChessMove::new(Square::E2, Square::E4, None)
    }

    fn outcome_with(checkmate: bool, draw: bool, check: bool) -> Outcome {
        let rules = FixedRules { checkmate, draw, check };
        let state = GameState::from_position(&StandardRules, Position::default());
        match try_move(&rules, &state, e2e4()) {
            MoveOutcome::Accepted(next) => next.outcome(),
            MoveOutcome::Rejected => panic!("move should be accepted"),
        }
    }

    #[test]
    fn test_outcome_precedence() {
        assert_eq!(outcome_with(true, true, true), Outcome::Checkmate);
        assert_eq!(outcome_with(true, false, true), Outcome::Checkmate);
        assert_eq!(outcome_with(false, true, true), Outcome::Draw);
        assert_eq!(outcome_with(false, false, true), Outcome::Check);
        assert_eq!(outcome_with(false, false, false), Outcome::InProgress);
    }

    #[test]
    fn test_accepts_legal_move() {
        let state = GameState::from_position(&StandardRules, Position::default());
        let outcome = try_move(&StandardRules, &state, e2e4());
        let next = match outcome {
            MoveOutcome::Accepted(next) => next,
            MoveOutcome::Rejected => panic!("e2e4 is legal"),
        };
        assert_eq!(next.outcome(), Outcome::InProgress);
        assert_eq!(next.position().side_to_move(), Color::Black);
        assert_eq!(
            next.position().to_string(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_rejects_illegal_move_without_touching_state() {
        let state = GameState::from_position(&StandardRules, Position::default());
        let before = state;
        let outcome = try_move(&StandardRules, &state, ChessMove::new(Square::E2, Square::E5, None));
        assert_eq!(outcome, MoveOutcome::Rejected);
        assert!(!outcome.is_accepted());
        assert_eq!(state, before);
    }
}
