//! The game session: one human against the engine

use chess::{ChessMove, Color, Piece, Square};
use log::{info, warn};

use crate::engine::coordinator::{AnalysisCoordinator, AnalysisRequest, AnalysisResponse, Delivery, Phase};
use crate::engine::protocol::{EngineReply, Evaluation};
use crate::error::{EngineError, ErrorKind};
use crate::game::applier::{try_move, MoveOutcome};
use crate::game::position::Position;
use crate::game::rules::{is_promotion_eligible, legal_targets, Rules, StandardRules};
use crate::game::state::GameState;
use crate::game::status::{derive_status, Status};

/// What became of a user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureOutcome {
    pub accepted: bool,
    /// Engine request to send, when the move handed the turn to the engine.
    pub request: Option<AnalysisRequest>,
}

impl GestureOutcome {
    fn rejected() -> Self {
        Self {
            accepted: false,
            request: None,
        }
    }
}

/// Owns the game state for one human player and drives the engine's turns.
///
/// Every operation takes `&mut self` and returns the engine request (if any) the
/// caller must dispatch; the session itself performs no I/O.
pub struct Session<R: Rules = StandardRules> {
    rules: R,
    human_color: Color,
    state: GameState,
    coordinator: AnalysisCoordinator,
    status: Status,
    evaluation: Option<Evaluation>,
    last_error: Option<ErrorKind>,
    last_move: Option<ChessMove>,
    /// Set when the engine reported it has no move to play.
    engine_finished: bool,
}

impl Session<StandardRules> {
    /// New game from the standard starting position.
    pub fn new(human_color: Color) -> Self {
        Self::with_rules(StandardRules, human_color, Position::default())
    }

    pub fn from_position(human_color: Color, position: Position) -> Self {
        Self::with_rules(StandardRules, human_color, position)
    }
}

impl<R: Rules> Session<R> {
    pub fn with_rules(rules: R, human_color: Color, position: Position) -> Self {
        let state = GameState::from_position(&rules, position);
        let status = derive_status(&rules, &state, human_color);
        info!("New session: human plays {:?} from {}", human_color, position);
        Self {
            rules,
            human_color,
            state,
            coordinator: AnalysisCoordinator::new(),
            status,
            evaluation: None,
            last_error: None,
            last_move: None,
            engine_finished: false,
        }
    }

    /// Kick off the game: when the engine moves first this is its first request.
    pub fn begin(&mut self) -> Option<AnalysisRequest> {
        self.status = derive_status(&self.rules, &self.state, self.human_color);
        self.maybe_request()
    }

    pub fn current_position(&self) -> &Position {
        self.state.position()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn status_text(&self) -> String {
        self.status.to_string()
    }

    pub fn evaluation(&self) -> Option<Evaluation> {
        self.evaluation
    }

    /// The board is drawn from the human's side.
    pub fn board_orientation(&self) -> Color {
        self.human_color
    }

    pub fn human_color(&self) -> Color {
        self.human_color
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn last_move(&self) -> Option<ChessMove> {
        self.last_move
    }

    pub fn pending_request(&self) -> Option<&AnalysisRequest> {
        self.coordinator.pending()
    }

    pub fn analysis_phase(&self) -> Phase {
        self.coordinator.phase()
    }

    pub fn is_human_turn(&self) -> bool {
        self.rules.turn(self.state.position()) == self.human_color
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over() || self.engine_finished
    }

    /// Legal targets for the human's piece on `from`; empty when it is not their turn.
    pub fn legal_targets(&self, from: Square) -> Vec<Square> {
        if self.is_over() || !self.is_human_turn() {
            return Vec::new();
        }
        legal_targets(self.state.position(), from)
    }

    /// Handle a drag/drop from the board.
    ///
    /// A pawn reaching its last rank promotes to a queen unless `promotion` says otherwise.
    pub fn on_user_gesture(&mut self, from: Square, to: Square, promotion: Option<Piece>) -> GestureOutcome {
        if self.is_over() || !self.is_human_turn() {
            info!("Ignoring gesture {}{}: not the human's turn", from, to);
            return GestureOutcome::rejected();
        }

        let promotion = match promotion {
            Some(piece) => Some(piece),
            None if is_promotion_eligible(self.state.position(), from, to) => Some(Piece::Queen),
            None => None,
        };
        let mv = ChessMove::new(from, to, promotion);

        match try_move(&self.rules, &self.state, mv) {
            MoveOutcome::Accepted(next) => {
                info!("Human played {}", mv);
                self.commit(next, mv);
                GestureOutcome {
                    accepted: true,
                    request: self.maybe_request(),
                }
            }
            MoveOutcome::Rejected => {
                self.status = Status::IllegalMove;
                GestureOutcome::rejected()
            }
        }
    }

    /// Apply an engine response if it still concerns the current position.
    ///
    /// Returns the follow-up request when the engine is to move again.
    pub fn on_engine_response(&mut self, response: AnalysisResponse) -> Option<AnalysisRequest> {
        let seq = response.request.seq();
        let result = match self.coordinator.receive(response, self.state.position()) {
            Delivery::Current(result) => result,
            Delivery::Stale => {
                self.refresh_status();
                return None;
            }
        };

        match result {
            Ok(EngineReply {
                best_move: Some(mv),
                evaluation,
            }) => match try_move(&self.rules, &self.state, mv) {
                MoveOutcome::Accepted(next) => {
                    info!("Engine played {} (request #{})", mv, seq);
                    self.commit(next, mv);
                    if evaluation.is_some() {
                        self.evaluation = evaluation;
                    }
                }
                MoveOutcome::Rejected => {
                    warn!("Engine proposed illegal move {} in {}", mv, self.state.position());
                    self.fail(EngineError::Protocol(format!("illegal move {mv}")));
                }
            },
            Ok(EngineReply { best_move: None, .. }) => {
                info!("Engine has no move in {}", self.state.position());
                self.engine_finished = true;
                self.status = Status::GameOver;
            }
            Err(e) => self.fail(e),
        }

        self.coordinator.settle();
        if self.last_error.is_some() {
            return None;
        }
        self.maybe_request()
    }

    /// Ask the engine again after a failed request.
    pub fn retry_analysis(&mut self) -> Option<AnalysisRequest> {
        if self.last_error.is_none() || self.coordinator.phase() != Phase::Idle {
            return None;
        }
        self.last_error = None;
        let request = self.maybe_request();
        if request.is_none() {
            self.status = derive_status(&self.rules, &self.state, self.human_color);
        }
        request
    }

    /// Replace the game with `position` (for example one pasted as FEN).
    ///
    /// Any request in flight becomes stale.
    pub fn load_position(&mut self, position: Position) -> Option<AnalysisRequest> {
        info!("Loading position {}", position);
        self.coordinator.reset();
        self.state = GameState::from_position(&self.rules, position);
        self.evaluation = None;
        self.last_error = None;
        self.last_move = None;
        self.engine_finished = false;
        self.status = derive_status(&self.rules, &self.state, self.human_color);
        self.maybe_request()
    }

    fn commit(&mut self, next: GameState, mv: ChessMove) {
        self.state = next;
        self.last_move = Some(mv);
        self.last_error = None;
        self.status = derive_status(&self.rules, &self.state, self.human_color);
    }

    /// Re-derive the status unless an engine failure or "Game over" is on display.
    fn refresh_status(&mut self) {
        if self.last_error.is_none() && !self.engine_finished {
            self.status = derive_status(&self.rules, &self.state, self.human_color);
        }
    }

    fn fail(&mut self, error: EngineError) {
        warn!("Engine request failed: {}", error);
        self.last_error = Some(error.kind());
        self.status = match error {
            EngineError::Transport(_) => Status::ConnectionFailure,
            EngineError::Protocol(_) => Status::EngineFailure,
        };
    }

    fn maybe_request(&mut self) -> Option<AnalysisRequest> {
        if self.engine_finished || !AnalysisCoordinator::should_request(&self.rules, &self.state, self.human_color) {
            return None;
        }
        let request = self.coordinator.issue(*self.state.position());
        self.status = Status::ComputerThinking;
        Some(request)
    }
}
