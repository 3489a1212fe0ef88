use chess::Color;
use std::fmt;

use crate::game::color_name;
use crate::game::rules::Rules;
use crate::game::state::{GameState, Outcome};

/// What the rendering surface shows above the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    YourMove,
    ComputerThinking,
    Check(Color),
    Checkmate { winner: Color },
    Draw,
    IllegalMove,
    /// The engine reported no legal reply.
    GameOver,
    /// The engine answered with something unusable.
    EngineFailure,
    /// The engine could not be reached.
    ConnectionFailure,
}

impl Status {
    /// Stable machine-readable tag for clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Status::YourMove => "your_move",
            Status::ComputerThinking => "computer_thinking",
            Status::Check(_) => "check",
            Status::Checkmate { .. } => "checkmate",
            Status::Draw => "draw",
            Status::IllegalMove => "illegal_move",
            Status::GameOver => "game_over",
            Status::EngineFailure => "engine_failure",
            Status::ConnectionFailure => "connection_failure",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::YourMove => f.write_str("Your move"),
            Status::ComputerThinking => f.write_str("Computer is thinking..."),
            Status::Check(side) => write!(f, "{} is in check!", color_name(*side)),
            Status::Checkmate { winner } => write!(f, "Checkmate! {} wins!", color_name(*winner)),
            Status::Draw => f.write_str("Game Over. It's a draw!"),
            Status::IllegalMove => f.write_str("Illegal move, try again"),
            Status::GameOver => f.write_str("Game over"),
            Status::EngineFailure => f.write_str("Error: Computer returned an invalid move"),
            Status::ConnectionFailure => f.write_str("Error: Failed to get computer move"),
        }
    }
}

/// Status for `state` as seen by the player holding `human_color`.
pub fn derive_status<R: Rules + ?Sized>(rules: &R, state: &GameState, human_color: Color) -> Status {
    let to_move = rules.turn(state.position());
    match state.outcome() {
        Outcome::Checkmate => Status::Checkmate { winner: !to_move },
        Outcome::Draw => Status::Draw,
        Outcome::Check => Status::Check(to_move),
        Outcome::InProgress if to_move == human_color => Status::YourMove,
        Outcome::InProgress => Status::ComputerThinking,
    }
}
