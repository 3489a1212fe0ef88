//! Error types shared by the session server and the engine service

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chess::ChessMove;
use serde_json::json;
use thiserror::Error;

/// Classification of the failures a session can run into.
///
/// Only `Transport` and `EngineProtocol` are ever recorded as a session's last error:
/// illegal moves stay inside the move applier and stale responses are only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IllegalMove,
    EngineProtocol,
    Transport,
    StaleResponse,
}

/// A move the rules refused for the given position.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal move {0}")]
pub struct IllegalMove(pub ChessMove);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid FEN: {0}")]
pub struct InvalidFen(pub String);

/// Failure talking to the engine service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Service unreachable, timed out, or answered with a non-success status.
    #[error("engine transport error: {0}")]
    Transport(String),

    /// Service answered but the payload or the proposed move is unusable.
    #[error("engine protocol error: {0}")]
    Protocol(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Transport(_) => ErrorKind::Transport,
            EngineError::Protocol(_) => ErrorKind::EngineProtocol,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Errors raised by the engine service HTTP endpoints.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidFen(#[from] InvalidFen),

    #[error("Stockfish error: {0}")]
    Stockfish(String),
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidFen(_) => StatusCode::BAD_REQUEST,
            ServiceError::Stockfish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ServiceError::Stockfish(msg) = self {
            log::error!("Engine failure: {}", msg);
        }
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}
