use chess::ChessMove;
use serde::{Deserialize, Serialize};

use crate::engine::protocol::Evaluation;
use crate::game::{color_to_string, promotion_code};
use crate::session::Session;

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ClientMessage {
    pub message_type: String,
    pub move_from: Option<String>,
    pub move_to: Option<String>,
    pub promote_to: Option<String>,
    pub color_preference: Option<String>,
    pub fen: Option<String>,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ServerMessage {
    pub message_type: String,
    pub session_id: Option<String>,
    pub fen: Option<String>,
    /// The human's color, which is also the board orientation.
    pub color: Option<String>,
    pub status: Option<String>,
    pub status_kind: Option<String>,
    pub evaluation: Option<Evaluation>,
    pub last_move: Option<LastMove>,
    pub available_moves: Option<Vec<String>>,
    pub accepted: Option<bool>,
    pub error: Option<String>,
}

/// Last move information
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LastMove {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

impl From<ChessMove> for LastMove {
    fn from(mv: ChessMove) -> Self {
        Self {
            from: mv.get_source().to_string(),
            to: mv.get_dest().to_string(),
            promotion: mv.get_promotion().map(|piece| promotion_code(piece).to_string()),
        }
    }
}

impl ServerMessage {
    /// Everything a client needs to redraw the board.
    pub fn snapshot(message_type: &str, session_id: &str, session: &Session) -> Self {
        Self {
            message_type: message_type.to_string(),
            session_id: Some(session_id.to_string()),
            fen: Some(session.current_position().to_string()),
            color: Some(color_to_string(session.board_orientation())),
            status: Some(session.status_text()),
            status_kind: Some(session.status().kind().to_string()),
            evaluation: session.evaluation(),
            last_move: session.last_move().map(LastMove::from),
            ..Self::default()
        }
    }

    pub fn error(session_id: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            message_type: "error".to_string(),
            session_id: session_id.map(str::to_string),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{Color, Piece, Square};
    use serde_json::json;

    #[test]
    fn test_client_message_partial_fields() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"message_type":"move","move_from":"e2","move_to":"e4"}"#).unwrap();
        assert_eq!(msg.message_type, "move");
        assert_eq!(msg.move_from.as_deref(), Some("e2"));
        assert_eq!(msg.promote_to, None);
    }

    #[test]
    fn test_snapshot_of_new_session() {
        let session = Session::new(Color::Black);
        let msg = ServerMessage::snapshot("game_started", "abc", &session);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["session_id"], "abc");
        assert_eq!(value["color"], "black");
        assert_eq!(value["status"], "Computer is thinking...");
        assert_eq!(value["status_kind"], "computer_thinking");
        assert_eq!(value["evaluation"], serde_json::Value::Null);
        assert_eq!(value["fen"], "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    }

    #[test]
    fn test_last_move_carries_promotion() {
        let last = LastMove::from(ChessMove::new(Square::A7, Square::A8, Some(Piece::Queen)));
        assert_eq!(
            serde_json::to_value(last).unwrap(),
            json!({ "from": "a7", "to": "a8", "promotion": "q" })
        );
    }
}
