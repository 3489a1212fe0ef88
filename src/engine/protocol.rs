//! JSON payloads exchanged with the engine service

use chess::{ChessMove, Color};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;
use crate::game::{parse_promotion, parse_square};

/// Body of `POST /analyze` and `POST /best_move`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeRequest {
    pub fen: String,
}

/// A move on the wire: either UCI text ("e7e5", "a7a8q") or explicit squares.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum WireMove {
    Uci(String),
    Squares {
        from: String,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promotion: Option<String>,
    },
}

impl WireMove {
    pub fn to_chess_move(&self) -> Result<ChessMove, EngineError> {
        let (from, to, promotion) = match self {
            WireMove::Uci(uci) => {
                let uci = uci.trim();
                if !uci.is_ascii() || !(4..=5).contains(&uci.len()) {
                    return Err(EngineError::Protocol(format!("malformed move {:?}", uci)));
                }
                let promotion = if uci.len() == 5 { Some(&uci[4..]) } else { None };
                (&uci[0..2], &uci[2..4], promotion)
            }
            WireMove::Squares { from, to, promotion } => (from.as_str(), to.as_str(), promotion.as_deref()),
        };

        let source = parse_square(from).ok_or_else(|| EngineError::Protocol(format!("bad square {:?}", from)))?;
        let dest = parse_square(to).ok_or_else(|| EngineError::Protocol(format!("bad square {:?}", to)))?;
        let promotion = match promotion {
            Some(code) => Some(
                parse_promotion(code)
                    .ok_or_else(|| EngineError::Protocol(format!("bad promotion piece {:?}", code)))?,
            ),
            None => None,
        };
        Ok(ChessMove::new(source, dest, promotion))
    }
}

/// Mate distance, written "M<n>" on the wire. Negative means Black mates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MateIn(pub i32);

impl TryFrom<String> for MateIn {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .strip_prefix('M')
            .and_then(|n| n.parse().ok())
            .map(MateIn)
            .ok_or_else(|| format!("invalid mate score {:?}", value))
    }
}

impl From<MateIn> for String {
    fn from(mate: MateIn) -> Self {
        format!("M{}", mate.0)
    }
}

/// Engine score from White's point of view: positive favours White.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Evaluation {
    Pawns(f64),
    Mate(MateIn),
}

impl Evaluation {
    /// Convert a UCI score, which is relative to `side_to_move`, to White's view.
    pub fn from_uci(cp: Option<i32>, mate: Option<i32>, side_to_move: Color) -> Self {
        let sign = match side_to_move {
            Color::White => 1,
            Color::Black => -1,
        };
        match (mate, cp) {
            (Some(m), _) => Evaluation::Mate(MateIn(m * sign)),
            (None, Some(cp)) => Evaluation::Pawns(f64::from(cp * sign) / 100.0),
            (None, None) => Evaluation::Pawns(0.0),
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Pawns(p) => write!(f, "{}", p),
            Evaluation::Mate(m) => write!(f, "M{}", m.0),
        }
    }
}

/// Body returned by the engine service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub best_move: Option<WireMove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
}

impl AnalyzeResponse {
    pub fn into_reply(self) -> Result<EngineReply, EngineError> {
        let best_move = match self.best_move {
            Some(WireMove::Uci(ref s)) if s.is_empty() => None,
            Some(wire) => Some(wire.to_chess_move()?),
            None => None,
        };
        Ok(EngineReply {
            best_move,
            evaluation: self.evaluation,
        })
    }
}

/// Decoded engine answer for one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineReply {
    /// `None` when the engine has no legal reply.
    pub best_move: Option<ChessMove>,
    pub evaluation: Option<Evaluation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{Piece, Square};

    #[test]
    fn test_decode_uci_response() {
        let body = r#"{"best_move": "e7e5", "evaluation": 0.2, "fen": "x"}"#;
        let reply = serde_json::from_str::<AnalyzeResponse>(body).unwrap().into_reply().unwrap();
        assert_eq!(reply.best_move, Some(ChessMove::new(Square::E7, Square::E5, None)));
        assert_eq!(reply.evaluation, Some(Evaluation::Pawns(0.2)));
    }

    #[test]
    fn test_decode_structured_move_with_promotion() {
        let body = r#"{"best_move": {"from": "a7", "to": "a8", "promotion": "q"}, "evaluation": "M2"}"#;
        let reply = serde_json::from_str::<AnalyzeResponse>(body).unwrap().into_reply().unwrap();
        assert_eq!(
            reply.best_move,
            Some(ChessMove::new(Square::A7, Square::A8, Some(Piece::Queen)))
        );
        assert_eq!(reply.evaluation, Some(Evaluation::Mate(MateIn(2))));
    }

    #[test]
    fn test_missing_best_move_means_no_reply() {
        for body in [r#"{}"#, r#"{"best_move": null}"#, r#"{"best_move": ""}"#] {
            let reply = serde_json::from_str::<AnalyzeResponse>(body).unwrap().into_reply().unwrap();
            assert_eq!(reply.best_move, None, "body {}", body);
        }
    }

    #[test]
    fn test_malformed_move_is_protocol_error() {
        let response = AnalyzeResponse {
            best_move: Some(WireMove::Uci("e9e5".into())),
            ..Default::default()
        };
        assert!(matches!(response.into_reply(), Err(EngineError::Protocol(_))));

        let response = AnalyzeResponse {
            best_move: Some(WireMove::Uci("a7a8x".into())),
            ..Default::default()
        };
        assert!(matches!(response.into_reply(), Err(EngineError::Protocol(_))));
    }

    #[test]
    fn test_negative_mate_round_trip() {
        let json = serde_json::to_string(&Evaluation::Mate(MateIn(-3))).unwrap();
        assert_eq!(json, r#""M-3""#);
        assert_eq!(Evaluation::from_uci(Some(35), None, Color::White), Evaluation::Pawns(0.35));
        assert_eq!(Evaluation::from_uci(None, Some(-3), Color::White).to_string(), "M-3");
    }

    #[test]
    fn test_black_to_move_score_is_flipped() {
        assert_eq!(Evaluation::from_uci(Some(35), None, Color::Black), Evaluation::Pawns(-0.35));
        assert_eq!(Evaluation::from_uci(None, Some(2), Color::Black), Evaluation::Mate(MateIn(-2)));
        assert_eq!(Evaluation::from_uci(None, Some(-4), Color::Black).to_string(), "M4");
    }
}
