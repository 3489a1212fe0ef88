//! Lifecycle of engine requests for one session

use chess::Color;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::client::EngineClient;
use crate::engine::protocol::EngineReply;
use crate::error::EngineError;
use crate::game::position::Position;
use crate::game::rules::Rules;
use crate::game::state::GameState;

/// A request sent to the engine, tagged with the position it is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisRequest {
    fingerprint: Position,
    seq: u64,
}

impl AnalysisRequest {
    pub fn fingerprint(&self) -> &Position {
        &self.fingerprint
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn fen(&self) -> String {
        self.fingerprint.to_string()
    }
}

/// The engine's answer (or failure) for a given request.
#[derive(Debug, Clone)]
pub struct AnalysisResponse {
    pub request: AnalysisRequest,
    pub result: Result<EngineReply, EngineError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Requesting,
    Applying,
}

/// Whether a response may touch the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Current(Result<EngineReply, EngineError>),
    Stale,
}

#[derive(Debug, Clone)]
pub struct AnalysisCoordinator {
    phase: Phase,
    pending: Option<AnalysisRequest>,
    next_seq: u64,
}

impl Default for AnalysisCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisCoordinator {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pending: None,
            next_seq: 1,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> Option<&AnalysisRequest> {
        self.pending.as_ref()
    }

    /// The engine is owed a move when it is its turn and the game has not ended.
    pub fn should_request<R: Rules + ?Sized>(rules: &R, state: &GameState, human_color: Color) -> bool {
        !state.is_over() && rules.turn(state.position()) != human_color
    }

    /// Start a request for `position`. Any earlier pending request is superseded.
    pub fn issue(&mut self, position: Position) -> AnalysisRequest {
        let request = AnalysisRequest {
            fingerprint: position,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        if let Some(previous) = self.pending.replace(request) {
            debug!("Request #{} superseded by #{}", previous.seq, request.seq);
        }
        self.phase = Phase::Requesting;
        info!("Requesting engine move #{} for {}", request.seq, position);
        request
    }

    /// Forget the pending request; its response will arrive as stale.
    pub fn reset(&mut self) {
        if let Some(previous) = self.pending.take() {
            debug!("Request #{} abandoned", previous.seq);
        }
        self.phase = Phase::Idle;
    }

    /// Currency check: only a response about `current` may be applied.
    pub fn receive(&mut self, response: AnalysisResponse, current: &Position) -> Delivery {
        let seq = response.request.seq;
        let was_pending = self.pending.map(|p| p.seq) == Some(seq);

        if response.request.fingerprint != *current {
            debug!(
                "Discarding stale engine response #{} for {} (now at {})",
                seq, response.request.fingerprint, current
            );
            if was_pending {
                self.pending = None;
                self.phase = Phase::Idle;
            }
            return Delivery::Stale;
        }

        if was_pending {
            self.pending = None;
        }
        self.phase = Phase::Applying;
        Delivery::Current(response.result)
    }

    /// Leave `Applying` once the response has been handled.
    pub fn settle(&mut self) {
        if self.phase == Phase::Applying {
            self.phase = if self.pending.is_some() { Phase::Requesting } else { Phase::Idle };
        }
    }
}

/// Timeout and retry rules wrapped around every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisPolicy {
    pub timeout: Duration,
    /// Extra attempts after a transport failure; protocol errors are never retried.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 0,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Run `request` against `client` under `policy`.
pub async fn dispatch(
    client: Arc<dyn EngineClient>,
    request: AnalysisRequest,
    policy: AnalysisPolicy,
) -> AnalysisResponse {
    let fen = request.fen();
    let mut attempt = 0;

    let result = loop {
        let outcome = match tokio::time::timeout(policy.timeout, client.analyze(&fen)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(EngineError::Transport(format!("timed out after {:?}", policy.timeout))),
        };

        match outcome {
            Err(EngineError::Transport(msg)) if attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    "Engine request #{} failed ({}), retry {}/{}",
                    request.seq, msg, attempt, policy.max_retries
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            other => break other,
        }
    };

    AnalysisResponse { request, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::StandardRules;
    use async_trait::async_trait;
    use chess::{ChessMove, Square};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn reply() -> EngineReply {
        EngineReply {
            best_move: Some(ChessMove::new(Square::E7, Square::E5, None)),
            evaluation: None,
        }
    }

    fn after_e4() -> Position {
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".parse().unwrap()
    }

    #[test]
    fn test_issue_and_receive_current() {
        let mut coordinator = AnalysisCoordinator::new();
        let request = coordinator.issue(after_e4());
        assert_eq!(coordinator.phase(), Phase::Requesting);
        assert_eq!(coordinator.pending(), Some(&request));

        let delivery = coordinator.receive(
            AnalysisResponse {
                request,
                result: Ok(reply()),
            },
            &after_e4(),
        );
        assert_eq!(delivery, Delivery::Current(Ok(reply())));
        assert_eq!(coordinator.phase(), Phase::Applying);
        assert!(coordinator.pending().is_none());

        coordinator.settle();
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut coordinator = AnalysisCoordinator::new();
        let request = coordinator.issue(after_e4());
        let delivery = coordinator.receive(
            AnalysisResponse {
                request,
                result: Ok(reply()),
            },
            &Position::default(),
        );
        assert_eq!(delivery, Delivery::Stale);
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[test]
    fn test_superseded_request_keeps_newer_pending() {
        let mut coordinator = AnalysisCoordinator::new();
        let old = coordinator.issue(after_e4());
        let newer = coordinator.issue(Position::default());
        assert!(newer.seq() > old.seq());

        let delivery = coordinator.receive(
            AnalysisResponse {
                request: old,
                result: Ok(reply()),
            },
            &Position::default(),
        );
        assert_eq!(delivery, Delivery::Stale);
        assert_eq!(coordinator.phase(), Phase::Requesting);
        assert_eq!(coordinator.pending(), Some(&newer));
    }

    #[test]
    fn test_reset_abandons_pending_request() {
        let mut coordinator = AnalysisCoordinator::new();
        let request = coordinator.issue(after_e4());
        coordinator.reset();
        assert_eq!(coordinator.phase(), Phase::Idle);
        assert!(coordinator.pending().is_none());

        let delivery = coordinator.receive(
            AnalysisResponse {
                request,
                result: Ok(reply()),
            },
            &Position::default(),
        );
        assert_eq!(delivery, Delivery::Stale);
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[test]
    fn test_should_request() {
        let start = GameState::from_position(&StandardRules, Position::default());
        assert!(!AnalysisCoordinator::should_request(&StandardRules, &start, Color::White));
        assert!(AnalysisCoordinator::should_request(&StandardRules, &start, Color::Black));

        let mate: Position = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3"
            .parse()
            .unwrap();
        let mate = GameState::from_position(&StandardRules, mate);
        assert!(!AnalysisCoordinator::should_request(&StandardRules, &mate, Color::Black));
    }

    /// Fails with a transport error a fixed number of times, then answers.
    struct FlakyEngine {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl EngineClient for FlakyEngine {
        async fn analyze(&self, _fen: &str) -> Result<EngineReply, EngineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(EngineError::Transport("connection refused".into()))
            } else {
                Ok(reply())
            }
        }
    }

    struct BrokenEngine {
        calls: AtomicU32,
    }

    #[async_trait]
    impl EngineClient for BrokenEngine {
        async fn analyze(&self, _fen: &str) -> Result<EngineReply, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::Protocol("garbage".into()))
        }
    }

    struct SlowEngine;

    #[async_trait]
    impl EngineClient for SlowEngine {
        async fn analyze(&self, _fen: &str) -> Result<EngineReply, EngineError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(reply())
        }
    }

    fn quick_policy(max_retries: u32) -> AnalysisPolicy {
        AnalysisPolicy {
            timeout: Duration::from_millis(200),
            max_retries,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[actix_rt::test]
    async fn test_dispatch_retries_transport_errors() {
        let engine = Arc::new(FlakyEngine {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let request = AnalysisCoordinator::new().issue(after_e4());

        let response = dispatch(engine.clone(), request, quick_policy(2)).await;
        assert_eq!(response.result, Ok(reply()));
        assert_eq!(response.request, request);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    }

    #[actix_rt::test]
    async fn test_dispatch_gives_up_after_retries() {
        let engine = Arc::new(FlakyEngine {
            failures: 5,
            calls: AtomicU32::new(0),
        });
        let request = AnalysisCoordinator::new().issue(after_e4());

        let response = dispatch(engine.clone(), request, quick_policy(1)).await;
        assert!(matches!(response.result, Err(EngineError::Transport(_))));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }

    #[actix_rt::test]
    async fn test_dispatch_does_not_retry_protocol_errors() {
        let engine = Arc::new(BrokenEngine {
            calls: AtomicU32::new(0),
        });
        let request = AnalysisCoordinator::new().issue(after_e4());

        let response = dispatch(engine.clone(), request, quick_policy(3)).await;
        assert!(matches!(response.result, Err(EngineError::Protocol(_))));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_rt::test]
    async fn test_dispatch_times_out() {
        let request = AnalysisCoordinator::new().issue(after_e4());
        let response = dispatch(Arc::new(SlowEngine), request, quick_policy(0)).await;
        assert!(matches!(response.result, Err(EngineError::Transport(_))));
    }
}
