//! HTTP front of the engine service: `/`, `/best_move`, `/analyze`

use actix_web::{web, HttpResponse, Responder};
use async_trait::async_trait;
use log::info;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::engine::protocol::{AnalyzeRequest, AnalyzeResponse, Evaluation, WireMove};
use crate::engine::stockfish::{EvalResult, StockfishEngine};
use crate::error::ServiceError;
use crate::game::position::Position;

/// Something that searches positions on behalf of the service.
#[async_trait]
pub trait PositionAnalyzer: Send + Sync {
    async fn analyze(&self, fen: &str) -> Result<EvalResult, ServiceError>;
}

/// A single Stockfish process; searches run one at a time.
pub struct StockfishAnalyzer {
    engine: Mutex<StockfishEngine>,
    depth: u32,
}

impl StockfishAnalyzer {
    pub fn new(engine: StockfishEngine, depth: u32) -> Self {
        Self {
            engine: Mutex::new(engine),
            depth,
        }
    }

    pub async fn shutdown(&self) {
        self.engine.lock().await.quit().await;
    }
}

#[async_trait]
impl PositionAnalyzer for StockfishAnalyzer {
    async fn analyze(&self, fen: &str) -> Result<EvalResult, ServiceError> {
        let mut engine = self.engine.lock().await;
        engine.evaluate(fen, self.depth).await
    }
}

#[derive(Serialize)]
struct BestMoveResponse {
    best_move: Option<String>,
}

/// Reject anything that is not a legal FEN before it reaches the engine.
fn validate(request: &AnalyzeRequest) -> Result<Position, ServiceError> {
    Ok(request.fen.parse()?)
}

async fn home() -> impl Responder {
    HttpResponse::Ok().body("Chess backend is running!")
}

async fn best_move(
    analyzer: web::Data<dyn PositionAnalyzer>,
    body: web::Json<AnalyzeRequest>,
) -> Result<HttpResponse, ServiceError> {
    let fen = validate(&body)?.to_string();
    let result = analyzer.analyze(&fen).await?;
    info!("best_move {} -> {:?}", fen, result.best_move);
    Ok(HttpResponse::Ok().json(BestMoveResponse {
        best_move: result.best_move,
    }))
}

async fn analyze(
    analyzer: web::Data<dyn PositionAnalyzer>,
    body: web::Json<AnalyzeRequest>,
) -> Result<HttpResponse, ServiceError> {
    let position = validate(&body)?;
    let fen = position.to_string();
    let result = analyzer.analyze(&fen).await?;
    let evaluation = Evaluation::from_uci(result.cp, result.mate, position.side_to_move());
    info!("analyze {} -> {:?} ({})", fen, result.best_move, evaluation);

    Ok(HttpResponse::Ok().json(AnalyzeResponse {
        best_move: result.best_move.map(WireMove::Uci),
        evaluation: Some(evaluation),
        fen: Some(body.into_inner().fen),
    }))
}

/// Configure the engine service routes. Expects `web::Data<dyn PositionAnalyzer>` in app data.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .service(web::resource("/best_move").route(web::post().to(best_move)))
        .service(web::resource("/analyze").route(web::post().to(analyze)));
}
