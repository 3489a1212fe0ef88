use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;
use std::sync::Arc;

use chess_vs_engine::config::EngineServiceConfig;
use chess_vs_engine::engine::service::{self, PositionAnalyzer, StockfishAnalyzer};
use chess_vs_engine::engine::stockfish::StockfishEngine;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    let config = EngineServiceConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let engine = StockfishEngine::new(&config.stockfish_path)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    info!("Stockfish ready at {} (depth {})", config.stockfish_path, config.depth);

    let analyzer = Arc::new(StockfishAnalyzer::new(engine, config.depth));
    let data: web::Data<dyn PositionAnalyzer> = web::Data::from(analyzer.clone() as Arc<dyn PositionAnalyzer>);

    info!("Starting engine service at http://{}:{}", config.host, config.port);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(service::configure_routes))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    analyzer.shutdown().await;
    Ok(())
}
