use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;
use std::sync::Arc;

use chess_vs_engine::config::ServerConfig;
use chess_vs_engine::engine::HttpEngineClient;
use chess_vs_engine::models::AppState;
use chess_vs_engine::routes;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let engine = HttpEngineClient::new(config.engine_url.clone());
    info!("Using engine service at {}", engine.base_url());

    let app_state = web::Data::new(AppState {
        engine: Arc::new(engine),
        policy: config.analysis_policy(),
        static_dir: config.static_dir.clone(),
    });

    info!("Starting server at http://{}:{}", config.host, config.port);
    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(app_state.clone())
            .configure(move |cfg| routes::configure_routes(cfg, &static_dir))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
