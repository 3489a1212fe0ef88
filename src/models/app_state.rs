use std::sync::Arc;

use crate::engine::client::EngineClient;
use crate::engine::coordinator::AnalysisPolicy;

/// Application state shared between connections
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn EngineClient>,
    pub policy: AnalysisPolicy,
    pub static_dir: String,
}
