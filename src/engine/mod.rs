pub mod client;
pub mod coordinator;
pub mod protocol;
pub mod service;
pub mod stockfish;

pub use client::{EngineClient, HttpEngineClient};
pub use coordinator::{dispatch, AnalysisCoordinator, AnalysisPolicy, AnalysisRequest, AnalysisResponse, Phase};
pub use protocol::{EngineReply, Evaluation};
