use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;

use crate::engine::protocol::{AnalyzeRequest, AnalyzeResponse, EngineReply};
use crate::error::EngineError;

/// Anything that can propose a move for a FEN position.
#[async_trait]
pub trait EngineClient: Send + Sync {
    async fn analyze(&self, fen: &str) -> Result<EngineReply, EngineError>;
}

/// Engine service reached over HTTP (`POST {base_url}/analyze`).
#[derive(Debug, Clone)]
pub struct HttpEngineClient {
    base_url: String,
    client: Client,
}

impl HttpEngineClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EngineClient for HttpEngineClient {
    async fn analyze(&self, fen: &str) -> Result<EngineReply, EngineError> {
        let url = format!("{}/analyze", self.base_url);
        debug!("POST {} fen={}", url, fen);

        let resp = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { fen: fen.to_string() })
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("request error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Engine service answered {} for {}", status, fen);
            return Err(EngineError::Transport(format!("HTTP {status}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| EngineError::Transport(format!("body read error: {e}")))?;

        let response: AnalyzeResponse = serde_json::from_slice(&body)
            .map_err(|e| EngineError::Protocol(format!("undecodable response: {e}")))?;
        response.into_reply()
    }
}
