use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::coordinator::AnalysisPolicy;
use crate::error::ConfigError;

/// Settings for the session server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub engine_url: String,
    pub engine_timeout: Duration,
    pub engine_max_retries: u32,
    pub engine_retry_delay: Duration,
    pub static_dir: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse(&lookup, "PORT", 8080)?,
            engine_url: lookup("ENGINE_URL").unwrap_or_else(|| "http://127.0.0.1:5000".to_string()),
            engine_timeout: Duration::from_millis(parse(&lookup, "ENGINE_TIMEOUT_MS", 30_000)?),
            engine_max_retries: parse(&lookup, "ENGINE_MAX_RETRIES", 0)?,
            engine_retry_delay: Duration::from_millis(parse(&lookup, "ENGINE_RETRY_DELAY_MS", 500)?),
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| "./static".to_string()),
        })
    }

    pub fn analysis_policy(&self) -> AnalysisPolicy {
        AnalysisPolicy {
            timeout: self.engine_timeout,
            max_retries: self.engine_max_retries,
            retry_delay: self.engine_retry_delay,
        }
    }
}

/// Settings for the Stockfish-backed engine service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineServiceConfig {
    pub host: String,
    pub port: u16,
    pub stockfish_path: String,
    pub depth: u32,
}

impl EngineServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: lookup("ENGINE_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse(&lookup, "ENGINE_PORT", 5000)?,
            stockfish_path: lookup("STOCKFISH_PATH").unwrap_or_else(|| "/usr/local/bin/stockfish".to_string()),
            depth: parse(&lookup, "ENGINE_DEPTH", 15)?,
        })
    }
}

/// Missing keys fall back to `default`; present but unparsable values are errors.
fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
