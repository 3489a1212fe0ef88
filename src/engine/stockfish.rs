//! Stockfish engine wrapper using UCI protocol (async I/O)

use log::debug;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::ServiceError;

/// Result of a single search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalResult {
    /// Centipawn score from the side to move's perspective
    pub cp: Option<i32>,
    /// Mate in N moves (positive = side to move mates)
    pub mate: Option<i32>,
    /// Best move in UCI notation; `None` when there is no legal move
    pub best_move: Option<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str) -> Result<Self, ServiceError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ServiceError::Stockfish(format!("Failed to spawn Stockfish at {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| ServiceError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| ServiceError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), ServiceError> {
        debug!("SF < {}", cmd);
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| ServiceError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ServiceError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, ServiceError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| ServiceError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(ServiceError::Stockfish("Stockfish closed its output".into()));
        }
        let line = line.trim().to_string();
        debug!("SF > {}", line);
        Ok(line)
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), ServiceError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    /// Search `fen` to `depth` plies and report the best move with its score
    pub async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<EvalResult, ServiceError> {
        self.send("ucinewgame").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut result = EvalResult {
            cp: None,
            mate: None,
            best_move: None,
        };

        loop {
            let line = self.read_line().await?;
            if line.starts_with("info") && line.contains(" score ") {
                if let Some(cp) = parse_cp(&line) {
                    result.cp = Some(cp);
                    result.mate = None;
                }
                if let Some(mate) = parse_mate(&line) {
                    result.mate = Some(mate);
                    result.cp = None;
                }
            } else if line.starts_with("bestmove") {
                result.best_move = parse_bestmove(&line);
                break;
            }
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

fn value_after(line: &str, key: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    parts
        .iter()
        .position(|part| *part == key)
        .and_then(|i| parts.get(i + 1))
        .and_then(|v| v.parse().ok())
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    value_after(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    value_after(line, "mate")
}

/// Parse the move from a `bestmove` line; "(none)" means no legal move.
fn parse_bestmove(line: &str) -> Option<String> {
    match line.split_whitespace().nth(1) {
        Some("(none)") | None => None,
        Some(mv) => Some(mv.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_cp(line), Some(35));
        assert_eq!(parse_mate(line), None);
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate -3 nodes 100000 pv e2e4";
        assert_eq!(parse_mate(line), Some(-3));
    }

    /// Answers like an engine, but only searches when `position` follows a `readyok`.
    #[cfg(unix)]
    const FAKE_ENGINE: &str = r#"#!/bin/sh
last=""
synced=no
while read -r cmd; do
  case "$cmd" in
    uci) echo "id name fake"; echo uciok ;;
    isready) echo readyok ;;
    position*) if [ "$last" = isready ]; then synced=yes; else synced=no; fi ;;
    go*)
      if [ "$synced" = yes ]; then
        echo "info depth 1 score cp 12 pv e7e5"
        echo "bestmove e7e5"
      else
        echo "bestmove (none)"
      fi ;;
    quit) exit 0 ;;
  esac
  last="${cmd%% *}"
done
"#;

    #[cfg(unix)]
    #[actix_rt::test]
    async fn test_evaluate_syncs_after_new_game() {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!("fake-uci-{}.sh", std::process::id()));
        std::fs::write(&path, FAKE_ENGINE).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut engine = StockfishEngine::new(path.to_str().unwrap()).await.unwrap();
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        for _ in 0..2 {
            let result = engine.evaluate(fen, 1).await.unwrap();
            assert_eq!(result.best_move.as_deref(), Some("e7e5"));
            assert_eq!(result.cp, Some(12));
        }
        engine.quit().await;
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(parse_bestmove("bestmove e2e4 ponder e7e5"), Some("e2e4".to_string()));
        assert_eq!(parse_bestmove("bestmove a7a8q"), Some("a7a8q".to_string()));
        assert_eq!(parse_bestmove("bestmove (none)"), None);
    }
}
