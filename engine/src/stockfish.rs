use crate::uci::{go_command, parse_uci_message, position_command, setoption_command, UciMessage};
use crate::{legal_in, Engine, EngineError, EngineInfo, GoParams, SearchLimits, UciError};
use async_trait::async_trait;
use chess::Game;
use cozy_chess::Move;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};

/// How long the engine gets to answer `uci` and `isready` during startup.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `quit` gets before the process is killed.
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// A UCI engine subprocess driven one request at a time.
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    multipv: u8,
    shut_down: bool,
}

/// Configuration for engine performance tuning.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
}

impl StockfishEngine {
    /// Spawn the engine at `path` and complete the UCI handshake.
    #[tracing::instrument(level = "info")]
    pub async fn spawn(path: &Path, config: EngineConfig) -> Result<Self, EngineError> {
        tracing::info!("Spawning engine process");
        let mut process = tokio::process::Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                tracing::error!("Failed to spawn engine: {}", source);
                EngineError::Spawn {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        let stdin = process.stdin.take().ok_or(UciError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(UciError::NoStdout)?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            multipv: 1,
            shut_down: false,
        };
        engine.handshake(&config).await?;

        tracing::info!("Engine spawned and initialized successfully");
        Ok(engine)
    }

    async fn handshake(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        self.send("uci").await?;
        self.wait_for(
            |msg| matches!(msg, UciMessage::UciOk),
            "uciok",
            HANDSHAKE_TIMEOUT,
        )
        .await?;

        if let Some(threads) = config.threads {
            let threads = threads.clamp(1, 16);
            tracing::info!("Setting Threads to {}", threads);
            self.set_option("Threads", &threads.to_string()).await?;
        }
        if let Some(hash_mb) = config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 2048);
            tracing::info!("Setting Hash to {} MB", hash_mb);
            self.set_option("Hash", &hash_mb.to_string()).await?;
        }

        self.send("ucinewgame").await?;
        self.sync(HANDSHAKE_TIMEOUT).await
    }

    /// Send `isready` and wait for `readyok`.
    async fn sync(&mut self, timeout: Duration) -> Result<(), EngineError> {
        self.send("isready").await?;
        self.wait_for(|msg| matches!(msg, UciMessage::ReadyOk), "readyok", timeout)
            .await
    }

    async fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        self.send(&setoption_command(name, Some(value))).await
    }

    async fn set_multipv(&mut self, count: u8) -> Result<(), EngineError> {
        if self.multipv != count {
            self.set_option("MultiPV", &count.to_string()).await?;
            self.multipv = count;
        }
        Ok(())
    }

    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        if self.shut_down {
            return Err(EngineError::ShutDown);
        }
        tracing::trace!("UCI >> {}", cmd);
        self.stdin.write_all(cmd.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Next parseable message; lines the parser does not know are skipped.
    async fn next_message(&mut self) -> Result<UciMessage, EngineError> {
        loop {
            let Some(line) = self.stdout.next_line().await? else {
                tracing::warn!("Engine stdout EOF - engine closed");
                return Err(EngineError::Closed);
            };
            let trimmed = line.trim();
            tracing::trace!("UCI << {}", trimmed);

            match parse_uci_message(trimmed) {
                Ok(msg) => return Ok(msg),
                Err(UciError::UnknownMessage(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn wait_for(
        &mut self,
        wanted: impl Fn(&UciMessage) -> bool,
        what: &'static str,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        let waited = tokio::time::timeout(timeout, async {
            loop {
                let msg = self.next_message().await?;
                if wanted(&msg) {
                    return Ok(());
                }
            }
        })
        .await;

        match waited {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Timeout waiting for {}", what);
                Err(EngineError::Timeout(what))
            }
        }
    }

    /// Run one search and collect every `info` line until `bestmove`.
    async fn search(
        &mut self,
        game: &Game,
        limits: SearchLimits,
    ) -> Result<(Option<Move>, Vec<EngineInfo>), EngineError> {
        self.send(&position_command(game)).await?;
        self.send(&go_command(&GoParams::from(limits))).await?;
        tracing::debug!(
            fen = %game.to_fen(),
            movetime_ms = limits.movetime.as_millis() as u64,
            depth = limits.depth,
            multipv = self.multipv,
            "Starting engine search"
        );

        let mut infos = Vec::new();
        loop {
            match self.next_message().await? {
                UciMessage::Info(info) => infos.push(info),
                UciMessage::BestMove { mv, .. } => return Ok((mv, infos)),
                _ => {}
            }
        }
    }
}

#[async_trait]
impl Engine for StockfishEngine {
    async fn best_move(&mut self, game: &Game, limits: SearchLimits) -> Result<Move, EngineError> {
        self.set_multipv(1).await?;
        let (best, infos) = self.search(game, limits).await?;
        let mv = legal_in(game, best.ok_or(EngineError::NoMove)?)?;

        if let Some(info) = infos.iter().rev().find(|info| info.score.is_some()) {
            tracing::info!(
                best = %game.format_move(mv),
                depth = ?info.depth,
                score = ?info.score,
                nodes = ?info.nodes,
                "Engine found best move"
            );
        }
        Ok(mv)
    }

    async fn ranked_candidates(
        &mut self,
        game: &Game,
        limits: SearchLimits,
        count: u8,
    ) -> Result<Vec<Move>, EngineError> {
        self.set_multipv(count.max(1)).await?;
        let (_, infos) = self.search(game, limits).await?;

        // Later lines are deeper, so the last line per rank wins.
        let mut ranked: BTreeMap<u8, Move> = BTreeMap::new();
        for info in infos {
            if let Some(&first) = info.pv.first() {
                ranked.insert(info.multipv.unwrap_or(1), first);
            }
        }

        let candidates = ranked
            .into_values()
            .take(count.into())
            .map(|mv| legal_in(game, mv))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = candidates.len(), "Engine ranked candidates");
        Ok(candidates)
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        if self.shut_down {
            tracing::debug!("Engine already shut down");
            return Ok(());
        }

        tracing::info!("Sending quit command to engine");
        if let Err(e) = self.send("quit").await {
            tracing::warn!("Failed to send quit: {}", e);
        }
        self.shut_down = true;

        if tokio::time::timeout(QUIT_GRACE, self.process.wait())
            .await
            .is_err()
        {
            tracing::warn!("Engine ignored quit, killing process");
            self.process.kill().await?;
        }
        Ok(())
    }
}

/// Find Stockfish executable in common locations, falling back to a `PATH`
/// lookup at spawn time.
pub fn find_stockfish_path() -> PathBuf {
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
    ];

    paths
        .iter()
        .map(Path::new)
        .find(|path| path.is_file())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("stockfish"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_stockfish_path_is_never_empty() {
        let path = find_stockfish_path();
        assert!(path.ends_with("stockfish"));
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_fails() {
        let result = StockfishEngine::spawn(
            Path::new("/nonexistent/definitely-not-an-engine"),
            EngineConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(EngineError::Spawn { .. })));
    }
}
