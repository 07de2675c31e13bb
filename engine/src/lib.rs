#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod stockfish;
pub mod uci;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockEngine};
pub use stockfish::{find_stockfish_path, EngineConfig, StockfishEngine};
pub use uci::{UciError, UciMessage};

use async_trait::async_trait;
use chess::Game;
use cozy_chess::Move;
use std::path::PathBuf;
use std::time::Duration;

/// What the game needs from a chess engine.
///
/// Moves are returned in the game's own encoding and are legal in the
/// position they were computed for.
#[async_trait]
pub trait Engine: Send {
    /// The engine's single best move for the game's current position.
    async fn best_move(&mut self, game: &Game, limits: SearchLimits) -> Result<Move, EngineError>;

    /// Up to `count` candidate moves, best first, by the engine's own ranking.
    async fn ranked_candidates(
        &mut self,
        game: &Game,
        limits: SearchLimits,
        count: u8,
    ) -> Result<Vec<Move>, EngineError>;

    /// Stop the engine. Further queries fail with [`EngineError::ShutDown`].
    async fn shutdown(&mut self) -> Result<(), EngineError>;
}

/// Per-query search budget. The engine stops at whichever limit it hits first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub movetime: Duration,
    pub depth: u8,
}

impl SearchLimits {
    pub fn new(movetime: Duration, depth: u8) -> Self {
        Self { movetime, depth }
    }
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub movetime: Option<u64>, // Move time in milliseconds
    pub depth: Option<u8>,     // Search depth
}

impl From<SearchLimits> for GoParams {
    fn from(limits: SearchLimits) -> Self {
        Self {
            movetime: Some(limits.movetime.as_millis().try_into().unwrap_or(u64::MAX)),
            depth: Some(limits.depth),
        }
    }
}

/// The parts of an `info` line used for ranking and logging
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub multipv: Option<u8>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    /// Principal variation, standard UCI encoding
    pub pv: Vec<Move>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Moves to mate; negative when the engine is being mated
    Mate(i32),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to spawn engine {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("UCI error: {0}")]
    Uci(#[from] UciError),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("engine closed its output")]
    Closed,
    #[error("engine returned no move")]
    NoMove,
    #[error("engine suggested an illegal move: {0}")]
    IllegalMove(String),
    #[error("engine session already shut down")]
    ShutDown,
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Uci(UciError::Io(e))
    }
}

/// Map an engine-reported move (standard notation) onto a legal move of `game`.
pub(crate) fn legal_in(game: &Game, mv: Move) -> Result<Move, EngineError> {
    let text = chess::format_uci_move(mv);
    game.resolve_move(&text)
        .map_err(|_| EngineError::IllegalMove(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_params_from_limits() {
        let params = GoParams::from(SearchLimits::new(Duration::from_secs_f64(2.5), 12));
        assert_eq!(params.movetime, Some(2500));
        assert_eq!(params.depth, Some(12));
    }

    #[test]
    fn test_legal_in_converts_castling() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let reported = chess::parse_uci_move("e1g1").unwrap();
        let mv = legal_in(&game, reported).unwrap();
        assert!(game.is_legal(mv));
        assert_eq!(game.format_move(mv), "e1g1");

        let bogus = chess::parse_uci_move("e1e3").unwrap();
        assert!(matches!(
            legal_in(&game, bogus),
            Err(EngineError::IllegalMove(text)) if text == "e1e3"
        ));
    }
}
