//! Scripted Engine implementation for testing

use crate::{Engine, EngineError, SearchLimits};
use async_trait::async_trait;
use chess::Game;
use cozy_chess::Move;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One recorded engine query, with the game's moves at the time of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    BestMove { moves: Vec<String> },
    RankedCandidates { moves: Vec<String>, count: u8 },
    Shutdown,
}

/// Engine that replays scripted answers in order.
///
/// When a script runs dry it answers with the first legal moves of the
/// position, so long games can be driven without scripting every ply.
#[derive(Default)]
pub struct MockEngine {
    best_moves: VecDeque<String>,
    candidates: VecDeque<Vec<String>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    shut_down: bool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue best-move answers (standard UCI text)
    pub fn with_best_moves<I, S>(mut self, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.best_moves.extend(moves.into_iter().map(Into::into));
        self
    }

    /// Queue one ranked candidate list, best first
    pub fn with_candidates<I, S>(mut self, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates
            .push_back(moves.into_iter().map(Into::into).collect());
        self
    }

    /// Shared handle to the call log; stays readable after the engine moves
    pub fn call_log(&self) -> Arc<Mutex<Vec<MockCall>>> {
        Arc::clone(&self.call_log)
    }

    /// Get recorded calls for verification
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    fn record(&self, call: MockCall) {
        self.call_log.lock().unwrap().push(call);
    }

    fn resolve(game: &Game, text: &str) -> Result<Move, EngineError> {
        game.resolve_move(text)
            .map_err(|_| EngineError::IllegalMove(text.to_string()))
    }
}

fn played(game: &Game) -> Vec<String> {
    game.uci_moves().map(str::to_string).collect()
}

#[async_trait]
impl Engine for MockEngine {
    async fn best_move(&mut self, game: &Game, _limits: SearchLimits) -> Result<Move, EngineError> {
        if self.shut_down {
            return Err(EngineError::ShutDown);
        }
        self.record(MockCall::BestMove {
            moves: played(game),
        });

        match self.best_moves.pop_front() {
            Some(text) => Self::resolve(game, &text),
            None => game.legal_moves().first().copied().ok_or(EngineError::NoMove),
        }
    }

    async fn ranked_candidates(
        &mut self,
        game: &Game,
        _limits: SearchLimits,
        count: u8,
    ) -> Result<Vec<Move>, EngineError> {
        if self.shut_down {
            return Err(EngineError::ShutDown);
        }
        self.record(MockCall::RankedCandidates {
            moves: played(game),
            count,
        });

        match self.candidates.pop_front() {
            Some(list) => list
                .iter()
                .take(count.into())
                .map(|text| Self::resolve(game, text))
                .collect(),
            None => Ok(game
                .legal_moves()
                .into_iter()
                .take(count.into())
                .collect()),
        }
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        self.record(MockCall::Shutdown);
        self.shut_down = true;
        Ok(())
    }
}
