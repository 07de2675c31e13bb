//! End-to-end sessions: scripted keyboard input, scripted engine, in-memory
//! terminal.

use std::io::{Cursor, ErrorKind};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chess::{Game, GameResult};
use chess_cli::{Accuracy, GameLoop, GameLoopError, Settings, Terminal};
use cozy_chess::Board;
use engine::{EngineError, MockCall, MockEngine, SearchLimits};
use rand::rngs::StdRng;
use rand::SeedableRng;

type Session = GameLoop<MockEngine, StdRng, Cursor<Vec<u8>>, Vec<u8>>;

fn settings(accuracy: u8) -> Settings {
    Settings {
        limits: SearchLimits::new(Duration::from_millis(100), 8),
        accuracy: Accuracy::new(accuracy).unwrap(),
    }
}

fn session(input: &str, engine: MockEngine) -> (Session, Arc<Mutex<Vec<MockCall>>>) {
    session_with(input, engine, settings(100))
}

fn session_with(
    input: &str,
    engine: MockEngine,
    settings: Settings,
) -> (Session, Arc<Mutex<Vec<MockCall>>>) {
    let log = engine.call_log();
    let terminal = Terminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), 80, false);
    let game_loop = GameLoop::new(engine, terminal, StdRng::seed_from_u64(42), settings);
    (game_loop, log)
}

fn output(session: &Session) -> String {
    String::from_utf8(session.terminal().output().clone()).unwrap()
}

fn played(session: &Session) -> Vec<String> {
    session.game().uci_moves().map(str::to_string).collect()
}

fn shutdowns(log: &Arc<Mutex<Vec<MockCall>>>) -> usize {
    log.lock()
        .unwrap()
        .iter()
        .filter(|call| **call == MockCall::Shutdown)
        .count()
}

fn is_eof(result: &Result<GameResult, GameLoopError>) -> bool {
    matches!(result, Err(GameLoopError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof)
}

#[tokio::test]
async fn illegal_move_is_rejected_after_engine_opens() {
    let engine = MockEngine::new().with_best_moves(["e2e4", "g1f3"]);
    let (mut session, log) = session("w\nn\ne2e5\ne7e5\n", engine);

    let result = session.run().await;

    assert!(is_eof(&result));
    assert_eq!(played(&session), vec!["e2e4", "e7e5", "g1f3"]);

    let out = output(&session);
    assert!(out.contains("Engine is playing as white."));
    assert_eq!(out.matches("Invalid move").count(), 1);
    assert!(out.contains("Engine played: e2e4"));
    assert!(out.contains("Engine played: g1f3"));
    assert_eq!(shutdowns(&log), 1);
}

#[tokio::test]
async fn undo_restores_start_position() {
    let engine = MockEngine::new().with_best_moves(["e7e5"]);
    let (mut session, log) = session("b\ny\ne2e4\nundo\n", engine);

    let result = session.run().await;

    assert!(is_eof(&result));
    assert!(session.game().history().is_empty());
    assert_eq!(session.game().position(), &Board::default());

    let out = output(&session);
    assert!(out.contains("Engine is playing as black."));
    assert!(out.contains("Last move undone."));
    assert_eq!(shutdowns(&log), 1);
}

#[tokio::test]
async fn undo_without_two_plies_is_refused() {
    let (mut session, log) = session("b\nn\nundo\n", MockEngine::new());

    let result = session.run().await;

    assert!(is_eof(&result));
    assert!(session.game().history().is_empty());
    assert!(output(&session).contains("Cannot undo, not enough moves to undo."));
    assert_eq!(shutdowns(&log), 1);
}

#[tokio::test]
async fn override_replaces_engine_move() {
    let engine = MockEngine::new().with_best_moves(["c7c5"]);
    let (mut session, log) = session("b\nn\ne2e4,e7e5\n", engine);

    let result = session.run().await;

    assert!(is_eof(&result));
    assert_eq!(played(&session), vec!["e2e4", "e7e5"]);

    let out = output(&session);
    assert!(out.contains("Move overridden: e7e5"));
    assert!(out.contains("Engine played: e7e5"));
    assert!(!out.contains("c7c5"));

    // The engine was still consulted, in the position after the player's move
    let calls = log.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            MockCall::BestMove {
                moves: vec!["e2e4".to_string()]
            },
            MockCall::Shutdown,
        ]
    );
}

#[tokio::test]
async fn game_ends_on_checkmate() {
    let engine = MockEngine::new().with_best_moves(["f2f3", "g2g4"]);
    let (mut session, log) = session("w\nn\ne7e5\nd8h4\n", engine);

    let result = session.run().await.unwrap();

    assert_eq!(result, GameResult::BlackWins);
    assert_eq!(played(&session), vec!["f2f3", "e7e5", "g2g4", "d8h4"]);

    let out = output(&session);
    assert!(out.contains("Game over: checkmate."));
    assert!(out.contains("0-1"));
    assert_eq!(shutdowns(&log), 1);
}

#[tokio::test]
async fn engine_can_deliver_mate() {
    let engine = MockEngine::new().with_best_moves(["e7e5", "d8h4"]);
    let (mut session, _log) = session("b\nn\nf2f3\ng2g4\n", engine);

    let result = session.run().await.unwrap();

    assert_eq!(result, GameResult::BlackWins);
    assert!(session.game().is_game_over());
    assert!(output(&session).contains("Engine played: d8h4"));
}

#[tokio::test]
async fn game_over_at_start_never_queries_engine() {
    let stalemate = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let (session, log) = session("b\nn\n", MockEngine::new());
    let mut session = session.with_game(stalemate);

    let result = session.run().await.unwrap();

    assert_eq!(result, GameResult::Draw);
    assert!(output(&session).contains("Game over: stalemate."));
    assert!(output(&session).contains("1/2-1/2"));
    assert_eq!(*log.lock().unwrap(), vec![MockCall::Shutdown]);
}

#[tokio::test]
async fn engine_moves_first_when_it_has_the_move() {
    // Black to move and the engine plays black, so it opens
    let game = Game::from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 1").unwrap();
    let engine = MockEngine::new().with_best_moves(["e8d8"]);
    let (session, _log) = session("b\nn\n", engine);
    let mut session = session.with_game(game);

    let result = session.run().await;

    assert!(is_eof(&result));
    assert_eq!(played(&session), vec!["e8d8"]);
}

#[tokio::test]
async fn engine_failure_still_shuts_down_once() {
    let engine = MockEngine::new().with_best_moves(["e2e5"]);
    let (mut session, log) = session("w\nn\n", engine);

    let result = session.run().await;

    assert!(matches!(
        result,
        Err(GameLoopError::Engine(EngineError::IllegalMove(mv))) if mv == "e2e5"
    ));
    assert!(session.game().history().is_empty());
    assert_eq!(shutdowns(&log), 1);
}

#[tokio::test]
async fn board_matches_direct_play() {
    // Weaker picks come from indices 2..4; every candidate is a quiet black
    // move so the scripted white moves stay legal whichever one is chosen.
    let engine = MockEngine::new()
        .with_candidates(["e7e5", "d7d5", "a7a6", "h7h6"])
        .with_candidates(["e7e5", "d7d5", "b7b6", "g7g6"])
        .with_candidates(["e7e5", "d7d5", "c7c6", "f7f6"])
        .with_candidates(["e7e5", "d7d5", "c7c6", "f7f6"])
        .with_candidates(["e7e5", "d7d5", "e7e6", "d7d6"]);
    let input = "b\nn\nd2d4\ng1f3\nc2c4\nundo\nb1c3\ne2e3\n";
    let (mut session, log) = session_with(input, engine, settings(0));

    let result = session.run().await;
    assert!(is_eof(&result));

    let history = session.game().history();
    assert_eq!(history.len(), 8);
    let white: Vec<&str> = history.iter().step_by(2).map(|e| e.uci.as_str()).collect();
    assert_eq!(white, vec!["d2d4", "g1f3", "b1c3", "e2e3"]);

    let mut board = Board::default();
    for entry in history {
        board.play(entry.mv);
    }
    assert_eq!(session.game().position(), &board);

    let ranked = log
        .lock()
        .unwrap()
        .iter()
        .filter(|call| matches!(call, MockCall::RankedCandidates { .. }))
        .count();
    assert_eq!(ranked, 5);
}
