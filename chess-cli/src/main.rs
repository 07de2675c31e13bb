//! chess-cli - play a UCI engine from the terminal.
//!
//! Starts the engine, asks which side it plays and whether to flip the
//! board, then alternates between the player's moves and the engine's until
//! the game is over. Logs go to a daily rolling file (see [`config`]) so they
//! never mix with the board on screen.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chess::Game;
use chess_cli::config::{
    self, parse_accuracy, parse_time_limit, DEFAULT_ACCURACY, DEFAULT_DEPTH_LIMIT,
};
use chess_cli::{Accuracy, GameLoop, Settings, Terminal};
use clap::Parser;
use engine::{EngineConfig, SearchLimits, StockfishEngine};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command-line options. Every option has a default.
#[derive(Parser, Debug)]
#[command(name = "chess-cli", version, about = "Play chess against a UCI engine in the terminal")]
struct Cli {
    /// Path to the engine executable [env: CHESS_CLI_ENGINE_PATH]
    #[arg(long)]
    engine_path: Option<PathBuf>,

    /// Seconds the engine may think per move
    #[arg(long, default_value = "5.0", value_parser = parse_time_limit)]
    time_limit: Duration,

    /// Maximum search depth per move
    #[arg(long, default_value_t = DEFAULT_DEPTH_LIMIT, value_parser = clap::value_parser!(u8).range(1..))]
    depth_limit: u8,

    /// How often the engine plays its best move (0-100)
    #[arg(long, default_value_t = DEFAULT_ACCURACY, value_parser = parse_accuracy)]
    accuracy: u8,

    /// Engine search threads
    #[arg(long)]
    threads: Option<u32>,

    /// Engine hash table size in MB
    #[arg(long)]
    hash: Option<u32>,

    /// Start from this position instead of the standard one
    #[arg(long)]
    fen: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let requested_log_dir = config::get_log_dir();
    let (file_appender, log_dir) = config::open_log_file(&requested_log_dir)
        .with_context(|| format!("failed to open a log file in {}", requested_log_dir.display()))?;
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(?cli, log_dir = %log_dir.display(), "chess-cli starting up");

    let accuracy = Accuracy::new(cli.accuracy)
        .with_context(|| format!("accuracy {} is out of range", cli.accuracy))?;
    let settings = Settings {
        limits: SearchLimits::new(cli.time_limit, cli.depth_limit),
        accuracy,
    };

    let game = match &cli.fen {
        Some(fen) => Game::from_fen(fen).with_context(|| format!("invalid FEN '{fen}'"))?,
        None => Game::new(),
    };

    let engine_path = config::get_engine_path(cli.engine_path);
    let engine_config = EngineConfig {
        threads: cli.threads,
        hash_mb: cli.hash,
    };
    let engine = StockfishEngine::spawn(&engine_path, engine_config)
        .await
        .with_context(|| format!("failed to start engine at {}", engine_path.display()))?;

    let terminal = Terminal::stdio(!cli.no_color);
    let mut game_loop = GameLoop::new(engine, terminal, rand::rng(), settings).with_game(game);
    let result = game_loop.run().await.context("game aborted")?;

    tracing::info!(%result, "chess-cli shutting down");
    Ok(())
}
