//! Runtime configuration for chess-cli.
//!
//! Every tunable has a compile-time default and an environment-variable
//! override. Command-line flags, parsed in `main`, take precedence over both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};

/// Default per-move depth budget.
pub const DEFAULT_DEPTH_LIMIT: u8 = 20;

/// Default accuracy: always play the engine's best move.
pub const DEFAULT_ACCURACY: u8 = 100;

/// Directory name under the system temp dir used for logs.
const DEFAULT_LOG_DIR_NAME: &str = "chess-cli";

/// File name prefix of the daily rolling log.
pub const LOG_FILE_PREFIX: &str = "chess-cli";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("time limit must be a positive number of seconds, got {0}")]
    TimeLimit(f64),
    #[error("accuracy must be between 0 and 100, got {0}")]
    Accuracy(u64),
}

/// Get the engine executable path.
///
/// Priority:
/// 1. `cli_path` if given
/// 2. `CHESS_CLI_ENGINE_PATH` env variable if set
/// 3. The first Stockfish found in a common install location, else `stockfish`
///    resolved through `PATH`
pub fn get_engine_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }
    if let Ok(path) = std::env::var("CHESS_CLI_ENGINE_PATH") {
        return PathBuf::from(path);
    }

    engine::find_stockfish_path()
}

/// Get the directory the log file is written to.
///
/// Priority:
/// 1. `CHESS_CLI_LOG_DIR` env variable if set
/// 2. `<temp dir>/chess-cli` as fallback
pub fn get_log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESS_CLI_LOG_DIR") {
        return PathBuf::from(dir);
    }

    std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)
}

/// Open the daily rolling log in `dir`, creating the directory if needed.
///
/// When `dir` cannot be used the log goes to `<temp dir>/chess-cli` instead.
/// Returns the appender together with the directory it writes to.
pub fn open_log_file(dir: &Path) -> Result<(RollingFileAppender, PathBuf), InitError> {
    let appender = |dir: &Path| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .build(dir)
    };

    match appender(dir) {
        Ok(file) => Ok((file, dir.to_path_buf())),
        Err(e) => {
            let fallback = std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME);
            if fallback == dir {
                return Err(e);
            }
            eprintln!(
                "warning: cannot write logs to {} ({e}), using {}",
                dir.display(),
                fallback.display()
            );
            Ok((appender(&fallback)?, fallback))
        }
    }
}

/// Parse a per-move time budget given in (possibly fractional) seconds.
pub fn parse_time_limit(text: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = text
        .trim()
        .parse()
        .map_err(|_| ConfigError::NotANumber(text.to_string()))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::TimeLimit(secs));
    }

    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::TimeLimit(secs))
}

/// Parse an accuracy percentage in `0..=100`.
pub fn parse_accuracy(text: &str) -> Result<u8, ConfigError> {
    let value: u64 = text
        .trim()
        .parse()
        .map_err(|_| ConfigError::NotANumber(text.to_string()))?;
    u8::try_from(value)
        .ok()
        .filter(|value| *value <= 100)
        .ok_or(ConfigError::Accuracy(value))
}
