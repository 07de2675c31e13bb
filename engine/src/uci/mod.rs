pub mod parser;

pub use parser::{parse_uci_message, UciMessage};

use crate::GoParams;
use chess::{Game, StartPosition};

#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine has no stdin")]
    NoStdin,
    #[error("Engine has no stdout")]
    NoStdout,
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] chess::UciMoveError),
}

/// Build the `position` command for the game's current state
pub fn position_command(game: &Game) -> String {
    let mut cmd = match game.start_position() {
        StartPosition::Standard => "position startpos".to_string(),
        StartPosition::Fen(fen) => format!("position fen {}", fen),
    };

    let mut moves = game.uci_moves().peekable();
    if moves.peek().is_some() {
        cmd.push_str(" moves");
        for mv in moves {
            cmd.push(' ');
            cmd.push_str(mv);
        }
    }
    cmd
}

/// Build the `go` command. Time and depth may both be given; the engine stops
/// at whichever limit it reaches first.
pub fn go_command(params: &GoParams) -> String {
    let mut cmd = "go".to_string();
    if let Some(movetime) = params.movetime {
        cmd.push_str(&format!(" movetime {}", movetime));
    }
    if let Some(depth) = params.depth {
        cmd.push_str(&format!(" depth {}", depth));
    }
    cmd
}

pub fn setoption_command(name: &str, value: Option<&str>) -> String {
    match value {
        Some(val) => format!("setoption name {} value {}", name, val),
        None => format!("setoption name {}", name),
    }
}
