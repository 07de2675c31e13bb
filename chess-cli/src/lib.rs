//! Play chess against a UCI engine in the terminal.
//!
//! The binary wires these modules to stdin/stdout and a Stockfish process;
//! tests drive [`game_loop::GameLoop`] with a scripted engine instead.

pub mod config;
pub mod game_loop;
pub mod input;
pub mod prompt;
pub mod render;
pub mod selector;
pub mod terminal;

pub use game_loop::{GameLoop, GameLoopError, Settings};
pub use selector::Accuracy;
pub use terminal::Terminal;
