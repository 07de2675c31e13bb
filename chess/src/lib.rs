pub mod fen;
pub mod game;
pub mod types;
pub mod uci;

pub use game::{Game, GameError, GameResult, HistoryEntry, Outcome, StartPosition, Termination};
pub use types::{PieceColor, PieceKind};
pub use uci::{
    convert_uci_castling_to_cozy, format_move, format_uci_move, parse_uci_move, to_standard_castling,
    UciMoveError,
};
