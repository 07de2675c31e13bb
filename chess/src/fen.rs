use cozy_chess::Board;

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    if fen.split_whitespace().next().is_none() {
        return Err(FenError::InvalidFormat);
    }

    fen.parse().map_err(|_| FenError::InvalidFormat)
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_start_position_round_trips() {
        let board = parse_fen(START).unwrap();
        assert_eq!(board, Board::default());
        assert_eq!(parse_fen(&format_fen(&board)).unwrap(), board);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_fen("").is_err());
        assert!(parse_fen("   ").is_err());
        assert!(parse_fen("not a fen").is_err());
    }
}
