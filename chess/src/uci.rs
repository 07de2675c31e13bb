//! UCI (Universal Chess Interface) move notation
//!
//! Users and engines speak standard long algebraic notation, where castling is
//! written as the king's two-square step (`e1g1`). cozy-chess encodes castling
//! as the king capturing its own rook (`e1h1`), so conversions happen here.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UciMoveError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}

/// Parse UCI move format (e2e4, e7e8q). Only checks the shape, not legality.
pub fn parse_uci_move(s: &str) -> Result<Move, UciMoveError> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return Err(UciMoveError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = match s.get(4..5) {
        None => None,
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(_) => return Err(UciMoveError::InvalidPromotion(s.to_string())),
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

fn parse_square(s: &str) -> Result<Square, UciMoveError> {
    let mut chars = s.chars();
    let (Some(f), Some(r), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(UciMoveError::InvalidSquare(s.to_string()));
    };

    let file = match f {
        'a' => File::A,
        'b' => File::B,
        'c' => File::C,
        'd' => File::D,
        'e' => File::E,
        'f' => File::F,
        'g' => File::G,
        'h' => File::H,
        _ => return Err(UciMoveError::InvalidSquare(s.to_string())),
    };

    let rank = match r {
        '1' => Rank::First,
        '2' => Rank::Second,
        '3' => Rank::Third,
        '4' => Rank::Fourth,
        '5' => Rank::Fifth,
        '6' => Rank::Sixth,
        '7' => Rank::Seventh,
        '8' => Rank::Eighth,
        _ => return Err(UciMoveError::InvalidSquare(s.to_string())),
    };

    Ok(Square::new(file, rank))
}

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// The conversion only happens when the converted move is in `legal_moves`,
/// so a plain king step like e1g1 in an endgame is left untouched.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_rank_1_or_8 && is_e_file && is_g_or_c_file && mv.promotion.is_none() {
        let rook_file = match mv.to.file() {
            File::G => File::H,
            _ => File::A,
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };

        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Rewrite a cozy_chess castling move (king takes own rook) into the standard
/// king-steps-two-squares form. `board` is the position before the move.
pub fn to_standard_castling(board: &Board, mv: Move) -> Move {
    let is_king = board.piece_on(mv.from) == Some(Piece::King);
    let onto_own_piece = board.color_on(mv.from).is_some()
        && board.color_on(mv.from) == board.color_on(mv.to);

    if !(is_king && onto_own_piece) {
        return mv;
    }

    let king_file = if mv.to.file() as u8 > mv.from.file() as u8 {
        File::G
    } else {
        File::C
    };
    Move {
        from: mv.from,
        to: Square::new(king_file, mv.from.rank()),
        promotion: None,
    }
}

/// Format a move played from `board` in standard UCI notation.
pub fn format_move(board: &Board, mv: Move) -> String {
    format_uci_move(to_standard_castling(board, mv))
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q"), without any
/// castling conversion.
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

fn format_square(sq: Square) -> String {
    let file = match sq.file() {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    };
    let rank = match sq.rank() {
        Rank::First => '1',
        Rank::Second => '2',
        Rank::Third => '3',
        Rank::Fourth => '4',
        Rank::Fifth => '5',
        Rank::Sixth => '6',
        Rank::Seventh => '7',
        Rank::Eighth => '8',
    };
    format!("{}{}", file, rank)
}

fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}
