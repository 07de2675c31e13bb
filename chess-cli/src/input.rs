//! Parsing and validation of what the player types.
//!
//! Parsing only checks the shape of a line. Validation checks the parsed
//! moves against a [`Game`]. The prompt loop in [`crate::prompt`] composes the
//! two and re-prompts on any error.

use chess::{convert_uci_castling_to_cozy, parse_uci_move, Game, PieceColor, UciMoveError};
use cozy_chess::Move;

/// A syntactically valid line. Moves are in standard UCI encoding and have
/// not been checked against any position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedInput {
    Undo,
    Moves {
        human: Move,
        engine_override: Option<Move>,
    },
}

/// A line that is valid for the current game. Moves are in the game's encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanInput {
    Undo,
    Moves {
        human: Move,
        engine_override: Option<Move>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("no move entered")]
    Empty,
    #[error("expected at most two moves, got {0}")]
    TooManyMoves(usize),
    #[error("'{token}' is not a move: {source}")]
    Malformed {
        token: String,
        #[source]
        source: UciMoveError,
    },
    #[error("{0} is not legal here")]
    Illegal(String),
    #[error("override {0} is not legal after your move")]
    IllegalOverride(String),
}

/// Parse one input line: `undo`, or one or two comma-separated moves.
///
/// Tokens are checked left to right; the first bad token rejects the line.
pub fn parse_input(line: &str) -> Result<ParsedInput, InputError> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("undo") {
        return Ok(ParsedInput::Undo);
    }
    if line.is_empty() {
        return Err(InputError::Empty);
    }

    let tokens: Vec<&str> = line.split(',').map(str::trim).collect();
    if tokens.len() > 2 {
        return Err(InputError::TooManyMoves(tokens.len()));
    }

    let mut moves = tokens.iter().map(|token| parse_token(token));
    let human = match moves.next() {
        Some(mv) => mv?,
        None => return Err(InputError::Empty),
    };
    let engine_override = moves.next().transpose()?;

    Ok(ParsedInput::Moves {
        human,
        engine_override,
    })
}

fn parse_token(token: &str) -> Result<Move, InputError> {
    parse_uci_move(token).map_err(|source| InputError::Malformed {
        token: token.to_string(),
        source,
    })
}

/// Check parsed moves against the game.
///
/// The human move must be legal now. The override must be legal in the
/// position the human move leads to, since that is where it will be played.
pub fn validate(parsed: ParsedInput, game: &Game) -> Result<HumanInput, InputError> {
    let (human, engine_override) = match parsed {
        ParsedInput::Undo => return Ok(HumanInput::Undo),
        ParsedInput::Moves {
            human,
            engine_override,
        } => (human, engine_override),
    };

    let human = legal_move(game, human)
        .ok_or_else(|| InputError::Illegal(chess::format_uci_move(human)))?;

    let engine_override = match engine_override {
        None => None,
        Some(reply) => {
            let mut after = game.clone();
            after
                .push(human)
                .map_err(|_| InputError::Illegal(game.format_move(human)))?;
            let resolved = legal_move(&after, reply)
                .ok_or_else(|| InputError::IllegalOverride(chess::format_uci_move(reply)))?;
            Some(resolved)
        }
    };

    Ok(HumanInput::Moves {
        human,
        engine_override,
    })
}

fn legal_move(game: &Game, mv: Move) -> Option<Move> {
    let mv = convert_uci_castling_to_cozy(mv, &game.legal_moves());
    game.is_legal(mv).then_some(mv)
}

/// Answer to "should the engine play white or black?"
pub fn parse_color_answer(answer: &str) -> Option<PieceColor> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "w" => Some(PieceColor::White),
        "b" => Some(PieceColor::Black),
        _ => None,
    }
}

/// Answer to a y/n question
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" => Some(true),
        "n" => Some(false),
        _ => None,
    }
}
