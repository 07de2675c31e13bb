//! Interactive questions. Each one re-asks until it gets a usable answer.

use crate::input::{parse_color_answer, parse_input, parse_yes_no, validate, HumanInput};
use crate::terminal::Terminal;
use chess::{Game, PieceColor};
use std::io::{self, BufRead, Write};

pub const ENGINE_COLOR_QUESTION: &str = "Do you want the engine to play as white or black? (w/b): ";
pub const FLIP_QUESTION: &str = "Do you want to flip the board? (y/n): ";
pub const MOVE_QUESTION: &str = "Enter your move (optionally followed by the engine's override move, \
     separated by a comma, or 'undo' to undo the last move): ";

/// Ask which side the engine plays.
pub fn ask_engine_color<R: BufRead, W: Write>(
    terminal: &mut Terminal<R, W>,
) -> io::Result<PieceColor> {
    loop {
        let answer = terminal.prompt(ENGINE_COLOR_QUESTION)?;
        if let Some(color) = parse_color_answer(&answer) {
            return Ok(color);
        }
        terminal.error("Invalid input. Please enter 'w' for white or 'b' for black.")?;
    }
}

/// Ask whether to draw the board with rank 1 on top.
pub fn ask_flip_board<R: BufRead, W: Write>(terminal: &mut Terminal<R, W>) -> io::Result<bool> {
    loop {
        let answer = terminal.prompt(FLIP_QUESTION)?;
        if let Some(flip) = parse_yes_no(&answer) {
            return Ok(flip);
        }
        terminal.error("Invalid input. Please enter 'y' for yes or 'n' for no.")?;
    }
}

/// Read the player's next action. Lines that do not parse, or name a move
/// that is not legal, are reported and discarded without touching `game`.
pub fn read_human_input<R: BufRead, W: Write>(
    terminal: &mut Terminal<R, W>,
    game: &Game,
) -> io::Result<HumanInput> {
    loop {
        let line = terminal.prompt(MOVE_QUESTION)?;
        match parse_input(&line).and_then(|parsed| validate(parsed, game)) {
            Ok(input) => return Ok(input),
            Err(e) => {
                tracing::debug!(input = line.trim(), error = %e, "Rejected player input");
                terminal.error(&format!("Invalid move ({e}). Please try again."))?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn terminal(input: &str) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
        Terminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), 80, false)
    }

    fn output(terminal: &Terminal<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(terminal.output().clone()).unwrap()
    }

    #[test]
    fn test_color_question_repeats_until_valid() {
        let mut term = terminal("white\n\nB\n");
        assert_eq!(ask_engine_color(&mut term).unwrap(), PieceColor::Black);

        let out = output(&term);
        assert_eq!(out.matches(ENGINE_COLOR_QUESTION).count(), 3);
        assert_eq!(out.matches("Invalid input").count(), 2);
    }

    #[test]
    fn test_flip_question() {
        let mut term = terminal("maybe\ny\n");
        assert!(ask_flip_board(&mut term).unwrap());

        let mut term = terminal("n\n");
        assert!(!ask_flip_board(&mut term).unwrap());
    }

    #[test]
    fn test_setup_eof_is_an_error() {
        let mut term = terminal("x\n");
        let err = ask_engine_color(&mut term).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_move_input_skips_bad_lines() {
        let game = Game::new();
        let mut term = terminal("e2e5\nhello\ne2e4,e7e5,d7d5\nUNDO\n");
        assert_eq!(read_human_input(&mut term, &game).unwrap(), HumanInput::Undo);
        assert_eq!(output(&term).matches("Invalid move").count(), 3);
    }

    #[test]
    fn test_move_input_reprompts_after_invalid_utf8() {
        let game = Game::new();
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"e2e4\n");
        let mut term = Terminal::new(Cursor::new(input), Vec::new(), 80, false);

        let HumanInput::Moves { human, .. } = read_human_input(&mut term, &game).unwrap() else {
            panic!("expected moves");
        };
        assert_eq!(game.format_move(human), "e2e4");
        assert_eq!(output(&term).matches("Invalid move").count(), 1);
    }

    #[test]
    fn test_move_input_returns_validated_moves() {
        let game = Game::new();
        let mut term = terminal("e2e4 , e7e5\n");
        let HumanInput::Moves {
            human,
            engine_override,
        } = read_human_input(&mut term, &game).unwrap()
        else {
            panic!("expected moves");
        };
        assert_eq!(game.format_move(human), "e2e4");
        assert!(engine_override.is_some());
    }
}
