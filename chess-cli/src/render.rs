//! Text rendering of the board.
//!
//! Rendering is split in two pure steps: [`board_view`] lays the squares out
//! in display order, [`render_board`] turns that grid into lines of text.
//! Centering happens in [`crate::terminal`], which knows the screen width.

use chess::{PieceColor, PieceKind};
use cozy_chess::{Board, File, Rank, Square};
use crossterm::style::Stylize;

pub const TITLE: &str = "Chess Board";

/// Symbol for an empty square.
pub const EMPTY_SQUARE: char = '.';

/// Each square is drawn three columns wide.
const CELL_WIDTH: usize = 3;

/// Left margin holding the rank label and the border: `"8 |"`.
const RANK_GUTTER: usize = 3;

/// One square as it will be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub symbol: char,
    pub highlighted: bool,
}

/// The 8x8 grid in display order, top row first, with its axis labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub rows: [[Cell; 8]; 8],
    pub rank_labels: [char; 8],
    pub file_labels: [char; 8],
}

/// Rendered lines, without ANSI codes counted in `width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBoard {
    pub lines: Vec<String>,
    pub width: usize,
}

/// Lay out `board` for display.
///
/// Rank 8 is on top unless `flip`, which puts rank 1 on top and mirrors the
/// files. `last_move` squares are highlighted.
pub fn board_view(board: &Board, last_move: Option<(Square, Square)>, flip: bool) -> BoardView {
    let mut ranks = Rank::ALL;
    let mut files = File::ALL;
    if !flip {
        ranks.reverse();
    } else {
        files.reverse();
    }

    let highlighted = |square: Square| {
        last_move.is_some_and(|(from, to)| square == from || square == to)
    };

    let rows = ranks.map(|rank| {
        files.map(|file| {
            let square = Square::new(file, rank);
            Cell {
                symbol: square_symbol(board, square),
                highlighted: highlighted(square),
            }
        })
    });

    BoardView {
        rows,
        rank_labels: ranks.map(rank_char),
        file_labels: files.map(file_char),
    }
}

fn square_symbol(board: &Board, square: Square) -> char {
    match (board.piece_on(square), board.color_on(square)) {
        (Some(piece), Some(color)) => PieceKind::from(piece).symbol(PieceColor::from(color)),
        _ => EMPTY_SQUARE,
    }
}

fn rank_char(rank: Rank) -> char {
    char::from(b'1' + rank as u8)
}

fn file_char(file: File) -> char {
    char::from(b'a' + file as u8)
}

/// Draw a bordered table titled [`TITLE`].
///
/// With `color`, highlighted squares are drawn in bold on cyan; without it
/// they are bracketed, as in `[P]`.
pub fn render_board(view: &BoardView, color: bool) -> RenderedBoard {
    let inner = CELL_WIDTH * 8;
    let width = RANK_GUTTER + inner + 1;
    let border = format!("  +{}+", "-".repeat(inner));

    let mut lines = Vec::with_capacity(12);
    lines.push(format!("{:^width$}", TITLE));
    lines.push(border.clone());

    for (row, label) in view.rows.iter().zip(view.rank_labels) {
        let mut line = format!("{label} |");
        for cell in row {
            line.push_str(&render_cell(*cell, color));
        }
        line.push('|');
        lines.push(line);
    }

    lines.push(border);

    let mut files = " ".repeat(RANK_GUTTER);
    for label in view.file_labels {
        files.push_str(&format!(" {label} "));
    }
    lines.push(files);

    RenderedBoard { lines, width }
}

fn render_cell(cell: Cell, color: bool) -> String {
    match (cell.highlighted, color) {
        (false, _) => format!(" {} ", cell.symbol),
        (true, true) => format!(" {} ", cell.symbol).bold().black().on_cyan().to_string(),
        (true, false) => format!("[{}]", cell.symbol),
    }
}
