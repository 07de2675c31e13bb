//! Line-based terminal I/O.
//!
//! Everything the game shows or reads goes through [`Terminal`], which wraps
//! any reader and writer so tests can script a session in memory.

use crate::render::RenderedBoard;
use crossterm::style::{StyledContent, Stylize};
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Width assumed when the real terminal size cannot be read.
pub const DEFAULT_WIDTH: usize = 80;

/// How an announcement is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Engine,
    Alert,
}

pub struct Terminal<R, W> {
    input: R,
    output: W,
    width: usize,
    color: bool,
}

impl Terminal<StdinLock<'static>, Stdout> {
    /// Terminal over the process's stdin and stdout, sized to the window.
    pub fn stdio(color: bool) -> Self {
        let width = crossterm::terminal::size()
            .map(|(columns, _)| usize::from(columns))
            .unwrap_or(DEFAULT_WIDTH);
        Self::new(io::stdin().lock(), io::stdout(), width, color)
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W, width: usize, color: bool) -> Self {
        Self {
            input,
            output,
            width,
            color,
        }
    }

    /// Whether output is styled with ANSI codes.
    pub fn color(&self) -> bool {
        self.color
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print `question` and read one line. End of input is an
    /// [`io::ErrorKind::UnexpectedEof`] error. Bytes that are not UTF-8 are
    /// replaced, so a garbled line reaches the caller as ordinary bad input.
    pub fn prompt(&mut self, question: &str) -> io::Result<String> {
        let question = self.styled(question, |text| text.bold());
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            ));
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Complain about bad input.
    pub fn error(&mut self, message: &str) -> io::Result<()> {
        let message = self.styled(message, |text| text.red());
        writeln!(self.output, "{message}")
    }

    /// Announce something centered on screen.
    pub fn announce(&mut self, message: &str, tone: Tone) -> io::Result<()> {
        let pad = self.padding(message.chars().count());
        let message = match tone {
            Tone::Info => self.styled(message, |text| text.green()),
            Tone::Engine => self.styled(message, |text| text.cyan().bold()),
            Tone::Alert => self.styled(message, |text| text.yellow().bold()),
        };
        writeln!(self.output, "{pad}{message}")
    }

    /// Draw a rendered board centered on screen.
    pub fn board(&mut self, board: &RenderedBoard) -> io::Result<()> {
        let pad = self.padding(board.width);
        writeln!(self.output)?;
        for line in &board.lines {
            writeln!(self.output, "{pad}{line}")?;
        }
        writeln!(self.output)
    }

    fn padding(&self, content_width: usize) -> String {
        " ".repeat(self.width.saturating_sub(content_width) / 2)
    }

    fn styled(&self, text: &str, style: impl Fn(&str) -> StyledContent<&str>) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}
