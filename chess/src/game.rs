use cozy_chess::{Board, Move, Piece, Rank, Square};

use crate::types::PieceColor;
use crate::uci::{
    convert_uci_castling_to_cozy, format_move, parse_uci_move, to_standard_castling, UciMoveError,
};

/// Plies without a capture or pawn move after which the game is drawn.
const SEVENTY_FIVE_MOVE_PLIES: u16 = 150;

/// Number of occurrences of a position that ends the game.
const FIVEFOLD: usize = 5;

/// Hash of a position for repetition counting. The en passant file only
/// counts while an en passant capture is legal.
fn repetition_key(board: &Board) -> u64 {
    let Some(file) = board.en_passant() else {
        return board.hash_without_ep();
    };

    let us = board.side_to_move();
    let target = Square::new(file, Rank::Sixth.relative_to(us));
    let mut capturable = false;
    board.generate_moves_for(board.colored_pieces(us, Piece::Pawn), |moves| {
        capturable = moves.to.has(target);
        capturable
    });

    if capturable {
        board.hash()
    } else {
        board.hash_without_ep()
    }
}

/// Main game state wrapper around cozy-chess Board
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    /// State of the start position followed by one entry per ply.
    states: Vec<PlyState>,
    start_position: StartPosition,
}

/// Per-position data the draw rules need. cozy-chess caps its own halfmove
/// clock at 100, so the clock is tracked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlyState {
    hash: u64,
    halfmove_clock: u16,
}

impl PlyState {
    fn initial(board: &Board) -> Self {
        Self {
            hash: repetition_key(board),
            halfmove_clock: board.halfmove_clock().into(),
        }
    }
}

/// A ply that has been applied to the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    /// Standard UCI text (castling as e1g1)
    pub uci: String,
    /// Origin and destination as a player sees them (castling lands on g1/c1)
    pub squares: (Square, Square),
    pub side: PieceColor,
}

/// Starting position of the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

/// A finished game: how it ended and who won (`None` for draws)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub termination: Termination,
    pub winner: Option<PieceColor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Ongoing,
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        let position = Board::default();
        Self {
            states: vec![PlyState::initial(&position)],
            position,
            history: Vec::new(),
            start_position: StartPosition::Standard,
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let position = crate::fen::parse_fen(fen)?;
        Ok(Self {
            states: vec![PlyState::initial(&position)],
            position,
            history: Vec::new(),
            start_position: StartPosition::Fen(fen.to_string()),
        })
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start_position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Moves played so far in standard UCI notation, for `position ... moves`
    pub fn uci_moves(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(|entry| entry.uci.as_str())
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.position.is_legal(mv)
    }

    /// Parse standard UCI text into a move in this position's encoding.
    ///
    /// Only the shape is checked; the result may still be illegal.
    pub fn parse_move(&self, text: &str) -> Result<Move, GameError> {
        let mv = parse_uci_move(text)?;
        Ok(convert_uci_castling_to_cozy(mv, &self.legal_moves()))
    }

    /// Parse standard UCI text and require the move to be legal here.
    pub fn resolve_move(&self, text: &str) -> Result<Move, GameError> {
        let mv = self.parse_move(text)?;
        if !self.is_legal(mv) {
            return Err(GameError::IllegalMove(text.to_string()));
        }
        Ok(mv)
    }

    /// Standard UCI text for a move played from the current position
    pub fn format_move(&self, mv: Move) -> String {
        format_move(&self.position, mv)
    }

    /// Make a move on the board
    pub fn push(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        if !self.is_legal(mv) {
            return Err(GameError::IllegalMove(self.format_move(mv)));
        }

        let standard = to_standard_castling(&self.position, mv);
        let entry = HistoryEntry {
            mv,
            uci: self.format_move(mv),
            squares: (standard.from, standard.to),
            side: self.side_to_move(),
        };

        let resets_clock = self.position.piece_on(mv.from) == Some(Piece::Pawn)
            || self
                .position
                .color_on(mv.to)
                .is_some_and(|color| color != self.position.side_to_move());
        let halfmove_clock = if resets_clock {
            0
        } else {
            self.current_state().halfmove_clock.saturating_add(1)
        };

        self.position.play_unchecked(mv);
        self.states.push(PlyState {
            hash: repetition_key(&self.position),
            halfmove_clock,
        });
        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Undo the last two plies (one per side) as a unit.
    ///
    /// Leaves the game untouched when fewer than two plies exist.
    pub fn undo_pair(&mut self) -> Result<[HistoryEntry; 2], GameError> {
        if self.history.len() < 2 {
            return Err(GameError::InsufficientHistory {
                requested: 2,
                available: self.history.len(),
            });
        }

        let second = self.history.pop().ok_or(GameError::NothingToUndo)?;
        let first = self.history.pop().ok_or(GameError::NothingToUndo)?;
        self.states.truncate(self.history.len() + 1);
        self.rebuild_position()?;

        Ok([first, second])
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> PieceColor {
        self.position.side_to_move().into()
    }

    /// How the game ended, or `None` while it is still going
    pub fn outcome(&self) -> Option<Outcome> {
        let board = &self.position;

        if !board.generate_moves(|_| true) {
            return Some(if board.checkers().is_empty() {
                Outcome::draw(Termination::Stalemate)
            } else {
                Outcome {
                    termination: Termination::Checkmate,
                    winner: Some(self.side_to_move().opposite()),
                }
            });
        }

        if is_insufficient_material(board) {
            return Some(Outcome::draw(Termination::InsufficientMaterial));
        }
        if self.current_state().halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES {
            return Some(Outcome::draw(Termination::SeventyFiveMoves));
        }
        if self.repetitions() >= FIVEFOLD {
            return Some(Outcome::draw(Termination::FivefoldRepetition));
        }

        None
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn result(&self) -> GameResult {
        match self.outcome() {
            None => GameResult::Ongoing,
            Some(Outcome {
                winner: Some(PieceColor::White),
                ..
            }) => GameResult::WhiteWins,
            Some(Outcome {
                winner: Some(PieceColor::Black),
                ..
            }) => GameResult::BlackWins,
            Some(_) => GameResult::Draw,
        }
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        crate::fen::format_fen(&self.position)
    }

    fn current_state(&self) -> PlyState {
        self.states
            .last()
            .copied()
            .unwrap_or_else(|| PlyState::initial(&self.position))
    }

    /// How many times the current position has occurred
    fn repetitions(&self) -> usize {
        let current = repetition_key(&self.position);
        self.states
            .iter()
            .filter(|state| state.hash == current)
            .count()
    }

    /// Rebuild position from start + history (for undo)
    fn rebuild_position(&mut self) -> Result<(), GameError> {
        let mut board = match &self.start_position {
            StartPosition::Standard => Board::default(),
            StartPosition::Fen(fen) => crate::fen::parse_fen(fen)?,
        };

        for entry in &self.history {
            if !board.is_legal(entry.mv) {
                return Err(GameError::IllegalMove(entry.uci.clone()));
            }
            board.play_unchecked(entry.mv);
        }

        self.position = board;
        Ok(())
    }
}

impl Outcome {
    fn draw(termination: Termination) -> Self {
        Self {
            termination,
            winner: None,
        }
    }
}

/// Positions where neither side can ever deliver mate: bare kings, a single
/// minor piece, or only bishops that all stand on one square color.
fn is_insufficient_material(board: &Board) -> bool {
    let mating_material =
        board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !mating_material.is_empty() {
        return false;
    }

    let knights = board.pieces(Piece::Knight);
    let bishops = board.pieces(Piece::Bishop);
    if (knights | bishops).len() <= 1 {
        return true;
    }
    if !knights.is_empty() {
        return false;
    }

    let mut shades = bishops
        .into_iter()
        .map(|sq| (sq.file() as u8 + sq.rank() as u8) % 2);
    match shades.next() {
        Some(first) => shades.all(|shade| shade == first),
        None => true,
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Checkmate => "checkmate",
            Self::Stalemate => "stalemate",
            Self::InsufficientMaterial => "insufficient material",
            Self::SeventyFiveMoves => "seventy-five-move rule",
            Self::FivefoldRepetition => "fivefold repetition",
        };
        f.write_str(text)
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        };
        f.write_str(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Cannot undo {requested} plies, only {available} played")]
    InsufficientHistory { requested: usize, available: usize },
    #[error("Move parse error: {0}")]
    Notation(#[from] UciMoveError),
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
}
