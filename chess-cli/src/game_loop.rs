//! The interactive game, driven as a small state machine.

use crate::input::HumanInput;
use crate::prompt::{ask_engine_color, ask_flip_board, read_human_input};
use crate::render::{board_view, render_board};
use crate::selector::{choose_move, Accuracy};
use crate::terminal::{Terminal, Tone};
use chess::{Game, GameError, GameResult};
use cozy_chess::Move;
use engine::{Engine, EngineError, SearchLimits};
use rand::Rng;
use std::io::{self, BufRead, Write};

/// Engine settings fixed for the whole game.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub limits: SearchLimits,
    pub accuracy: Accuracy,
}

#[derive(Debug, thiserror::Error)]
pub enum GameLoopError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("engine failed: {0}")]
    Engine(#[from] EngineError),
    #[error("game error: {0}")]
    Game(#[from] GameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Setup,
    /// The engine has the first move of the game.
    EngineOpening,
    AwaitHuman,
    /// The engine replies, or plays the player's override instead.
    AwaitEngine {
        engine_override: Option<Move>,
    },
    GameOver,
}

pub struct GameLoop<E, G, I, O> {
    engine: E,
    terminal: Terminal<I, O>,
    rng: G,
    settings: Settings,
    game: Game,
    flip: bool,
}

impl<E, G, I, O> GameLoop<E, G, I, O>
where
    E: Engine,
    G: Rng,
    I: BufRead,
    O: Write,
{
    pub fn new(engine: E, terminal: Terminal<I, O>, rng: G, settings: Settings) -> Self {
        Self {
            engine,
            terminal,
            rng,
            settings,
            game: Game::new(),
            flip: false,
        }
    }

    /// Start from `game` instead of the standard position.
    pub fn with_game(mut self, game: Game) -> Self {
        self.game = game;
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn terminal(&self) -> &Terminal<I, O> {
        &self.terminal
    }

    /// Play until the game is over, then shut the engine down.
    ///
    /// The engine is shut down exactly once, also when play ends in an error.
    pub async fn run(&mut self) -> Result<GameResult, GameLoopError> {
        let played = self.play().await;

        let shutdown = self.engine.shutdown().await;
        if let Err(e) = &shutdown {
            tracing::error!("Engine shutdown failed: {}", e);
        }

        let result = played?;
        shutdown?;
        Ok(result)
    }

    async fn play(&mut self) -> Result<GameResult, GameLoopError> {
        let mut state = State::Setup;
        loop {
            tracing::trace!(?state, plies = self.game.history().len(), "Game loop step");
            state = match state {
                State::Setup => self.setup()?,
                State::EngineOpening => self.engine_turn(None).await?,
                State::AwaitHuman => self.human_turn()?,
                State::AwaitEngine { engine_override } => {
                    self.engine_turn(engine_override).await?
                }
                State::GameOver => return self.game_over(),
            };
        }
    }

    fn setup(&mut self) -> Result<State, GameLoopError> {
        let engine_color = ask_engine_color(&mut self.terminal)?;
        self.flip = ask_flip_board(&mut self.terminal)?;
        tracing::info!(
            engine = %engine_color,
            flip = self.flip,
            fen = %self.game.to_fen(),
            "Game started"
        );

        self.terminal.announce(
            &format!("Engine is playing as {}.", engine_color.as_str()),
            Tone::Alert,
        )?;

        if self.game.is_game_over() {
            self.show_board()?;
            return Ok(State::GameOver);
        }
        if self.game.side_to_move() == engine_color {
            return Ok(State::EngineOpening);
        }

        self.show_board()?;
        Ok(State::AwaitHuman)
    }

    fn human_turn(&mut self) -> Result<State, GameLoopError> {
        match read_human_input(&mut self.terminal, &self.game)? {
            HumanInput::Undo => {
                self.undo()?;
                Ok(State::AwaitHuman)
            }
            HumanInput::Moves {
                human,
                engine_override,
            } => {
                let entry = self.game.push(human)?;
                tracing::debug!(side = %entry.side, mv = %entry.uci, "Player moved");
                self.show_board()?;

                if self.game.is_game_over() {
                    Ok(State::GameOver)
                } else {
                    Ok(State::AwaitEngine { engine_override })
                }
            }
        }
    }

    fn undo(&mut self) -> Result<(), GameLoopError> {
        match self.game.undo_pair() {
            Ok(_) => {
                tracing::debug!(plies = self.game.history().len(), "Undid two plies");
                self.render(false)?;
                self.terminal.announce("Last move undone.", Tone::Alert)?;
            }
            Err(GameError::InsufficientHistory { .. }) => {
                self.terminal
                    .announce("Cannot undo, not enough moves to undo.", Tone::Alert)?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn engine_turn(&mut self, engine_override: Option<Move>) -> Result<State, GameLoopError> {
        let Settings { limits, accuracy } = self.settings;
        let mut mv =
            choose_move(&mut self.engine, &self.game, limits, accuracy, &mut self.rng).await?;

        if let Some(replacement) = engine_override {
            tracing::info!(
                engine = %self.game.format_move(mv),
                replacement = %self.game.format_move(replacement),
                "Engine move overridden"
            );
            mv = replacement;
            self.terminal.announce(
                &format!("Move overridden: {}", self.game.format_move(mv)),
                Tone::Alert,
            )?;
        }

        let entry = self.game.push(mv)?;
        tracing::debug!(side = %entry.side, mv = %entry.uci, "Engine moved");
        self.show_board()?;
        self.terminal
            .announce(&format!("Engine played: {}", entry.uci), Tone::Engine)?;

        if self.game.is_game_over() {
            Ok(State::GameOver)
        } else {
            Ok(State::AwaitHuman)
        }
    }

    fn game_over(&mut self) -> Result<GameResult, GameLoopError> {
        let result = self.game.result();
        match self.game.outcome() {
            Some(outcome) => {
                tracing::info!(
                    termination = %outcome.termination,
                    result = %result,
                    plies = self.game.history().len(),
                    "Game over"
                );
                self.terminal.announce(
                    &format!("Game over: {}.", outcome.termination),
                    Tone::Alert,
                )?;
            }
            None => self.terminal.announce("Game over.", Tone::Alert)?,
        }
        self.terminal.announce(&result.to_string(), Tone::Info)?;
        Ok(result)
    }

    fn show_board(&mut self) -> io::Result<()> {
        self.render(true)
    }

    fn render(&mut self, highlight_last: bool) -> io::Result<()> {
        let last = if highlight_last {
            self.game.history().last().map(|entry| entry.squares)
        } else {
            None
        };
        let view = board_view(self.game.position(), last, self.flip);
        let board = render_board(&view, self.terminal.color());
        self.terminal.board(&board)
    }
}
