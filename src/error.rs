//! Errors surfaced to the caller of the game API.

use thiserror::Error;

use crate::mcts::SearchError;
use crate::position::Side;

/// Errors that can occur while driving a game.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The destination is not among the legal moves for the start point.
    #[error("illegal move from {start} to {destination}")]
    IllegalMove { start: usize, destination: usize },

    /// A move was requested before rolling.
    #[error("no dice remaining, roll first")]
    NoDice,

    /// A roll was requested while dice from the last roll remain.
    #[error("dice already rolled")]
    DiceAlreadyRolled,

    /// The turn was handed over before the side to move rolled.
    #[error("roll before ending the turn")]
    NotRolled,

    /// The side to move is not driven by the computer.
    #[error("side {0} is not controlled by the computer")]
    NotComputerControlled(Side),

    /// The game already has a winner.
    #[error("game is already over")]
    GameOver,

    /// A position that breaks checker conservation or point ownership.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Convenience Result type for game operations.
pub type Result<T> = std::result::Result<T, GameError>;
