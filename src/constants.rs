//! Constants for board geometry and search parameters.
//!
//! The board is a flat array of 24 points. Indices past the last point are
//! pseudo-points: each side has a bar it re-enters from and an "off" tray it
//! bears off into. Move generation speaks in these indices, so a move is always
//! a plain `(from, to)` pair.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of points on the board.
pub const NUM_POINTS: usize = 24;

/// Checkers each side starts with.
pub const CHECKERS_PER_SIDE: u8 = 15;

/// Points in a home quadrant.
pub const HOME_SIZE: usize = 6;

/// Faces on a die.
pub const DIE_FACES: u8 = 6;

// =============================================================================
// Pseudo-indices
// =============================================================================

/// Bar of side A (A re-enters onto points 0..=5).
pub const BAR_A: usize = 24;

/// Bar of side B (B re-enters onto points 23..=18).
pub const BAR_B: usize = 25;

/// Borne-off tray of side A.
pub const OFF_A: usize = 26;

/// Borne-off tray of side B.
pub const OFF_B: usize = 27;

/// Opening layout as signed counts: positive is side A, negative is side B.
pub const STARTING_POINTS: [i8; NUM_POINTS] = [
    2, 0, 0, 0, 0, -5, 0, -3, 0, 0, 0, 5, //
    -5, 0, 0, 0, 3, 0, 5, 0, 0, 0, 0, -2,
];

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default number of select/rollout/backpropagate iterations per decision.
pub const N_ITERATIONS: usize = 1000;

/// Default exploration constant in the selection score.
pub const EXPLORATION: f64 = 1.4;

/// Turn cap for a single random playout. Random play finishes far below this;
/// it only guards against a pathological loop.
pub const MAX_PLAYOUT_TURNS: usize = 10_000;
