//! Backgammon position representation.
//!
//! The board is 24 signed counters: the sign says which side owns a point and
//! the magnitude says how many checkers sit there. Side A owns positive counts
//! and travels toward higher indices; side B owns negative counts and travels
//! toward lower indices. Bar and borne-off checkers are kept as per-side
//! counters next to the board.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{GameError, Result};

/// Board-only identity of a position, used to deduplicate end-of-turn states.
pub type BoardKey = [i8; NUM_POINTS];

/// One of the two players.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    /// Array slot of this side in per-side tables.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Sign of this side's counts on the board (+1 for A, -1 for B).
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Side::A => 1,
            Side::B => -1,
        }
    }

    #[inline]
    pub fn bar_index(self) -> usize {
        match self {
            Side::A => BAR_A,
            Side::B => BAR_B,
        }
    }

    #[inline]
    pub fn off_index(self) -> usize {
        match self {
            Side::A => OFF_A,
            Side::B => OFF_B,
        }
    }

    /// Points of this side's home quadrant.
    pub fn home(self) -> RangeInclusive<usize> {
        match self {
            Side::A => NUM_POINTS - HOME_SIZE..=NUM_POINTS - 1,
            Side::B => 0..=HOME_SIZE - 1,
        }
    }

    /// Point a bar checker lands on when entering with `die`.
    #[inline]
    pub fn entry_point(self, die: u8) -> usize {
        match self {
            Side::A => die as usize - 1,
            Side::B => NUM_POINTS - die as usize,
        }
    }

    /// Destination of advancing `start` by `die`, or `None` when it runs past
    /// the last point.
    #[inline]
    pub fn advance(self, start: usize, die: u8) -> Option<usize> {
        let die = die as usize;
        match self {
            Side::A if start + die < NUM_POINTS => Some(start + die),
            Side::B if start >= die => Some(start - die),
            _ => None,
        }
    }

    /// Whether `die` carries a checker on `start` exactly off the board.
    #[inline]
    pub fn bears_off_exactly(self, start: usize, die: u8) -> bool {
        let die = die as usize;
        match self {
            Side::A => start + die == NUM_POINTS,
            Side::B => start + 1 == die,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(Side::A),
            "B" | "b" => Ok(Side::B),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// A backgammon position: the board plus bar and borne-off counters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Signed checker counts, point 0 to point 23
    pub points: [i8; NUM_POINTS],
    /// Checkers waiting on the bar, indexed by `Side::index`
    pub bar: [u8; 2],
    /// Checkers borne off, indexed by `Side::index`
    pub off: [u8; 2],
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// The standard opening position.
    pub fn new() -> Self {
        Self {
            points: STARTING_POINTS,
            bar: [0; 2],
            off: [0; 2],
        }
    }

    /// Build a position from raw parts, rejecting anything that breaks
    /// checker conservation.
    pub fn from_parts(points: [i8; NUM_POINTS], bar: [u8; 2], off: [u8; 2]) -> Result<Self> {
        let pos = Self { points, bar, off };
        pos.validate()?;
        Ok(pos)
    }

    /// Number of `side`'s checkers on `point`.
    #[inline]
    pub fn count(&self, side: Side, point: usize) -> u8 {
        let c = self.points[point];
        if c.signum() == side.sign() {
            c.unsigned_abs()
        } else {
            0
        }
    }

    #[inline]
    pub fn bar(&self, side: Side) -> u8 {
        self.bar[side.index()]
    }

    #[inline]
    pub fn off(&self, side: Side) -> u8 {
        self.off[side.index()]
    }

    /// Checkers of `side` still on the 24 points.
    pub fn on_board(&self, side: Side) -> u8 {
        (0..NUM_POINTS).map(|pt| self.count(side, pt)).sum()
    }

    /// On-board + bar + off; always 15 for a valid position.
    pub fn checker_total(&self, side: Side) -> u8 {
        self.on_board(side) + self.bar(side) + self.off(side)
    }

    pub fn is_consistent(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check checker conservation for both sides.
    pub fn validate(&self) -> Result<()> {
        let oversized = self
            .points
            .iter()
            .position(|c| c.unsigned_abs() > CHECKERS_PER_SIDE);
        if let Some(pt) = oversized {
            return Err(GameError::InvalidPosition(format!(
                "point {pt} holds {} checkers",
                self.points[pt].unsigned_abs()
            )));
        }
        for side in Side::BOTH {
            let on_board: u32 = (0..NUM_POINTS)
                .map(|pt| self.count(side, pt) as u32)
                .sum();
            let total = on_board + self.bar(side) as u32 + self.off(side) as u32;
            if total != CHECKERS_PER_SIDE as u32 {
                return Err(GameError::InvalidPosition(format!(
                    "side {side} has {total} checkers"
                )));
            }
        }
        Ok(())
    }

    /// Board-only key; ignores bar and off counters.
    #[inline]
    pub fn key(&self) -> BoardKey {
        self.points
    }

    /// Hash of the board-only key.
    pub fn canonical_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.points.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |c: i8| -> String {
            match c.signum() {
                1 => format!("{:>2}A", c),
                -1 => format!("{:>2}B", c.unsigned_abs()),
                _ => "  .".to_string(),
            }
        };
        let top: Vec<String> = self.points[..12].iter().map(|&c| cell(c)).collect();
        let bottom: Vec<String> = self.points[12..].iter().rev().map(|&c| cell(c)).collect();
        writeln!(f, " {}", top.join(" |"))?;
        writeln!(f, " {}", bottom.join(" |"))?;
        write!(
            f,
            " bar A:{} B:{}  off A:{} B:{}",
            self.bar(Side::A),
            self.bar(Side::B),
            self.off(Side::A),
            self.off(Side::B)
        )
    }
}
