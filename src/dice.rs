//! Dice rolls and the die values left to play in a turn.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DIE_FACES;

/// Die values still available to the side to move.
///
/// A plain roll gives two values; a double gives four copies of one value.
/// Serializes as a JSON array of the remaining values.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<u8>", try_from = "Vec<u8>")]
pub struct Dice {
    values: [u8; 4],
    len: u8,
}

impl Dice {
    /// No dice left.
    pub const fn empty() -> Self {
        Self {
            values: [0; 4],
            len: 0,
        }
    }

    /// Dice for a roll of `a` and `b`, expanded to four values on a double.
    pub fn from_roll(a: u8, b: u8) -> Self {
        debug_assert!((1..=DIE_FACES).contains(&a) && (1..=DIE_FACES).contains(&b));
        if a == b {
            Self {
                values: [a; 4],
                len: 4,
            }
        } else {
            Self {
                values: [a, b, 0, 0],
                len: 2,
            }
        }
    }

    /// Roll two dice.
    pub fn roll(rng: &mut fastrand::Rng) -> Self {
        Self::from_roll(rng.u8(1..=DIE_FACES), rng.u8(1..=DIE_FACES))
    }

    #[inline]
    pub fn values(&self) -> &[u8] {
        &self.values[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_double(&self) -> bool {
        self.len == 4
    }

    /// Remove the first die showing `value`. Returns false if none does.
    pub fn remove(&mut self, value: u8) -> bool {
        let n = self.len as usize;
        match self.values[..n].iter().position(|&v| v == value) {
            Some(i) => {
                self.values.copy_within(i + 1..n, i);
                self.values[n - 1] = 0;
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::empty();
    }
}

impl From<Dice> for Vec<u8> {
    fn from(dice: Dice) -> Self {
        dice.values().to_vec()
    }
}

impl TryFrom<Vec<u8>> for Dice {
    type Error = String;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        if values.len() > 4 {
            return Err(format!("at most 4 dice, got {}", values.len()));
        }
        if let Some(v) = values.iter().find(|v| !(1..=DIE_FACES).contains(*v)) {
            return Err(format!("die value out of range: {v}"));
        }
        let mut dice = Self::empty();
        dice.values[..values.len()].copy_from_slice(&values);
        dice.len = values.len() as u8;
        Ok(dice)
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.values().iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", parts.join(" "))
    }
}
