//! Game state and the operations exposed to a session layer.
//!
//! A `GameState` is a value: every operation that changes the game returns a
//! new state and leaves the receiver alone, so callers can branch, undo and
//! search freely.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::DIE_FACES;
use crate::dice::Dice;
use crate::error::{GameError, Result};
use crate::mcts::MctsEngine;
use crate::playout::random_turn;
use crate::position::{Position, Side};
use crate::rules;

/// Who makes the decisions for a side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Uniformly random legal moves
    Random,
    /// Monte Carlo Tree Search
    TreeSearch,
    /// Moves supplied from outside
    Human,
}

impl Policy {
    pub fn is_computer(self) -> bool {
        !matches!(self, Policy::Human)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Random => write!(f, "random"),
            Policy::TreeSearch => write!(f, "tree-search"),
            Policy::Human => write!(f, "human"),
        }
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Policy::Random),
            "tree-search" | "tree" | "mcts" => Ok(Policy::TreeSearch),
            "human" | "user" => Ok(Policy::Human),
            other => Err(format!("unknown policy: {other}")),
        }
    }
}

/// A named participant and the policy driving it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub policy: Policy,
}

impl Player {
    pub fn new(name: impl Into<String>, policy: Policy) -> Self {
        Self {
            name: name.into(),
            policy,
        }
    }
}

/// A single-die checker move. `from` may be a bar pseudo-index and `to` may
/// be an off pseudo-index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

impl Move {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

/// Everything needed to continue a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub position: Position,
    /// Players, indexed by `Side::index`
    pub players: [Player; 2],
    /// Side to move
    pub turn: Side,
    /// Die values the side to move has not played yet
    pub dice: Dice,
    /// Whether the side to move has rolled this turn
    #[serde(default)]
    pub rolled: bool,
}

impl GameState {
    /// Start a new game. Two dice are rolled until they differ; the higher
    /// die gives side A the first turn.
    pub fn new_game(
        name_a: &str,
        name_b: &str,
        policy_a: Policy,
        policy_b: Policy,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let turn = loop {
            let (a, b) = (rng.u8(1..=DIE_FACES), rng.u8(1..=DIE_FACES));
            if a > b {
                break Side::A;
            }
            if a < b {
                break Side::B;
            }
        };
        debug!("{turn} goes first");
        Self::with_turn(
            [Player::new(name_a, policy_a), Player::new(name_b, policy_b)],
            turn,
        )
    }

    /// Opening position with a fixed first player and no dice rolled.
    pub fn with_turn(players: [Player; 2], turn: Side) -> Self {
        Self {
            position: Position::new(),
            players,
            turn,
            dice: Dice::empty(),
            rolled: false,
        }
    }

    /// Replace the remaining dice. Non-empty dice count as this turn's roll.
    pub fn with_dice(mut self, dice: Dice) -> Self {
        self.rolled = !dice.is_empty();
        self.dice = dice;
        self
    }

    pub fn player(&self, side: Side) -> &Player {
        &self.players[side.index()]
    }

    /// Roll for the side to move. Only one roll is allowed per turn.
    pub fn roll(&self, rng: &mut fastrand::Rng) -> Result<GameState> {
        self.check_can_roll()?;
        Ok(self.clone().with_dice(Dice::roll(rng)))
    }

    /// Like `roll`, with the dice supplied by the caller.
    pub fn roll_with(&self, dice: Dice) -> Result<GameState> {
        self.check_can_roll()?;
        Ok(self.clone().with_dice(dice))
    }

    fn check_can_roll(&self) -> Result<()> {
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }
        if self.rolled || !self.dice.is_empty() {
            return Err(GameError::DiceAlreadyRolled);
        }
        Ok(())
    }

    pub fn legal_starts(&self) -> Vec<usize> {
        rules::legal_starts(&self.position, self.turn, self.dice.values())
    }

    pub fn legal_moves(&self, start: usize) -> BTreeMap<usize, u8> {
        rules::legal_moves(&self.position, self.turn, self.dice.values(), start)
    }

    /// Move a checker of the side to move from `start` to `destination`,
    /// consuming the matching die.
    pub fn apply_move(&self, start: usize, destination: usize) -> Result<GameState> {
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }
        if self.dice.is_empty() {
            return Err(GameError::NoDice);
        }
        let die = self
            .legal_moves(start)
            .get(&destination)
            .copied()
            .ok_or(GameError::IllegalMove { start, destination })?;
        let mut next = self.clone();
        next.play_unchecked(start, destination, die);
        Ok(next)
    }

    /// Apply a move taken from `legal_moves` without checking it again.
    pub(crate) fn play_unchecked(&mut self, start: usize, destination: usize, die: u8) {
        rules::play_move(&mut self.position, self.turn, start, destination);
        let removed = self.dice.remove(die);
        debug_assert!(removed, "die {die} not available in {}", self.dice);
    }

    /// Throw away the dice when no legal move exists. Returns true if the
    /// dice were discarded.
    pub fn discard_if_blocked(&mut self) -> bool {
        if !self.dice.is_empty() && self.legal_starts().is_empty() {
            self.dice.clear();
            true
        } else {
            false
        }
    }

    /// Hand the turn to the other side. Unplayed dice are forfeited; the side
    /// to move must have rolled unless the game is over.
    pub fn end_turn(&self) -> Result<GameState> {
        if !self.rolled && !self.is_terminal() {
            return Err(GameError::NotRolled);
        }
        Ok(self.pass_turn())
    }

    /// Hand the turn over without checking the turn phase.
    pub(crate) fn pass_turn(&self) -> GameState {
        let mut next = self.clone();
        next.dice.clear();
        next.rolled = false;
        next.turn = self.turn.opponent();
        next
    }

    pub fn winner(&self) -> Option<Side> {
        rules::winner(&self.position)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.winner().is_some()
    }

    /// Check the position and turn phase after deserialization.
    pub fn validate(&self) -> Result<()> {
        if !self.rolled && !self.dice.is_empty() {
            return Err(GameError::InvalidPosition("dice present before the roll".to_string()));
        }
        self.position.validate()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = &self.players;
        writeln!(f, " A: {} ({}) | B: {} ({})", a.name, a.policy, b.name, b.policy)?;
        writeln!(f, " to move: {}  dice: {}", self.turn, self.dice)?;
        write!(f, "{}", self.position)
    }
}

/// The result of letting the computer play a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiTurn {
    /// State after the turn; dice are spent, the turn has not been handed over
    pub state: GameState,
    /// Moves played, in order
    pub moves: Vec<Move>,
}

/// Play the whole turn for the side to move according to its policy.
///
/// Tree search works on at most two dice at a time, so a double is played as
/// two consecutive searches.
pub fn ai_decide(state: &GameState, engine: &mut MctsEngine) -> Result<AiTurn> {
    if state.is_terminal() {
        return Err(GameError::GameOver);
    }
    if state.dice.is_empty() {
        return Err(GameError::NoDice);
    }
    let side = state.turn;

    let turn = match state.player(side).policy {
        Policy::Human => return Err(GameError::NotComputerControlled(side)),
        Policy::Random => {
            let mut next = state.clone();
            let moves = random_turn(&mut next, engine.rng_mut());
            AiTurn { state: next, moves }
        }
        Policy::TreeSearch => {
            let mut current = state.clone();
            let mut moves = Vec::new();
            while !current.dice.is_empty() && !current.is_terminal() {
                let outcome = engine.search(&current)?;
                let plies = outcome.candidate.moves.len();
                moves.extend(outcome.candidate.moves);
                current = outcome.candidate.state;
                if plies < 2 {
                    break;
                }
            }
            current.dice.clear();
            AiTurn {
                state: current,
                moves,
            }
        }
    };

    debug!(
        "{side} ({}) played {}",
        state.player(side).policy,
        turn.moves
            .iter()
            .map(Move::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(turn)
}
