//! Undo/redo within a turn.
//!
//! Snapshots are taken after the roll and after every move. Rolling again or
//! handing the turn over starts a fresh history, so a player can only take
//! back moves of the turn in progress.

use crate::game::GameState;

#[derive(Debug, Default, Clone)]
pub struct TurnHistory {
    states: Vec<GameState>,
    pointer: usize,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all snapshots and start over from `state`.
    pub fn reset(&mut self, state: &GameState) {
        self.states.clear();
        self.states.push(state.clone());
        self.pointer = 0;
    }

    /// Append a snapshot, discarding anything that was undone.
    pub fn record(&mut self, state: &GameState) {
        if self.states.is_empty() {
            self.reset(state);
            return;
        }
        self.states.truncate(self.pointer + 1);
        self.states.push(state.clone());
        self.pointer += 1;
    }

    /// Step back one snapshot.
    pub fn undo(&mut self) -> Option<&GameState> {
        if self.pointer == 0 || self.states.is_empty() {
            return None;
        }
        self.pointer -= 1;
        self.states.get(self.pointer)
    }

    /// Step forward one snapshot.
    pub fn redo(&mut self) -> Option<&GameState> {
        if self.pointer + 1 >= self.states.len() {
            return None;
        }
        self.pointer += 1;
        self.states.get(self.pointer)
    }

    pub fn current(&self) -> Option<&GameState> {
        self.states.get(self.pointer)
    }
}
