//! Random playouts.
//!
//! A playout rolls dice and plays uniformly random legal moves for both sides
//! until someone bears off all fifteen checkers. The same turn routine drives
//! the scripted-random opponent.

use log::warn;

use crate::dice::Dice;
use crate::game::{GameState, Move};
use crate::position::Side;

/// Play the rest of the current turn at random.
///
/// Picks a random legal start, then a random destination for it, until the
/// dice run out or no legal move remains. Leftover dice are discarded.
pub fn random_turn(state: &mut GameState, rng: &mut fastrand::Rng) -> Vec<Move> {
    let mut moves = Vec::new();
    while !state.dice.is_empty() && !state.is_terminal() {
        let Some(start) = rng.choice(state.legal_starts()) else {
            break;
        };
        let Some((dest, die)) = rng.choice(state.legal_moves(start)) else {
            break;
        };
        state.play_unchecked(start, dest, die);
        moves.push(Move::new(start, dest));
    }
    state.dice.clear();
    moves
}

/// Play random turns for both sides until the game ends.
///
/// Remaining dice in `state` are played first by the side to move. Returns
/// the winner, or `None` if `max_turns` fresh rolls pass without one.
pub fn playout(state: &mut GameState, rng: &mut fastrand::Rng, max_turns: usize) -> Option<Side> {
    let mut turns = 0;
    loop {
        if let Some(winner) = state.winner() {
            return Some(winner);
        }
        if state.dice.is_empty() {
            if turns >= max_turns {
                warn!("playout stopped after {turns} turns without a winner");
                return None;
            }
            state.turn = state.turn.opponent();
            state.dice = Dice::roll(rng);
            state.rolled = true;
            turns += 1;
        }
        random_turn(state, rng);
    }
}
