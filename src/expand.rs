//! End-of-turn state enumeration.
//!
//! Given a state with dice to play, lists every distinct board the side to
//! move can reach by playing two dice (or one, when only one can be played).
//! This is the candidate pool the tree search picks from.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::game::{GameState, Move};
use crate::position::BoardKey;
use crate::rules::{legal_moves, legal_starts};

/// A reachable end-of-turn state and the moves that lead to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub state: GameState,
    pub moves: Vec<Move>,
}

/// Every single-die move available in `state`, with the state it produces.
/// Starts and destinations come out in ascending order.
fn successors(state: &GameState) -> Vec<(Move, GameState)> {
    let side = state.turn;
    let dice = state.dice.values();
    let mut out = Vec::new();
    for start in legal_starts(&state.position, side, dice) {
        for (dest, die) in legal_moves(&state.position, side, dice, start) {
            let mut next = state.clone();
            next.play_unchecked(start, dest, die);
            out.push((Move::new(start, dest), next));
        }
    }
    out
}

/// Keep the first sequence reaching each board.
fn record(
    out: &mut Vec<Candidate>,
    seen: &mut HashMap<BoardKey, usize>,
    state: GameState,
    moves: Vec<Move>,
) {
    match seen.entry(state.position.key()) {
        Entry::Occupied(e) => {
            debug_assert_eq!(
                out[*e.get()].state.position,
                state.position,
                "different positions share a board key"
            );
        }
        Entry::Vacant(e) => {
            e.insert(out.len());
            out.push(Candidate { state, moves });
        }
    }
}

/// Enumerate the distinct states reachable by playing up to two of the
/// remaining dice.
///
/// Sequences using both dice are preferred; if none exists, single moves are
/// returned; if no move exists at all, the unchanged state is the only
/// candidate. Candidates keep the mover's turn and any dice left unplayed
/// (the last two of a double).
pub fn possible_states(state: &GameState) -> Vec<Candidate> {
    let mut one_move = Vec::new();
    let mut two_moves = Vec::new();
    let mut seen_one = HashMap::new();
    let mut seen_two = HashMap::new();

    if !state.is_terminal() {
        for (first, after_first) in successors(state) {
            for (second, after_second) in successors(&after_first) {
                record(&mut two_moves, &mut seen_two, after_second, vec![first, second]);
            }
            record(&mut one_move, &mut seen_one, after_first, vec![first]);
        }
    }

    if !two_moves.is_empty() {
        two_moves
    } else if !one_move.is_empty() {
        one_move
    } else {
        vec![Candidate {
            state: state.clone(),
            moves: Vec::new(),
        }]
    }
}
