//! Integration tests for the rules engine and the state expander.
//!
//! Structural properties are checked over states visited by seeded random
//! self-play; specific mechanics use hand-built positions.

use std::collections::BTreeSet;

use backgammon_mcts::constants::{
    BAR_A, BAR_B, CHECKERS_PER_SIDE, MAX_PLAYOUT_TURNS, NUM_POINTS, OFF_A,
};
use backgammon_mcts::dice::Dice;
use backgammon_mcts::expand::possible_states;
use backgammon_mcts::game::{GameState, Move, Player, Policy};
use backgammon_mcts::playout::{playout, random_turn};
use backgammon_mcts::position::{BoardKey, Position, Side};
use backgammon_mcts::rules::{self, can_bear_off};

// =============================================================================
// Helper functions
// =============================================================================

fn players() -> [Player; 2] {
    [
        Player::new("a", Policy::Random),
        Player::new("b", Policy::Random),
    ]
}

/// A state with `position` and the given roll for `side`.
fn state_with(position: Position, side: Side, a: u8, b: u8) -> GameState {
    let mut state = GameState::with_turn(players(), side).with_dice(Dice::from_roll(a, b));
    state.position = position;
    state
}

/// Collect the freshly rolled states of a seeded random game, one per turn.
fn rolled_states(seed: u64, max_turns: usize) -> Vec<GameState> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut state = GameState::new_game("a", "b", Policy::Random, Policy::Random, &mut rng);
    let mut out = Vec::new();
    for _ in 0..max_turns {
        if state.is_terminal() {
            break;
        }
        state = state.roll(&mut rng).unwrap();
        out.push(state.clone());
        random_turn(&mut state, &mut rng);
        if !state.is_terminal() {
            state = state.end_turn().unwrap();
        }
    }
    out
}

/// Every board reachable by playing both dice of a non-double roll in
/// either order, one die at a time.
fn brute_force_two_moves(state: &GameState) -> BTreeSet<BoardKey> {
    let side = state.turn;
    let dice = state.dice.values();
    let mut out = BTreeSet::new();
    for (d1, d2) in [(dice[0], dice[1]), (dice[1], dice[0])] {
        for s1 in 0..=OFF_A {
            for dest1 in rules::legal_moves(&state.position, side, &[d1], s1).into_keys() {
                let mid = rules::apply_move(&state.position, side, s1, dest1);
                for s2 in 0..=OFF_A {
                    for dest2 in rules::legal_moves(&mid, side, &[d2], s2).into_keys() {
                        out.insert(rules::apply_move(&mid, side, s2, dest2).key());
                    }
                }
            }
        }
    }
    out
}

// =============================================================================
// Opening position
// =============================================================================

#[test]
fn test_opening_layout() {
    let pos = Position::new();
    for side in Side::BOTH {
        assert_eq!(pos.checker_total(side), CHECKERS_PER_SIDE);
        assert_eq!(pos.bar(side), 0);
        assert_eq!(pos.off(side), 0);
    }
    assert_eq!(pos.points[0], 2);
    assert_eq!(pos.points[23], -2);
    assert_eq!(rules::winner(&pos), None);
}

#[test]
fn test_opening_starts_for_six_five() {
    let pos = Position::new();
    assert_eq!(rules::legal_starts(&pos, Side::A, &[6, 5]), vec![0, 11, 16]);
    assert_eq!(rules::legal_starts(&pos, Side::B, &[6, 5]), vec![7, 12, 23]);
}

// =============================================================================
// Structural properties over random play
// =============================================================================

#[test]
fn test_checker_conservation_over_random_games() {
    for seed in 0..5 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut state = GameState::new_game("a", "b", Policy::Random, Policy::Random, &mut rng);
        for _ in 0..MAX_PLAYOUT_TURNS {
            if state.is_terminal() {
                break;
            }
            state = state.roll(&mut rng).unwrap();
            while let Some(start) = rng.choice(state.legal_starts()) {
                let (dest, _) = rng.choice(state.legal_moves(start)).unwrap();
                state = state.apply_move(start, dest).unwrap();
                for side in Side::BOTH {
                    assert_eq!(state.position.checker_total(side), CHECKERS_PER_SIDE);
                }
                if state.is_terminal() {
                    break;
                }
            }
            if !state.is_terminal() {
                state = state.end_turn().unwrap();
            }
        }
        assert!(state.is_terminal(), "seed {seed} did not finish");
    }
}

#[test]
fn test_legal_destinations_never_blocked() {
    for state in rolled_states(21, 200) {
        let side = state.turn;
        let starts = state.legal_starts();
        if state.position.bar(side) > 0 {
            assert!(starts.is_empty() || starts == vec![side.bar_index()]);
        }
        for start in starts {
            for (dest, die) in state.legal_moves(start) {
                assert!(state.dice.values().contains(&die));
                if dest == side.off_index() {
                    assert!(can_bear_off(&state.position, side));
                } else {
                    assert!(dest < NUM_POINTS);
                    assert!(state.position.count(side.opponent(), dest) <= 1);
                }
            }
        }
    }
}

#[test]
fn test_expansion_matches_brute_force() {
    let mut checked = 0;
    for state in rolled_states(4, 120) {
        // The brute force pairs exactly two dice
        if state.dice.is_double() {
            continue;
        }
        let expected = brute_force_two_moves(&state);
        if expected.is_empty() {
            continue;
        }
        let got: BTreeSet<BoardKey> = possible_states(&state)
            .iter()
            .map(|c| c.state.position.key())
            .collect();
        assert_eq!(got, expected, "mismatch for\n{state}");
        checked += 1;
    }
    assert!(checked > 10);
}

#[test]
fn test_expansion_candidates_are_distinct() {
    for state in rolled_states(8, 60) {
        let candidates = possible_states(&state);
        let keys: BTreeSet<BoardKey> = candidates.iter().map(|c| c.state.position.key()).collect();
        assert_eq!(keys.len(), candidates.len());
        for c in &candidates {
            assert_eq!(c.state.turn, state.turn);
            assert!(c.state.position.is_consistent());
        }
    }
}

// =============================================================================
// Hits and the bar
// =============================================================================

#[test]
fn test_hit_sends_checker_to_bar() {
    let mut points = [0i8; NUM_POINTS];
    points[0] = 2;
    points[11] = 13;
    points[6] = -1;
    points[12] = -14;
    let pos = Position::from_parts(points, [0, 0], [0, 0]).unwrap();
    let state = state_with(pos, Side::A, 6, 1);

    let next = state.apply_move(0, 6).unwrap();
    assert_eq!(next.position.points[0], 1);
    assert_eq!(next.position.points[6], 1);
    assert_eq!(next.position.bar(Side::B), 1);
    assert_eq!(next.position.checker_total(Side::B), CHECKERS_PER_SIDE);
}

#[test]
fn test_bar_checker_must_enter_first() {
    let mut points = [0i8; NUM_POINTS];
    points[11] = 14;
    points[5] = -2;
    points[7] = -13;
    let pos = Position::from_parts(points, [1, 0], [0, 0]).unwrap();
    let state = state_with(pos, Side::A, 6, 5);

    assert_eq!(state.legal_starts(), vec![BAR_A]);
    let moves = state.legal_moves(BAR_A);
    assert_eq!(moves.len(), 1);
    assert_eq!(moves.get(&4), Some(&5));
    assert!(state.legal_moves(11).is_empty());
    assert!(state.apply_move(11, 17).is_err());

    let entered = state.apply_move(BAR_A, 4).unwrap();
    assert_eq!(entered.position.bar(Side::A), 0);
    assert_eq!(entered.legal_starts(), vec![4, 11]);
}

#[test]
fn test_side_b_hits_side_a() {
    let mut points = [0i8; NUM_POINTS];
    points[10] = 1;
    points[20] = 14;
    points[13] = -1;
    points[2] = -14;
    let pos = Position::from_parts(points, [0, 0], [0, 0]).unwrap();
    let state = state_with(pos, Side::B, 3, 1);

    assert_eq!(state.legal_moves(13).get(&10), Some(&3));
    let next = state.apply_move(13, 10).unwrap();
    assert_eq!(next.position.points[13], 0);
    assert_eq!(next.position.points[10], -1);
    assert_eq!(next.position.bar(Side::A), 1);
    assert_eq!(next.position.checker_total(Side::A), CHECKERS_PER_SIDE);
    assert_eq!(next.dice.values(), &[1]);
}

#[test]
fn test_side_b_enters_from_bar() {
    let mut points = [0i8; NUM_POINTS];
    points[18] = 2;
    points[21] = 1;
    points[20] = 12;
    points[0] = -14;
    let pos = Position::from_parts(points, [0, 1], [0, 0]).unwrap();
    let state = state_with(pos, Side::B, 6, 3);

    // 24 - 6 = 18 is held by two A checkers, 24 - 3 = 21 is a lone blot
    assert_eq!(state.legal_starts(), vec![BAR_B]);
    let moves = state.legal_moves(BAR_B);
    assert_eq!(moves.len(), 1);
    assert_eq!(moves.get(&21), Some(&3));
    assert!(state.legal_moves(0).is_empty());
    assert!(state.apply_move(0, 3).is_err());

    let entered = state.apply_move(BAR_B, 21).unwrap();
    assert_eq!(entered.position.bar(Side::B), 0);
    assert_eq!(entered.position.points[21], -1);
    assert_eq!(entered.position.bar(Side::A), 1);
    // The 6 cannot bear off from 0 while a B checker is outside home
    assert_eq!(entered.legal_starts(), vec![21]);
}

#[test]
fn test_side_b_blocked_entry_has_no_moves() {
    let mut points = [0i8; NUM_POINTS];
    points[18..].fill(2);
    points[10] = 3;
    points[0] = -14;
    let pos = Position::from_parts(points, [0, 1], [0, 0]).unwrap();
    let mut state = state_with(pos, Side::B, 6, 5);

    assert!(state.legal_starts().is_empty());
    assert!(state.legal_moves(BAR_B).is_empty());
    let candidates = possible_states(&state);
    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].moves.is_empty());

    assert!(state.discard_if_blocked());
    assert!(state.end_turn().is_ok());
}

#[test]
fn test_blocked_entry_has_no_moves() {
    let mut points = [0i8; NUM_POINTS];
    points[..6].fill(-2);
    points[10] = -3;
    let pos = Position::from_parts(points, [1, 0], [14, 0]).unwrap();
    let mut state = state_with(pos, Side::A, 6, 5);

    assert!(state.legal_starts().is_empty());
    let candidates = possible_states(&state);
    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].moves.is_empty());
    assert_eq!(candidates[0].state, state);

    assert!(state.discard_if_blocked());
    assert!(state.dice.is_empty());
}

// =============================================================================
// Bearing off
// =============================================================================

#[test]
fn test_bear_off_gated_by_straggler() {
    let mut points = [0i8; NUM_POINTS];
    points[18] = 14;
    points[5] = 1;
    points[2] = -15;
    let pos = Position::from_parts(points, [0, 0], [0, 0]).unwrap();
    assert!(!can_bear_off(&pos, Side::A));
    assert!(rules::legal_moves(&pos, Side::A, &[6], 18).is_empty());

    points[5] = 0;
    points[18] = 15;
    let pos = Position::from_parts(points, [0, 0], [0, 0]).unwrap();
    assert!(can_bear_off(&pos, Side::A));
    let moves = rules::legal_moves(&pos, Side::A, &[6, 5], 18);
    assert_eq!(moves.get(&OFF_A), Some(&6));
    assert_eq!(moves.get(&23), Some(&5));
}

#[test]
fn test_bear_off_to_victory() {
    let mut points = [0i8; NUM_POINTS];
    points[23] = 1;
    points[12] = -15;
    let pos = Position::from_parts(points, [0, 0], [14, 0]).unwrap();
    let state = state_with(pos, Side::A, 4, 2);

    let next = state.apply_move(23, OFF_A).unwrap();
    assert_eq!(next.winner(), Some(Side::A));
    assert!(next.apply_move(12, 8).is_err());
}

// =============================================================================
// Serialization and playouts
// =============================================================================

#[test]
fn test_state_json_roundtrip() {
    let state = rolled_states(13, 30).pop().unwrap();
    let json = serde_json::to_string(&state).unwrap();
    let back: GameState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
}

#[test]
fn test_json_rejects_bad_dice() {
    let state = state_with(Position::new(), Side::A, 3, 1);
    let json = serde_json::to_string(&state).unwrap().replace("[3,1]", "[3,9]");
    assert!(serde_json::from_str::<GameState>(&json).is_err());
}

#[test]
fn test_playouts_terminate() {
    for seed in 0..10 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut state = state_with(Position::new(), Side::A, 3, 1);
        let winner = playout(&mut state, &mut rng, MAX_PLAYOUT_TURNS).unwrap();
        assert_eq!(state.position.off(winner), CHECKERS_PER_SIDE);
        assert!(state.position.off(winner.opponent()) < CHECKERS_PER_SIDE);
    }
}

#[test]
fn test_random_turn_moves_are_legal() {
    let mut rng = fastrand::Rng::with_seed(2);
    let start = state_with(Position::new(), Side::B, 4, 2);
    let mut state = start.clone();
    let moves = random_turn(&mut state, &mut rng);

    let mut replay = start;
    for Move { from, to } in moves {
        replay = replay.apply_move(from, to).unwrap();
    }
    assert_eq!(replay.position, state.position);
}
