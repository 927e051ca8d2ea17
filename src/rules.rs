//! Backgammon move legality and single-die move execution.
//!
//! Everything here works on one die at a time:
//! - `legal_starts` lists the points a checker may be picked up from
//! - `legal_moves` maps each reachable destination to the die it consumes
//! - `play_move` carries out one move, including hits and bearing off
//!
//! A side with checkers on the bar may only move from its bar pseudo-index
//! until every checker has re-entered.

use std::collections::BTreeMap;

use crate::constants::{CHECKERS_PER_SIDE, NUM_POINTS};
use crate::position::{Position, Side};

/// Whether `side` may land on `point` (at most one opposing checker there).
#[inline]
fn is_open(pos: &Position, side: Side, point: usize) -> bool {
    pos.count(side.opponent(), point) <= 1
}

/// Whether `side` may bear off: nothing on the bar and every checker inside
/// the home quadrant.
pub fn can_bear_off(pos: &Position, side: Side) -> bool {
    if pos.bar(side) > 0 {
        return false;
    }
    let home = side.home();
    (0..NUM_POINTS)
        .filter(|pt| !home.contains(pt))
        .all(|pt| pos.count(side, pt) == 0)
}

/// The occupied home point farthest from bearing off, if any.
pub fn farthest_in_home(pos: &Position, side: Side) -> Option<usize> {
    let home = side.home();
    match side {
        Side::A => home.into_iter().find(|&pt| pos.count(side, pt) > 0),
        Side::B => home.rev().find(|&pt| pos.count(side, pt) > 0),
    }
}

/// Legal destinations for a checker of `side` on `start`, each mapped to the
/// die value it consumes.
///
/// Dice are tried in order; when two dice reach the same destination the
/// later one is recorded.
pub fn legal_moves(
    pos: &Position,
    side: Side,
    dice: &[u8],
    start: usize,
) -> BTreeMap<usize, u8> {
    let mut moves = BTreeMap::new();

    if pos.bar(side) > 0 {
        if start == side.bar_index() {
            for &die in dice {
                let dest = side.entry_point(die);
                if is_open(pos, side, dest) {
                    moves.insert(dest, die);
                }
            }
        }
        return moves;
    }

    if start >= NUM_POINTS || pos.count(side, start) == 0 {
        return moves;
    }

    let bearing_off = can_bear_off(pos, side);
    let farthest = if bearing_off {
        farthest_in_home(pos, side)
    } else {
        None
    };

    for &die in dice {
        match side.advance(start, die) {
            Some(dest) => {
                if is_open(pos, side, dest) {
                    moves.insert(dest, die);
                }
            }
            None if bearing_off => {
                // Over-rolls only bear off from the farthest-back checker
                if side.bears_off_exactly(start, die) || farthest == Some(start) {
                    moves.insert(side.off_index(), die);
                }
            }
            None => {}
        }
    }
    moves
}

/// Points (or the bar pseudo-index) `side` can legally move from.
///
/// An empty result means no legal move exists for these dice and the turn
/// is over.
pub fn legal_starts(pos: &Position, side: Side, dice: &[u8]) -> Vec<usize> {
    if dice.is_empty() {
        return Vec::new();
    }
    if pos.bar(side) > 0 {
        let bar = side.bar_index();
        return if legal_moves(pos, side, dice, bar).is_empty() {
            Vec::new()
        } else {
            vec![bar]
        };
    }
    (0..NUM_POINTS)
        .filter(|&pt| pos.count(side, pt) > 0)
        .filter(|&pt| !legal_moves(pos, side, dice, pt).is_empty())
        .collect()
}

/// Move one checker of `side` from `start` to `dest`.
///
/// The move must come from `legal_moves`; this function does not re-check
/// legality beyond debug assertions.
pub fn play_move(pos: &mut Position, side: Side, start: usize, dest: usize) {
    let sign = side.sign();
    let me = side.index();
    let them = side.opponent().index();

    if start == side.bar_index() {
        debug_assert!(pos.bar[me] > 0, "no checker on the bar of {side}");
        pos.bar[me] -= 1;
    } else {
        debug_assert!(pos.count(side, start) > 0, "no checker of {side} on {start}");
        pos.points[start] -= sign;
    }

    if dest == side.off_index() {
        pos.off[me] += 1;
    } else {
        if pos.points[dest] == -sign {
            // Hit
            pos.points[dest] = 0;
            pos.bar[them] += 1;
        }
        debug_assert!(
            pos.count(side.opponent(), dest) == 0,
            "{side} landed on a blocked point {dest}"
        );
        pos.points[dest] += sign;
    }

    debug_assert!(pos.is_consistent(), "checker count drifted:\n{pos}");
}

/// Pure form of `play_move`: returns the resulting position.
pub fn apply_move(pos: &Position, side: Side, start: usize, dest: usize) -> Position {
    let mut next = pos.clone();
    play_move(&mut next, side, start, dest);
    next
}

/// The side that has borne off all of its checkers, if any.
pub fn winner(pos: &Position) -> Option<Side> {
    Side::BOTH
        .into_iter()
        .find(|&side| pos.off(side) == CHECKERS_PER_SIDE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BAR_A, OFF_A, OFF_B};

    /// A position with the listed checkers on the board and every remaining
    /// checker of each side already borne off.
    fn sparse(a: &[(usize, i8)], b: &[(usize, i8)]) -> Position {
        let mut points = [0i8; NUM_POINTS];
        for &(pt, n) in a {
            points[pt] = n;
        }
        for &(pt, n) in b {
            points[pt] = -n;
        }
        let a_total: i8 = a.iter().map(|&(_, n)| n).sum();
        let b_total: i8 = b.iter().map(|&(_, n)| n).sum();
        Position::from_parts(points, [0, 0], [15 - a_total as u8, 15 - b_total as u8]).unwrap()
    }

    #[test]
    fn test_opening_moves_from_back_checkers() {
        let pos = Position::new();
        let moves = legal_moves(&pos, Side::A, &[6, 5], 0);
        // 0 + 5 lands on B's five-stack
        assert_eq!(moves.len(), 1);
        assert_eq!(moves.get(&6), Some(&6));
    }

    #[test]
    fn test_opening_starts() {
        let pos = Position::new();
        assert_eq!(legal_starts(&pos, Side::A, &[6, 5]), vec![0, 11, 16]);
        assert_eq!(legal_starts(&pos, Side::B, &[6, 5]), vec![7, 12, 23]);
    }

    #[test]
    fn test_hit_sends_checker_to_bar() {
        let pos = sparse(&[(3, 1)], &[(5, 1)]);
        let moves = legal_moves(&pos, Side::A, &[2], 3);
        assert_eq!(moves.get(&5), Some(&2));

        let next = apply_move(&pos, Side::A, 3, 5);
        assert_eq!(next.points[5], 1);
        assert_eq!(next.bar(Side::B), 1);
        assert_eq!(next.checker_total(Side::B), 15);
    }

    #[test]
    fn test_blocked_point_rejected() {
        let pos = sparse(&[(3, 1)], &[(5, 2)]);
        assert!(legal_moves(&pos, Side::A, &[2], 3).is_empty());
    }

    #[test]
    fn test_bar_must_move_first() {
        let mut pos = sparse(&[(10, 1)], &[(20, 2)]);
        pos.points[10] = 0;
        pos.bar[Side::A.index()] = 1;
        assert_eq!(legal_starts(&pos, Side::A, &[3, 4]), vec![BAR_A]);
        assert!(legal_moves(&pos, Side::A, &[3, 4], 10).is_empty());

        let moves = legal_moves(&pos, Side::A, &[3, 4], BAR_A);
        assert_eq!(moves.get(&2), Some(&3));
        assert_eq!(moves.get(&3), Some(&4));
    }

    #[test]
    fn test_bear_off_exact_and_over_roll() {
        let pos = sparse(&[(20, 1), (22, 1)], &[(2, 2)]);
        assert!(can_bear_off(&pos, Side::A));
        assert_eq!(farthest_in_home(&pos, Side::A), Some(20));

        // Over-roll from the farthest-back checker
        assert_eq!(legal_moves(&pos, Side::A, &[6], 20).get(&OFF_A), Some(&6));
        // Over-roll from a checker in front of it is not allowed
        assert!(legal_moves(&pos, Side::A, &[6], 22).is_empty());
        // Exact roll always bears off
        assert_eq!(legal_moves(&pos, Side::A, &[2], 22).get(&OFF_A), Some(&2));
    }

    #[test]
    fn test_bear_off_for_side_b() {
        let pos = sparse(&[(20, 2)], &[(1, 1), (4, 1)]);
        assert_eq!(farthest_in_home(&pos, Side::B), Some(4));
        assert_eq!(legal_moves(&pos, Side::B, &[2], 1).get(&OFF_B), Some(&2));
        assert!(legal_moves(&pos, Side::B, &[6], 1).is_empty());
        assert_eq!(legal_moves(&pos, Side::B, &[6], 4).get(&OFF_B), Some(&6));
    }

    #[test]
    fn test_no_bear_off_with_straggler() {
        let pos = sparse(&[(10, 1), (22, 1)], &[(2, 2)]);
        assert!(!can_bear_off(&pos, Side::A));
        assert!(!legal_moves(&pos, Side::A, &[2], 22).contains_key(&OFF_A));
    }

    #[test]
    fn test_winner() {
        let pos = sparse(&[], &[(3, 1)]);
        assert_eq!(winner(&pos), Some(Side::A));
        assert_eq!(winner(&Position::new()), None);
    }
}
