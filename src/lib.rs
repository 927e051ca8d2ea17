//! Backgammon-MCTS: a backgammon rules engine and Monte Carlo Tree Search player.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, pseudo-indices and search defaults
//! - [`position`] - Board state and side identities
//! - [`dice`] - Rolls and remaining die values
//! - [`rules`] - Move legality, hits, bar re-entry and bearing off
//! - [`game`] - Game state and the operations a session layer calls
//! - [`expand`] - Enumeration of every end-of-turn state for a roll
//! - [`playout`] - Random turns and random games
//! - [`mcts`] - Monte Carlo Tree Search over end-of-turn states
//! - [`history`] - Undo/redo within a turn
//! - [`protocol`] - Text command loop for playing from a terminal or GUI
//!
//! ## Example
//!
//! ```
//! use backgammon_mcts::dice::Dice;
//! use backgammon_mcts::game::{GameState, Player, Policy, ai_decide};
//! use backgammon_mcts::mcts::{MctsEngine, SearchConfig};
//! use backgammon_mcts::position::Side;
//!
//! let players = [
//!     Player::new("human", Policy::Human),
//!     Player::new("computer", Policy::TreeSearch),
//! ];
//! let state = GameState::with_turn(players, Side::B).with_dice(Dice::from_roll(6, 5));
//!
//! let mut engine = MctsEngine::new(SearchConfig::with_iterations(100));
//! let turn = ai_decide(&state, &mut engine).unwrap();
//! println!("{:?}", turn.moves);
//! let next = turn.state.end_turn().unwrap();
//! assert_eq!(next.turn, Side::A);
//! ```

pub mod constants;
pub mod dice;
pub mod error;
pub mod expand;
pub mod game;
pub mod history;
pub mod mcts;
pub mod playout;
pub mod position;
pub mod protocol;
pub mod rules;
