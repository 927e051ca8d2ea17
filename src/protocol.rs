//! Line-oriented text protocol for driving a game.
//!
//! The format follows the Go Text Protocol conventions: each line holds an
//! optional numeric id, a command and its arguments. Replies start with `=`
//! on success or `?` on failure, followed by the id and a message, and end
//! with a blank line. This lets a GUI or a terminal play against the engine
//! over stdin/stdout.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`,
//!   `known_command <cmd>`, `quit`
//! - `new [nameA nameB policyA policyB]` - Start a new game
//! - `roll` - Roll for the side to move
//! - `dice <d1> <d2>` - Set the roll explicitly
//! - `starts` - Points the side to move can move from
//! - `moves <start>` - Destinations from a start, as `dest:die`
//! - `move <start> <dest>` - Play one checker
//! - `end_turn` - Hand the turn over (after a roll, with the dice spent or blocked)
//! - `ai` - Let the computer play the turn of the side to move
//! - `undo`, `redo` - Step through the moves of the current turn
//! - `winner` - `A`, `B` or `none`
//! - `show` - Board diagram
//! - `state` / `load <json>` - Save and restore the game as JSON

use std::io::{self, BufRead, Write};

use log::info;

use crate::dice::Dice;
use crate::game::{GameState, Move, Policy, ai_decide};
use crate::history::TurnHistory;
use crate::mcts::{MctsEngine, SearchConfig};
use crate::position::Side;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "ai",
    "dice",
    "end_turn",
    "known_command",
    "list_commands",
    "load",
    "move",
    "moves",
    "name",
    "new",
    "protocol_version",
    "quit",
    "redo",
    "roll",
    "show",
    "starts",
    "state",
    "undo",
    "version",
    "winner",
];

/// Protocol engine state.
pub struct TextEngine {
    /// Current game
    state: GameState,
    /// Snapshots of the turn in progress
    history: TurnHistory,
    /// Search engine used for computer turns
    engine: MctsEngine,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl TextEngine {
    /// Create an engine with a human (A) against tree search (B).
    pub fn new(config: SearchConfig) -> Self {
        let mut engine = MctsEngine::new(config);
        let state = GameState::new_game(
            "A",
            "B",
            Policy::Human,
            Policy::TreeSearch,
            engine.rng_mut(),
        );
        let mut history = TurnHistory::new();
        history.reset(&state);
        Self {
            state,
            history,
            engine,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute a command and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match self.dispatch(command, args) {
            Ok(message) => (true, message),
            Err(message) => (false, message),
        }
    }

    fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<String, String> {
        match command {
            "name" => Ok(env!("CARGO_PKG_NAME").to_string()),

            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => Ok("1".to_string()),

            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let cmd = args.first().ok_or("missing argument")?;
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                Ok(known.to_string())
            }

            "quit" => Ok(String::new()),

            "new" => {
                let name_a = args.first().copied().unwrap_or("A");
                let name_b = args.get(1).copied().unwrap_or("B");
                let policy_a = args.get(2).map_or(Ok(Policy::Human), |s| s.parse())?;
                let policy_b = args.get(3).map_or(Ok(Policy::TreeSearch), |s| s.parse())?;
                self.state = GameState::new_game(
                    name_a,
                    name_b,
                    policy_a,
                    policy_b,
                    self.engine.rng_mut(),
                );
                self.history.reset(&self.state);
                info!("new game: {name_a} ({policy_a}) vs {name_b} ({policy_b})");
                Ok(self.state.turn.to_string())
            }

            "roll" => {
                let next = self
                    .state
                    .roll(self.engine.rng_mut())
                    .map_err(|e| e.to_string())?;
                self.start_turn(next);
                Ok(dice_str(&self.state.dice))
            }

            "dice" => {
                if args.len() < 2 {
                    return Err("missing arguments".to_string());
                }
                let a = parse_die(args[0])?;
                let b = parse_die(args[1])?;
                let next = self
                    .state
                    .roll_with(Dice::from_roll(a, b))
                    .map_err(|e| e.to_string())?;
                self.start_turn(next);
                Ok(dice_str(&self.state.dice))
            }

            "starts" => Ok(join(self.state.legal_starts())),

            "moves" => {
                let start = parse_index(args.first())?;
                let moves: Vec<String> = self
                    .state
                    .legal_moves(start)
                    .iter()
                    .map(|(dest, die)| format!("{dest}:{die}"))
                    .collect();
                Ok(moves.join(" "))
            }

            "move" => {
                let start = parse_index(args.first())?;
                let dest = parse_index(args.get(1))?;
                let next = self
                    .state
                    .apply_move(start, dest)
                    .map_err(|e| e.to_string())?;
                self.history.record(&next);
                self.state = next;
                Ok(dice_str(&self.state.dice))
            }

            "end_turn" => {
                self.state.discard_if_blocked();
                if !self.state.dice.is_empty() {
                    return Err(format!("dice remain: {}", self.state.dice));
                }
                self.state = self.state.end_turn().map_err(|e| e.to_string())?;
                self.history.reset(&self.state);
                Ok(self.state.turn.to_string())
            }

            "ai" => {
                let turn = ai_decide(&self.state, &mut self.engine).map_err(|e| e.to_string())?;
                self.state = turn.state;
                self.history.reset(&self.state);
                let moves: Vec<String> = turn.moves.iter().map(Move::to_string).collect();
                Ok(moves.join(" "))
            }

            "undo" => {
                let prev = self.history.undo().ok_or("nothing to undo")?;
                self.state = prev.clone();
                Ok(dice_str(&self.state.dice))
            }

            "redo" => {
                let next = self.history.redo().ok_or("nothing to redo")?;
                self.state = next.clone();
                Ok(dice_str(&self.state.dice))
            }

            "winner" => Ok(self
                .state
                .winner()
                .map_or("none".to_string(), |side: Side| side.to_string())),

            "show" => Ok(format!("\n{}", self.state)),

            "state" => serde_json::to_string(&self.state).map_err(|e| e.to_string()),

            "load" => {
                if args.is_empty() {
                    return Err("missing argument".to_string());
                }
                let state: GameState =
                    serde_json::from_str(&args.join(" ")).map_err(|e| e.to_string())?;
                state.validate().map_err(|e| e.to_string())?;
                self.state = state;
                self.history.reset(&self.state);
                Ok(self.state.turn.to_string())
            }

            _ => Err(format!("unknown command: {command}")),
        }
    }

    /// Install a freshly rolled state and start the turn's history there.
    fn start_turn(&mut self, state: GameState) {
        self.state = state;
        self.history.reset(&self.state);
    }
}

fn parse_index(arg: Option<&&str>) -> Result<usize, String> {
    let s = arg.ok_or("missing argument")?;
    s.parse::<usize>().map_err(|_| format!("invalid point: {s}"))
}

fn parse_die(s: &str) -> Result<u8, String> {
    match s.parse::<u8>() {
        Ok(v) if (1..=6).contains(&v) => Ok(v),
        _ => Err(format!("invalid die: {s}")),
    }
}

fn dice_str(dice: &Dice) -> String {
    join(dice.values().iter().copied())
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
