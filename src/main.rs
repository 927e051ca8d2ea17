//! Backgammon-MCTS command line.
//!
//! ## Usage
//!
//! - `backgammon-mcts` - Show a demo
//! - `backgammon-mcts play` - Start the text protocol on stdin/stdout
//! - `backgammon-mcts selfplay` - Play computer-vs-computer games
//! - `backgammon-mcts demo` - Run the search demo
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

use std::io;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flexi_logger::Logger;
use log::info;

use backgammon_mcts::dice::Dice;
use backgammon_mcts::game::{GameState, Player, Policy, ai_decide};
use backgammon_mcts::mcts::{ExpansionMode, MctsEngine, RolloutScoring, SearchConfig, UcbFormula};
use backgammon_mcts::position::Side;
use backgammon_mcts::protocol::TextEngine;

/// Backgammon-MCTS: a backgammon engine driven by Monte Carlo Tree Search
#[derive(Parser)]
#[command(name = "backgammon-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    search: SearchArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the text protocol server for terminal or GUI play
    Play,
    /// Play games between two computer policies and report the results
    Selfplay {
        /// Number of games
        #[arg(long, default_value_t = 10)]
        games: usize,
        /// Policy for side A
        #[arg(long, default_value_t = Policy::TreeSearch)]
        policy_a: Policy,
        /// Policy for side B
        #[arg(long, default_value_t = Policy::Random)]
        policy_b: Policy,
    },
    /// Run a single search from the opening and print the result
    Demo,
}

#[derive(Args)]
struct SearchArgs {
    /// Iterations per search
    #[arg(long, global = true, default_value_t = backgammon_mcts::constants::N_ITERATIONS)]
    iterations: usize,
    /// Exploration constant
    #[arg(long, global = true, default_value_t = backgammon_mcts::constants::EXPLORATION)]
    exploration: f64,
    /// Expansion pool: shared or per-node
    #[arg(long, global = true, default_value_t = ExpansionMode::Shared)]
    expansion: ExpansionMode,
    /// Rollout scoring: literal or outcome
    #[arg(long, global = true, default_value_t = RolloutScoring::Literal)]
    scoring: RolloutScoring,
    /// Exploration term: literal or canonical
    #[arg(long, global = true, default_value_t = UcbFormula::Literal)]
    ucb: UcbFormula,
    /// Random seed
    #[arg(long, global = true)]
    seed: Option<u64>,
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        SearchConfig {
            iterations: self.iterations,
            exploration: self.exploration,
            expansion: self.expansion,
            scoring: self.scoring,
            ucb: self.ucb,
            seed: self.seed,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let _logger = Logger::try_with_env_or_str("info")?
        .log_to_stderr()
        .start()
        .context("failed to start logger")?;

    let cli = Cli::parse();
    let config = cli.search.config();

    match cli.command {
        Some(Commands::Play) => {
            let mut engine = TextEngine::new(config);
            let stdin = io::stdin();
            engine.run(stdin.lock(), io::stdout())?;
        }
        Some(Commands::Selfplay {
            games,
            policy_a,
            policy_b,
        }) => run_selfplay(config, games, policy_a, policy_b)?,
        Some(Commands::Demo) | None => run_demo(config)?,
    }
    Ok(())
}

fn run_selfplay(
    config: SearchConfig,
    games: usize,
    policy_a: Policy,
    policy_b: Policy,
) -> Result<()> {
    anyhow::ensure!(
        policy_a.is_computer() && policy_b.is_computer(),
        "selfplay needs two computer policies"
    );
    let mut engine = MctsEngine::new(config);
    let mut wins = [0usize; 2];

    for game in 0..games {
        let mut state = GameState::new_game("A", "B", policy_a, policy_b, engine.rng_mut());
        let mut turns = 0;
        let winner = loop {
            if let Some(winner) = state.winner() {
                break winner;
            }
            state = state.roll(engine.rng_mut())?;
            let turn = ai_decide(&state, &mut engine)?;
            state = turn.state;
            turns += 1;
            if state.winner().is_none() {
                state = state.end_turn()?;
            }
        };
        wins[winner.index()] += 1;
        info!("game {}: {winner} wins after {turns} turns", game + 1);
    }

    println!(
        "A ({policy_a}) {} - {} B ({policy_b})",
        wins[Side::A.index()],
        wins[Side::B.index()]
    );
    Ok(())
}

fn run_demo(config: SearchConfig) -> Result<()> {
    println!("Backgammon-MCTS\n");

    let players = [
        Player::new("human", Policy::Human),
        Player::new("computer", Policy::TreeSearch),
    ];
    let state = GameState::with_turn(players, Side::B).with_dice(Dice::from_roll(3, 1));
    println!("{state}\n");

    let mut engine = MctsEngine::new(config);
    println!("Running {} MCTS iterations...", engine.config().iterations);
    let outcome = engine.search(&state)?;
    let moves: Vec<String> = outcome.candidate.moves.iter().map(|m| m.to_string()).collect();
    println!("Best moves: {}", moves.join(" "));
    println!(
        "Tree: {} nodes, {} root visits\n",
        outcome.tree_size, outcome.root_visits
    );
    println!("{}", outcome.candidate.state.position);
    Ok(())
}
