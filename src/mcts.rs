//! Monte Carlo Tree Search over end-of-turn states.
//!
//! Each search builds a fresh tree whose nodes hold full game states taken
//! from the state expander. Every iteration:
//! - selects a focus node, expanding one new child when possible
//! - plays a random game from the focus state
//! - adds the rollout score to every node on the path back to the root
//!
//! Nodes live in an arena owned by the tree; a child refers to its parent by
//! index, and the parent link is only used for backpropagation.
//!
//! Three behaviors are switchable through `SearchConfig` so they can be
//! compared: where expansion candidates come from (`ExpansionMode`), how a
//! rollout is scored (`RolloutScoring`) and the exploration term
//! (`UcbFormula`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{Level, debug, log_enabled, trace};
use thiserror::Error;

use crate::constants::{EXPLORATION, MAX_PLAYOUT_TURNS, N_ITERATIONS};
use crate::dice::Dice;
use crate::expand::{Candidate, possible_states};
use crate::game::{GameState, Move};
use crate::playout::playout;
use crate::position::{BoardKey, Side};

/// Errors that can occur during a search.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("cannot search a finished game")]
    Terminal,

    #[error("search finished without a candidate")]
    Exhausted,
}

// =============================================================================
// Configuration
// =============================================================================

/// Source of the states used to expand nodes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExpansionMode {
    /// One pool computed at the root and consumed by whichever node expands
    #[default]
    Shared,
    /// Each node expands from its own successor states
    PerNode,
}

/// How a finished rollout is turned into a score.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RolloutScoring {
    /// +1 if side A was to move in the focus state, -1 for side B. The
    /// simulated result does not count.
    #[default]
    Literal,
    /// +1 if side A won the simulated game, -1 if side B did
    Outcome,
}

/// Exploration term added to a child's mean score during selection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum UcbFormula {
    /// `sqrt(ln(parent / child))`
    #[default]
    Literal,
    /// `sqrt(ln(parent) / child)`
    Canonical,
}

impl RolloutScoring {
    pub fn score(self, turn_before: Side, winner: Option<Side>) -> f64 {
        match self {
            RolloutScoring::Literal => side_sign(turn_before),
            RolloutScoring::Outcome => winner.map_or(0.0, side_sign),
        }
    }
}

impl UcbFormula {
    pub fn exploration(self, parent_visits: u32, child_visits: u32) -> f64 {
        if child_visits == 0 {
            return f64::INFINITY;
        }
        let (n, c) = (parent_visits as f64, child_visits as f64);
        match self {
            UcbFormula::Literal => (n / c).ln().max(0.0).sqrt(),
            UcbFormula::Canonical => (n.ln().max(0.0) / c).sqrt(),
        }
    }
}

macro_rules! str_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($ty::$variant => write!(f, $name),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($ty))),
                }
            }
        }
    };
}

str_enum!(ExpansionMode { Shared => "shared", PerNode => "per-node" });
str_enum!(RolloutScoring { Literal => "literal", Outcome => "outcome" });
str_enum!(UcbFormula { Literal => "literal", Canonical => "canonical" });

/// Search parameters.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Select/rollout/backpropagate rounds per search
    pub iterations: usize,
    /// Weight of the exploration term during selection
    pub exploration: f64,
    pub expansion: ExpansionMode,
    pub scoring: RolloutScoring,
    pub ucb: UcbFormula,
    /// Turn cap for a single rollout
    pub max_playout_turns: usize,
    /// Seed for dice and tie-breaks; `None` seeds from the environment
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: N_ITERATIONS,
            exploration: EXPLORATION,
            expansion: ExpansionMode::default(),
            scoring: RolloutScoring::default(),
            ucb: UcbFormula::default(),
            max_playout_turns: MAX_PLAYOUT_TURNS,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Default::default()
        }
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// =============================================================================
// Tree
// =============================================================================

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// A node of the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub state: GameState,
    /// Moves that lead from the parent's state to this one
    pub moves: Vec<Move>,
    pub parent: Option<NodeId>,
    /// Children keyed by their board
    pub children: BTreeMap<BoardKey, NodeId>,
    pub visits: u32,
    /// Sum of rollout scores (positive favors side A)
    pub score_sum: f64,
    pub terminal: bool,
    pub fully_expanded: bool,
    /// Candidates not yet turned into children (per-node expansion only)
    pool: Option<Vec<Candidate>>,
}

impl SearchNode {
    fn new(state: GameState, moves: Vec<Move>, parent: Option<NodeId>) -> Self {
        let terminal = state.is_terminal();
        Self {
            state,
            moves,
            parent,
            children: BTreeMap::new(),
            visits: 0,
            score_sum: 0.0,
            terminal,
            fully_expanded: terminal,
            pool: None,
        }
    }

    /// Mean score from the point of view of the side that moved into this
    /// node.
    pub fn mean_score(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            side_sign(self.state.turn) * self.score_sum / self.visits as f64
        }
    }
}

/// Arena-allocated search tree.
#[derive(Debug)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    mode: ExpansionMode,
    /// Root candidates shared by all nodes (shared expansion only)
    shared_pool: Vec<Candidate>,
}

impl SearchTree {
    /// Create a tree whose root holds `state` and whose root candidates are
    /// `pool`.
    pub fn new(state: GameState, pool: Vec<Candidate>, mode: ExpansionMode) -> Self {
        let mut root = SearchNode::new(state, Vec::new(), None);
        let shared_pool = match mode {
            ExpansionMode::Shared => pool,
            ExpansionMode::PerNode => {
                root.pool = Some(pool);
                Vec::new()
            }
        };
        Self {
            nodes: vec![root],
            mode,
            shared_pool,
        }
    }

    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> &SearchNode {
        self.get(NodeId::ROOT)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        (0..self.nodes.len())
            .map(|i| {
                let mut d = 0;
                let mut id = NodeId(i);
                while let Some(p) = self.get(id).parent {
                    d += 1;
                    id = p;
                }
                d
            })
            .max()
            .unwrap_or(0)
    }

    fn add_child(&mut self, parent: NodeId, candidate: Candidate) -> NodeId {
        let key = candidate.state.position.key();
        if let Some(&existing) = self.get(parent).children.get(&key) {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(SearchNode::new(candidate.state, candidate.moves, Some(parent)));
        self.get_mut(parent).children.insert(key, id);
        id
    }

    /// Add `score` to every node from `id` up to the root.
    fn backpropagate(&mut self, id: NodeId, score: f64) {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += 1;
            node.score_sum += score;
            current = node.parent;
        }
    }
}

/// +1 for side A, -1 for side B.
#[inline]
fn side_sign(side: Side) -> f64 {
    side.sign() as f64
}

/// The state whose moves a node's children represent: the same side keeps
/// playing while it has dice and a legal move, otherwise the opponent rolls.
fn decision_state(state: &GameState, rng: &mut fastrand::Rng) -> GameState {
    if !state.dice.is_empty() && !state.legal_starts().is_empty() {
        return state.clone();
    }
    state.pass_turn().with_dice(Dice::roll(rng))
}

// =============================================================================
// Search
// =============================================================================

/// Result of a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The chosen state and the moves that reach it
    pub candidate: Candidate,
    /// Iterations run (0 when the choice was forced)
    pub iterations: usize,
    pub root_visits: u32,
    /// Nodes in the tree, root included
    pub tree_size: usize,
    pub tree_depth: usize,
}

/// Search driver; owns the configuration and the random source.
pub struct MctsEngine {
    config: SearchConfig,
    rng: fastrand::Rng,
}

impl Default for MctsEngine {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl MctsEngine {
    pub fn new(config: SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn rng_mut(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    /// Pick the best end-of-turn state reachable from `state`.
    ///
    /// When the expander yields a single candidate it is returned without
    /// running any iteration.
    pub fn search(&mut self, state: &GameState) -> Result<SearchOutcome, SearchError> {
        if state.is_terminal() {
            return Err(SearchError::Terminal);
        }

        let mut pool = possible_states(state);
        if pool.len() == 1 {
            if let Some(candidate) = pool.pop() {
                debug!("forced choice for {}, skipping search", state.turn);
                return Ok(SearchOutcome {
                    candidate,
                    iterations: 0,
                    root_visits: 0,
                    tree_size: 1,
                    tree_depth: 0,
                });
            }
        }

        let candidates = pool.len();
        let mut tree = SearchTree::new(state.clone(), pool, self.config.expansion);
        for i in 0..self.config.iterations {
            let focus = self.select(&mut tree);
            let score = self.rollout(&tree.get(focus).state);
            tree.backpropagate(focus, score);
            trace!("iteration {i}: focus {:?} score {score}", focus);
        }

        dump_children(&tree);

        let best = self
            .best_child(&tree, NodeId::ROOT, 0.0)
            .ok_or(SearchError::Exhausted)?;
        let node = tree.get(best);
        debug!(
            "search for {}: {} candidates, {} iterations, {} nodes, best visits={} mean={:.3}",
            state.turn,
            candidates,
            self.config.iterations,
            tree.len(),
            node.visits,
            node.mean_score()
        );

        Ok(SearchOutcome {
            candidate: Candidate {
                state: node.state.clone(),
                moves: node.moves.clone(),
            },
            iterations: self.config.iterations,
            root_visits: tree.root().visits,
            tree_size: tree.len(),
            tree_depth: tree.depth(),
        })
    }

    /// Descend from the root to the node the next rollout starts from.
    fn select(&mut self, tree: &mut SearchTree) -> NodeId {
        let mut id = NodeId::ROOT;
        loop {
            if tree.get(id).terminal {
                return id;
            }
            if !tree.get(id).fully_expanded {
                if let Some(child) = self.expand(tree, id) {
                    return child;
                }
            }
            match self.best_child(tree, id, self.config.exploration) {
                Some(child) => id = child,
                None => return id,
            }
        }
    }

    /// Attach one new child to `id`. Returns `None` once there is nothing
    /// left to add, marking the node fully expanded.
    fn expand(&mut self, tree: &mut SearchTree, id: NodeId) -> Option<NodeId> {
        let mode = tree.mode;
        let (candidate, exhausted) = match mode {
            ExpansionMode::Shared => {
                let candidate = tree.shared_pool.pop();
                (candidate, tree.shared_pool.is_empty())
            }
            ExpansionMode::PerNode => {
                if tree.get(id).pool.is_none() {
                    let decision = decision_state(&tree.get(id).state, &mut self.rng);
                    tree.get_mut(id).pool = Some(possible_states(&decision));
                }
                let pool = tree.get_mut(id).pool.get_or_insert_with(Vec::new);
                let candidate = pool.pop();
                (candidate, pool.is_empty())
            }
        };
        if exhausted {
            tree.get_mut(id).fully_expanded = true;
        }
        candidate.map(|c| tree.add_child(id, c))
    }

    fn rollout(&mut self, state: &GameState) -> f64 {
        let mut sim = state.clone();
        let winner = playout(&mut sim, &mut self.rng, self.config.max_playout_turns);
        self.config.scoring.score(state.turn, winner)
    }

    /// Child of `id` with the highest selection score; ties are broken at
    /// random.
    fn best_child(&mut self, tree: &SearchTree, id: NodeId, exploration: f64) -> Option<NodeId> {
        let parent = tree.get(id);
        let mut best_score = f64::NEG_INFINITY;
        let mut best = Vec::new();

        for &child_id in parent.children.values() {
            let score = selection_score(
                tree.get(child_id),
                parent.visits,
                exploration,
                self.config.ucb,
            );
            if score > best_score {
                best_score = score;
                best.clear();
                best.push(child_id);
            } else if score == best_score {
                best.push(child_id);
            }
        }

        self.rng.choice(best)
    }
}

/// Side-signed mean score plus the weighted exploration term.
pub fn selection_score(
    child: &SearchNode,
    parent_visits: u32,
    exploration: f64,
    ucb: UcbFormula,
) -> f64 {
    let exploit = child.mean_score();
    if exploration == 0.0 {
        return exploit;
    }
    exploit + exploration * ucb.exploration(parent_visits, child.visits)
}

/// Log the root's children at debug level.
pub fn dump_children(tree: &SearchTree) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    for &id in tree.root().children.values() {
        let child = tree.get(id);
        let moves: Vec<String> = child.moves.iter().map(Move::to_string).collect();
        debug!(
            "moves {} v={} sum={} mean={:.3}",
            moves.join(" "),
            child.visits,
            child.score_sum,
            child.mean_score()
        );
    }
}
