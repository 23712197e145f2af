//! Preprocessing and query options.

use serde::{Deserialize, Serialize};

/// How h-reachability between two cells is verified.
///
/// Every mode only ever accepts pairs joined by a path of octile length;
/// they differ in how many such pairs they recognise and how much work the
/// check costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReachabilityMode {
    /// Bounded grid search limited to the octile distance. Exact.
    BoundedDistance,
    /// Diagonal-first or cardinal-first straight runs.
    #[default]
    Freespace,
    /// Diagonal-first straight runs only.
    CanonicalFreespace,
    /// The whole parallelogram between the two canonical runs is free.
    SafeFreespace,
}

/// Default subgoal budget: every id must fit a `u16`, with two ids reserved
/// for the transient query start and goal and one for the sentinel.
pub const DEFAULT_MAX_SUBGOALS: usize = u16::MAX as usize - 2;

/// Configuration for building and querying a subgoal graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Strategy used for the query short-circuit and for pruning bypasses.
    pub reachability: ReachabilityMode,
    /// Demote subgoals that are not needed for global shortest paths.
    pub prune: bool,
    /// Serve all neighbour pairs of a pruning candidate from one bounded
    /// Dijkstra per neighbour instead of one search per pair.
    pub pairwise_distance_cache: bool,
    /// Expand equal-f successors from a stack before touching the heap.
    pub use_stack: bool,
    /// Cap of the stored per-direction clearance values.
    pub clearance_limit: u8,
    /// Largest subgoal count before falling back to the bucket engine.
    pub max_subgoals: usize,
    /// Expansion bound for a single search. `None` uses the node count.
    pub max_expansions: Option<usize>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            reachability: ReachabilityMode::default(),
            prune: true,
            pairwise_distance_cache: true,
            use_stack: true,
            clearance_limit: u8::MAX,
            max_subgoals: DEFAULT_MAX_SUBGOALS,
            max_expansions: None,
        }
    }
}

impl GraphConfig {
    pub fn with_reachability(mut self, mode: ReachabilityMode) -> Self {
        self.reachability = mode;
        self
    }

    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    pub fn with_pairwise_distance_cache(mut self, on: bool) -> Self {
        self.pairwise_distance_cache = on;
        self
    }

    pub fn with_stack(mut self, on: bool) -> Self {
        self.use_stack = on;
        self
    }

    /// Set the clearance cap. Zero is raised to one.
    pub fn with_clearance_limit(mut self, limit: u8) -> Self {
        self.clearance_limit = limit.max(1);
        self
    }

    /// Set the subgoal budget. Values above [`DEFAULT_MAX_SUBGOALS`] are
    /// clamped, since ids must stay addressable.
    pub fn with_max_subgoals(mut self, max: usize) -> Self {
        self.max_subgoals = max.min(DEFAULT_MAX_SUBGOALS);
        self
    }

    pub fn with_max_expansions(mut self, max: Option<usize>) -> Self {
        self.max_expansions = max;
        self
    }
}
