//! Subgoal-graph pathfinding on 8-connected grids.
//!
//! Preprocessing turns a [`Grid`](sgraph_core::Grid) into a sparse graph of
//! *subgoals* (cells at obstacle corners) joined by edges whose cost is the
//! octile distance of their endpoints. Queries splice the start and goal
//! into that graph, search it, and refine the result back into grid cells.
//!
//! - **Clearance** per cardinal direction ([`ClearanceMap`])
//! - **Subgoal identification** ([`identify_subgoals`])
//! - **h-reachability** checks ([`Reachability`], [`ReachabilityMode`])
//! - **Linking** and **pruning** ([`Linker`], [`Pruner`])
//! - **Queries** ([`Planner`], [`SubgoalPlanner`])
//! - **Bucket fallback** for maps with too many subgoals ([`BucketPlanner`])
//! - **Persistence** through bincode and zlib ([`SerializedGraph`])
//!
//! ```no_run
//! use std::sync::Arc;
//! use sgraph_core::{Grid, Point};
//! use sgraph_paths::{GraphConfig, PathFinder, Planner, preprocess};
//!
//! let grid = Grid::open(64, 64).unwrap();
//! let engine = Arc::new(preprocess(&grid, &GraphConfig::default()).unwrap());
//! let mut planner = Planner::new(engine);
//! let path = planner.find_path(Point::new(0, 0), Point::new(63, 40)).unwrap();
//! assert!(path.is_some());
//! ```
//!
//! # Trait hierarchy
//!
//! | Trait | Required for |
//! |---|---|
//! | [`Pather`] | Dijkstra over dense node ids |
//! | [`AstarPather`] : [`Pather`] | A* |
//! | [`PathFinder`] | point-to-point queries on a preprocessed map |

mod bucket;
mod clearance;
mod components;
mod config;
mod distance;
mod engine;
mod error;
mod graph;
mod gridsearch;
mod link;
mod neighbors;
mod persist;
mod prune;
mod query;
mod reach;
mod search;
mod subgoals;
mod traits;

pub use bucket::{BUCKETS, BucketGraph, BucketPlanner, BucketQueue};
pub use clearance::{ClearanceMap, Layer};
pub use components::{Components, NO_COMPONENT};
pub use config::{DEFAULT_MAX_SUBGOALS, GraphConfig, ReachabilityMode};
pub use distance::{
    CARDINAL_COST, Cost, DIAGONAL_COST, INFINITE_COST, chebyshev, cost_to_length, manhattan, octile,
    step_cost,
};
pub use engine::{EngineKind, Path, PathEngine, Planner, preprocess, preprocess_with};
pub use error::{Result, SubgoalError};
pub use graph::{Edge, GraphStats, SubgoalGraph};
pub use gridsearch::{GridSearch, PathNode};
pub use link::{Linker, link_subgoals};
pub use neighbors::{GridPather, moves};
pub use persist::{GRAPH_VERSION, SerializedGraph, SerializedKind};
pub use prune::{Pruned, Pruner};
pub use query::{QueryState, SubgoalPlanner};
pub use reach::Reachability;
pub use search::{Outcome, SearchContext};
pub use subgoals::{NO_SUBGOAL, SubgoalId, SubgoalMap, identify_subgoals, is_corner};
pub use traits::{AstarPather, PathFinder, Pather};
