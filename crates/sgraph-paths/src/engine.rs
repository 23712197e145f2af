//! The two preprocessing back ends behind one engine type, and the
//! per-thread [`Planner`] that queries them.

use std::sync::Arc;

use log::warn;
use sgraph_core::{Context, Grid, Point};

use crate::bucket::{BucketGraph, BucketPlanner};
use crate::config::GraphConfig;
use crate::distance::{Cost, cost_to_length};
use crate::error::{Result, SubgoalError};
use crate::graph::{GraphStats, SubgoalGraph};
use crate::query::SubgoalPlanner;
use crate::traits::PathFinder;

/// A shortest path as a sequence of grid cells, endpoints included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub cells: Vec<Point>,
    pub cost: Cost,
}

impl Path {
    pub(crate) fn single(p: Point) -> Self {
        Self {
            cells: vec![p],
            cost: 0,
        }
    }

    /// Length in grid units (cardinal step = 1.0).
    pub fn length(&self) -> f64 {
        cost_to_length(self.cost)
    }
}

/// Which back end an engine runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Abstracted,
    Bucket,
}

/// A preprocessed map, ready to be shared between planners.
#[derive(Debug, Clone)]
pub enum PathEngine {
    /// Subgoal graph queries.
    Abstracted(Arc<SubgoalGraph>),
    /// Plain grid A* for maps with too many subgoals.
    Bucket(Arc<BucketGraph>),
}

/// Preprocess `grid`, falling back to the bucket engine when the map has
/// more subgoals than `config.max_subgoals`.
pub fn preprocess(grid: &Grid, config: &GraphConfig) -> Result<PathEngine> {
    preprocess_with(grid, config, &Context::new())
}

/// Like [`preprocess`], cancellable through `ctx`.
pub fn preprocess_with(grid: &Grid, config: &GraphConfig, ctx: &Context) -> Result<PathEngine> {
    match SubgoalGraph::build(grid, config, ctx) {
        Ok(graph) => Ok(PathEngine::Abstracted(Arc::new(graph))),
        Err(SubgoalError::MapTooLarge { subgoals, budget }) => {
            warn!("preprocess: {subgoals} subgoals exceed the budget of {budget}, using bucket engine");
            Ok(PathEngine::Bucket(Arc::new(BucketGraph::new(grid, config))))
        }
        Err(e) => Err(e),
    }
}

impl PathEngine {
    pub fn kind(&self) -> EngineKind {
        match self {
            PathEngine::Abstracted(_) => EngineKind::Abstracted,
            PathEngine::Bucket(_) => EngineKind::Bucket,
        }
    }

    pub fn grid(&self) -> &Grid {
        match self {
            PathEngine::Abstracted(g) => g.grid(),
            PathEngine::Bucket(b) => b.grid(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        match self {
            PathEngine::Abstracted(g) => g.config(),
            PathEngine::Bucket(b) => b.config(),
        }
    }

    /// Graph size. The bucket engine has no subgoals.
    pub fn stats(&self) -> GraphStats {
        match self {
            PathEngine::Abstracted(g) => g.stats(),
            PathEngine::Bucket(_) => GraphStats::default(),
        }
    }

    /// The subgoal graph, if this engine has one.
    pub fn subgoal_graph(&self) -> Option<&SubgoalGraph> {
        match self {
            PathEngine::Abstracted(g) => Some(g),
            PathEngine::Bucket(_) => None,
        }
    }
}

enum Backend {
    Subgoal(SubgoalPlanner),
    Bucket(BucketPlanner),
}

/// Query handle over a shared engine. Holds all per-query scratch, so use
/// one planner per thread.
pub struct Planner {
    engine: Arc<PathEngine>,
    backend: Backend,
}

impl Planner {
    pub fn new(engine: Arc<PathEngine>) -> Self {
        let backend = match &*engine {
            PathEngine::Abstracted(g) => Backend::Subgoal(SubgoalPlanner::new(Arc::clone(g))),
            PathEngine::Bucket(b) => Backend::Bucket(BucketPlanner::new(Arc::clone(b))),
        };
        Self { engine, backend }
    }

    pub fn engine(&self) -> &Arc<PathEngine> {
        &self.engine
    }

    /// Drop any transient query state. Idempotent.
    pub fn clear_query(&mut self) {
        if let Backend::Subgoal(p) = &mut self.backend {
            p.clear_query();
        }
    }

    /// Number of transient edges currently spliced into the graph.
    pub fn overlay_len(&self) -> usize {
        match &self.backend {
            Backend::Subgoal(p) => p.overlay_len(),
            Backend::Bucket(_) => 0,
        }
    }

    /// An octile-length path between `a` and `b` per the configured
    /// reachability mode. The bucket engine always answers with a bounded
    /// grid search.
    pub fn is_h_reachable(&mut self, a: Point, b: Point) -> Result<Option<Vec<Point>>> {
        match &mut self.backend {
            Backend::Subgoal(p) => p.is_h_reachable(a, b),
            Backend::Bucket(p) => p.is_h_reachable(a, b),
        }
    }
}

impl PathFinder for Planner {
    fn find_path(&mut self, start: Point, goal: Point) -> Result<Option<Path>> {
        match &mut self.backend {
            Backend::Subgoal(p) => p.find_path(start, goal),
            Backend::Bucket(p) => p.find_path(start, goal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pillars(w: i32, h: i32) -> Grid {
        let mut g = Grid::open(w, h).unwrap();
        for x in (2..w - 1).step_by(3) {
            for y in (2..h - 1).step_by(3) {
                g.set(Point::new(x, y), false);
            }
        }
        g
    }

    #[test]
    fn path_length_is_in_grid_units() {
        let p = Path {
            cells: vec![Point::ZERO, Point::new(1, 1)],
            cost: 1414,
        };
        assert!((p.length() - 1.414).abs() < 1e-9);
    }

    #[test]
    fn too_many_subgoals_falls_back_to_buckets() {
        let g = pillars(12, 12);
        let config = GraphConfig::default().with_max_subgoals(4);
        let engine = preprocess(&g, &config).unwrap();
        assert_eq!(engine.kind(), EngineKind::Bucket);
        assert_eq!(engine.stats(), GraphStats::default());
        let mut planner = Planner::new(Arc::new(engine));
        let path = planner
            .find_path(Point::new(0, 0), Point::new(11, 11))
            .unwrap()
            .unwrap();
        assert_eq!(path.cells.first(), Some(&Point::new(0, 0)));
        assert_eq!(path.cells.last(), Some(&Point::new(11, 11)));
    }

    #[test]
    fn both_engines_agree() {
        let g = pillars(15, 11);
        let sg = Arc::new(preprocess(&g, &GraphConfig::default()).unwrap());
        let bk = Arc::new(preprocess(&g, &GraphConfig::default().with_max_subgoals(0)).unwrap());
        assert_eq!(sg.kind(), EngineKind::Abstracted);
        assert_eq!(bk.kind(), EngineKind::Bucket);
        let (mut a, mut b) = (Planner::new(sg), Planner::new(bk));
        for (s, t) in [((0, 0), (14, 10)), ((1, 3), (13, 4)), ((3, 9), (3, 0))] {
            let (s, t) = (Point::new(s.0, s.1), Point::new(t.0, t.1));
            assert_eq!(a.distance(s, t).unwrap(), b.distance(s, t).unwrap());
        }
    }

    #[test]
    fn cancelled_preprocessing_is_an_error() {
        let g = pillars(9, 9);
        let ctx = Context::new();
        ctx.cancel();
        assert!(matches!(
            preprocess_with(&g, &GraphConfig::default(), &ctx),
            Err(SubgoalError::Cancelled)
        ));
    }
}
