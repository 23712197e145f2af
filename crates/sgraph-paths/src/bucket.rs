//! Fallback engine for maps with too many subgoals: A* over raw grid cells
//! with a circular bucket queue keyed by `f`.
//!
//! With the octile heuristic every successor's `f` lies within
//! `[f, f + 2 * DIAGONAL_COST]` of the node being expanded, so
//! `2 * DIAGONAL_COST + 1` buckets cover every live key.

use std::sync::Arc;

use log::{debug, warn};
use sgraph_core::{Grid, MapLoc, Point};

use crate::components::Components;
use crate::config::GraphConfig;
use crate::distance::{Cost, DIAGONAL_COST, INFINITE_COST, octile, step_cost};
use crate::engine::Path;
use crate::error::{Result, SubgoalError};
use crate::gridsearch::GridSearch;
use crate::neighbors::moves;
use crate::search::NO_PARENT;
use crate::traits::PathFinder;

/// Number of buckets needed for the octile heuristic.
pub const BUCKETS: usize = 2 * DIAGONAL_COST as usize + 1;

/// Dial-style monotone priority queue over a sliding window of keys.
#[derive(Debug)]
pub struct BucketQueue {
    buckets: Vec<Vec<usize>>,
    base: Cost,
    cursor: usize,
    len: usize,
}

impl Default for BucketQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketQueue {
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); BUCKETS],
            base: 0,
            cursor: 0,
            len: 0,
        }
    }

    /// Empty the queue and set the smallest accepted key.
    pub fn reset(&mut self, base: Cost) {
        for b in &mut self.buckets {
            b.clear();
        }
        self.base = base;
        self.cursor = base as usize % BUCKETS;
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Push `idx` with key `f`. Keys must lie in `[base, base + BUCKETS)`;
    /// returns `false` and drops the entry otherwise.
    pub fn push(&mut self, idx: usize, f: Cost) -> bool {
        if f < self.base || (f - self.base) as usize >= BUCKETS {
            return false;
        }
        self.buckets[f as usize % BUCKETS].push(idx);
        self.len += 1;
        true
    }

    /// Pop an entry with the smallest key, advancing the window.
    pub fn pop(&mut self) -> Option<(usize, Cost)> {
        if self.len == 0 {
            return None;
        }
        loop {
            if let Some(idx) = self.buckets[self.cursor].pop() {
                self.len -= 1;
                return Some((idx, self.base));
            }
            self.cursor = (self.cursor + 1) % BUCKETS;
            self.base += 1;
        }
    }
}

/// A grid prepared for the bucket engine.
#[derive(Debug, Clone)]
pub struct BucketGraph {
    pub(crate) grid: Grid,
    pub(crate) config: GraphConfig,
    pub(crate) components: Components,
}

impl BucketGraph {
    pub fn new(grid: &Grid, config: &GraphConfig) -> Self {
        Self {
            grid: grid.clone(),
            config: config.clone(),
            components: Components::new(grid),
        }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }
}

#[derive(Clone)]
struct Cell {
    g: Cost,
    parent: usize,
    generation: u32,
    closed: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            g: INFINITE_COST,
            parent: NO_PARENT,
            generation: 0,
            closed: false,
        }
    }
}

/// Per-thread query state for a [`BucketGraph`].
pub struct BucketPlanner {
    graph: Arc<BucketGraph>,
    cells: Vec<Cell>,
    generation: u32,
    open: BucketQueue,
    grid_search: GridSearch,
}

impl BucketPlanner {
    pub fn new(graph: Arc<BucketGraph>) -> Self {
        let len = graph.grid.padded_len();
        Self {
            graph,
            cells: vec![Cell::default(); len],
            generation: 0,
            open: BucketQueue::new(),
            grid_search: GridSearch::new(),
        }
    }

    pub fn graph(&self) -> &Arc<BucketGraph> {
        &self.graph
    }

    fn validate(&self, p: Point) -> Result<MapLoc> {
        let grid = &self.graph.grid;
        grid.loc(p)
            .filter(|&loc| grid.is_free(loc))
            .ok_or(SubgoalError::InvalidLocation(p))
    }

    /// An octile-length path between `a` and `b`, from a grid search
    /// bounded at their octile distance.
    pub fn is_h_reachable(&mut self, a: Point, b: Point) -> Result<Option<Vec<Point>>> {
        let (from, to) = (self.validate(a)?, self.validate(b)?);
        let grid = &self.graph.grid;
        Ok(self
            .grid_search
            .bounded_path(grid, from, to, octile(a, b))
            .map(|cells| cells.into_iter().map(|loc| grid.point(loc)).collect()))
    }

    fn search(&mut self, from: MapLoc, to: MapLoc) -> Result<Option<Cost>> {
        let graph = Arc::clone(&self.graph);
        let grid = &graph.grid;
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.cells.fill(Cell::default());
            self.generation = 1;
        }
        let generation = self.generation;
        let goal = grid.point(to);
        let h = |loc: MapLoc| octile(grid.point(loc), goal);

        self.cells[from] = Cell {
            g: 0,
            parent: NO_PARENT,
            generation,
            closed: false,
        };
        self.open.reset(h(from));
        let pushed = self.open.push(from, h(from));
        debug_assert!(pushed);
        let max_expansions = self.graph.config.max_expansions.unwrap_or(grid.padded_len() + 2);
        let mut expansions = 0;

        while let Some((ci, _)) = self.open.pop() {
            if self.cells[ci].closed {
                continue;
            }
            let g = self.cells[ci].g;
            if ci == to {
                debug!("bucket: goal reached after {expansions} expansions");
                return Ok(Some(g));
            }
            if expansions >= max_expansions {
                warn!("bucket: expansion bound {max_expansions} reached");
                return Err(SubgoalError::SearchBounded { expansions });
            }
            self.cells[ci].closed = true;
            expansions += 1;

            for (dir, ni) in moves(grid, ci) {
                let ng = g + step_cost(dir);
                let n = &mut self.cells[ni];
                if n.generation == generation {
                    if n.closed || ng >= n.g {
                        continue;
                    }
                } else {
                    *n = Cell::default();
                    n.generation = generation;
                }
                n.g = ng;
                n.parent = ci;
                let pushed = self.open.push(ni, ng + h(ni));
                debug_assert!(pushed, "key {} outside the bucket window", ng + h(ni));
            }
        }
        Ok(None)
    }
}

impl PathFinder for BucketPlanner {
    fn find_path(&mut self, start: Point, goal: Point) -> Result<Option<Path>> {
        let from = self.validate(start)?;
        let to = self.validate(goal)?;
        if from == to {
            return Ok(Some(Path::single(start)));
        }
        if !self.graph.components.connected(from, to) {
            return Ok(None);
        }
        let Some(cost) = self.search(from, to)? else {
            return Ok(None);
        };
        let mut cells = Vec::new();
        let mut cur = to;
        while cur != NO_PARENT {
            cells.push(self.graph.grid.point(cur));
            cur = self.cells[cur].parent;
        }
        cells.reverse();
        Ok(Some(Path { cells, cost }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_pops_in_key_order_across_the_window() {
        let mut q = BucketQueue::new();
        q.reset(5000);
        assert!(q.push(1, 5000 + 2828));
        assert!(q.push(2, 5000));
        assert!(q.push(3, 5414));
        assert!(!q.push(4, 4999));
        assert!(!q.push(5, 5000 + BUCKETS as Cost));
        assert_eq!(q.pop(), Some((2, 5000)));
        assert_eq!(q.pop(), Some((3, 5414)));
        assert!(q.push(6, 5414 + 2000));
        assert_eq!(q.pop(), Some((6, 7414)));
        assert_eq!(q.pop(), Some((1, 7828)));
        assert!(q.is_empty());
    }

    #[test]
    fn bucket_search_matches_octile_on_open_grid() {
        let g = Grid::open(10, 10).unwrap();
        let graph = Arc::new(BucketGraph::new(&g, &GraphConfig::default()));
        let mut planner = BucketPlanner::new(graph);
        let path = planner
            .find_path(Point::new(0, 0), Point::new(9, 9))
            .unwrap()
            .unwrap();
        assert_eq!(path.cost, 9 * DIAGONAL_COST);
        assert_eq!(path.cells.len(), 10);
    }

    #[test]
    fn bucket_search_reports_disconnected_and_invalid() {
        let mut g = Grid::open(5, 5).unwrap();
        for y in 0..5 {
            g.set(Point::new(2, y), false);
        }
        let graph = Arc::new(BucketGraph::new(&g, &GraphConfig::default()));
        let mut planner = BucketPlanner::new(graph);
        assert!(planner.find_path(Point::new(0, 0), Point::new(4, 4)).unwrap().is_none());
        assert!(matches!(
            planner.find_path(Point::new(2, 2), Point::new(0, 0)),
            Err(SubgoalError::InvalidLocation(_))
        ));
    }

    #[test]
    fn expansion_bound_is_reported() {
        let mut g = Grid::open(7, 7).unwrap();
        for y in 0..6 {
            g.set(Point::new(3, y), false);
        }
        let config = GraphConfig::default().with_max_expansions(Some(1));
        let mut planner = BucketPlanner::new(Arc::new(BucketGraph::new(&g, &config)));
        assert!(matches!(
            planner.find_path(Point::new(0, 0), Point::new(6, 0)),
            Err(SubgoalError::SearchBounded { expansions: 1 })
        ));
        // The bound is checked after the component test.
        g.set(Point::new(3, 6), false);
        let mut planner = BucketPlanner::new(Arc::new(BucketGraph::new(&g, &config)));
        assert_eq!(planner.find_path(Point::new(0, 0), Point::new(6, 0)).unwrap(), None);
    }

    #[test]
    fn h_reachability_is_capped_at_octile() {
        let mut g = Grid::open(7, 7).unwrap();
        for y in 0..6 {
            g.set(Point::new(3, y), false);
        }
        let mut planner = BucketPlanner::new(Arc::new(BucketGraph::new(&g, &GraphConfig::default())));
        let cells = planner
            .is_h_reachable(Point::new(0, 6), Point::new(6, 4))
            .unwrap()
            .unwrap();
        assert_eq!(cells.first(), Some(&Point::new(0, 6)));
        assert_eq!(cells.last(), Some(&Point::new(6, 4)));
        assert_eq!(cells.len(), 7);
        assert_eq!(planner.is_h_reachable(Point::new(0, 0), Point::new(6, 0)).unwrap(), None);
        assert!(matches!(
            planner.is_h_reachable(Point::new(3, 0), Point::new(0, 0)),
            Err(SubgoalError::InvalidLocation(_))
        ));
    }
}
