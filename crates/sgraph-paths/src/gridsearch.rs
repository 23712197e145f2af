//! Searches over raw grid cells: bounded A* for h-reachability checks and
//! path refinement, and a Dijkstra distance map for ground truth.

use sgraph_core::{Grid, MapLoc, Point};

use crate::distance::{Cost, INFINITE_COST};
use crate::neighbors::GridPather;
use crate::search::{Bounds, SearchContext};

/// A position with an associated cost, returned from Dijkstra map queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathNode {
    pub pos: Point,
    pub cost: Cost,
}

/// Grid search scratch. Reuses its buffers across calls.
#[derive(Default)]
pub struct GridSearch {
    ctx: SearchContext,
    settled: Vec<(usize, Cost)>,
    results: Vec<PathNode>,
}

impl GridSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cost of the shortest grid path from `from` to `to` if it does not
    /// exceed `limit`.
    pub fn bounded_cost(&mut self, grid: &Grid, from: MapLoc, to: MapLoc, limit: Cost) -> Option<Cost> {
        if !grid.is_free(from) || !grid.is_free(to) {
            return None;
        }
        self.ctx
            .astar(&GridPather::new(grid), from, to, Bounds::limit(limit))
            .cost()
    }

    /// Like [`bounded_cost`](Self::bounded_cost), returning the cells of the
    /// path, endpoints included.
    pub fn bounded_path(&mut self, grid: &Grid, from: MapLoc, to: MapLoc, limit: Cost) -> Option<Vec<MapLoc>> {
        self.bounded_cost(grid, from, to, limit)?;
        Some(self.ctx.path_to(to))
    }

    /// Unbounded shortest-path cost between two logical points.
    pub fn distance(&mut self, grid: &Grid, from: Point, to: Point) -> Option<Cost> {
        let (a, b) = (grid.loc(from)?, grid.loc(to)?);
        self.bounded_cost(grid, a, b, INFINITE_COST)
    }

    /// Unbounded shortest path between two logical points.
    pub fn path(&mut self, grid: &Grid, from: Point, to: Point) -> Option<Vec<Point>> {
        let (a, b) = (grid.loc(from)?, grid.loc(to)?);
        let cells = self.bounded_path(grid, a, b, INFINITE_COST)?;
        Some(cells.into_iter().map(|loc| grid.point(loc)).collect())
    }

    /// Compute a multi-source Dijkstra distance map.
    ///
    /// Every traversable source starts at cost 0. Expansion stops when the
    /// cumulative cost exceeds `max_cost`. Returns every reached cell in the
    /// order it was settled.
    pub fn dijkstra_map(&mut self, grid: &Grid, sources: &[Point], max_cost: Cost) -> &[PathNode] {
        let sources: Vec<MapLoc> = sources
            .iter()
            .filter_map(|&p| grid.loc(p))
            .filter(|&loc| grid.is_free(loc))
            .collect();
        self.ctx
            .dijkstra(&GridPather::new(grid), &sources, max_cost, &mut self.settled);
        self.results.clear();
        self.results.extend(self.settled.iter().map(|&(loc, cost)| PathNode {
            pos: grid.point(loc),
            cost,
        }));
        &self.results
    }

    /// Cost of `p` in the last [`dijkstra_map`](Self::dijkstra_map), or
    /// `None` if it was not reached.
    pub fn dijkstra_at(&self, grid: &Grid, p: Point) -> Option<Cost> {
        self.ctx.g(grid.loc(p)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::octile;

    #[test]
    fn open_grid_distance_is_octile() {
        let g = Grid::open(7, 5).unwrap();
        let mut s = GridSearch::new();
        let (a, b) = (Point::new(0, 0), Point::new(6, 3));
        assert_eq!(s.distance(&g, a, b), Some(octile(a, b)));
        let path = s.path(&g, a, b).unwrap();
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&b));
        assert_eq!(path.len(), 7);
    }

    #[test]
    fn wall_forces_detour_and_limit_rejects_it() {
        // Wall at x = 2 except for a gap at y = 4.
        let mut g = Grid::open(5, 5).unwrap();
        for y in 0..4 {
            g.set(Point::new(2, y), false);
        }
        let mut s = GridSearch::new();
        let (a, b) = (Point::new(0, 0), Point::new(4, 0));
        let d = s.distance(&g, a, b).unwrap();
        assert!(d > octile(a, b));
        let (la, lb) = (g.loc(a).unwrap(), g.loc(b).unwrap());
        assert_eq!(s.bounded_cost(&g, la, lb, d - 1), None);
        assert_eq!(s.bounded_cost(&g, la, lb, d), Some(d));
    }

    #[test]
    fn blocked_endpoints_have_no_distance() {
        let mut g = Grid::open(3, 3).unwrap();
        g.set(Point::new(1, 1), false);
        let mut s = GridSearch::new();
        assert_eq!(s.distance(&g, Point::new(0, 0), Point::new(1, 1)), None);
        assert_eq!(s.distance(&g, Point::new(0, 0), Point::new(9, 9)), None);
    }

    #[test]
    fn dijkstra_map_covers_the_component() {
        let mut g = Grid::open(4, 3).unwrap();
        for y in 0..3 {
            g.set(Point::new(2, y), false);
        }
        let mut s = GridSearch::new();
        let reached = s.dijkstra_map(&g, &[Point::new(0, 0)], INFINITE_COST);
        assert_eq!(reached.len(), 6);
        assert_eq!(reached[0], PathNode { pos: Point::new(0, 0), cost: 0 });
        assert_eq!(s.dijkstra_at(&g, Point::new(1, 2)), Some(2414));
        assert_eq!(s.dijkstra_at(&g, Point::new(3, 0)), None);
    }
}
