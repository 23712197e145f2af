use sgraph_core::Point;

use crate::distance::Cost;
use crate::engine::Path;
use crate::error::Result;

/// Minimal search interface over a graph with dense `usize` node indices.
pub trait Pather {
    /// Number of addressable node indices. Every index handed to or
    /// produced by [`neighbors`](Pather::neighbors) is below this value.
    fn len(&self) -> usize;

    /// Append `(neighbour, edge cost)` pairs of `node` into `buf`. The caller
    /// clears `buf` before calling. Costs must be > 0.
    fn neighbors(&self, node: usize, buf: &mut Vec<(usize, Cost)>);
}

/// Pather with an admissible, consistent heuristic.
pub trait AstarPather: Pather {
    /// Estimate of the cost from `from` to `to`. Must never overestimate,
    /// and must satisfy the triangle inequality along every edge.
    fn estimate(&self, from: usize, to: usize) -> Cost;
}

/// Point-to-point shortest path queries on a preprocessed map.
pub trait PathFinder {
    /// Shortest path from `start` to `goal`, or `Ok(None)` if the goal
    /// cannot be reached.
    fn find_path(&mut self, start: Point, goal: Point) -> Result<Option<Path>>;

    /// Cost of the shortest path, if any.
    fn distance(&mut self, start: Point, goal: Point) -> Result<Option<Cost>> {
        Ok(self.find_path(start, goal)?.map(|p| p.cost))
    }
}
