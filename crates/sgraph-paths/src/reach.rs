//! h-reachability: whether two cells are joined by a path whose cost equals
//! their octile distance.
//!
//! An octile-length path between `a` and `b` uses only two move directions:
//! the diagonal `d` towards `b` (`min(dx, dy)` times) and the cardinal `c`
//! along the longer axis (`|dx - dy|` times). The canonical paths take all
//! diagonal moves first, or all cardinal moves first.

use sgraph_core::{Direction, Grid, MapLoc, Point};

use crate::clearance::{ClearanceMap, Layer};
use crate::config::ReachabilityMode;
use crate::distance::{Cost, octile};
use crate::gridsearch::GridSearch;

/// Move decomposition of an octile-length path between two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Octant {
    diagonal: Option<Direction>,
    cardinal: Option<Direction>,
    diagonal_steps: usize,
    cardinal_steps: usize,
}

impl Octant {
    fn between(a: Point, b: Point) -> Self {
        let d = b - a;
        let (ax, ay) = (d.x.unsigned_abs() as usize, d.y.unsigned_abs() as usize);
        let diagonal_steps = ax.min(ay);
        let cardinal_steps = ax.max(ay) - diagonal_steps;
        let s = d.signum();
        let diagonal = (diagonal_steps > 0)
            .then(|| Direction::from_delta(s))
            .flatten();
        let cardinal = if cardinal_steps == 0 {
            None
        } else if ax > ay {
            Direction::from_delta(Point::new(s.x, 0))
        } else {
            Direction::from_delta(Point::new(0, s.y))
        };
        Self {
            diagonal,
            cardinal,
            diagonal_steps,
            cardinal_steps,
        }
    }
}

/// Read-only reachability checks over a grid and its obstacle clearance.
#[derive(Clone, Copy)]
pub struct Reachability<'a> {
    grid: &'a Grid,
    clearance: &'a ClearanceMap,
}

impl<'a> Reachability<'a> {
    pub fn new(grid: &'a Grid, clearance: &'a ClearanceMap) -> Self {
        Self { grid, clearance }
    }

    /// Walk `n` diagonal steps from `loc`. Returns the end cell if every
    /// step is legal.
    fn diagonal_run(&self, loc: MapLoc, dir: Option<Direction>, n: usize) -> Option<MapLoc> {
        let Some(dir) = dir else {
            return Some(loc);
        };
        let mut cur = loc;
        for _ in 0..n {
            if !self.grid.can_step(cur, dir) {
                return None;
            }
            cur = self.grid.step(cur, dir);
        }
        Some(cur)
    }

    /// Whether `n` cardinal steps from `loc` stay on free cells.
    fn cardinal_run(&self, loc: MapLoc, dir: Option<Direction>, n: usize) -> Option<MapLoc> {
        let Some(dir) = dir else {
            return Some(loc);
        };
        let free = self.clearance.total_clearance(Layer::Obstacle, loc, dir) as usize;
        (free >= n).then(|| self.grid.step_n(loc, dir, n))
    }

    /// All diagonal moves, then all cardinal moves.
    pub fn diagonal_first(&self, a: MapLoc, b: MapLoc) -> bool {
        if !self.grid.is_free(a) || !self.grid.is_free(b) {
            return false;
        }
        let o = Octant::between(self.grid.point(a), self.grid.point(b));
        self.diagonal_run(a, o.diagonal, o.diagonal_steps)
            .and_then(|mid| self.cardinal_run(mid, o.cardinal, o.cardinal_steps))
            .is_some()
    }

    /// All cardinal moves, then all diagonal moves.
    pub fn cardinal_first(&self, a: MapLoc, b: MapLoc) -> bool {
        self.diagonal_first(b, a)
    }

    /// Every interleaving of the diagonal and cardinal moves is legal: the
    /// whole parallelogram spanned by the two canonical paths is free and
    /// no diagonal move inside it cuts a corner.
    pub fn safe_freespace(&self, a: MapLoc, b: MapLoc) -> bool {
        if !self.grid.is_free(a) || !self.grid.is_free(b) {
            return false;
        }
        let o = Octant::between(self.grid.point(a), self.grid.point(b));
        let mut row = a;
        for i in 0..=o.diagonal_steps {
            if self.cardinal_run(row, o.cardinal, o.cardinal_steps).is_none() {
                return false;
            }
            if i == o.diagonal_steps {
                break;
            }
            let Some(d) = o.diagonal else {
                break;
            };
            let mut cell = row;
            for j in 0..=o.cardinal_steps {
                if !self.grid.can_step(cell, d) {
                    return false;
                }
                if let (Some(c), true) = (o.cardinal, j < o.cardinal_steps) {
                    cell = self.grid.step(cell, c);
                }
            }
            row = self.grid.step(row, d);
        }
        true
    }

    /// Bounded grid A* limited to the octile distance.
    pub fn bounded_distance(&self, a: MapLoc, b: MapLoc, search: &mut GridSearch) -> bool {
        let limit = octile(self.grid.point(a), self.grid.point(b));
        search.bounded_cost(self.grid, a, b, limit).is_some()
    }

    /// Cheap one-directional check.
    pub fn is_quick_h_reachable(&self, a: MapLoc, b: MapLoc) -> bool {
        self.diagonal_first(a, b)
    }

    /// Quick check, then the cardinal-first variant.
    pub fn is_lookahead_h_reachable(&self, a: MapLoc, b: MapLoc) -> bool {
        self.diagonal_first(a, b) || self.cardinal_first(a, b)
    }

    /// Check `a`/`b` with the given strategy.
    pub fn check(&self, a: MapLoc, b: MapLoc, mode: ReachabilityMode, search: &mut GridSearch) -> bool {
        match mode {
            ReachabilityMode::CanonicalFreespace => self.is_quick_h_reachable(a, b),
            ReachabilityMode::Freespace => self.is_lookahead_h_reachable(a, b),
            ReachabilityMode::SafeFreespace => self.safe_freespace(a, b),
            ReachabilityMode::BoundedDistance => self.bounded_distance(a, b, search),
        }
    }

    /// Check `a`/`b` with the given strategy and return an octile-length
    /// path between them, endpoints included.
    pub fn is_h_reachable(
        &self,
        a: MapLoc,
        b: MapLoc,
        mode: ReachabilityMode,
        search: &mut GridSearch,
    ) -> Option<Vec<MapLoc>> {
        match mode {
            ReachabilityMode::CanonicalFreespace | ReachabilityMode::SafeFreespace => {
                self.check(a, b, mode, search).then(|| self.diagonal_first_path(a, b))
            }
            ReachabilityMode::Freespace => {
                if self.diagonal_first(a, b) {
                    Some(self.diagonal_first_path(a, b))
                } else if self.cardinal_first(a, b) {
                    Some(self.cardinal_first_path(a, b))
                } else {
                    None
                }
            }
            ReachabilityMode::BoundedDistance => {
                let limit = octile(self.grid.point(a), self.grid.point(b));
                search.bounded_path(self.grid, a, b, limit)
            }
        }
    }

    /// Cells of an octile-length path from `a` to `b` for an edge of the
    /// given cost: diagonal-first, else cardinal-first, else a grid search
    /// bounded by `cost`.
    pub fn refine(&self, a: MapLoc, b: MapLoc, cost: Cost, search: &mut GridSearch) -> Option<Vec<MapLoc>> {
        if self.diagonal_first(a, b) {
            Some(self.diagonal_first_path(a, b))
        } else if self.cardinal_first(a, b) {
            Some(self.cardinal_first_path(a, b))
        } else {
            search.bounded_path(self.grid, a, b, cost)
        }
    }

    /// Cells of the diagonal-first path. Does not check legality.
    fn diagonal_first_path(&self, a: MapLoc, b: MapLoc) -> Vec<MapLoc> {
        let o = Octant::between(self.grid.point(a), self.grid.point(b));
        let mut cells = Vec::with_capacity(o.diagonal_steps + o.cardinal_steps + 1);
        let mut cur = a;
        cells.push(cur);
        let runs = [(o.diagonal, o.diagonal_steps), (o.cardinal, o.cardinal_steps)];
        for (dir, n) in runs {
            if let Some(dir) = dir {
                for _ in 0..n {
                    cur = self.grid.step(cur, dir);
                    cells.push(cur);
                }
            }
        }
        cells
    }

    fn cardinal_first_path(&self, a: MapLoc, b: MapLoc) -> Vec<MapLoc> {
        let mut cells = self.diagonal_first_path(b, a);
        cells.reverse();
        cells
    }
}
