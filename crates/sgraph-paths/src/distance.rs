use sgraph_core::{Direction, Point};

/// Integer path cost. One cardinal step costs [`CARDINAL_COST`].
pub type Cost = u32;

/// Cost of a cardinal step.
pub const CARDINAL_COST: Cost = 1000;

/// Cost of a diagonal step (√2 scaled by [`CARDINAL_COST`], rounded down).
pub const DIAGONAL_COST: Cost = 1414;

/// Sentinel for "not reached".
pub const INFINITE_COST: Cost = Cost::MAX;

/// Cost of a single step in `dir`.
#[inline]
pub const fn step_cost(dir: Direction) -> Cost {
    if dir.is_diagonal() {
        DIAGONAL_COST
    } else {
        CARDINAL_COST
    }
}

/// Octile distance: the cost of the shortest path between `a` and `b` on
/// an obstacle-free grid.
#[inline]
pub fn octile(a: Point, b: Point) -> Cost {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
    lo * DIAGONAL_COST + (hi - lo) * CARDINAL_COST
}

/// Manhattan (L1) distance between two points.
#[inline]
pub fn manhattan(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Chebyshev (L∞) distance between two points.
#[inline]
pub fn chebyshev(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Convert an integer cost into grid units (cardinal step = 1.0).
#[inline]
pub fn cost_to_length(cost: Cost) -> f64 {
    cost as f64 / CARDINAL_COST as f64
}
