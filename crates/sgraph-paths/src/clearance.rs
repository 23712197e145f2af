//! Per-direction clearance: how far one can walk from a cell along a
//! cardinal direction before an obstacle (or a subgoal) stops the walk.
//!
//! Values are stored as `u8` capped at a configurable limit. A stored value
//! equal to the limit means "at least the limit"; [`ClearanceMap::total_clearance`]
//! recovers the exact run length by jumping `limit` cells at a time, so a
//! run of length `n` costs `n / limit + 1` lookups instead of `n`.

use serde::{Deserialize, Serialize};
use sgraph_core::{Direction, Grid, MapLoc};

/// Which cells stop a clearance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Runs stop before blocked cells.
    Obstacle,
    /// Runs stop before blocked cells and before subgoals.
    Subgoal,
}

/// Stored clearance values for the four cardinal directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceMap {
    limit: u8,
    stride: usize,
    obstacle: [Vec<u8>; 4],
    subgoal: [Vec<u8>; 4],
}

impl ClearanceMap {
    /// Compute obstacle clearance for `grid`. Subgoal clearance starts out
    /// identical until [`mark_subgoals`](Self::mark_subgoals) is called.
    pub fn new(grid: &Grid, limit: u8) -> Self {
        let limit = limit.max(1);
        let obstacle = Direction::CARDINALS.map(|dir| sweep(grid, dir, limit, |_| false));
        Self {
            limit,
            stride: grid.stride(),
            subgoal: obstacle.clone(),
            obstacle,
        }
    }

    /// Rebuild from persisted parts. Returns `None` if the arrays do not
    /// match the grid's padded size or the limit is zero.
    pub fn from_parts(
        grid: &Grid,
        limit: u8,
        obstacle: [Vec<u8>; 4],
        subgoal: [Vec<u8>; 4],
    ) -> Option<Self> {
        let len = grid.padded_len();
        if limit == 0
            || obstacle.iter().chain(subgoal.iter()).any(|v| v.len() != len)
            || obstacle
                .iter()
                .chain(subgoal.iter())
                .any(|v| v.iter().any(|&c| c > limit))
        {
            return None;
        }
        Some(Self {
            limit,
            stride: grid.stride(),
            obstacle,
            subgoal,
        })
    }

    /// Recompute subgoal clearance so that runs stop before every cell for
    /// which `is_subgoal` holds.
    pub fn mark_subgoals(&mut self, grid: &Grid, is_subgoal: impl Fn(MapLoc) -> bool) {
        self.subgoal = Direction::CARDINALS.map(|dir| sweep(grid, dir, self.limit, &is_subgoal));
    }

    #[inline]
    pub fn limit(&self) -> u8 {
        self.limit
    }

    /// Raw obstacle and subgoal arrays, in N/E/S/W order.
    pub fn parts(&self) -> (&[Vec<u8>; 4], &[Vec<u8>; 4]) {
        (&self.obstacle, &self.subgoal)
    }

    /// Stored (capped) clearance of `loc` in the cardinal direction `dir`.
    #[inline]
    pub fn clearance(&self, layer: Layer, loc: MapLoc, dir: Direction) -> u8 {
        debug_assert!(!dir.is_diagonal());
        let i = dir.cardinal_index();
        match layer {
            Layer::Obstacle => self.obstacle[i][loc],
            Layer::Subgoal => self.subgoal[i][loc],
        }
    }

    /// Exact run length from `loc` in `dir`, chaining across capped values.
    pub fn total_clearance(&self, layer: Layer, loc: MapLoc, dir: Direction) -> u32 {
        let d = dir.delta();
        let jump = (d.x as isize + d.y as isize * self.stride as isize) * self.limit as isize;
        let mut total = 0u32;
        let mut cur = loc;
        loop {
            let c = self.clearance(layer, cur, dir);
            total += c as u32;
            if c < self.limit {
                return total;
            }
            cur = cur.wrapping_add_signed(jump);
        }
    }
}

/// One sweep over the padded buffer, visiting each cell after its
/// neighbour in `dir` so run lengths can be extended in place.
fn sweep(grid: &Grid, dir: Direction, limit: u8, stops: impl Fn(MapLoc) -> bool) -> Vec<u8> {
    let len = grid.padded_len();
    let mut run = vec![0u32; len];
    let mut out = vec![0u8; len];
    let mut visit = |loc: MapLoc| {
        if !grid.is_free(loc) {
            return;
        }
        let next = grid.step(loc, dir);
        if grid.is_free(next) && !stops(next) {
            run[loc] = run[next] + 1;
            out[loc] = run[loc].min(limit as u32) as u8;
        }
    };
    if grid.offset(dir) > 0 {
        (0..len).rev().for_each(&mut visit);
    } else {
        (0..len).for_each(&mut visit);
    }
    out
}
