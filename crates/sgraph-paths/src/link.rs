//! Linking: connecting every subgoal to the subgoals it can reach along an
//! octile-length path that passes no other subgoal.

use log::{debug, warn};
use sgraph_core::{Context, Direction, Grid, MapLoc};

use crate::clearance::{ClearanceMap, Layer};
use crate::distance::octile;
use crate::error::{Result, SubgoalError};
use crate::graph::Edge;
use crate::subgoals::{SubgoalId, SubgoalMap};

/// Scans for directly h-reachable subgoals using subgoal clearance.
#[derive(Clone, Copy)]
pub struct Linker<'a> {
    grid: &'a Grid,
    clearance: &'a ClearanceMap,
    subgoals: &'a SubgoalMap,
}

impl<'a> Linker<'a> {
    pub fn new(grid: &'a Grid, clearance: &'a ClearanceMap, subgoals: &'a SubgoalMap) -> Self {
        Self {
            grid,
            clearance,
            subgoals,
        }
    }

    /// Offset of the first cell that stops a cardinal ray from `loc`, and
    /// the subgoal there, if the ray was stopped by one.
    #[inline]
    fn ray(&self, loc: MapLoc, dir: Direction) -> (usize, Option<SubgoalId>) {
        let stop = self.clearance.total_clearance(Layer::Subgoal, loc, dir) as usize + 1;
        (stop, self.subgoals.id(self.grid.step_n(loc, dir, stop)))
    }

    /// Fill `out` with the subgoals directly h-reachable from `loc`: the
    /// first subgoal on each cardinal ray, the first subgoal on each
    /// diagonal, and the subgoals stopping the cardinal rays cast from the
    /// diagonal cells, as long as a ray stops no later than every earlier
    /// ray along the same component. The result is sorted and excludes `loc`.
    pub fn direct_h_reachable(&self, loc: MapLoc, out: &mut Vec<SubgoalId>) {
        out.clear();
        let mut bound = [0usize; 4];
        for dir in Direction::CARDINALS {
            let (stop, hit) = self.ray(loc, dir);
            bound[dir.cardinal_index()] = stop;
            out.extend(hit);
        }

        for diag in Direction::DIAGONALS {
            let (h, v) = diag.components();
            let mut limits = [bound[h.cardinal_index()], bound[v.cardinal_index()]];
            let mut cur = loc;
            while self.grid.can_step(cur, diag) {
                cur = self.grid.step(cur, diag);
                if let Some(id) = self.subgoals.id(cur) {
                    out.push(id);
                    break;
                }
                for (limit, dir) in limits.iter_mut().zip([h, v]) {
                    let (stop, hit) = self.ray(cur, dir);
                    if stop <= *limit {
                        out.extend(hit);
                    }
                    *limit = (*limit).min(stop);
                }
            }
        }

        let own = self.subgoals.id(loc);
        out.sort_unstable();
        out.dedup();
        out.retain(|&id| Some(id) != own);
    }
}

/// Connect every subgoal to its directly h-reachable subgoals. The result
/// is symmetric and sorted by target, with edge costs equal to the octile
/// distance of the endpoints.
pub fn link_subgoals(
    grid: &Grid,
    clearance: &ClearanceMap,
    subgoals: &SubgoalMap,
    ctx: &Context,
) -> Result<Vec<Vec<Edge>>> {
    let linker = Linker::new(grid, clearance, subgoals);
    let mut adj: Vec<Vec<Edge>> = vec![Vec::new(); subgoals.len()];
    let mut found = Vec::new();

    for (s, &loc) in subgoals.locs().iter().enumerate() {
        if ctx.is_done() {
            return Err(SubgoalError::Cancelled);
        }
        linker.direct_h_reachable(loc, &mut found);
        let ps = grid.point(loc);
        for &t in &found {
            let cost = octile(ps, grid.point(subgoals.loc(t)));
            adj[s].push(Edge { target: t, cost });
            adj[t as usize].push(Edge {
                target: s as SubgoalId,
                cost,
            });
        }
    }

    let mut isolated = 0;
    let mut edges = 0;
    for list in adj.iter_mut() {
        list.sort_unstable_by_key(|e| e.target);
        list.dedup_by_key(|e| e.target);
        if list.is_empty() {
            isolated += 1;
        }
        edges += list.len();
    }
    if isolated > 0 {
        warn!("link: {isolated} subgoals have no h-reachable neighbour");
    }
    debug!("link: {} subgoals, {} directed edges", subgoals.len(), edges);
    Ok(adj)
}
