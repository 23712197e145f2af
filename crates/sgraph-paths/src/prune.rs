//! Pruning: demoting subgoals that no shortest path between two other
//! global subgoals needs.
//!
//! Subgoals are visited once, in id order. A subgoal `s` is kept global if
//! some pair of its neighbours `(p, q)` is connected optimally only through
//! `s` and cannot be joined by a direct edge. Otherwise `s` becomes local:
//! it keeps the edges it had at that moment (all pointing at subgoals that
//! are demoted later or stay global), its neighbours forget it, and the
//! needed bypass edges are added.

use log::debug;
use sgraph_core::{Context, Grid, Point};

use crate::clearance::ClearanceMap;
use crate::config::GraphConfig;
use crate::distance::{Cost, octile};
use crate::error::{Result, SubgoalError};
use crate::graph::Edge;
use crate::gridsearch::GridSearch;
use crate::reach::Reachability;
use crate::search::{Bounds, SearchContext};
use crate::subgoals::{SubgoalId, SubgoalMap};
use crate::traits::{AstarPather, Pather};

/// The current global graph with one subgoal cut out.
struct Without<'a> {
    adj: &'a [Vec<Edge>],
    points: &'a [Point],
    excluded: usize,
}

impl Pather for Without<'_> {
    fn len(&self) -> usize {
        self.adj.len()
    }

    fn neighbors(&self, node: usize, buf: &mut Vec<(usize, Cost)>) {
        buf.extend(
            self.adj[node]
                .iter()
                .filter(|e| e.target as usize != self.excluded)
                .map(|e| (e.target as usize, e.cost)),
        );
    }
}

impl AstarPather for Without<'_> {
    fn estimate(&self, from: usize, to: usize) -> Cost {
        octile(self.points[from], self.points[to])
    }
}

/// Local flags and the edges each local subgoal had when it was demoted.
#[derive(Debug, Default)]
pub struct Pruned {
    pub local: Vec<bool>,
    pub local_edges: Vec<Vec<Edge>>,
}

/// Pruning state over a linked adjacency.
pub struct Pruner<'a> {
    grid: &'a Grid,
    clearance: &'a ClearanceMap,
    subgoals: &'a SubgoalMap,
    config: &'a GraphConfig,
    points: Vec<Point>,
    search: SearchContext,
    grid_search: GridSearch,
    settled: Vec<(usize, Cost)>,
}

impl<'a> Pruner<'a> {
    pub fn new(
        grid: &'a Grid,
        clearance: &'a ClearanceMap,
        subgoals: &'a SubgoalMap,
        config: &'a GraphConfig,
    ) -> Self {
        Self {
            grid,
            clearance,
            subgoals,
            config,
            points: subgoals.points(grid),
            search: SearchContext::new(),
            grid_search: GridSearch::new(),
            settled: Vec::new(),
        }
    }

    /// Cost of the cheapest `p`-`q` path avoiding `s`, if it is at most
    /// `via`.
    pub fn cost_other_path(
        &mut self,
        adj: &[Vec<Edge>],
        s: SubgoalId,
        p: SubgoalId,
        q: SubgoalId,
        via: Cost,
    ) -> Option<Cost> {
        let graph = Without {
            adj,
            points: &self.points,
            excluded: s as usize,
        };
        self.search
            .astar(&graph, p as usize, q as usize, Bounds::limit(via))
            .cost()
    }

    /// Whether the pair `(p, q)` of neighbours of `s` relies on `s`. When
    /// it does not, `bypass` receives the edge that must replace `s`, if
    /// any. `other` is the cost of the best path avoiding `s`, when known.
    fn is_necessary_to_connect(
        &mut self,
        p: Edge,
        q: Edge,
        other: Option<Cost>,
        bypass: &mut Vec<(SubgoalId, SubgoalId, Cost)>,
    ) -> bool {
        let via = p.cost + q.cost;
        if other.is_some_and(|c| c <= via) {
            return false;
        }
        let (pl, ql) = (self.subgoals.loc(p.target), self.subgoals.loc(q.target));
        if via == octile(self.points[p.target as usize], self.points[q.target as usize]) {
            let reach = Reachability::new(self.grid, self.clearance);
            if reach.check(pl, ql, self.config.reachability, &mut self.grid_search) {
                bypass.push((p.target, q.target, via));
                return false;
            }
        }
        true
    }

    /// Decide whether `s` can be demoted, collecting the bypass edges.
    fn can_demote(
        &mut self,
        adj: &[Vec<Edge>],
        s: SubgoalId,
        bypass: &mut Vec<(SubgoalId, SubgoalId, Cost)>,
    ) -> bool {
        bypass.clear();
        let neighbours = &adj[s as usize];
        for (i, &p) in neighbours.iter().enumerate() {
            let rest = &neighbours[i + 1..];
            if rest.is_empty() {
                break;
            }
            if self.config.pairwise_distance_cache {
                let max_via = rest.iter().map(|q| p.cost + q.cost).max().unwrap_or(0);
                let graph = Without {
                    adj,
                    points: &self.points,
                    excluded: s as usize,
                };
                self.search
                    .dijkstra(&graph, &[p.target as usize], max_via, &mut self.settled);
            }
            for &q in rest {
                let other = if self.config.pairwise_distance_cache {
                    self.search.g(q.target as usize)
                } else {
                    self.cost_other_path(adj, s, p.target, q.target, p.cost + q.cost)
                };
                if self.is_necessary_to_connect(p, q, other, bypass) {
                    return false;
                }
            }
        }
        true
    }

    /// Prune `adj` in place, leaving only global subgoals connected.
    pub fn prune_subgoals(&mut self, adj: &mut [Vec<Edge>], ctx: &Context) -> Result<Pruned> {
        let n = adj.len();
        let mut pruned = Pruned {
            local: vec![false; n],
            local_edges: vec![Vec::new(); n],
        };
        let mut bypass = Vec::new();

        for s in 0..n {
            if ctx.is_done() {
                return Err(SubgoalError::Cancelled);
            }
            let id = s as SubgoalId;
            if !self.can_demote(adj, id, &mut bypass) {
                continue;
            }
            let edges = std::mem::take(&mut adj[s]);
            for e in &edges {
                adj[e.target as usize].retain(|b| b.target != id);
            }
            for &(p, q, cost) in &bypass {
                insert_edge(&mut adj[p as usize], q, cost);
                insert_edge(&mut adj[q as usize], p, cost);
            }
            pruned.local[s] = true;
            pruned.local_edges[s] = edges;
        }

        let demoted = pruned.local.iter().filter(|&&l| l).count();
        debug!("prune: {demoted} of {n} subgoals demoted to local");
        Ok(pruned)
    }
}

/// Insert into a target-sorted list, keeping the cheaper edge on conflict.
fn insert_edge(list: &mut Vec<Edge>, target: SubgoalId, cost: Cost) {
    match list.binary_search_by_key(&target, |e| e.target) {
        Ok(i) => list[i].cost = list[i].cost.min(cost),
        Err(i) => list.insert(i, Edge { target, cost }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::link_subgoals;
    use crate::subgoals::identify_subgoals;

    struct Fixture {
        grid: Grid,
        clearance: ClearanceMap,
        subgoals: SubgoalMap,
    }

    fn fixture(w: i32, h: i32, blocked: &[(i32, i32)]) -> Fixture {
        let mut grid = Grid::open(w, h).unwrap();
        for &(x, y) in blocked {
            grid.set(Point::new(x, y), false);
        }
        let mut subgoals = SubgoalMap::new(grid.padded_len());
        for loc in identify_subgoals(&grid) {
            subgoals.add(loc);
        }
        let mut clearance = ClearanceMap::new(&grid, 8);
        clearance.mark_subgoals(&grid, |l| subgoals.is_subgoal(l));
        Fixture {
            grid,
            clearance,
            subgoals,
        }
    }

    fn all_pairs(adj: &[Vec<Edge>], points: &[Point], nodes: &[usize]) -> Vec<Option<Cost>> {
        let mut ctx = SearchContext::new();
        let graph = Without {
            adj,
            points,
            excluded: usize::MAX,
        };
        let mut out = Vec::new();
        for &a in nodes {
            for &b in nodes {
                out.push(ctx.astar(&graph, a, b, Bounds::unbounded()).cost());
            }
        }
        out
    }

    #[test]
    fn insert_edge_keeps_order_and_minimum() {
        let mut list = vec![Edge { target: 1, cost: 5 }, Edge { target: 4, cost: 9 }];
        insert_edge(&mut list, 3, 7);
        insert_edge(&mut list, 4, 2);
        let targets: Vec<_> = list.iter().map(|e| (e.target, e.cost)).collect();
        assert_eq!(targets, vec![(1, 5), (3, 7), (4, 2)]);
    }

    #[test]
    fn pruning_preserves_distances_between_global_subgoals() {
        let f = fixture(
            14,
            10,
            &[(3, 2), (4, 2), (4, 3), (9, 2), (9, 3), (2, 7), (3, 7), (7, 6), (11, 7), (11, 8)],
        );
        let points = f.subgoals.points(&f.grid);
        for cache in [true, false] {
            let config = GraphConfig::default().with_pairwise_distance_cache(cache);
            let ctx = Context::new();
            let mut adj = link_subgoals(&f.grid, &f.clearance, &f.subgoals, &ctx).unwrap();
            let linked = adj.clone();
            let mut pruner = Pruner::new(&f.grid, &f.clearance, &f.subgoals, &config);
            let pruned = pruner.prune_subgoals(&mut adj, &ctx).unwrap();
            let global: Vec<usize> = (0..adj.len()).filter(|&s| !pruned.local[s]).collect();
            assert_eq!(
                all_pairs(&linked, &points, &global),
                all_pairs(&adj, &points, &global)
            );
            for &s in &global {
                assert!(adj[s].iter().all(|e| !pruned.local[e.target as usize]));
            }
        }
    }

    #[test]
    fn cache_and_pairwise_searches_agree() {
        let f = fixture(12, 12, &[(5, 5), (5, 6), (6, 5), (2, 9), (9, 2), (9, 9)]);
        let ctx = Context::new();
        let mut results = Vec::new();
        for cache in [true, false] {
            let config = GraphConfig::default().with_pairwise_distance_cache(cache);
            let mut adj = link_subgoals(&f.grid, &f.clearance, &f.subgoals, &ctx).unwrap();
            let mut pruner = Pruner::new(&f.grid, &f.clearance, &f.subgoals, &config);
            let pruned = pruner.prune_subgoals(&mut adj, &ctx).unwrap();
            results.push((adj, pruned.local, pruned.local_edges));
        }
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn local_edges_point_upwards() {
        let f = fixture(10, 8, &[(2, 2), (6, 2), (2, 5), (6, 5)]);
        let ctx = Context::new();
        let config = GraphConfig::default();
        let mut adj = link_subgoals(&f.grid, &f.clearance, &f.subgoals, &ctx).unwrap();
        let mut pruner = Pruner::new(&f.grid, &f.clearance, &f.subgoals, &config);
        let pruned = pruner.prune_subgoals(&mut adj, &ctx).unwrap();
        for (s, edges) in pruned.local_edges.iter().enumerate() {
            for e in edges {
                let t = e.target as usize;
                // Demoted later, or never.
                assert!(t > s || !pruned.local[t]);
            }
        }
    }
}
