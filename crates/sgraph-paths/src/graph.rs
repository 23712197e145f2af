//! The finalized subgoal graph and the preprocessing pipeline that builds it.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use sgraph_core::{Context, Direction, Grid, MapLoc, Point};

use crate::clearance::{ClearanceMap, Layer};
use crate::components::Components;
use crate::config::GraphConfig;
use crate::distance::Cost;
use crate::error::{Result, SubgoalError};
use crate::link::{Linker, link_subgoals};
use crate::prune::{Pruned, Pruner};
use crate::reach::Reachability;
use crate::subgoals::{SubgoalId, SubgoalMap, identify_subgoals};

/// A directed edge to `target`. Its cost is the octile distance between the
/// endpoints, which is also their true grid distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub target: SubgoalId,
    pub cost: Cost,
}

/// Size summary of a preprocessed graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphStats {
    /// All subgoals, global and local.
    pub subgoals: usize,
    /// Subgoals that survived pruning.
    pub global_subgoals: usize,
    /// Stored directed edges, local edges included.
    pub edges: usize,
}

/// An immutable subgoal graph over a grid.
///
/// Edges are stored in compressed rows: the edges of subgoal `s` are
/// `targets[offsets[s]..offsets[s + 1]]` with matching `costs`. A global
/// subgoal's row holds its global neighbours; a local subgoal's row holds
/// the edges it had when it was demoted.
#[derive(Debug, Clone)]
pub struct SubgoalGraph {
    pub(crate) grid: Grid,
    pub(crate) config: GraphConfig,
    pub(crate) clearance: ClearanceMap,
    pub(crate) subgoals: SubgoalMap,
    pub(crate) local: Vec<bool>,
    pub(crate) offsets: Vec<u32>,
    pub(crate) targets: Vec<SubgoalId>,
    pub(crate) costs: Vec<Cost>,
    pub(crate) components: Components,
}

impl SubgoalGraph {
    /// Run the full pipeline: clearance, identification, linking, pruning
    /// and finalization.
    ///
    /// Fails with [`SubgoalError::MapTooLarge`] if the map has more
    /// subgoals than `config.max_subgoals`, and with
    /// [`SubgoalError::Cancelled`] if `ctx` is cancelled midway.
    pub fn build(grid: &Grid, config: &GraphConfig, ctx: &Context) -> Result<Self> {
        let mut clearance = ClearanceMap::new(grid, config.clearance_limit);
        let corners = identify_subgoals(grid);
        debug!("preprocess: {} subgoals identified", corners.len());
        if corners.len() > config.max_subgoals {
            return Err(SubgoalError::MapTooLarge {
                subgoals: corners.len(),
                budget: config.max_subgoals,
            });
        }

        let mut subgoals = SubgoalMap::new(grid.padded_len());
        for &loc in &corners {
            subgoals.add(loc).ok_or(SubgoalError::MapTooLarge {
                subgoals: corners.len(),
                budget: config.max_subgoals,
            })?;
        }
        clearance.mark_subgoals(grid, |loc| subgoals.is_subgoal(loc));

        let mut adj = link_subgoals(grid, &clearance, &subgoals, ctx)?;
        let pruned = if config.prune {
            Pruner::new(grid, &clearance, &subgoals, config).prune_subgoals(&mut adj, ctx)?
        } else {
            Pruned {
                local: vec![false; adj.len()],
                local_edges: vec![Vec::new(); adj.len()],
            }
        };

        let graph = Self::finalize(grid.clone(), config.clone(), clearance, subgoals, adj, pruned);
        let stats = graph.stats();
        info!(
            "preprocess: {}x{} map, {} subgoals ({} global), {} edges",
            grid.width(),
            grid.height(),
            stats.subgoals,
            stats.global_subgoals,
            stats.edges
        );
        Ok(graph)
    }

    /// Pack adjacency lists into compressed rows.
    fn finalize(
        grid: Grid,
        config: GraphConfig,
        clearance: ClearanceMap,
        subgoals: SubgoalMap,
        adj: Vec<Vec<Edge>>,
        pruned: Pruned,
    ) -> Self {
        let Pruned { local, local_edges } = pruned;
        let mut offsets = Vec::with_capacity(adj.len() + 1);
        let mut targets = Vec::new();
        let mut costs = Vec::new();
        offsets.push(0);
        for (s, global) in adj.into_iter().enumerate() {
            let row = if local[s] { &local_edges[s] } else { &global };
            targets.extend(row.iter().map(|e| e.target));
            costs.extend(row.iter().map(|e| e.cost));
            offsets.push(targets.len() as u32);
        }
        let components = Components::new(&grid);
        Self {
            grid,
            config,
            clearance,
            subgoals,
            local,
            offsets,
            targets,
            costs,
            components,
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

    #[inline]
    pub fn clearance_map(&self) -> &ClearanceMap {
        &self.clearance
    }

    #[inline]
    pub fn subgoals(&self) -> &SubgoalMap {
        &self.subgoals
    }

    #[inline]
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Number of subgoals.
    #[inline]
    pub fn len(&self) -> usize {
        self.subgoals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subgoals.is_empty()
    }

    #[inline]
    pub fn is_local(&self, id: SubgoalId) -> bool {
        self.local[id as usize]
    }

    /// Location of subgoal `id` in logical coordinates.
    #[inline]
    pub fn point(&self, id: SubgoalId) -> Point {
        self.grid.point(self.subgoals.loc(id))
    }

    /// Stored edges of `id`.
    pub fn edges(&self, id: SubgoalId) -> impl Iterator<Item = Edge> + '_ {
        let (lo, hi) = (self.offsets[id as usize] as usize, self.offsets[id as usize + 1] as usize);
        self.targets[lo..hi]
            .iter()
            .zip(&self.costs[lo..hi])
            .map(|(&target, &cost)| Edge { target, cost })
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            subgoals: self.len(),
            global_subgoals: self.local.iter().filter(|&&l| !l).count(),
            edges: self.targets.len(),
        }
    }

    /// Padded location of a traversable point.
    pub(crate) fn traversable_loc(&self, p: Point) -> Option<MapLoc> {
        self.grid.loc(p).filter(|&loc| self.grid.is_free(loc))
    }

    /// Stored obstacle clearance of `p` in the cardinal direction `dir`.
    pub fn clearance(&self, p: Point, dir: Direction) -> Result<u8> {
        let loc = self
            .traversable_loc(p)
            .filter(|_| !dir.is_diagonal())
            .ok_or(SubgoalError::InvalidQuery(p))?;
        Ok(self.clearance.clearance(Layer::Obstacle, loc, dir))
    }

    /// Exact obstacle clearance of `p` in the cardinal direction `dir`.
    pub fn total_clearance(&self, p: Point, dir: Direction) -> Result<u32> {
        let loc = self
            .traversable_loc(p)
            .filter(|_| !dir.is_diagonal())
            .ok_or(SubgoalError::InvalidQuery(p))?;
        Ok(self.clearance.total_clearance(Layer::Obstacle, loc, dir))
    }

    pub fn reachability(&self) -> Reachability<'_> {
        Reachability::new(&self.grid, &self.clearance)
    }

    pub fn linker(&self) -> Linker<'_> {
        Linker::new(&self.grid, &self.clearance, &self.subgoals)
    }

    /// Diagonal-first check between two points. Blocked or out-of-bounds
    /// points are never reachable.
    pub fn is_quick_h_reachable(&self, a: Point, b: Point) -> bool {
        match (self.traversable_loc(a), self.traversable_loc(b)) {
            (Some(a), Some(b)) => self.reachability().is_quick_h_reachable(a, b),
            _ => false,
        }
    }

    /// Diagonal-first, then cardinal-first check between two points.
    pub fn is_lookahead_h_reachable(&self, a: Point, b: Point) -> bool {
        match (self.traversable_loc(a), self.traversable_loc(b)) {
            (Some(a), Some(b)) => self.reachability().is_lookahead_h_reachable(a, b),
            _ => false,
        }
    }

    /// Subgoals directly h-reachable from a traversable point.
    pub fn direct_h_reachable(&self, p: Point) -> Result<Vec<SubgoalId>> {
        let loc = self.traversable_loc(p).ok_or(SubgoalError::InvalidQuery(p))?;
        let mut out = Vec::new();
        self.linker().direct_h_reachable(loc, &mut out);
        Ok(out)
    }
}
