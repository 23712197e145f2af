//! Subgoal identification and the id ↔ location mapping.
//!
//! A subgoal sits next to the convex corner of an obstacle: for some
//! diagonal direction the diagonal neighbour is blocked while both cardinal
//! cells beside it are free. These are exactly the cells where a taut
//! shortest path can turn, i.e. the turn points of jump point search.

use sgraph_core::{Direction, Grid, MapLoc, Point};

/// Dense subgoal identifier, assigned in row-major order.
pub type SubgoalId = u16;

/// Sentinel stored in the location map for cells that are not subgoals.
pub const NO_SUBGOAL: SubgoalId = SubgoalId::MAX;

/// Whether the traversable cell `loc` is at the corner of an obstacle.
#[inline]
pub fn is_corner(grid: &Grid, loc: MapLoc) -> bool {
    if !grid.is_free(loc) {
        return false;
    }
    Direction::DIAGONALS.into_iter().any(|d| {
        let (h, v) = d.components();
        !grid.is_free(grid.step(loc, d))
            && grid.is_free(grid.step(loc, h))
            && grid.is_free(grid.step(loc, v))
    })
}

/// Scan every cell once and return the corner cells in row-major order.
pub fn identify_subgoals(grid: &Grid) -> Vec<MapLoc> {
    grid.traversable_points()
        .filter_map(|p| grid.loc(p))
        .filter(|&loc| is_corner(grid, loc))
        .collect()
}

// ---------------------------------------------------------------------------
// SubgoalMap
// ---------------------------------------------------------------------------

/// Append-only bidirectional map between subgoal ids and padded locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgoalMap {
    locs: Vec<MapLoc>,
    ids: Vec<SubgoalId>,
}

impl SubgoalMap {
    /// An empty map for a grid with `padded_len` cells.
    pub fn new(padded_len: usize) -> Self {
        Self {
            locs: Vec::new(),
            ids: vec![NO_SUBGOAL; padded_len],
        }
    }

    /// Register `loc` and return its id. A location already registered
    /// keeps its id. Returns `None` when the id space is exhausted.
    pub fn add(&mut self, loc: MapLoc) -> Option<SubgoalId> {
        let existing = self.ids[loc];
        if existing != NO_SUBGOAL {
            return Some(existing);
        }
        let id = SubgoalId::try_from(self.locs.len()).ok().filter(|&id| id != NO_SUBGOAL)?;
        self.locs.push(loc);
        self.ids[loc] = id;
        Some(id)
    }

    /// Id of the subgoal at `loc`, if any.
    #[inline]
    pub fn id(&self, loc: MapLoc) -> Option<SubgoalId> {
        match self.ids.get(loc) {
            Some(&id) if id != NO_SUBGOAL => Some(id),
            _ => None,
        }
    }

    #[inline]
    pub fn is_subgoal(&self, loc: MapLoc) -> bool {
        self.id(loc).is_some()
    }

    /// Location of subgoal `id`.
    #[inline]
    pub fn loc(&self, id: SubgoalId) -> MapLoc {
        self.locs[id as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locs.is_empty()
    }

    /// All locations, indexed by id.
    pub fn locs(&self) -> &[MapLoc] {
        &self.locs
    }

    /// Logical coordinates of every subgoal, indexed by id.
    pub fn points(&self, grid: &Grid) -> Vec<Point> {
        self.locs.iter().map(|&loc| grid.point(loc)).collect()
    }
}
