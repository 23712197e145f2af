//! Connected-component labelling of the traversable cells.

use sgraph_core::{Grid, MapLoc};

use crate::neighbors::moves;

/// Label of blocked cells.
pub const NO_COMPONENT: u32 = u32::MAX;

/// Component labels under 8-connectivity without corner cutting. Two cells
/// share a label iff a grid path joins them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    labels: Vec<u32>,
    count: u32,
}

impl Components {
    /// Label every traversable cell of `grid`.
    pub fn new(grid: &Grid) -> Self {
        let len = grid.padded_len();
        let mut labels = vec![NO_COMPONENT; len];
        let mut stack: Vec<MapLoc> = Vec::new();
        let mut label = 0u32;

        for start in 0..len {
            if !grid.is_free(start) || labels[start] != NO_COMPONENT {
                continue;
            }

            // Iterative DFS from `start`.
            stack.clear();
            stack.push(start);
            labels[start] = label;
            while let Some(ci) = stack.pop() {
                for (_, ni) in moves(grid, ci) {
                    if labels[ni] == NO_COMPONENT {
                        labels[ni] = label;
                        stack.push(ni);
                    }
                }
            }

            label += 1;
        }

        Self {
            labels,
            count: label,
        }
    }

    /// Label of `loc`, or `None` for blocked cells.
    #[inline]
    pub fn label(&self, loc: MapLoc) -> Option<u32> {
        self.labels.get(loc).copied().filter(|&l| l != NO_COMPONENT)
    }

    #[inline]
    pub fn connected(&self, a: MapLoc, b: MapLoc) -> bool {
        matches!((self.label(a), self.label(b)), (Some(x), Some(y)) if x == y)
    }

    /// Number of components.
    pub fn count(&self) -> u32 {
        self.count
    }
}
