//! Reusable best-first search scratch, shared by every search in the crate.
//!
//! Node records are stamped with a generation counter, so starting a new
//! search is O(1): records from older generations read as unvisited.

use std::collections::BinaryHeap;

use crate::distance::{Cost, INFINITE_COST};
use crate::traits::{AstarPather, Pather};

/// Parent of a search root.
pub(crate) const NO_PARENT: usize = usize::MAX;

#[derive(Clone)]
struct Node {
    g: Cost,
    parent: usize,
    generation: u32,
    closed: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            g: INFINITE_COST,
            parent: NO_PARENT,
            generation: 0,
            closed: false,
        }
    }
}

/// Heap entry, ordered so that `BinaryHeap` pops the lowest `f` first and
/// among equal `f` the lowest index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeRef {
    pub(crate) idx: usize,
    pub(crate) f: Cost,
}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.f.cmp(&self.f).then_with(|| other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Open list: a binary heap plus an optional LIFO stack holding successors
/// whose `f` equals the `f` of the node being expanded.
#[derive(Default)]
pub(crate) struct OpenList {
    heap: BinaryHeap<NodeRef>,
    stack: Vec<NodeRef>,
    use_stack: bool,
}

impl OpenList {
    fn reset(&mut self, use_stack: bool) {
        self.heap.clear();
        self.stack.clear();
        self.use_stack = use_stack;
    }

    fn push(&mut self, entry: NodeRef, current_f: Cost) {
        if self.use_stack && entry.f == current_f {
            self.stack.push(entry);
        } else {
            self.heap.push(entry);
        }
    }

    fn pop(&mut self) -> Option<NodeRef> {
        self.stack.pop().or_else(|| self.heap.pop())
    }
}

/// How a bounded search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target was reached at this cost.
    Found(Cost),
    /// The open list ran dry within the cost limit.
    Exhausted,
    /// The expansion bound was hit first.
    Bounded,
}

impl Outcome {
    pub fn cost(self) -> Option<Cost> {
        match self {
            Outcome::Found(c) => Some(c),
            _ => None,
        }
    }
}

/// Search parameters beyond the endpoints.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bounds {
    /// Nodes with `f` above this are never opened.
    pub(crate) cost_limit: Cost,
    pub(crate) max_expansions: Option<usize>,
    pub(crate) use_stack: bool,
}

impl Bounds {
    pub(crate) fn limit(cost_limit: Cost) -> Self {
        Self {
            cost_limit,
            max_expansions: None,
            use_stack: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn unbounded() -> Self {
        Self::limit(INFINITE_COST)
    }
}

/// Per-search scratch state: node records, open list and neighbour buffer.
///
/// Owning one of these per thread lets repeated queries run without
/// allocating after warm-up.
#[derive(Default)]
pub struct SearchContext {
    nodes: Vec<Node>,
    generation: u32,
    open: OpenList,
    nbuf: Vec<(usize, Cost)>,
    expansions: usize,
}

impl SearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every record and make room for `len` nodes.
    fn begin(&mut self, len: usize, use_stack: bool) -> u32 {
        if self.nodes.len() < len {
            self.nodes.resize(len, Node::default());
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.nodes.fill(Node::default());
            self.generation = 1;
        }
        self.open.reset(use_stack);
        self.expansions = 0;
        self.generation
    }

    /// Lower `idx` to cost `g` via `parent`. Returns whether the record
    /// improved and should be (re)opened.
    #[inline]
    fn relax(&mut self, idx: usize, g: Cost, parent: usize, generation: u32) -> bool {
        let n = &mut self.nodes[idx];
        if n.generation == generation {
            if n.closed || g >= n.g {
                return false;
            }
        } else {
            n.generation = generation;
            n.closed = false;
        }
        n.g = g;
        n.parent = parent;
        true
    }

    /// Cost of `idx` in the last search, if it was reached.
    #[inline]
    pub fn g(&self, idx: usize) -> Option<Cost> {
        match self.nodes.get(idx) {
            Some(n) if n.generation == self.generation && self.generation != 0 => Some(n.g),
            _ => None,
        }
    }

    /// Number of nodes expanded by the last search.
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Indices from the root of the last search to `idx`, inclusive.
    pub fn path_to(&self, idx: usize) -> Vec<usize> {
        let mut path = Vec::new();
        if self.g(idx).is_none() {
            return path;
        }
        let mut cur = idx;
        while cur != NO_PARENT {
            path.push(cur);
            cur = self.nodes[cur].parent;
        }
        path.reverse();
        path
    }

    /// A* from `from` to `to`. Stale heap entries are skipped lazily.
    pub(crate) fn astar<P: AstarPather>(
        &mut self,
        pather: &P,
        from: usize,
        to: usize,
        bounds: Bounds,
    ) -> Outcome {
        let generation = self.begin(pather.len(), bounds.use_stack);
        let max_expansions = bounds.max_expansions.unwrap_or(pather.len() + 2);
        self.relax(from, 0, NO_PARENT, generation);
        let f0 = pather.estimate(from, to);
        if f0 > bounds.cost_limit {
            return Outcome::Exhausted;
        }
        self.open.push(NodeRef { idx: from, f: f0 }, INFINITE_COST);

        let mut nbuf = std::mem::take(&mut self.nbuf);

        let outcome = 'search: loop {
            let Some(current) = self.open.pop() else {
                break 'search Outcome::Exhausted;
            };
            let ci = current.idx;
            if self.nodes[ci].closed {
                continue;
            }
            let current_g = self.nodes[ci].g;
            if ci == to {
                break 'search Outcome::Found(current_g);
            }
            if self.expansions >= max_expansions {
                break 'search Outcome::Bounded;
            }
            self.nodes[ci].closed = true;
            self.expansions += 1;

            nbuf.clear();
            pather.neighbors(ci, &mut nbuf);
            for &(ni, cost) in nbuf.iter() {
                let g = current_g.saturating_add(cost);
                let f = g.saturating_add(pather.estimate(ni, to));
                if f > bounds.cost_limit {
                    continue;
                }
                if self.relax(ni, g, ci, generation) {
                    self.open.push(NodeRef { idx: ni, f }, current.f);
                }
            }
        };

        self.nbuf = nbuf;
        outcome
    }

    /// Multi-source Dijkstra up to `max_cost`. Reached costs are readable
    /// through [`g`](Self::g) afterwards; the order in which nodes were
    /// settled is appended to `settled`.
    pub(crate) fn dijkstra<P: Pather>(
        &mut self,
        pather: &P,
        sources: &[usize],
        max_cost: Cost,
        settled: &mut Vec<(usize, Cost)>,
    ) {
        let generation = self.begin(pather.len(), false);
        settled.clear();
        for &src in sources {
            if src < pather.len() && self.relax(src, 0, NO_PARENT, generation) {
                self.open.push(NodeRef { idx: src, f: 0 }, INFINITE_COST);
            }
        }

        let mut nbuf = std::mem::take(&mut self.nbuf);

        while let Some(current) = self.open.pop() {
            let ci = current.idx;
            if self.nodes[ci].closed {
                continue;
            }
            self.nodes[ci].closed = true;
            self.expansions += 1;
            let current_g = self.nodes[ci].g;
            settled.push((ci, current_g));

            nbuf.clear();
            pather.neighbors(ci, &mut nbuf);
            for &(ni, cost) in nbuf.iter() {
                let g = current_g.saturating_add(cost);
                if g > max_cost {
                    continue;
                }
                if self.relax(ni, g, ci, generation) {
                    self.open.push(NodeRef { idx: ni, f: g }, INFINITE_COST);
                }
            }
        }

        self.nbuf = nbuf;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A weighted line 0 - 1 - 2 - ... with unit-1000 steps and a shortcut
    /// edge 0 -> last.
    struct Line {
        len: usize,
        shortcut: Option<Cost>,
    }

    impl Pather for Line {
        fn len(&self) -> usize {
            self.len
        }

        fn neighbors(&self, node: usize, buf: &mut Vec<(usize, Cost)>) {
            if node > 0 {
                buf.push((node - 1, 1000));
            }
            if node + 1 < self.len {
                buf.push((node + 1, 1000));
            }
            if let (0, Some(c)) = (node, self.shortcut) {
                buf.push((self.len - 1, c));
            }
        }
    }

    impl AstarPather for Line {
        fn estimate(&self, from: usize, to: usize) -> Cost {
            (from.abs_diff(to) as Cost) * 500
        }
    }

    #[test]
    fn heap_pops_lowest_f_then_lowest_index() {
        let mut heap = BinaryHeap::new();
        heap.push(NodeRef { idx: 4, f: 10 });
        heap.push(NodeRef { idx: 2, f: 10 });
        heap.push(NodeRef { idx: 9, f: 3 });
        assert_eq!(heap.pop().map(|n| n.idx), Some(9));
        assert_eq!(heap.pop().map(|n| n.idx), Some(2));
        assert_eq!(heap.pop().map(|n| n.idx), Some(4));
    }

    #[test]
    fn astar_prefers_cheaper_route() {
        let line = Line {
            len: 6,
            shortcut: Some(3000),
        };
        let mut ctx = SearchContext::new();
        assert_eq!(ctx.astar(&line, 0, 5, Bounds::unbounded()), Outcome::Found(3000));
        assert_eq!(ctx.path_to(5), vec![0, 5]);
        let line = Line {
            len: 6,
            shortcut: None,
        };
        assert_eq!(ctx.astar(&line, 0, 5, Bounds::unbounded()), Outcome::Found(5000));
        assert_eq!(ctx.path_to(5), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn cost_limit_and_expansion_bound() {
        let line = Line {
            len: 6,
            shortcut: None,
        };
        let mut ctx = SearchContext::new();
        assert_eq!(ctx.astar(&line, 0, 5, Bounds::limit(4999)), Outcome::Exhausted);
        assert_eq!(ctx.astar(&line, 0, 5, Bounds::limit(5000)), Outcome::Found(5000));
        let bounds = Bounds {
            max_expansions: Some(2),
            ..Bounds::unbounded()
        };
        assert_eq!(ctx.astar(&line, 0, 5, bounds), Outcome::Bounded);
    }

    #[test]
    fn stack_does_not_change_costs() {
        let line = Line {
            len: 8,
            shortcut: Some(6500),
        };
        let mut ctx = SearchContext::new();
        let with_stack = Bounds {
            use_stack: true,
            ..Bounds::unbounded()
        };
        assert_eq!(ctx.astar(&line, 0, 7, with_stack), Outcome::Found(6500));
        assert_eq!(ctx.astar(&line, 2, 6, with_stack), Outcome::Found(4000));
    }

    #[test]
    fn dijkstra_reports_settled_order() {
        let line = Line {
            len: 5,
            shortcut: None,
        };
        let mut ctx = SearchContext::new();
        let mut settled = Vec::new();
        ctx.dijkstra(&line, &[2], 1000, &mut settled);
        assert_eq!(settled, vec![(2, 0), (1, 1000), (3, 1000)]);
        assert_eq!(ctx.g(0), None);
        assert_eq!(ctx.g(3), Some(1000));
    }

    #[test]
    fn new_search_forgets_old_records() {
        let line = Line {
            len: 4,
            shortcut: None,
        };
        let mut ctx = SearchContext::new();
        ctx.astar(&line, 0, 3, Bounds::unbounded());
        assert_eq!(ctx.g(3), Some(3000));
        ctx.astar(&line, 3, 2, Bounds::unbounded());
        assert_eq!(ctx.g(0), None);
        assert_eq!(ctx.path_to(2), vec![3, 2]);
    }
}
