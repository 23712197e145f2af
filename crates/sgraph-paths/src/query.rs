//! Point-to-point queries over a [`SubgoalGraph`].
//!
//! A query splices its endpoints into the graph through a transient edge
//! overlay, searches the abstract graph, refines each abstract edge back
//! into grid cells and finally drops the overlay again.
//!
//! Local subgoals only ever appear at the two ends of a shortest path: an
//! ascending run from the start side (following the edges they had when
//! demoted) and a descending run into the goal side. The goal side is
//! handled by adding reversed copies of the upward edges reachable from
//! the goal's direct neighbours.

use std::sync::Arc;

use log::{debug, warn};
use sgraph_core::{MapLoc, Point};

use crate::distance::{Cost, INFINITE_COST, octile};
use crate::engine::Path;
use crate::error::{Result, SubgoalError};
use crate::graph::{Edge, SubgoalGraph};
use crate::gridsearch::GridSearch;
use crate::search::{Bounds, Outcome, SearchContext};
use crate::subgoals::SubgoalId;
use crate::traits::{AstarPather, PathFinder, Pather};

/// Where a query currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryState {
    #[default]
    Idle,
    /// Endpoints are spliced into the overlay.
    Connected,
    Searching,
    PathFound,
    NoPath,
    /// The search hit its expansion bound.
    Bounded,
}

/// Transient edges added for one query.
#[derive(Debug, Default)]
struct Overlay {
    extra: Vec<Vec<Edge>>,
    dirty: Vec<usize>,
    start: MapLoc,
    goal: MapLoc,
}

impl Overlay {
    fn add(&mut self, from: usize, edge: Edge) {
        if self.extra.len() <= from {
            self.extra.resize_with(from + 1, Vec::new);
        }
        if self.extra[from].is_empty() {
            self.dirty.push(from);
        }
        self.extra[from].push(edge);
    }

    fn clear(&mut self) {
        for i in self.dirty.drain(..) {
            self.extra[i].clear();
        }
    }

    fn len(&self) -> usize {
        self.dirty.iter().map(|&i| self.extra[i].len()).sum()
    }
}

/// The finalized graph plus the query overlay, with ids `n` and `n + 1`
/// standing for the transient start and goal.
struct QueryGraph<'a> {
    graph: &'a SubgoalGraph,
    overlay: &'a Overlay,
}

impl QueryGraph<'_> {
    fn loc(&self, node: usize) -> MapLoc {
        let n = self.graph.len();
        if node < n {
            self.graph.subgoals.loc(node as SubgoalId)
        } else if node == n {
            self.overlay.start
        } else {
            self.overlay.goal
        }
    }

    fn point(&self, node: usize) -> Point {
        self.graph.grid.point(self.loc(node))
    }
}

impl Pather for QueryGraph<'_> {
    fn len(&self) -> usize {
        self.graph.len() + 2
    }

    fn neighbors(&self, node: usize, buf: &mut Vec<(usize, Cost)>) {
        if node < self.graph.len() {
            buf.extend(
                self.graph
                    .edges(node as SubgoalId)
                    .map(|e| (e.target as usize, e.cost)),
            );
        }
        if let Some(extra) = self.overlay.extra.get(node) {
            buf.extend(extra.iter().map(|e| (e.target as usize, e.cost)));
        }
    }
}

impl AstarPather for QueryGraph<'_> {
    fn estimate(&self, from: usize, to: usize) -> Cost {
        octile(self.point(from), self.point(to))
    }
}

/// Per-thread query state for a shared [`SubgoalGraph`].
pub struct SubgoalPlanner {
    graph: Arc<SubgoalGraph>,
    search: SearchContext,
    grid_search: GridSearch,
    overlay: Overlay,
    found: Vec<SubgoalId>,
    seen: Vec<bool>,
    queue: Vec<SubgoalId>,
    state: QueryState,
}

impl SubgoalPlanner {
    pub fn new(graph: Arc<SubgoalGraph>) -> Self {
        let n = graph.len();
        Self {
            graph,
            search: SearchContext::new(),
            grid_search: GridSearch::new(),
            overlay: Overlay::default(),
            found: Vec::new(),
            seen: vec![false; n],
            queue: Vec::new(),
            state: QueryState::Idle,
        }
    }

    pub fn graph(&self) -> &Arc<SubgoalGraph> {
        &self.graph
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Number of transient edges currently spliced in.
    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }

    /// Drop the transient nodes and edges of the last query. Idempotent.
    pub fn clear_query(&mut self) {
        self.overlay.clear();
        self.state = QueryState::Idle;
    }

    fn validate(&self, p: Point) -> Result<MapLoc> {
        self.graph
            .traversable_loc(p)
            .ok_or(SubgoalError::InvalidLocation(p))
    }

    /// An octile-length path between two points according to the
    /// configured reachability mode.
    pub fn is_h_reachable(&mut self, a: Point, b: Point) -> Result<Option<Vec<Point>>> {
        let (la, lb) = (self.validate(a)?, self.validate(b)?);
        let graph = Arc::clone(&self.graph);
        let cells = graph.reachability().is_h_reachable(
            la,
            lb,
            graph.config.reachability,
            &mut self.grid_search,
        );
        Ok(cells.map(|cells| cells.into_iter().map(|l| graph.grid.point(l)).collect()))
    }

    /// Splice the endpoints into the overlay. Returns the search root and
    /// target node ids.
    fn connect(&mut self, graph: &SubgoalGraph, start: MapLoc, goal: MapLoc) -> (usize, usize) {
        let n = graph.len();
        let linker = graph.linker();
        let grid = &graph.grid;

        let root = match graph.subgoals.id(start) {
            Some(id) => id as usize,
            None => {
                self.overlay.start = start;
                linker.direct_h_reachable(start, &mut self.found);
                let ps = grid.point(start);
                for &t in &self.found {
                    let cost = octile(ps, graph.point(t));
                    self.overlay.add(n, Edge { target: t, cost });
                }
                n
            }
        };

        self.queue.clear();
        let target = match graph.subgoals.id(goal) {
            Some(id) => {
                if graph.is_local(id) {
                    self.queue.push(id);
                }
                id as usize
            }
            None => {
                self.overlay.goal = goal;
                linker.direct_h_reachable(goal, &mut self.found);
                let pg = grid.point(goal);
                let goal_id = (n + 1) as SubgoalId;
                for &x in &self.found {
                    let cost = octile(graph.point(x), pg);
                    self.overlay.add(x as usize, Edge { target: goal_id, cost });
                    if graph.is_local(x) {
                        self.queue.push(x);
                    }
                }
                n + 1
            }
        };

        // Upward closure of the goal-side locals; every upward edge found is
        // made walkable downwards.
        for &v in &self.queue {
            self.seen[v as usize] = true;
        }
        let mut head = 0;
        while head < self.queue.len() {
            let v = self.queue[head];
            head += 1;
            for e in graph.edges(v) {
                self.overlay.add(
                    e.target as usize,
                    Edge {
                        target: v,
                        cost: e.cost,
                    },
                );
                let w = e.target as usize;
                if graph.is_local(e.target) && !self.seen[w] {
                    self.seen[w] = true;
                    self.queue.push(e.target);
                }
            }
        }
        for &v in &self.queue {
            self.seen[v as usize] = false;
        }

        self.state = QueryState::Connected;
        (root, target)
    }

    /// Expand abstract nodes into grid cells.
    fn refine(&mut self, graph: &SubgoalGraph, nodes: &[usize]) -> Result<Vec<Point>> {
        let qg = QueryGraph {
            graph,
            overlay: &self.overlay,
        };
        let reach = graph.reachability();
        let mut cells: Vec<Point> = vec![qg.point(nodes[0])];
        for pair in nodes.windows(2) {
            let (a, b) = (qg.loc(pair[0]), qg.loc(pair[1]));
            let cost = octile(qg.point(pair[0]), qg.point(pair[1]));
            let segment = reach
                .refine(a, b, cost, &mut self.grid_search)
                .ok_or(SubgoalError::Unrefinable {
                    from: qg.point(pair[0]),
                    to: qg.point(pair[1]),
                })?;
            cells.extend(segment.into_iter().skip(1).map(|l| graph.grid.point(l)));
        }
        Ok(cells)
    }

    fn run(&mut self, graph: &SubgoalGraph, start: MapLoc, goal: MapLoc) -> Result<Option<Path>> {
        let reach = graph.reachability();
        if let Some(cells) =
            reach.is_h_reachable(start, goal, graph.config.reachability, &mut self.grid_search)
        {
            debug!("query: start and goal are h-reachable");
            self.state = QueryState::PathFound;
            let cost = octile(graph.grid.point(start), graph.grid.point(goal));
            let cells = cells.into_iter().map(|l| graph.grid.point(l)).collect();
            return Ok(Some(Path { cells, cost }));
        }

        let (root, target) = self.connect(graph, start, goal);
        self.state = QueryState::Searching;
        let bounds = Bounds {
            cost_limit: INFINITE_COST,
            max_expansions: graph.config.max_expansions,
            use_stack: graph.config.use_stack,
        };
        let qg = QueryGraph {
            graph,
            overlay: &self.overlay,
        };
        let outcome = self.search.astar(&qg, root, target, bounds);
        let cost = match outcome {
            Outcome::Found(cost) => cost,
            Outcome::Exhausted => {
                debug!("query: open list exhausted");
                self.state = QueryState::NoPath;
                return Ok(None);
            }
            Outcome::Bounded => {
                let expansions = self.search.expansions();
                warn!("query: expansion bound hit after {expansions} expansions");
                self.state = QueryState::Bounded;
                return Err(SubgoalError::SearchBounded { expansions });
            }
        };

        let nodes = self.search.path_to(target);
        let cells = self
            .refine(graph, &nodes)
            .inspect_err(|e| warn!("query: {e}"))?;
        debug!(
            "query: {} abstract nodes, {} cells, {} expansions",
            nodes.len(),
            cells.len(),
            self.search.expansions()
        );
        self.state = QueryState::PathFound;
        Ok(Some(Path { cells, cost }))
    }
}

impl PathFinder for SubgoalPlanner {
    fn find_path(&mut self, start: Point, goal: Point) -> Result<Option<Path>> {
        let from = self.validate(start)?;
        let to = self.validate(goal)?;
        if from == to {
            return Ok(Some(Path::single(start)));
        }
        if !self.graph.components.connected(from, to) {
            debug!("query: {start} and {goal} are in different components");
            return Ok(None);
        }
        let graph = Arc::clone(&self.graph);
        let path = self.run(&graph, from, to);
        self.clear_query();
        path
    }
}
