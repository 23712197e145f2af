#![allow(dead_code)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use sgraph_core::{Grid, Point};
use sgraph_maps::{CellularAutomataRule, MapGen};
use sgraph_paths::{CARDINAL_COST, Cost, DIAGONAL_COST, GraphConfig, ReachabilityMode};

pub const MODES: [ReachabilityMode; 4] = [
    ReachabilityMode::BoundedDistance,
    ReachabilityMode::Freespace,
    ReachabilityMode::CanonicalFreespace,
    ReachabilityMode::SafeFreespace,
];

pub fn grid_from(rows: &[&str]) -> Grid {
    sgraph_maps::parse_grid(&rows.join("\n")).unwrap()
}

pub fn cave(w: i32, h: i32, seed: u64) -> Grid {
    let mut mg = MapGen::with_grid(Grid::new(w, h).unwrap(), StdRng::seed_from_u64(seed));
    let rule = CellularAutomataRule {
        reps: 2,
        ..CellularAutomataRule::default()
    };
    mg.cellular_automata_cave(0.40, &[rule]);
    mg.into_grid()
}

pub fn scattered(w: i32, h: i32, density: f64, seed: u64) -> Grid {
    let mut mg = MapGen::with_grid(Grid::open(w, h).unwrap(), StdRng::seed_from_u64(seed));
    mg.scatter_obstacles(density);
    mg.into_grid()
}

/// Every configuration toggle combination, per reachability mode.
pub fn all_configs() -> Vec<GraphConfig> {
    let mut out = Vec::new();
    for mode in MODES {
        for prune in [false, true] {
            for cache in [false, true] {
                for stack in [false, true] {
                    out.push(
                        GraphConfig::default()
                            .with_reachability(mode)
                            .with_prune(prune)
                            .with_pairwise_distance_cache(cache)
                            .with_stack(stack),
                    );
                }
            }
        }
    }
    out
}

/// Check that `cells` is a legal walk on `grid` and return its cost.
pub fn walk_cost(grid: &Grid, cells: &[Point]) -> Cost {
    assert!(!cells.is_empty(), "empty path");
    for &p in cells {
        assert!(grid.is_traversable(p), "path crosses blocked cell {p}");
    }
    let mut cost = 0;
    for w in cells.windows(2) {
        let (a, b) = (w[0], w[1]);
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        assert!(dx.abs() <= 1 && dy.abs() <= 1 && (dx, dy) != (0, 0), "{a} -> {b} is not a step");
        if dx != 0 && dy != 0 {
            assert!(
                grid.is_traversable(Point::new(a.x + dx, a.y)) && grid.is_traversable(Point::new(a.x, a.y + dy)),
                "{a} -> {b} cuts a corner"
            );
            cost += DIAGONAL_COST;
        } else {
            cost += CARDINAL_COST;
        }
    }
    cost
}
