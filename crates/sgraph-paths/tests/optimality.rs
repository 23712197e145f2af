mod common;

use std::sync::Arc;

use common::{MODES, all_configs, cave, scattered, walk_cost};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use sgraph_core::{Grid, Point};
use sgraph_paths::{
    EngineKind, GraphConfig, GridSearch, PathFinder, Planner, ReachabilityMode, octile, preprocess,
};

fn random_pairs(grid: &Grid, count: usize, seed: u64) -> Vec<(Point, Point)> {
    let cells: Vec<Point> = grid.traversable_points().collect();
    if cells.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let s = cells[rng.random_range(0..cells.len())];
            let g = cells[rng.random_range(0..cells.len())];
            (s, g)
        })
        .collect()
}

fn check_against_dijkstra(grid: &Grid, config: &GraphConfig, pairs: &[(Point, Point)]) {
    let engine = Arc::new(preprocess(grid, config).unwrap());
    let mut planner = Planner::new(engine);
    let mut truth = GridSearch::new();
    for &(s, g) in pairs {
        let want = truth.distance(grid, s, g);
        let got = planner.find_path(s, g).unwrap();
        match (&got, want) {
            (Some(path), Some(cost)) => {
                assert_eq!(path.cost, cost, "{s} -> {g} under {config:?}");
                assert_eq!(path.cells.first(), Some(&s));
                assert_eq!(path.cells.last(), Some(&g));
                assert_eq!(walk_cost(grid, &path.cells), cost);
            }
            (None, None) => {}
            _ => panic!("{s} -> {g} under {config:?}: got {got:?}, want {want:?}"),
        }
        assert_eq!(planner.overlay_len(), 0);
    }
}

#[test]
fn caves_match_dijkstra_in_every_configuration() {
    for seed in 0..3 {
        let grid = cave(36, 24, seed);
        let pairs = random_pairs(&grid, 25, seed + 100);
        for config in all_configs() {
            check_against_dijkstra(&grid, &config, &pairs);
        }
    }
}

#[test]
fn scattered_obstacles_match_dijkstra() {
    for (seed, density) in [(1, 0.1), (2, 0.25), (3, 0.35)] {
        let grid = scattered(40, 30, density, seed);
        let pairs = random_pairs(&grid, 40, seed);
        for mode in MODES {
            for prune in [false, true] {
                let config = GraphConfig::default().with_reachability(mode).with_prune(prune);
                check_against_dijkstra(&grid, &config, &pairs);
            }
        }
    }
}

#[test]
fn bucket_engine_matches_dijkstra() {
    let grid = scattered(32, 32, 0.3, 9);
    let config = GraphConfig::default().with_max_subgoals(0);
    assert_eq!(preprocess(&grid, &config).unwrap().kind(), EngineKind::Bucket);
    check_against_dijkstra(&grid, &config, &random_pairs(&grid, 60, 9));
}

#[test]
fn pruning_keeps_distances_between_global_subgoals() {
    let grid = scattered(30, 20, 0.2, 5);
    let full = preprocess(&grid, &GraphConfig::default().with_prune(false)).unwrap();
    let pruned = preprocess(&grid, &GraphConfig::default()).unwrap();
    let graph = pruned.subgoal_graph().unwrap();
    let globals: Vec<Point> = (0..graph.len() as u16)
        .filter(|&id| !graph.is_local(id))
        .map(|id| graph.point(id))
        .collect();

    let (mut a, mut b) = (Planner::new(Arc::new(full)), Planner::new(Arc::new(pruned)));
    for &s in globals.iter().step_by(4) {
        for &t in globals.iter().step_by(7) {
            assert_eq!(a.distance(s, t).unwrap(), b.distance(s, t).unwrap(), "{s} -> {t}");
        }
    }
}

#[test]
fn bounded_distance_mode_is_exact() {
    let grid = cave(24, 18, 4);
    let config = GraphConfig::default().with_reachability(ReachabilityMode::BoundedDistance);
    let mut planner = Planner::new(Arc::new(preprocess(&grid, &config).unwrap()));
    let mut truth = GridSearch::new();
    for (a, b) in random_pairs(&grid, 80, 4).into_iter().filter(|(a, b)| a != b) {
        let exact = truth.distance(&grid, a, b) == Some(octile(a, b));
        assert_eq!(planner.is_h_reachable(a, b).unwrap().is_some(), exact, "{a} -> {b}");
    }
}

#[test]
fn weaker_modes_never_accept_more_than_bounded_distance() {
    let grid = scattered(20, 20, 0.3, 8);
    let pairs = random_pairs(&grid, 120, 8);
    let mut truth = GridSearch::new();
    for mode in MODES {
        let config = GraphConfig::default().with_reachability(mode);
        let mut planner = Planner::new(Arc::new(preprocess(&grid, &config).unwrap()));
        for &(a, b) in pairs.iter().filter(|(a, b)| a != b) {
            if let Some(cells) = planner.is_h_reachable(a, b).unwrap() {
                assert_eq!(truth.distance(&grid, a, b), Some(octile(a, b)), "{a} -> {b} under {mode:?}");
                assert_eq!(walk_cost(&grid, &cells), octile(a, b));
            }
        }
    }
}
