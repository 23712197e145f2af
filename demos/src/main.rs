//! Preprocess a map, answer random queries and check every answer against
//! an exhaustive grid Dijkstra.
//!
//! Usage:
//!   cargo run -- --width 256 --height 256 --seed 7
//!   cargo run -- --map arena.map --queries 500 --save arena.sg
//!   cargo run -- --load arena.sg --mode safe-freespace

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use sgraph_core::{Grid, Point};
use sgraph_maps::{CellularAutomataRule, EightDirectionWalker, MapGen, parse_grid};
use sgraph_paths::{GraphConfig, GridSearch, PathEngine, PathFinder, Planner, ReachabilityMode, preprocess};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    BoundedDistance,
    Freespace,
    CanonicalFreespace,
    SafeFreespace,
}

impl From<Mode> for ReachabilityMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::BoundedDistance => ReachabilityMode::BoundedDistance,
            Mode::Freespace => ReachabilityMode::Freespace,
            Mode::CanonicalFreespace => ReachabilityMode::CanonicalFreespace,
            Mode::SafeFreespace => ReachabilityMode::SafeFreespace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Cave {
    Automata,
    Walk,
}

/// Subgoal graph pathfinding driver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Text map to load (`.map` header optional)
    #[arg(short, long, conflicts_with = "load")]
    map: Option<PathBuf>,

    /// Preprocessed engine to load instead of building one
    #[arg(short, long)]
    load: Option<PathBuf>,

    /// Write the preprocessed engine here
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Width of a generated map
    #[arg(long, default_value_t = 128)]
    width: i32,

    /// Height of a generated map
    #[arg(long, default_value_t = 128)]
    height: i32,

    /// Generator for random maps
    #[arg(long, value_enum, default_value_t = Cave::Automata)]
    cave: Cave,

    /// Seed for map generation and query endpoints
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of random queries
    #[arg(short, long, default_value_t = 100)]
    queries: usize,

    /// h-reachability check
    #[arg(long, value_enum, default_value_t = Mode::Freespace)]
    mode: Mode,

    /// Keep every subgoal global
    #[arg(long)]
    no_prune: bool,

    /// Run one search per neighbour pair while pruning
    #[arg(long)]
    no_cache: bool,

    /// Disable the same-f expansion stack
    #[arg(long)]
    no_stack: bool,

    /// Subgoal budget before the bucket engine takes over
    #[arg(long)]
    max_subgoals: Option<usize>,
}

impl Args {
    fn config(&self) -> GraphConfig {
        let mut config = GraphConfig::default()
            .with_reachability(self.mode.into())
            .with_prune(!self.no_prune)
            .with_pairwise_distance_cache(!self.no_cache)
            .with_stack(!self.no_stack);
        if let Some(max) = self.max_subgoals {
            config = config.with_max_subgoals(max);
        }
        config
    }
}

fn generate(args: &Args, rng: &mut StdRng) -> Result<Grid, Box<dyn Error>> {
    let grid = Grid::new(args.width, args.height)?;
    let mut mg = MapGen::with_grid(grid, StdRng::seed_from_u64(rng.random()));
    let open = match args.cave {
        Cave::Automata => mg.cellular_automata_cave(0.45, &[CellularAutomataRule::default()]),
        Cave::Walk => {
            mg.random_walk_cave(&EightDirectionWalker, 0.45, 64);
            mg.grid.count_traversable()
        }
    };
    info!("generated {}x{} {:?} cave, {open} open cells", args.width, args.height, args.cave);
    Ok(mg.into_grid())
}

fn build(args: &Args, rng: &mut StdRng) -> Result<PathEngine, Box<dyn Error>> {
    if let Some(path) = &args.load {
        let engine = PathEngine::load(path)?;
        info!("loaded engine from {}", path.display());
        return Ok(engine);
    }
    let grid = match &args.map {
        Some(path) => parse_grid(&std::fs::read_to_string(path)?)?,
        None => generate(args, rng)?,
    };
    let start = Instant::now();
    let engine = preprocess(&grid, &args.config())?;
    let stats = engine.stats();
    info!(
        "preprocessed {:?} engine in {:.1?}: {} subgoals, {} global, {} edges",
        engine.kind(),
        start.elapsed(),
        stats.subgoals,
        stats.global_subgoals,
        stats.edges
    );
    Ok(engine)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let engine = build(&args, &mut rng)?;
    if let Some(path) = &args.save {
        engine.save(path)?;
        info!("saved engine to {}", path.display());
    }

    let cells: Vec<Point> = engine.grid().traversable_points().collect();
    if cells.is_empty() {
        warn!("map has no traversable cells, nothing to query");
        return Ok(());
    }

    let engine = Arc::new(engine);
    let grid = engine.grid().clone();
    let mut planner = Planner::new(Arc::clone(&engine));
    let mut truth = GridSearch::new();
    let (mut found, mut unreachable, mut mismatches) = (0usize, 0usize, 0usize);
    let start = Instant::now();

    for _ in 0..args.queries {
        let s = cells[rng.random_range(0..cells.len())];
        let g = cells[rng.random_range(0..cells.len())];
        let got = planner.find_path(s, g)?;
        let want = truth.distance(&grid, s, g);
        match (&got, want) {
            (Some(path), Some(cost)) if path.cost == cost => {
                debug!("{s} -> {g}: {} cells, length {:.3}", path.cells.len(), path.length());
                found += 1;
            }
            (None, None) => unreachable += 1,
            _ => {
                error!(
                    "{s} -> {g}: engine {:?}, grid search {want:?}",
                    got.as_ref().map(|p| p.cost)
                );
                mismatches += 1;
            }
        }
        debug_assert_eq!(planner.overlay_len(), 0);
    }

    info!(
        "{} queries in {:.1?}: {found} paths, {unreachable} unreachable, {mismatches} mismatches",
        args.queries,
        start.elapsed()
    );
    if mismatches > 0 {
        return Err(format!("{mismatches} queries disagree with grid search").into());
    }
    Ok(())
}
