//! Persisted engines: a serde struct encoded with bincode, zlib-compressed
//! when written to a file.
//!
//! Loading trusts nothing: every count, index and derived array is checked
//! against the stored grid before a graph is rebuilt from it.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path as FsPath;
use std::sync::Arc;

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use sgraph_core::Grid;

use crate::bucket::BucketGraph;
use crate::clearance::ClearanceMap;
use crate::components::Components;
use crate::config::{DEFAULT_MAX_SUBGOALS, GraphConfig};
use crate::distance::octile;
use crate::engine::PathEngine;
use crate::error::{Result, SubgoalError};
use crate::graph::SubgoalGraph;
use crate::subgoals::{SubgoalId, SubgoalMap, identify_subgoals};

/// Format version written by this crate.
pub const GRAPH_VERSION: u32 = 1;

/// Persisted engine kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerializedKind {
    Abstracted,
    Bucket,
}

/// Flat, serde-friendly image of a [`PathEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub version: u32,
    pub kind: SerializedKind,
    pub width: i32,
    pub height: i32,
    /// Row-major traversability of the logical cells.
    pub traversable: Vec<bool>,
    pub config: GraphConfig,
    pub clearance_limit: u8,
    /// Obstacle clearance, N/E/S/W, over the padded buffer.
    pub obstacle_clearance: [Vec<u8>; 4],
    /// Subgoal clearance, N/E/S/W, over the padded buffer.
    pub subgoal_clearance: [Vec<u8>; 4],
    /// Padded location of every subgoal, by id.
    pub subgoals: Vec<u64>,
    pub local: Vec<bool>,
    pub offsets: Vec<u32>,
    pub targets: Vec<SubgoalId>,
    pub costs: Vec<u32>,
}

fn corrupt(reason: impl Into<String>) -> SubgoalError {
    SubgoalError::CorruptGraphFile(reason.into())
}

impl PathEngine {
    pub fn to_serialized(&self) -> SerializedGraph {
        let grid = self.grid();
        let mut out = SerializedGraph {
            version: GRAPH_VERSION,
            kind: SerializedKind::Bucket,
            width: grid.width(),
            height: grid.height(),
            traversable: grid.to_bits(),
            config: self.config().clone(),
            clearance_limit: 0,
            obstacle_clearance: Default::default(),
            subgoal_clearance: Default::default(),
            subgoals: Vec::new(),
            local: Vec::new(),
            offsets: Vec::new(),
            targets: Vec::new(),
            costs: Vec::new(),
        };
        if let PathEngine::Abstracted(g) = self {
            let (obstacle, subgoal) = g.clearance.parts();
            out.kind = SerializedKind::Abstracted;
            out.clearance_limit = g.clearance.limit();
            out.obstacle_clearance = obstacle.clone();
            out.subgoal_clearance = subgoal.clone();
            out.subgoals = g.subgoals.locs().iter().map(|&l| l as u64).collect();
            out.local = g.local.clone();
            out.offsets = g.offsets.clone();
            out.targets = g.targets.clone();
            out.costs = g.costs.clone();
        }
        out
    }

    /// Write the engine to `path`, zlib-compressed.
    pub fn save(&self, path: impl AsRef<FsPath>) -> Result<()> {
        self.to_serialized().save(path)
    }

    /// Read an engine written by [`save`](Self::save).
    pub fn load(path: impl AsRef<FsPath>) -> Result<Self> {
        SerializedGraph::load_file(path)?.load()
    }
}

impl SerializedGraph {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| corrupt(e.to_string()))
    }

    pub fn save(&self, path: impl AsRef<FsPath>) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        let mut encoder = ZlibEncoder::new(writer, Compression::default());
        bincode::serialize_into(&mut encoder, self)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    pub fn load_file(path: impl AsRef<FsPath>) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut decoder = ZlibDecoder::new(reader);
        bincode::deserialize_from(&mut decoder).map_err(|e| corrupt(e.to_string()))
    }

    /// Validate and rebuild the engine.
    pub fn load(self) -> Result<PathEngine> {
        if self.version != GRAPH_VERSION {
            return Err(corrupt(format!("unsupported version {}", self.version)));
        }
        let grid = Grid::from_bits(&self.traversable, self.width, self.height)
            .map_err(|e| corrupt(e.to_string()))?;
        match self.kind {
            SerializedKind::Bucket => Ok(PathEngine::Bucket(Arc::new(BucketGraph::new(
                &grid,
                &self.config,
            )))),
            SerializedKind::Abstracted => Ok(PathEngine::Abstracted(Arc::new(self.into_graph(grid)?))),
        }
    }

    fn into_graph(self, grid: Grid) -> Result<SubgoalGraph> {
        let n = self.subgoals.len();
        if n > DEFAULT_MAX_SUBGOALS {
            return Err(corrupt(format!("{n} subgoals exceed the id space")));
        }

        let expected = identify_subgoals(&grid);
        if expected.len() != n || expected.iter().zip(&self.subgoals).any(|(&a, &b)| a as u64 != b) {
            return Err(corrupt("subgoal locations do not match the grid"));
        }
        let mut subgoals = SubgoalMap::new(grid.padded_len());
        for &loc in &expected {
            subgoals
                .add(loc)
                .ok_or_else(|| corrupt("subgoal id space exhausted"))?;
        }

        let clearance = ClearanceMap::from_parts(
            &grid,
            self.clearance_limit,
            self.obstacle_clearance,
            self.subgoal_clearance,
        )
        .ok_or_else(|| corrupt("clearance arrays do not match the grid"))?;
        let mut fresh = ClearanceMap::new(&grid, self.clearance_limit);
        fresh.mark_subgoals(&grid, |loc| subgoals.is_subgoal(loc));
        if fresh != clearance {
            return Err(corrupt("clearance values do not match the grid"));
        }

        if self.local.len() != n {
            return Err(corrupt("local flag count mismatch"));
        }
        if self.offsets.len() != n + 1 || self.offsets.first() != Some(&0) {
            return Err(corrupt("edge offsets malformed"));
        }
        if self.offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(corrupt("edge offsets not monotone"));
        }
        let m = self.offsets[n] as usize;
        if self.targets.len() != m || self.costs.len() != m {
            return Err(corrupt("edge array length mismatch"));
        }
        for s in 0..n {
            let ps = grid.point(expected[s]);
            for i in self.offsets[s] as usize..self.offsets[s + 1] as usize {
                let t = self.targets[i] as usize;
                if t >= n || t == s {
                    return Err(corrupt(format!("edge {s} -> {t} out of range")));
                }
                if self.costs[i] != octile(ps, grid.point(expected[t])) {
                    return Err(corrupt(format!("edge {s} -> {t} has a wrong cost")));
                }
                if !self.local[s] && self.local[t] {
                    return Err(corrupt(format!("global subgoal {s} links to local {t}")));
                }
            }
        }

        let components = Components::new(&grid);
        Ok(SubgoalGraph {
            grid,
            config: self.config,
            clearance,
            subgoals,
            local: self.local,
            offsets: self.offsets,
            targets: self.targets,
            costs: self.costs,
            components,
        })
    }
}
