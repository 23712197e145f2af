//! Map construction helpers for the sgraph crates: text map parsing and
//! random cave generation.

pub mod ascii;
pub mod mapgen;

pub use ascii::{AsciiMap, MapParseError, parse_grid, render};
pub use mapgen::{CellularAutomataRule, EightDirectionWalker, FourDirectionWalker, MapGen, RandomWalker};
