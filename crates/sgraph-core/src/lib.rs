//! **sgraph-core**: grid and geometry types for subgoal-graph pathfinding.
//!
//! This crate provides the foundational types shared by the *sgraph*
//! crates: geometry primitives, the padded traversability [`Grid`], and a
//! cooperative-cancellation [`Context`] for long preprocessing runs.

pub mod context;
pub mod geom;
pub mod grid;

pub use context::Context;
pub use geom::{Direction, Point, Range, RangeIter};
pub use grid::{Grid, GridError, MapLoc};
