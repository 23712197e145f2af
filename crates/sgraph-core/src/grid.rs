//! The [`Grid`] type: a traversability bitmap over a padded buffer.
//!
//! The buffer carries one blocked border cell on every side, so every
//! traversable cell has eight in-buffer neighbours and scans along a
//! direction always stop at the border without bounds checks. Cells are
//! addressed either by [`Point`] (logical coordinates, `0..width`) or by a
//! [`MapLoc`] (linear index into the padded buffer).

use std::fmt;

use crate::geom::{Direction, Point, Range};

/// Linear index of a cell in the padded buffer.
pub type MapLoc = usize;

/// Errors raised when building a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Width or height is zero, negative, or too large to address.
    InvalidDimensions { width: i32, height: i32 },
    /// The traversability slice does not hold `width * height` entries.
    BitLengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "grid: invalid dimensions {width}x{height}")
            }
            Self::BitLengthMismatch { expected, actual } => {
                write!(f, "grid: expected {expected} cells, got {actual}")
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Largest accepted side length.
pub const MAX_SIDE: i32 = 1 << 15;

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A 2D traversability grid backed by a padded buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl Grid {
    /// Create a grid of the given dimensions with every cell blocked.
    pub fn new(width: i32, height: i32) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 || width > MAX_SIDE || height > MAX_SIDE {
            return Err(GridError::InvalidDimensions { width, height });
        }
        let len = (width as usize + 2) * (height as usize + 2);
        Ok(Self {
            width,
            height,
            cells: vec![false; len],
        })
    }

    /// Create a grid with every cell traversable.
    pub fn open(width: i32, height: i32) -> Result<Self, GridError> {
        let mut grid = Self::new(width, height)?;
        for p in grid.bounds() {
            grid.set(p, true);
        }
        Ok(grid)
    }

    /// Build a grid from a row-major slice where `bits[y * width + x]` is
    /// `true` for traversable cells.
    pub fn from_bits(bits: &[bool], width: i32, height: i32) -> Result<Self, GridError> {
        let mut grid = Self::new(width, height)?;
        let expected = width as usize * height as usize;
        if bits.len() != expected {
            return Err(GridError::BitLengthMismatch {
                expected,
                actual: bits.len(),
            });
        }
        for (p, &bit) in grid.bounds().iter().zip(bits) {
            grid.set(p, bit);
        }
        Ok(grid)
    }

    /// Row-major traversability of the logical cells, the inverse of
    /// [`from_bits`](Grid::from_bits).
    pub fn to_bits(&self) -> Vec<bool> {
        self.bounds().iter().map(|p| self.is_traversable(p)).collect()
    }

    /// The logical bounds `[0, width) x [0, height)`.
    #[inline]
    pub fn bounds(&self) -> Range {
        Range::new(0, 0, self.width, self.height)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Row stride of the padded buffer.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize + 2
    }

    /// Number of cells in the padded buffer.
    #[inline]
    pub fn padded_len(&self) -> usize {
        self.cells.len()
    }

    /// Whether `p` is inside the logical bounds.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }

    /// Padded index of an in-bounds point.
    #[inline]
    pub fn loc(&self, p: Point) -> Option<MapLoc> {
        if !self.contains(p) {
            return None;
        }
        Some((p.y as usize + 1) * self.stride() + p.x as usize + 1)
    }

    /// Logical coordinates of a padded index. Border cells map to `-1` or
    /// `width` / `height`.
    #[inline]
    pub fn point(&self, loc: MapLoc) -> Point {
        let stride = self.stride();
        Point::new((loc % stride) as i32 - 1, (loc / stride) as i32 - 1)
    }

    /// Signed offset of one step in `dir` within the padded buffer.
    #[inline]
    pub fn offset(&self, dir: Direction) -> isize {
        let d = dir.delta();
        d.x as isize + d.y as isize * self.stride() as isize
    }

    /// The neighbour of `loc` in `dir`. `loc` must not be a border cell.
    #[inline]
    pub fn step(&self, loc: MapLoc, dir: Direction) -> MapLoc {
        loc.wrapping_add_signed(self.offset(dir))
    }

    /// The cell `n` steps from `loc` in `dir`.
    #[inline]
    pub fn step_n(&self, loc: MapLoc, dir: Direction, n: usize) -> MapLoc {
        loc.wrapping_add_signed(self.offset(dir) * n as isize)
    }

    /// Whether `p` is in bounds and traversable.
    #[inline]
    pub fn is_traversable(&self, p: Point) -> bool {
        self.loc(p).is_some_and(|loc| self.cells[loc])
    }

    /// Traversability by padded index. Border cells are always blocked.
    #[inline]
    pub fn is_free(&self, loc: MapLoc) -> bool {
        self.cells.get(loc).copied().unwrap_or(false)
    }

    /// Set the traversability of `p`. No-op if `p` is outside bounds.
    pub fn set(&mut self, p: Point, traversable: bool) {
        if let Some(loc) = self.loc(p) {
            self.cells[loc] = traversable;
        }
    }

    /// Whether a single step from the traversable cell `loc` in `dir` is
    /// legal: the target is free and, for diagonals, both cardinal cells
    /// passed between are free (no corner cutting).
    #[inline]
    pub fn can_step(&self, loc: MapLoc, dir: Direction) -> bool {
        if !self.is_free(self.step(loc, dir)) {
            return false;
        }
        if dir.is_diagonal() {
            let (h, v) = dir.components();
            return self.is_free(self.step(loc, h)) && self.is_free(self.step(loc, v));
        }
        true
    }

    /// Number of traversable cells.
    pub fn count_traversable(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Row-major iterator over the traversable points.
    pub fn traversable_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.bounds().into_iter().filter(|&p| self.is_traversable(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_blocked() {
        let g = Grid::new(4, 3).unwrap();
        assert_eq!(g.bounds(), Range::new(0, 0, 4, 3));
        assert_eq!(g.count_traversable(), 0);
        assert_eq!(g.padded_len(), 6 * 5);
    }

    #[test]
    fn invalid_dimensions_rejected() {
        assert!(matches!(
            Grid::new(0, 3),
            Err(GridError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Grid::new(3, -1),
            Err(GridError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn from_bits_round_trip() {
        let bits = vec![true, false, true, true, true, false];
        let g = Grid::from_bits(&bits, 3, 2).unwrap();
        assert!(g.is_traversable(Point::new(0, 0)));
        assert!(!g.is_traversable(Point::new(1, 0)));
        assert!(!g.is_traversable(Point::new(2, 1)));
        assert_eq!(g.to_bits(), bits);
    }

    #[test]
    fn from_bits_length_mismatch() {
        let err = Grid::from_bits(&[true; 5], 3, 2).unwrap_err();
        assert_eq!(
            err,
            GridError::BitLengthMismatch {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn loc_point_round_trip() {
        let g = Grid::open(5, 4).unwrap();
        for p in g.bounds() {
            let loc = g.loc(p).unwrap();
            assert_eq!(g.point(loc), p);
            assert!(g.is_free(loc));
        }
        assert_eq!(g.loc(Point::new(-1, 0)), None);
        assert!(!g.is_traversable(Point::new(5, 0)));
    }

    #[test]
    fn steps_reach_the_blocked_border() {
        let g = Grid::open(3, 3).unwrap();
        let loc = g.loc(Point::new(0, 0)).unwrap();
        let west = g.step(loc, Direction::West);
        assert_eq!(g.point(west), Point::new(-1, 0));
        assert!(!g.is_free(west));
        let far = g.step_n(loc, Direction::SouthEast, 2);
        assert_eq!(g.point(far), Point::new(2, 2));
    }

    #[test]
    fn diagonal_steps_do_not_cut_corners() {
        let mut g = Grid::open(3, 3).unwrap();
        g.set(Point::new(1, 0), false);
        let loc = g.loc(Point::new(0, 1)).unwrap();
        // (0,1) -> (1,0) is blocked outright.
        assert!(!g.can_step(loc, Direction::NorthEast));
        let origin = g.loc(Point::new(0, 0)).unwrap();
        // (0,0) -> (1,1) would squeeze past the blocked (1,0).
        assert!(!g.can_step(origin, Direction::SouthEast));
        assert!(g.can_step(origin, Direction::South));
        assert!(g.can_step(loc, Direction::SouthEast));
    }
}
