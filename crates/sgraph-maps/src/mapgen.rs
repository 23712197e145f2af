//! Random map generation for tests and benchmarks.
//!
//! Provides three generators over a traversability [`Grid`]:
//! - **Random Walk Cave**: drunk walks carve open space out of rock.
//! - **Cellular Automata Cave**: random walls smoothed with automata rules.
//! - **Scattered obstacles**: independent blocked cells at a given density.

use rand::{Rng, RngExt};
use sgraph_core::{Direction, Grid, Point};

/// Picks the next cell of a random walk.
pub trait RandomWalker {
    fn neighbor(&self, p: Point, rng: &mut impl Rng) -> Point;
}

/// Steps to one of the four cardinal neighbours.
pub struct FourDirectionWalker;

impl RandomWalker for FourDirectionWalker {
    fn neighbor(&self, p: Point, rng: &mut impl Rng) -> Point {
        p + Direction::CARDINALS[rng.random_range(0..4usize)].delta()
    }
}

/// Steps to any of the eight neighbours. Carves rougher walls with more
/// corners, and so more subgoals.
pub struct EightDirectionWalker;

impl RandomWalker for EightDirectionWalker {
    fn neighbor(&self, p: Point, rng: &mut impl Rng) -> Point {
        p.neighbors_8()[rng.random_range(0..8usize)]
    }
}

/// A rule for one iteration of cellular automata smoothing.
#[derive(Debug, Clone)]
pub struct CellularAutomataRule {
    /// A cell with at least this many walls among its 8 neighbours becomes
    /// a wall.
    pub w_cutoff1: i32,
    /// A cell with at most this many walls within Chebyshev distance 2
    /// becomes a wall.
    pub w_cutoff2: i32,
    /// Whether cells outside the grid count as walls.
    pub walls_out_of_range: bool,
    /// How many times to apply this rule.
    pub reps: usize,
}

impl Default for CellularAutomataRule {
    fn default() -> Self {
        Self {
            w_cutoff1: 5,
            w_cutoff2: 2,
            walls_out_of_range: true,
            reps: 4,
        }
    }
}

/// Map generator drawing into a [`Grid`].
pub struct MapGen<R: Rng> {
    pub rng: R,
    pub grid: Grid,
}

impl<R: Rng> MapGen<R> {
    pub fn with_grid(grid: Grid, rng: R) -> Self {
        Self { rng, grid }
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Carve a cave with random walks from the centre.
    ///
    /// Performs up to `walks` walks, each marking visited cells
    /// traversable, until `fill_pct` (0.0 to 1.0) of the area is open.
    /// Cells opened by earlier calls count towards the target.
    ///
    /// Returns the number of cells carved by this call.
    pub fn random_walk_cave(&mut self, walker: &impl RandomWalker, fill_pct: f64, walks: usize) -> usize {
        let bounds = self.grid.bounds();
        let total = bounds.len();
        let target = (total as f64 * fill_pct) as usize;
        let mut open = self.grid.count_traversable();
        let mut carved = 0usize;

        let start = Point::new(bounds.min.x + bounds.width() / 2, bounds.min.y + bounds.height() / 2);

        for _ in 0..walks {
            let mut pos = start;
            let step_limit = total * 4;

            for _ in 0..step_limit {
                if open >= target {
                    return carved;
                }
                if !self.grid.is_traversable(pos) {
                    self.grid.set(pos, true);
                    carved += 1;
                    open += 1;
                }
                let next = walker.neighbor(pos, &mut self.rng);
                if bounds.contains(next) {
                    pos = next;
                }
            }
        }

        carved
    }

    /// Generate a cave with cellular automata.
    ///
    /// Each cell starts blocked with probability `wall_init_pct`, then each
    /// rule in `rules` is applied for its repetitions.
    ///
    /// Returns the number of traversable cells in the final grid.
    pub fn cellular_automata_cave(&mut self, wall_init_pct: f64, rules: &[CellularAutomataRule]) -> usize {
        let bounds = self.grid.bounds();
        let w = bounds.width();

        for p in bounds {
            let r: f64 = self.rng.random();
            self.grid.set(p, r >= wall_init_pct);
        }

        let mut scratch = vec![false; bounds.len()];
        for rule in rules {
            for _ in 0..rule.reps {
                for p in bounds {
                    let walls1 = self.count_walls_ring(p, 1, rule.walls_out_of_range);
                    let walls2 = self.count_walls_ring(p, 2, rule.walls_out_of_range);
                    let idx = ((p.y - bounds.min.y) * w + (p.x - bounds.min.x)) as usize;
                    scratch[idx] = !(walls1 >= rule.w_cutoff1 || walls2 <= rule.w_cutoff2);
                }
                for p in bounds {
                    let idx = ((p.y - bounds.min.y) * w + (p.x - bounds.min.x)) as usize;
                    self.grid.set(p, scratch[idx]);
                }
            }
        }

        self.grid.count_traversable()
    }

    /// Block each traversable cell independently with probability
    /// `density`. Returns the number of cells blocked.
    pub fn scatter_obstacles(&mut self, density: f64) -> usize {
        let mut blocked = 0;
        for p in self.grid.bounds() {
            if self.grid.is_traversable(p) && self.rng.random_bool(density) {
                self.grid.set(p, false);
                blocked += 1;
            }
        }
        blocked
    }

    /// Count blocked cells within Chebyshev distance `radius` of `center`.
    fn count_walls_ring(&self, center: Point, radius: i32, walls_out_of_range: bool) -> i32 {
        let bounds = self.grid.bounds();
        let mut count = 0;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let p = Point::new(center.x + dx, center.y + dy);
                if bounds.contains(p) {
                    if !self.grid.is_traversable(p) {
                        count += 1;
                    }
                } else if walls_out_of_range {
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_walk_carves_cells() {
        let grid = Grid::new(20, 20).unwrap();
        let mut mg = MapGen::with_grid(grid, StdRng::seed_from_u64(7));
        let carved = mg.random_walk_cave(&FourDirectionWalker, 0.4, 10);
        assert!(carved > 0);
        assert_eq!(mg.grid.count_traversable(), carved);
        assert!(mg.grid.is_traversable(Point::new(10, 10)));
    }

    #[test]
    fn eight_direction_walker_stays_adjacent() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = Point::new(5, 5);
        for _ in 0..32 {
            let q = EightDirectionWalker.neighbor(p, &mut rng);
            assert!((q.x - p.x).abs() <= 1 && (q.y - p.y).abs() <= 1 && q != p);
        }
    }

    #[test]
    fn cellular_automata_produces_mixed() {
        let grid = Grid::new(30, 30).unwrap();
        let mut mg = MapGen::with_grid(grid, StdRng::seed_from_u64(11));
        let open = mg.cellular_automata_cave(0.45, &[CellularAutomataRule::default()]);
        assert!(open > 0);
        assert!(open < 30 * 30);
    }

    #[test]
    fn same_seed_same_map() {
        let make = || {
            let mut mg = MapGen::with_grid(Grid::open(16, 16).unwrap(), StdRng::seed_from_u64(99));
            mg.scatter_obstacles(0.3);
            mg.into_grid()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn scatter_extremes() {
        let mut mg = MapGen::with_grid(Grid::open(8, 8).unwrap(), StdRng::seed_from_u64(1));
        assert_eq!(mg.scatter_obstacles(0.0), 0);
        assert_eq!(mg.scatter_obstacles(1.0), 64);
        assert_eq!(mg.grid.count_traversable(), 0);
    }
}
