use sgraph_core::{Direction, Grid, MapLoc};

use crate::distance::{Cost, octile, step_cost};
use crate::traits::{AstarPather, Pather};

/// Legal single-step moves out of the traversable cell `loc`, in
/// [`Direction::ALL`] order.
pub fn moves(grid: &Grid, loc: MapLoc) -> impl Iterator<Item = (Direction, MapLoc)> + '_ {
    Direction::ALL
        .into_iter()
        .filter(move |&d| grid.can_step(loc, d))
        .map(move |d| (d, grid.step(loc, d)))
}

/// The raw grid as a search graph over padded locations, with the octile
/// heuristic.
#[derive(Clone, Copy)]
pub struct GridPather<'a> {
    grid: &'a Grid,
}

impl<'a> GridPather<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid }
    }
}

impl Pather for GridPather<'_> {
    fn len(&self) -> usize {
        self.grid.padded_len()
    }

    fn neighbors(&self, node: usize, buf: &mut Vec<(usize, Cost)>) {
        buf.extend(moves(self.grid, node).map(|(d, n)| (n, step_cost(d))));
    }
}

impl AstarPather for GridPather<'_> {
    fn estimate(&self, from: usize, to: usize) -> Cost {
        octile(self.grid.point(from), self.grid.point(to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgraph_core::Point;

    #[test]
    fn corner_cutting_moves_are_filtered() {
        let mut g = Grid::open(3, 3).unwrap();
        g.set(Point::new(2, 1), false);
        let centre = g.loc(Point::new(1, 1)).unwrap();
        let dirs: Vec<Direction> = moves(&g, centre).map(|(d, _)| d).collect();
        assert_eq!(
            dirs,
            vec![
                Direction::North,
                Direction::South,
                Direction::SouthWest,
                Direction::West,
                Direction::NorthWest
            ]
        );
    }

    #[test]
    fn pather_reports_step_costs() {
        let g = Grid::open(2, 2).unwrap();
        let p = GridPather::new(&g);
        let origin = g.loc(Point::ZERO).unwrap();
        let mut buf = Vec::new();
        p.neighbors(origin, &mut buf);
        buf.sort();
        let mut expected = vec![
            (g.loc(Point::new(1, 0)).unwrap(), 1000),
            (g.loc(Point::new(0, 1)).unwrap(), 1000),
            (g.loc(Point::new(1, 1)).unwrap(), 1414),
        ];
        expected.sort();
        assert_eq!(buf, expected);
        assert_eq!(p.estimate(origin, g.loc(Point::new(1, 1)).unwrap()), 1414);
    }
}
