//! Uniform bucket grids over a domain's axis ranges.

mod shell;

pub use shell::{shell_cells, shell_size};

use tessera_core::config::{AxisRange, DomainSchema};
use tessera_core::tile::{Axis, Coordinates};

/// Integer cell coordinates, one per axis.
pub type CellKey = [u32; 3];

/// Maps points in a domain's ranges to cells of a `cells × cells × cells` grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    cells: u32,
    ranges: [AxisRange; 3],
}

impl GridSpec {
    pub fn new(schema: &DomainSchema, cells: u32) -> Self {
        Self {
            cells: cells.max(1),
            ranges: Axis::ALL.map(|axis| schema.range(axis)),
        }
    }

    pub fn cells(&self) -> u32 {
        self.cells
    }

    pub fn cell_of(&self, point: &Coordinates) -> CellKey {
        let values = point.as_array();
        let mut key = [0u32; 3];
        for (i, range) in self.ranges.iter().enumerate() {
            key[i] = self.axis_cell(values[i], *range);
        }
        key
    }

    fn axis_cell(&self, value: f64, range: AxisRange) -> u32 {
        let span = range.span();
        if span <= 0.0 || !value.is_finite() {
            return 0;
        }
        let fraction = (range.clamp(value) - range.min) / span;
        let cell = (fraction * self.cells as f64).floor() as u32;
        cell.min(self.cells - 1)
    }

    /// Width of one cell along each axis.
    pub fn cell_widths(&self) -> [f64; 3] {
        self.ranges.map(|r| r.span().max(0.0) / self.cells as f64)
    }

    /// Smallest positive cell width; zero when every axis is degenerate.
    pub fn min_cell_width(&self) -> f64 {
        let min = self
            .cell_widths()
            .into_iter()
            .filter(|w| *w > 0.0)
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            min
        } else {
            0.0
        }
    }

    /// Center point of a cell.
    pub fn center(&self, key: CellKey) -> Coordinates {
        let widths = self.cell_widths();
        let mut values = [0.0; 3];
        for i in 0..3 {
            values[i] = self.ranges[i].min + (key[i] as f64 + 0.5) * widths[i];
        }
        Coordinates::new(values[0], values[1], values[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(cells: u32) -> GridSpec {
        GridSpec::new(&DomainSchema::default(), cells)
    }

    #[test]
    fn cells_cover_the_whole_range() {
        let grid = spec(4);
        assert_eq!(grid.cell_of(&Coordinates::new(0.0, 1.0, 0.0)), [0, 0, 0]);
        assert_eq!(grid.cell_of(&Coordinates::new(100.0, 1000.0, 100.0)), [3, 3, 3]);
        assert_eq!(grid.cell_of(&Coordinates::new(49.9, 500.0, 75.0)), [1, 1, 3]);
    }

    #[test]
    fn out_of_range_points_land_in_edge_cells() {
        let grid = spec(4);
        assert_eq!(grid.cell_of(&Coordinates::new(-5.0, 5000.0, 50.0)), [0, 3, 2]);
    }

    #[test]
    fn centers_sit_inside_their_cells() {
        let grid = spec(8);
        for key in [[0, 0, 0], [3, 5, 7], [7, 7, 7]] {
            assert_eq!(grid.cell_of(&grid.center(key)), key);
        }
    }

    #[test]
    fn degenerate_axis_maps_to_cell_zero() {
        let mut schema = DomainSchema::default();
        schema.verification_range = AxisRange::new(5.0, 5.0);
        let grid = GridSpec::new(&schema, 4);
        assert_eq!(grid.cell_of(&Coordinates::new(50.0, 500.0, 5.0))[2], 0);
        assert_eq!(grid.min_cell_width(), 25.0);
    }
}
