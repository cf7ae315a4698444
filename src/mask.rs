//! Boolean occupancy grid produced by detection and edited by the cover gesture.

use std::fmt;

use crate::grid::GridSize;

/// Which cells of a sheet are covered (`true`) or visible (`false`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskState {
    grid: GridSize,
    cells: Vec<bool>,
}

impl MaskState {
    /// An all-visible mask for the given grid.
    #[must_use]
    pub fn new(grid: GridSize) -> Self {
        Self {
            grid,
            cells: vec![false; grid.cell_count()],
        }
    }

    /// The grid this mask was built for.
    #[must_use]
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.grid.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.grid.columns
    }

    /// Whether `(row, col)` is covered. Out-of-range cells read as visible.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.index(row, col).is_some_and(|i| self.cells[i])
    }

    /// Set `(row, col)`; out-of-range cells are ignored.
    pub fn set(&mut self, row: usize, col: usize, covered: bool) {
        if let Some(i) = self.index(row, col) {
            self.cells[i] = covered;
        }
    }

    /// Number of covered cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Covered cells as `(row, col)` in row-major order.
    pub fn covered(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let columns = self.grid.columns;
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c)
            .map(move |(i, _)| (i / columns, i % columns))
    }

    /// One row of the mask.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    #[must_use]
    pub fn row(&self, row: usize) -> &[bool] {
        let start = row * self.grid.columns;
        &self.cells[start..start + self.grid.columns]
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.grid.rows && col < self.grid.columns).then(|| row * self.grid.columns + col)
    }
}

/// Renders one line per row, `#` for covered and `.` for visible.
impl fmt::Display for MaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.grid.rows {
            let line: String = self
                .row(row)
                .iter()
                .map(|&c| if c { '#' } else { '.' })
                .collect();
            writeln!(f, "{row:>3} {line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mask_is_all_visible() {
        let mask = MaskState::new(GridSize::default());
        assert_eq!(mask.rows(), 30);
        assert_eq!(mask.columns(), 1);
        assert_eq!(mask.count(), 0);
        assert_eq!(mask.covered().count(), 0);
    }

    #[test]
    fn set_and_get_round_trip_in_range_only() {
        let mut mask = MaskState::new(GridSize::new(3, 4).unwrap());
        mask.set(2, 1, true);
        mask.set(9, 0, true);
        assert!(mask.get(2, 1));
        assert!(!mask.get(9, 0));
        assert!(!mask.get(0, 3));
        assert_eq!(mask.covered().collect::<Vec<_>>(), vec![(2, 1)]);
    }

    #[test]
    fn display_marks_covered_cells() {
        let mut mask = MaskState::new(GridSize::new(2, 2).unwrap());
        mask.set(1, 0, true);
        let text = mask.to_string();
        assert_eq!(text, "  0 ..\n  1 #.\n");
    }
}
