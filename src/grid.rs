//! Grid geometry shared by the classifier and the interaction controller.
//!
//! All cell boundary math lives here so that pixel-space bounds used during
//! detection and on-screen rectangles used while dragging are derived the same
//! way. Pixel bounds are floored independently at the start and end of each
//! cell, so adjacent cells may overlap or leave a one pixel seam.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of grid columns.
pub const DEFAULT_COLUMNS: usize = 1;
/// Default number of grid rows.
pub const DEFAULT_ROWS: usize = 30;

/// Dimensions of the cell grid laid over every sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSize {
    /// Number of cells across.
    pub columns: usize,
    /// Number of cells down.
    pub rows: usize,
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
        }
    }
}

/// Half-open pixel ranges `[start, end)` covered by one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    /// First pixel column.
    pub x_start: u32,
    /// One past the last pixel column.
    pub x_end: u32,
    /// First pixel row.
    pub y_start: u32,
    /// One past the last pixel row.
    pub y_end: u32,
}

/// An on-screen rectangle, relative to the displayed image's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellRect {
    /// Distance from the image's left edge.
    pub left: f64,
    /// Distance from the image's top edge.
    pub top: f64,
    /// Rectangle width.
    pub width: f64,
    /// Rectangle height.
    pub height: f64,
}

/// Where the image currently sits on screen.
///
/// The displayed size may differ from the natural pixel size under responsive
/// scaling; pointer coordinates are mapped through this, never through the
/// natural dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportGeometry {
    /// Left edge of the displayed image in viewport coordinates.
    pub left: f64,
    /// Top edge of the displayed image in viewport coordinates.
    pub top: f64,
    /// Displayed width.
    pub width: f64,
    /// Displayed height.
    pub height: f64,
}

impl ViewportGeometry {
    /// Geometry of an image displayed at `width` x `height` with its corner at the origin.
    #[must_use]
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Translate viewport coordinates into image-local coordinates.
    #[must_use]
    pub fn to_local(&self, client_x: f64, client_y: f64) -> (f64, f64) {
        (client_x - self.left, client_y - self.top)
    }
}

impl GridSize {
    /// Create a grid, rejecting zero-sized dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGrid`] if `columns` or `rows` is zero.
    pub fn new(columns: usize, rows: usize) -> Result<Self> {
        let grid = Self { columns, rows };
        grid.validate()?;
        Ok(grid)
    }

    /// Check that both dimensions are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGrid`] if `columns` or `rows` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(Error::InvalidGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        Ok(())
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Pixel-space bounds of cell `(row, col)` on an image of `width` x `height`.
    #[must_use]
    pub fn pixel_bounds(&self, width: u32, height: u32, row: usize, col: usize) -> CellBounds {
        let (x_start, x_end) = pixel_span(width, self.columns, col);
        let (y_start, y_end) = pixel_span(height, self.rows, row);
        CellBounds {
            x_start,
            x_end,
            y_start,
            y_end,
        }
    }

    /// On-screen rectangle of cell `(row, col)` for the given display geometry.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_rect(&self, geometry: &ViewportGeometry, row: usize, col: usize) -> CellRect {
        let width = geometry.width / self.columns as f64;
        let height = geometry.height / self.rows as f64;
        CellRect {
            left: col as f64 * width,
            top: row as f64 * height,
            width,
            height,
        }
    }

    /// Map an image-local point to `(row, col)`.
    ///
    /// Returns `None` for anything outside the grid, including non-finite input
    /// from a zero-sized display.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn cell_at(&self, x: f64, y: f64, width: f64, height: f64) -> Option<(usize, usize)> {
        let col = (x / width * self.columns as f64).floor();
        let row = (y / height * self.rows as f64).floor();
        if !(0.0..self.columns as f64).contains(&col) || !(0.0..self.rows as f64).contains(&row) {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// Horizontal position of `x` within column `col`, as a percentage in `[0, 100]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage_in_cell(&self, x: f64, width: f64, col: usize) -> f64 {
        let cell_width = width / self.columns as f64;
        let cell_left = col as f64 * cell_width;
        ((x - cell_left) / cell_width * 100.0).clamp(0.0, 100.0)
    }
}

/// `[floor(i * cell), floor((i + 1) * cell))` with `cell = extent / count`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn pixel_span(extent: u32, count: usize, index: usize) -> (u32, u32) {
    let cell = f64::from(extent) / count as f64;
    let start = (index as f64 * cell).floor() as u32;
    let end = ((index + 1) as f64 * cell).floor() as u32;
    (start, end)
}
