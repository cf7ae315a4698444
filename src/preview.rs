//! Paint a mask onto the sheet itself, for offline previews.
//!
//! Covered cells are filled with the same opaque, slightly rounded overlay the
//! interactive renderer draws, shifted down by the sheet's row offset.

use image::{Rgba, RgbaImage};

use crate::grid::CellBounds;
use crate::mask::MaskState;

/// Overlay fill color.
const OVERLAY: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Corner radius of an overlay, in natural pixels.
const CORNER_RADIUS: u32 = 4;

/// Whether `(x, y)` lies inside `bounds` once its corners are rounded off.
fn inside_rounded(x: u32, y: u32, bounds: &CellBounds, radius: u32) -> bool {
    let width = bounds.x_end - bounds.x_start;
    let height = bounds.y_end - bounds.y_start;
    let r = radius.min(width / 2).min(height / 2);
    if r == 0 {
        return true;
    }

    let (lx, ly) = (x - bounds.x_start, y - bounds.y_start);
    let dx = if lx < r {
        r - lx
    } else if lx >= width - r {
        lx + r + 1 - width
    } else {
        return true;
    };
    let dy = if ly < r {
        r - ly
    } else if ly >= height - r {
        ly + r + 1 - height
    } else {
        return true;
    };
    dx * dx + dy * dy <= r * r
}

/// Fill every covered cell of `mask` on `image`.
///
/// Cells whose shifted row falls past the last grid row are skipped. Returns
/// the number of cells painted.
pub fn paint_mask(image: &mut RgbaImage, mask: &MaskState, row_offset: usize) -> usize {
    let grid = mask.grid();
    let (width, height) = image.dimensions();
    let mut painted = 0;

    for (row, col) in mask.covered() {
        let render_row = row + row_offset;
        if render_row >= grid.rows {
            continue;
        }
        let bounds = grid.pixel_bounds(width, height, render_row, col);
        for y in bounds.y_start..bounds.y_end {
            for x in bounds.x_start..bounds.x_end {
                if inside_rounded(x, y, &bounds, CORNER_RADIUS) {
                    image.put_pixel(x, y, OVERLAY);
                }
            }
        }
        painted += 1;
    }

    painted
}
