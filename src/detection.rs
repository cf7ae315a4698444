//! Per-cell mark detection.
//!
//! Every grid cell is scanned on a stride-2 lattice (every second pixel in both
//! axes, starting from the cell's floored top-left corner) and classified by one
//! of three rules:
//!
//! - **Red / Blue**: a sample is on-target when the dominant channel is above 150,
//!   the other two are below 100, and the dominant channel leads each of them by
//!   more than 50. The cell is covered when more than 0.5% of samples are on-target.
//! - **Black**: samples with all channels below 80 are ink. The cell is covered
//!   only when ink exceeds 1% of samples *and* a clustering score over the first
//!   ink samples exceeds 100, which rejects both scattered noise and isolated dots.

use std::fmt;

use image::RgbaImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::{CellBounds, GridSize};
use crate::mask::MaskState;

/// Sampling stride in both axes.
const SAMPLE_STRIDE: usize = 2;
/// Minimum value of the dominant channel for a colored sample.
const DOMINANT_MIN: i32 = 150;
/// Maximum value of the two other channels for a colored sample.
const OTHER_MAX: i32 = 100;
/// Required lead of the dominant channel over each other channel.
const DOMINANCE_MARGIN: i32 = 50;
/// Colored fraction of samples above which a cell is covered.
const COLOR_RATIO_THRESHOLD: f64 = 0.005;
/// All channels must be below this for a sample to count as ink.
const INK_MAX: u8 = 80;
/// Ink fraction of samples above which a cell may be covered.
const INK_RATIO_THRESHOLD: f64 = 0.01;
/// Clustering score above which a cell may be covered.
const DENSITY_THRESHOLD: usize = 100;
/// Manhattan radius, in pixels, within which ink samples count as neighbors.
const NEIGHBOR_RADIUS: u32 = 4;
/// Only the first this-many ink samples are considered as anchors.
const MAX_ANCHORS: usize = 50;
/// Step through the anchor candidates.
const ANCHOR_STEP: usize = 2;

/// Which kind of marking to look for on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Red pen or highlighter.
    #[default]
    Red,
    /// Blue pen or highlighter.
    Blue,
    /// Dense black ink (handwritten or printed text).
    Black,
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Black => "black",
        })
    }
}

/// Row-major pixel buffer, RGBA unless it is exactly RGB-sized.
struct PixelView<'a> {
    data: &'a [u8],
    width: usize,
    channels: usize,
}

impl<'a> PixelView<'a> {
    fn new(data: &'a [u8], width: u32, height: u32) -> Self {
        let width = width as usize;
        let rgb_len = width * height as usize * 3;
        let channels = if data.len() == rgb_len { 3 } else { 4 };
        Self {
            data,
            width,
            channels,
        }
    }

    /// RGB at `(x, y)`, or `None` when the buffer is too short.
    fn rgb(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let idx = (y as usize * self.width + x as usize) * self.channels;
        self.data.get(idx..idx + 3).map(|p| [p[0], p[1], p[2]])
    }
}

/// Stride-2 sample coordinates inside a cell.
fn samples(bounds: CellBounds) -> impl Iterator<Item = (u32, u32)> {
    (bounds.y_start..bounds.y_end)
        .step_by(SAMPLE_STRIDE)
        .flat_map(move |y| {
            (bounds.x_start..bounds.x_end)
                .step_by(SAMPLE_STRIDE)
                .map(move |x| (x, y))
        })
}

fn dominates(dominant: u8, a: u8, b: u8) -> bool {
    let (d, a, b) = (i32::from(dominant), i32::from(a), i32::from(b));
    d > DOMINANT_MIN
        && a < OTHER_MAX
        && b < OTHER_MAX
        && d > a + DOMINANCE_MARGIN
        && d > b + DOMINANCE_MARGIN
}

fn is_target_color(mode: DetectionMode, [r, g, b]: [u8; 3]) -> bool {
    match mode {
        DetectionMode::Red => dominates(r, g, b),
        DetectionMode::Blue => dominates(b, r, g),
        DetectionMode::Black => false,
    }
}

fn is_ink([r, g, b]: [u8; 3]) -> bool {
    r < INK_MAX && g < INK_MAX && b < INK_MAX
}

#[allow(clippy::cast_precision_loss)]
fn ratio(count: usize, sampled: usize) -> f64 {
    if sampled == 0 {
        return 0.0;
    }
    count as f64 / sampled as f64
}

fn color_cell(view: &PixelView<'_>, bounds: CellBounds, mode: DetectionMode) -> bool {
    let mut sampled = 0usize;
    let mut target = 0usize;
    for (x, y) in samples(bounds) {
        sampled += 1;
        if view.rgb(x, y).is_some_and(|px| is_target_color(mode, px)) {
            target += 1;
        }
    }
    ratio(target, sampled) > COLOR_RATIO_THRESHOLD
}

fn ink_cell(view: &PixelView<'_>, bounds: CellBounds) -> bool {
    let mut sampled = 0usize;
    let mut ink = Vec::new();
    for (x, y) in samples(bounds) {
        sampled += 1;
        if view.rgb(x, y).is_some_and(is_ink) {
            ink.push((x, y));
        }
    }
    if ink.is_empty() {
        return false;
    }
    ratio(ink.len(), sampled) > INK_RATIO_THRESHOLD && density_score(&ink) > DENSITY_THRESHOLD
}

/// Sum, over every second one of the first 50 ink samples, of how many other
/// ink samples lie within Manhattan distance 4.
pub(crate) fn density_score(ink: &[(u32, u32)]) -> usize {
    ink.iter()
        .take(MAX_ANCHORS)
        .step_by(ANCHOR_STEP)
        .map(|&(ax, ay)| {
            ink.iter()
                .filter(|&&(x, y)| {
                    let dist = ax.abs_diff(x) + ay.abs_diff(y);
                    dist > 0 && dist <= NEIGHBOR_RADIUS
                })
                .count()
        })
        .sum()
}

/// Classify every cell of a `width` x `height` pixel buffer.
///
/// `pixels` is row-major RGBA; a buffer of exactly `width * height * 3` bytes is
/// read as RGB. Samples past the end of a short buffer never count as marked.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if `width` or `height` is zero, and
/// [`Error::InvalidGrid`] if the grid has a zero dimension.
pub fn classify(
    pixels: &[u8],
    width: u32,
    height: u32,
    mode: DetectionMode,
    grid: GridSize,
) -> Result<MaskState> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    grid.validate()?;

    debug!(
        "{mode} detection on {width}x{height} image, {}x{} grid",
        grid.columns, grid.rows
    );

    let view = PixelView::new(pixels, width, height);
    let mut mask = MaskState::new(grid);
    for row in 0..grid.rows {
        for col in 0..grid.columns {
            let bounds = grid.pixel_bounds(width, height, row, col);
            let covered = match mode {
                DetectionMode::Red | DetectionMode::Blue => color_cell(&view, bounds, mode),
                DetectionMode::Black => ink_cell(&view, bounds),
            };
            mask.set(row, col, covered);
        }
    }

    info!("{mode} detection complete: {} cells covered", mask.count());
    Ok(mask)
}

/// Classify a decoded RGBA image.
///
/// # Errors
///
/// See [`classify`].
pub fn classify_image(image: &RgbaImage, mode: DetectionMode, grid: GridSize) -> Result<MaskState> {
    classify(image.as_raw(), image.width(), image.height(), mode, grid)
}
