//! Instructions sent to the mask overlay renderer.
//!
//! The crate never draws anything on screen itself. It tells a [`MaskRenderer`]
//! which rectangular overlays to create, clip and remove, and keeps an
//! [`OverlayLayer`] mirror of what it has told the renderer so the drag gesture
//! can ask whether an overlay already exists at a cell.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::grid::{CellRect, GridSize, ViewportGeometry};
use crate::mask::MaskState;

/// Fractions of an overlay's width that are currently hidden, from each side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevealClip {
    /// Hidden fraction measured from the left edge, in `[0, 1]`.
    pub inset_left: f64,
    /// Hidden fraction measured from the right edge, in `[0, 1]`.
    pub inset_right: f64,
}

impl RevealClip {
    /// Hide the leftmost `fraction` of the overlay.
    #[must_use]
    pub fn from_left(fraction: f64) -> Self {
        Self {
            inset_left: fraction,
            inset_right: 0.0,
        }
    }

    /// Hide the rightmost `fraction` of the overlay.
    #[must_use]
    pub fn from_right(fraction: f64) -> Self {
        Self {
            inset_left: 0.0,
            inset_right: fraction,
        }
    }
}

/// Receiver of overlay instructions, addressed by displayed grid cell.
pub trait MaskRenderer {
    /// Show an opaque overlay over `rect` at `(row, col)`.
    fn create(&mut self, row: usize, col: usize, rect: CellRect);
    /// Partially hide the overlay at `(row, col)`.
    fn set_clip(&mut self, row: usize, col: usize, clip: RevealClip);
    /// Show the overlay at `(row, col)` in full again.
    fn clear_clip(&mut self, row: usize, col: usize);
    /// Drop every overlay.
    fn remove_all(&mut self);
}

/// A single renderer instruction, as recorded by `Vec<RenderCommand>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum RenderCommand {
    Create { row: usize, col: usize, rect: CellRect },
    SetClip { row: usize, col: usize, clip: RevealClip },
    ClearClip { row: usize, col: usize },
    RemoveAll,
}

impl RenderCommand {
    /// The cell this instruction addresses, if any.
    #[must_use]
    pub fn cell(&self) -> Option<(usize, usize)> {
        match *self {
            Self::Create { row, col, .. }
            | Self::SetClip { row, col, .. }
            | Self::ClearClip { row, col } => Some((row, col)),
            Self::RemoveAll => None,
        }
    }
}

/// Records instructions instead of drawing them.
impl MaskRenderer for Vec<RenderCommand> {
    fn create(&mut self, row: usize, col: usize, rect: CellRect) {
        self.push(RenderCommand::Create { row, col, rect });
    }

    fn set_clip(&mut self, row: usize, col: usize, clip: RevealClip) {
        self.push(RenderCommand::SetClip { row, col, clip });
    }

    fn clear_clip(&mut self, row: usize, col: usize) {
        self.push(RenderCommand::ClearClip { row, col });
    }

    fn remove_all(&mut self) {
        self.push(RenderCommand::RemoveAll);
    }
}

/// Mirror of the overlays the renderer currently shows, with their clips.
#[derive(Debug, Clone, Default)]
pub struct OverlayLayer {
    overlays: BTreeMap<(usize, usize), Option<RevealClip>>,
}

impl OverlayLayer {
    /// Whether an overlay exists at `(row, col)`.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.overlays.contains_key(&(row, col))
    }

    /// Current clip of the overlay at `(row, col)`, if it has one.
    #[must_use]
    pub fn clip(&self, row: usize, col: usize) -> Option<RevealClip> {
        self.overlays.get(&(row, col)).copied().flatten()
    }

    /// Number of overlays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Whether there are no overlays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Create an overlay.
    pub fn create<R: MaskRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        row: usize,
        col: usize,
        rect: CellRect,
    ) {
        self.overlays.insert((row, col), None);
        renderer.create(row, col, rect);
    }

    /// Clip an existing overlay. Does nothing if there is no overlay at `(row, col)`.
    pub fn set_clip<R: MaskRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        row: usize,
        col: usize,
        clip: RevealClip,
    ) {
        if let Some(slot) = self.overlays.get_mut(&(row, col)) {
            *slot = Some(clip);
            renderer.set_clip(row, col, clip);
        }
    }

    /// Show an existing overlay in full. Does nothing if there is no overlay at `(row, col)`.
    pub fn clear_clip<R: MaskRenderer + ?Sized>(&mut self, renderer: &mut R, row: usize, col: usize) {
        if let Some(slot) = self.overlays.get_mut(&(row, col)) {
            *slot = None;
            renderer.clear_clip(row, col);
        }
    }

    /// Clear the clip of every clipped overlay, leaving unclipped ones alone.
    pub fn clear_all_clips<R: MaskRenderer + ?Sized>(&mut self, renderer: &mut R) {
        for (&(row, col), slot) in &mut self.overlays {
            if slot.take().is_some() {
                renderer.clear_clip(row, col);
            }
        }
    }

    /// Drop every overlay.
    pub fn remove_all<R: MaskRenderer + ?Sized>(&mut self, renderer: &mut R) {
        self.overlays.clear();
        renderer.remove_all();
    }
}

/// Redraw `mask` from scratch, shifting every covered cell down by `row_offset`.
///
/// Cells pushed past the last row are skipped. Returns the number of overlays
/// created.
pub fn render_mask<R: MaskRenderer + ?Sized>(
    mask: &MaskState,
    row_offset: usize,
    geometry: &ViewportGeometry,
    overlays: &mut OverlayLayer,
    renderer: &mut R,
) -> usize {
    let grid: GridSize = mask.grid();
    overlays.remove_all(renderer);

    let mut rendered = 0;
    for (row, col) in mask.covered() {
        let render_row = row + row_offset;
        if render_row >= grid.rows {
            continue;
        }
        overlays.create(
            renderer,
            render_row,
            col,
            grid.cell_rect(geometry, render_row, col),
        );
        rendered += 1;
    }

    debug!("rendered {rendered} of {} covered cells", mask.count());
    rendered
}
