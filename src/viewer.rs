//! Per-sheet viewer state tying detection, rendering and the drag gesture together.

use image::RgbaImage;
use log::warn;

use crate::detection::{classify_image, DetectionMode};
use crate::error::Result;
use crate::grid::{GridSize, ViewportGeometry};
use crate::interaction::{DragSession, InteractionController, PointerEvent};
use crate::mask::MaskState;
use crate::render::{render_mask, MaskRenderer, OverlayLayer};

/// A decoded sheet together with how it should be classified and displayed.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// Decoded pixels at natural size.
    pub image: RgbaImage,
    /// Marking to detect.
    pub mode: DetectionMode,
    /// Rows to shift overlays down by when drawing.
    pub row_offset: usize,
}

/// Everything the viewer knows about the sheet on screen.
///
/// The mask belongs to the current sheet only and is replaced whenever a sheet
/// is loaded or reset. Drag edits write straight into it.
#[derive(Debug, Clone)]
pub struct Viewer {
    grid: GridSize,
    sheet: Option<Sheet>,
    mask: MaskState,
    overlays: OverlayLayer,
    controller: InteractionController,
}

impl Viewer {
    /// An empty viewer for `grid`.
    #[must_use]
    pub fn new(grid: GridSize) -> Self {
        Self {
            grid,
            sheet: None,
            mask: MaskState::new(grid),
            overlays: OverlayLayer::default(),
            controller: InteractionController::default(),
        }
    }

    /// The current mask.
    #[must_use]
    pub fn mask(&self) -> &MaskState {
        &self.mask
    }

    /// The overlays currently on screen.
    #[must_use]
    pub fn overlays(&self) -> &OverlayLayer {
        &self.overlays
    }

    /// The current drag session.
    #[must_use]
    pub fn session(&self) -> DragSession {
        self.controller.session()
    }

    /// The loaded sheet, if any.
    #[must_use]
    pub fn sheet(&self) -> Option<&Sheet> {
        self.sheet.as_ref()
    }

    /// Replace the current sheet, classify it and draw its mask.
    ///
    /// Any drag in progress is abandoned. Returns the number of overlays drawn.
    ///
    /// # Errors
    ///
    /// Returns the classification error if the sheet has a zero dimension; the
    /// viewer is then left showing no mask at all.
    pub fn load<R: MaskRenderer + ?Sized>(
        &mut self,
        sheet: Sheet,
        geometry: &ViewportGeometry,
        renderer: &mut R,
    ) -> Result<usize> {
        self.sheet = Some(sheet);
        self.controller = InteractionController::default();
        self.reset(geometry, renderer)
    }

    /// Run detection on the current sheet again, discarding drag edits.
    ///
    /// # Errors
    ///
    /// See [`Viewer::load`].
    pub fn reset<R: MaskRenderer + ?Sized>(
        &mut self,
        geometry: &ViewportGeometry,
        renderer: &mut R,
    ) -> Result<usize> {
        let Some(sheet) = &self.sheet else {
            self.mask = MaskState::new(self.grid);
            return Ok(self.render(geometry, renderer));
        };

        match classify_image(&sheet.image, sheet.mode, self.grid) {
            Ok(mask) => {
                self.mask = mask;
                Ok(self.render(geometry, renderer))
            }
            Err(e) => {
                warn!("detection failed, showing sheet unmasked: {e}");
                self.mask = MaskState::new(self.grid);
                self.render(geometry, renderer);
                Err(e)
            }
        }
    }

    /// Redraw every overlay, e.g. after the display was resized.
    pub fn render<R: MaskRenderer + ?Sized>(
        &mut self,
        geometry: &ViewportGeometry,
        renderer: &mut R,
    ) -> usize {
        let row_offset = self.sheet.as_ref().map_or(0, |s| s.row_offset);
        render_mask(
            &self.mask,
            row_offset,
            geometry,
            &mut self.overlays,
            renderer,
        )
    }

    /// Feed one pointer event to the drag gesture.
    pub fn handle_pointer<R: MaskRenderer + ?Sized>(
        &mut self,
        event: &PointerEvent,
        geometry: &ViewportGeometry,
        renderer: &mut R,
    ) {
        self.controller.handle(
            event,
            &mut self.mask,
            &mut self.overlays,
            geometry,
            renderer,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::PointerEventKind;
    use crate::render::{RenderCommand, RevealClip};
    use image::Rgba;

    /// 20x300 sheet with red marks on rows 3 and 29 of a 1x30 grid.
    fn marked_sheet(row_offset: usize) -> Sheet {
        let mut image = RgbaImage::from_pixel(20, 300, Rgba([255, 255, 255, 255]));
        for row in [3u32, 29] {
            for y in row * 10..row * 10 + 10 {
                for x in 0..20 {
                    image.put_pixel(x, y, Rgba([230, 20, 20, 255]));
                }
            }
        }
        Sheet {
            image,
            mode: DetectionMode::Red,
            row_offset,
        }
    }

    fn geometry() -> ViewportGeometry {
        ViewportGeometry::sized(100.0, 300.0)
    }

    #[test]
    fn load_classifies_and_renders() {
        let mut viewer = Viewer::new(GridSize::default());
        let mut log: Vec<RenderCommand> = Vec::new();
        let drawn = viewer.load(marked_sheet(0), &geometry(), &mut log).unwrap();

        assert_eq!(drawn, 2);
        assert!(viewer.mask().get(3, 0));
        assert!(viewer.mask().get(29, 0));
        assert_eq!(viewer.overlays().len(), 2);
    }

    #[test]
    fn row_offset_drops_last_row_and_shifts_others() {
        let mut viewer = Viewer::new(GridSize::default());
        let mut log: Vec<RenderCommand> = Vec::new();
        let drawn = viewer.load(marked_sheet(2), &geometry(), &mut log).unwrap();

        assert_eq!(drawn, 1);
        assert!(viewer.overlays().contains(5, 0));
        assert!(!viewer.overlays().contains(3, 0));
        // the mask itself is not shifted
        assert!(viewer.mask().get(3, 0));
    }

    #[test]
    fn reset_discards_cover_edits() {
        let mut viewer = Viewer::new(GridSize::default());
        let mut log: Vec<RenderCommand> = Vec::new();
        viewer.load(marked_sheet(0), &geometry(), &mut log).unwrap();

        viewer.handle_pointer(&PointerEvent::down(90.0, 105.0), &geometry(), &mut log);
        viewer.handle_pointer(&PointerEvent::moved(50.0, 105.0, -40.0), &geometry(), &mut log);
        viewer.handle_pointer(
            &PointerEvent::ended(PointerEventKind::Up),
            &geometry(),
            &mut log,
        );
        assert!(viewer.mask().get(10, 0));

        viewer.reset(&geometry(), &mut log).unwrap();
        assert!(!viewer.mask().get(10, 0));
        assert_eq!(viewer.mask().count(), 2);
    }

    #[test]
    fn zero_sized_sheet_shows_no_mask() {
        let mut viewer = Viewer::new(GridSize::default());
        let mut log: Vec<RenderCommand> = Vec::new();
        let sheet = Sheet {
            image: RgbaImage::new(0, 0),
            mode: DetectionMode::Black,
            row_offset: 0,
        };

        assert!(viewer.load(sheet, &geometry(), &mut log).is_err());
        assert_eq!(viewer.mask().count(), 0);
        assert_eq!(log, vec![RenderCommand::RemoveAll]);
    }

    #[test]
    fn resize_replays_mask_at_new_geometry() {
        let mut viewer = Viewer::new(GridSize::default());
        let mut log: Vec<RenderCommand> = Vec::new();
        viewer.load(marked_sheet(0), &geometry(), &mut log).unwrap();
        log.clear();

        viewer.render(&ViewportGeometry::sized(50.0, 150.0), &mut log);

        assert_eq!(log.len(), 3);
        match &log[1] {
            RenderCommand::Create { row: 3, rect, .. } => {
                assert!((rect.top - 15.0).abs() < 1e-9);
                assert!((rect.width - 50.0).abs() < 1e-9);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn drags_on_offset_sheet_address_displayed_rows() {
        let mut viewer = Viewer::new(GridSize::default());
        let mut log: Vec<RenderCommand> = Vec::new();
        viewer.load(marked_sheet(2), &geometry(), &mut log).unwrap();
        let up = PointerEvent::ended(PointerEventKind::Up);

        // mask row 3 is drawn at row 5; revealing there clips row 5
        log.clear();
        viewer.handle_pointer(&PointerEvent::down(0.0, 55.0), &geometry(), &mut log);
        viewer.handle_pointer(&PointerEvent::moved(25.0, 55.0, 25.0), &geometry(), &mut log);
        viewer.handle_pointer(&up, &geometry(), &mut log);
        assert_eq!(
            log,
            vec![
                RenderCommand::SetClip {
                    row: 5,
                    col: 0,
                    clip: RevealClip::from_left(0.25)
                },
                RenderCommand::ClearClip { row: 5, col: 0 },
            ]
        );

        // covering the shifted overlay reuses it and leaves the mask alone
        log.clear();
        viewer.handle_pointer(&PointerEvent::down(90.0, 55.0), &geometry(), &mut log);
        viewer.handle_pointer(&PointerEvent::moved(25.0, 55.0, -65.0), &geometry(), &mut log);
        assert_eq!(
            log,
            vec![RenderCommand::SetClip {
                row: 5,
                col: 0,
                clip: RevealClip::from_right(0.75)
            }]
        );
        assert!(!viewer.mask().get(5, 0));
        assert!(viewer.mask().get(3, 0));

        // an empty displayed row gets an overlay and a mask cell at that same row
        log.clear();
        viewer.handle_pointer(&PointerEvent::moved(25.0, 85.0, 0.0), &geometry(), &mut log);
        viewer.handle_pointer(&up, &geometry(), &mut log);
        let rect = GridSize::default().cell_rect(&geometry(), 8, 0);
        assert_eq!(log[0], RenderCommand::Create { row: 8, col: 0, rect });
        assert_eq!(
            log[1],
            RenderCommand::SetClip {
                row: 8,
                col: 0,
                clip: RevealClip::from_right(0.75)
            }
        );
        assert!(viewer.mask().get(8, 0));
        assert!(!viewer.mask().get(6, 0));
        assert!(viewer.overlays().contains(8, 0));
        assert_eq!(viewer.overlays().clip(8, 0), None);
    }

    #[test]
    fn loading_a_new_sheet_abandons_the_drag() {
        let mut viewer = Viewer::new(GridSize::default());
        let mut log: Vec<RenderCommand> = Vec::new();
        viewer.load(marked_sheet(0), &geometry(), &mut log).unwrap();
        viewer.handle_pointer(&PointerEvent::down(0.0, 35.0), &geometry(), &mut log);
        assert!(viewer.session().is_active());

        viewer.load(marked_sheet(0), &geometry(), &mut log).unwrap();
        assert!(!viewer.session().is_active());
    }
}
