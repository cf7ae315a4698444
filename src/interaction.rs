//! The curtain drag gesture.
//!
//! A drag session starts undecided on pointer-down. The first movement sample
//! whose horizontal delta exceeds one unit locks the direction for the rest of
//! the session:
//!
//! - dragging **right** reveals: an existing overlay under the pointer is
//!   clipped from the left, up to the pointer's position within the cell;
//! - dragging **left** covers: a missing overlay is created (and the cell is
//!   marked covered), then clipped from the right so that it sweeps in as the
//!   pointer moves left.
//!
//! Clips are transient. Ending the session clears every clip but never touches
//! the mask.

use log::debug;

use crate::grid::{GridSize, ViewportGeometry};
use crate::mask::MaskState;
use crate::render::{MaskRenderer, OverlayLayer, RevealClip};

/// Horizontal movement that must be exceeded before a direction is chosen.
const DIRECTION_DEADZONE: f64 = 1.0;
/// At or below this percentage the cover path shows the overlay unclipped.
const COVER_FULL_PERCENT: f64 = 1.0;

/// Direction of the current drag session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragDirection {
    /// Not yet decided.
    #[default]
    Undetermined,
    /// Left to right: peel existing overlays back.
    Reveal,
    /// Right to left: cover cells, creating overlays as needed.
    Cover,
}

/// State of one press-to-release pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragSession {
    active: bool,
    direction: DragDirection,
}

impl DragSession {
    /// Whether a pointer is currently held down.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The locked direction, or [`DragDirection::Undetermined`].
    #[must_use]
    pub fn direction(&self) -> DragDirection {
        self.direction
    }

    /// Start a new session with no direction.
    pub fn begin(&mut self) {
        self.active = true;
        self.direction = DragDirection::Undetermined;
    }

    /// Feed a horizontal movement delta; locks the direction on the first one
    /// past the deadzone. Returns the direction after this sample.
    pub fn observe(&mut self, movement_x: f64) -> DragDirection {
        if self.active
            && self.direction == DragDirection::Undetermined
            && movement_x.abs() > DIRECTION_DEADZONE
        {
            self.direction = if movement_x > 0.0 {
                DragDirection::Reveal
            } else {
                DragDirection::Cover
            };
            debug!("drag direction locked: {:?}", self.direction);
        }
        self.direction
    }

    /// End the session. Returns whether one was active.
    pub fn end(&mut self) -> bool {
        let was_active = self.active;
        *self = Self::default();
        was_active
    }
}

/// What happened to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    /// Pressed.
    Down,
    /// Moved.
    Move,
    /// Released.
    Up,
    /// Left the sheet area.
    Leave,
    /// Cancelled by the platform.
    Cancel,
}

/// A pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Event type.
    pub kind: PointerEventKind,
    /// Pointer x in viewport coordinates.
    pub client_x: f64,
    /// Pointer y in viewport coordinates.
    pub client_y: f64,
    /// Horizontal movement since the previous event.
    pub movement_x: f64,
}

impl PointerEvent {
    /// A press at `(x, y)`.
    #[must_use]
    pub fn down(client_x: f64, client_y: f64) -> Self {
        Self {
            kind: PointerEventKind::Down,
            client_x,
            client_y,
            movement_x: 0.0,
        }
    }

    /// A move to `(x, y)` that travelled `movement_x` horizontally.
    #[must_use]
    pub fn moved(client_x: f64, client_y: f64, movement_x: f64) -> Self {
        Self {
            kind: PointerEventKind::Move,
            client_x,
            client_y,
            movement_x,
        }
    }

    /// A release, leave or cancel.
    #[must_use]
    pub fn ended(kind: PointerEventKind) -> Self {
        Self {
            kind,
            client_x: 0.0,
            client_y: 0.0,
            movement_x: 0.0,
        }
    }
}

/// Turns pointer events into mask edits and overlay instructions.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    session: DragSession,
}

impl InteractionController {
    /// The current drag session.
    #[must_use]
    pub fn session(&self) -> DragSession {
        self.session
    }

    /// Process one pointer event.
    ///
    /// `overlays` is keyed by displayed cell, exactly as the renderer sees it.
    pub fn handle<R: MaskRenderer + ?Sized>(
        &mut self,
        event: &PointerEvent,
        mask: &mut MaskState,
        overlays: &mut OverlayLayer,
        geometry: &ViewportGeometry,
        renderer: &mut R,
    ) {
        match event.kind {
            PointerEventKind::Down => self.session.begin(),
            PointerEventKind::Move => {
                if !self.session.is_active() {
                    return;
                }
                match self.session.observe(event.movement_x) {
                    DragDirection::Undetermined => {}
                    direction => {
                        drag_over(direction, event, mask, overlays, geometry, renderer);
                    }
                }
            }
            PointerEventKind::Up | PointerEventKind::Leave | PointerEventKind::Cancel => {
                if self.session.end() {
                    overlays.clear_all_clips(renderer);
                }
            }
        }
    }
}

fn drag_over<R: MaskRenderer + ?Sized>(
    direction: DragDirection,
    event: &PointerEvent,
    mask: &mut MaskState,
    overlays: &mut OverlayLayer,
    geometry: &ViewportGeometry,
    renderer: &mut R,
) {
    let grid: GridSize = mask.grid();
    let (x, y) = geometry.to_local(event.client_x, event.client_y);
    let Some((row, col)) = grid.cell_at(x, y, geometry.width, geometry.height) else {
        return;
    };
    let percentage = grid.percentage_in_cell(x, geometry.width, col);

    match direction {
        DragDirection::Reveal => {
            overlays.set_clip(renderer, row, col, RevealClip::from_left(percentage / 100.0));
        }
        DragDirection::Cover => {
            if !overlays.contains(row, col) {
                debug!("covering new cell ({row}, {col})");
                mask.set(row, col, true);
                overlays.create(renderer, row, col, grid.cell_rect(geometry, row, col));
            }
            if percentage <= COVER_FULL_PERCENT {
                overlays.clear_clip(renderer, row, col);
            } else {
                let hidden = (100.0 - percentage) / 100.0;
                overlays.set_clip(renderer, row, col, RevealClip::from_right(hidden));
            }
        }
        DragDirection::Undetermined => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderCommand;

    struct Fixture {
        controller: InteractionController,
        mask: MaskState,
        overlays: OverlayLayer,
        geometry: ViewportGeometry,
        log: Vec<RenderCommand>,
    }

    impl Fixture {
        /// 100x300 display of a 1x30 grid: every row is 10 units tall.
        fn new() -> Self {
            Self {
                controller: InteractionController::default(),
                mask: MaskState::new(GridSize::default()),
                overlays: OverlayLayer::default(),
                geometry: ViewportGeometry::sized(100.0, 300.0),
                log: Vec::new(),
            }
        }

        fn covered_row(mut self, row: usize) -> Self {
            self.mask.set(row, 0, true);
            let rect = self.mask.grid().cell_rect(&self.geometry, row, 0);
            self.overlays.create(&mut self.log, row, 0, rect);
            self.log.clear();
            self
        }

        fn send(&mut self, event: PointerEvent) {
            self.controller.handle(
                &event,
                &mut self.mask,
                &mut self.overlays,
                &self.geometry,
                &mut self.log,
            );
        }
    }

    #[test]
    fn direction_locks_on_first_sample_past_deadzone() {
        let mut session = DragSession::default();
        session.begin();
        assert_eq!(session.observe(0.5), DragDirection::Undetermined);
        assert_eq!(session.observe(0.5), DragDirection::Undetermined);
        assert_eq!(session.observe(2.0), DragDirection::Reveal);
        assert_eq!(session.observe(-5.0), DragDirection::Reveal);
    }

    #[test]
    fn exactly_one_unit_does_not_lock() {
        let mut session = DragSession::default();
        session.begin();
        assert_eq!(session.observe(-1.0), DragDirection::Undetermined);
        assert_eq!(session.observe(-1.5), DragDirection::Cover);
    }

    #[test]
    fn idle_session_ignores_movement() {
        let mut session = DragSession::default();
        assert_eq!(session.observe(10.0), DragDirection::Undetermined);
        assert!(!session.end());
    }

    #[test]
    fn reveal_clips_existing_overlay_from_left() {
        let mut f = Fixture::new().covered_row(4);
        f.send(PointerEvent::down(10.0, 45.0));
        f.send(PointerEvent::moved(25.0, 45.0, 3.0));

        assert_eq!(
            f.log,
            vec![RenderCommand::SetClip {
                row: 4,
                col: 0,
                clip: RevealClip::from_left(0.25)
            }]
        );
        assert!(f.mask.get(4, 0));
    }

    #[test]
    fn reveal_over_uncovered_cell_is_silent() {
        let mut f = Fixture::new();
        f.send(PointerEvent::down(10.0, 45.0));
        f.send(PointerEvent::moved(30.0, 45.0, 3.0));
        f.send(PointerEvent::moved(60.0, 45.0, 3.0));
        f.send(PointerEvent::ended(PointerEventKind::Up));

        assert!(f.log.is_empty());
        assert!(!f.mask.get(4, 0));
    }

    #[test]
    fn cover_creates_overlay_and_marks_mask() {
        let mut f = Fixture::new();
        f.send(PointerEvent::down(90.0, 75.0));
        f.send(PointerEvent::moved(80.0, 75.0, -10.0));
        f.send(PointerEvent::moved(25.0, 75.0, -55.0));

        assert!(f.mask.get(7, 0));
        assert!(matches!(
            f.log[0],
            RenderCommand::Create { row: 7, col: 0, .. }
        ));
        let creates = f
            .log
            .iter()
            .filter(|c| matches!(c, RenderCommand::Create { .. }))
            .count();
        assert_eq!(creates, 1);
        assert_eq!(
            f.log[2],
            RenderCommand::SetClip {
                row: 7,
                col: 0,
                clip: RevealClip::from_right(0.75)
            }
        );

        f.send(PointerEvent::ended(PointerEventKind::Up));
        assert_eq!(
            f.log.last(),
            Some(&RenderCommand::ClearClip { row: 7, col: 0 })
        );
        assert!(f.mask.get(7, 0));
        assert!(!f.controller.session().is_active());
    }

    #[test]
    fn cover_at_left_edge_shows_overlay_in_full() {
        let mut f = Fixture::new().covered_row(2);
        f.send(PointerEvent::down(50.0, 25.0));
        f.send(PointerEvent::moved(0.5, 25.0, -49.5));

        assert_eq!(f.log, vec![RenderCommand::ClearClip { row: 2, col: 0 }]);
        assert_eq!(f.overlays.clip(2, 0), None);
    }

    #[test]
    fn direction_holds_after_reversal() {
        let mut f = Fixture::new();
        f.send(PointerEvent::down(50.0, 15.0));
        f.send(PointerEvent::moved(52.0, 15.0, 2.0));
        f.send(PointerEvent::moved(20.0, 15.0, -32.0));

        assert_eq!(f.controller.session().direction(), DragDirection::Reveal);
        assert!(f.log.is_empty());
        assert!(!f.mask.get(1, 0));
    }

    #[test]
    fn out_of_grid_movement_is_a_no_op() {
        let mut f = Fixture::new().covered_row(0);
        f.send(PointerEvent::down(50.0, 5.0));
        f.send(PointerEvent::moved(150.0, 5.0, 5.0));
        f.send(PointerEvent::moved(50.0, -3.0, 5.0));
        f.send(PointerEvent::moved(50.0, 300.0, -5.0));

        assert!(f.log.is_empty());
    }

    #[test]
    fn leave_and_cancel_end_the_session() {
        for kind in [PointerEventKind::Leave, PointerEventKind::Cancel] {
            let mut f = Fixture::new().covered_row(3);
            f.send(PointerEvent::down(0.0, 35.0));
            f.send(PointerEvent::moved(50.0, 35.0, 4.0));
            f.send(PointerEvent::ended(kind));

            assert_eq!(
                f.log.last(),
                Some(&RenderCommand::ClearClip { row: 3, col: 0 })
            );
            assert!(f.mask.get(3, 0));
            assert_eq!(f.controller.session(), DragSession::default());
        }
    }

    #[test]
    fn release_without_press_issues_nothing() {
        let mut f = Fixture::new().covered_row(3);
        f.send(PointerEvent::ended(PointerEventKind::Up));
        assert!(f.log.is_empty());
    }
}
