//! Detect hand-marked cells on scanned sheets and peel them back with a drag gesture.
//!
//! A sheet is divided into a fixed grid (one column by thirty rows by default).
//! Detection marks every cell that carries red or blue pen, or a dense blob of
//! black ink, producing a [`MaskState`]. Each covered cell is then drawn as an
//! opaque overlay which the user can temporarily peel back by dragging right,
//! or extend by dragging left over uncovered cells.
//!
//! # Quick Start
//!
//! ```no_run
//! use sheet_curtain::{classify_image, DetectionMode, GridSize};
//!
//! let img = image::open("sheet1.jpg").unwrap().to_rgba8();
//! let mask = classify_image(&img, DetectionMode::Red, GridSize::default()).unwrap();
//! println!("{} cells covered\n{mask}", mask.count());
//! ```
//!
//! # Interaction
//!
//! The crate does not draw. A [`Viewer`] emits instructions to any
//! [`MaskRenderer`]; `Vec<RenderCommand>` records them.
//!
//! ```
//! use image::RgbaImage;
//! use sheet_curtain::{
//!     DetectionMode, GridSize, PointerEvent, PointerEventKind, RenderCommand, Sheet, Viewer,
//!     ViewportGeometry,
//! };
//!
//! let mut viewer = Viewer::new(GridSize::default());
//! let geometry = ViewportGeometry::sized(600.0, 900.0);
//! let mut commands: Vec<RenderCommand> = Vec::new();
//!
//! let sheet = Sheet {
//!     image: RgbaImage::from_pixel(60, 90, image::Rgba([255, 255, 255, 255])),
//!     mode: DetectionMode::Red,
//!     row_offset: 0,
//! };
//! viewer.load(sheet, &geometry, &mut commands).unwrap();
//!
//! // drag left across row 0 to cover it
//! viewer.handle_pointer(&PointerEvent::down(590.0, 10.0), &geometry, &mut commands);
//! viewer.handle_pointer(&PointerEvent::moved(300.0, 10.0, -290.0), &geometry, &mut commands);
//! viewer.handle_pointer(&PointerEvent::ended(PointerEventKind::Up), &geometry, &mut commands);
//! assert!(viewer.mask().get(0, 0));
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod detection;
mod engine;
pub mod error;
pub mod grid;
pub mod interaction;
pub mod mask;
pub mod preview;
pub mod render;
mod viewer;

pub use config::{Manifest, SheetConfig};
pub use detection::{classify, classify_image, DetectionMode};
pub use engine::{
    default_output_path, is_supported_image, save_image, ProcessOptions, ProcessResult,
    SheetEngine,
};
pub use error::{Error, Result};
pub use grid::{CellBounds, CellRect, GridSize, ViewportGeometry};
pub use interaction::{
    DragDirection, DragSession, InteractionController, PointerEvent, PointerEventKind,
};
pub use mask::MaskState;
pub use render::{render_mask, MaskRenderer, OverlayLayer, RenderCommand, RevealClip};
pub use viewer::{Sheet, Viewer};
