//! Sheet manifest configuration.
//!
//! A manifest is a JSON file listing the sheets of a book together with the
//! marking to detect on each one and its display row offset:
//!
//! ```json
//! {
//!   "grid": { "columns": 1, "rows": 30 },
//!   "sheets": [
//!     { "path": "sheets/sheet1.jpg", "detection": "red" },
//!     { "path": "sheets/sheet4.png", "detection": "black", "row_offset": 2 }
//!   ]
//! }
//! ```
//!
//! Relative sheet paths are resolved against the manifest's own directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detection::DetectionMode;
use crate::error::Result;
use crate::grid::GridSize;

/// One sheet entry in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Image file.
    pub path: PathBuf,
    /// Marking to detect on this sheet.
    #[serde(default)]
    pub detection: DetectionMode,
    /// Rows to shift overlays down by when drawing this sheet.
    #[serde(default)]
    pub row_offset: usize,
}

impl SheetConfig {
    /// A sheet with no row offset.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, detection: DetectionMode) -> Self {
        Self {
            path: path.into(),
            detection,
            row_offset: 0,
        }
    }
}

/// A book of sheets sharing one grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Grid laid over every sheet.
    pub grid: GridSize,
    /// Sheets in page order.
    pub sheets: Vec<SheetConfig>,
}

impl Manifest {
    /// Parse a manifest from JSON text. Sheet paths are left as written.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Manifest`] for malformed JSON and
    /// [`crate::Error::InvalidGrid`] for a zero-sized grid.
    pub fn from_json(text: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(text)?;
        manifest.grid.validate()?;
        Ok(manifest)
    }

    /// Read a manifest file and resolve its sheet paths against its directory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read, otherwise see
    /// [`Manifest::from_json`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut manifest = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            manifest.resolve_paths(base);
        }
        Ok(manifest)
    }

    /// Prefix every relative sheet path with `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for sheet in &mut self.sheets {
            if sheet.path.is_relative() {
                sheet.path = base.join(&sheet.path);
            }
        }
    }
}
