//! Load sheets from disk, detect their marks and write previews.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, warn};

use crate::config::{Manifest, SheetConfig};
use crate::detection::classify_image;
use crate::error::{Error, Result};
use crate::grid::GridSize;
use crate::mask::MaskState;
use crate::preview;
use crate::viewer::Sheet;

/// Options controlling sheet processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single sheet.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed sheet.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Natural image size, when the sheet could be decoded.
    pub dimensions: Option<(u32, u32)>,
    /// Detected mask, when detection ran.
    pub mask: Option<MaskState>,
    /// Where the preview was written, if one was requested and saved.
    pub preview: Option<PathBuf>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            dimensions: None,
            mask: None,
            preview: None,
            message,
        }
    }

    /// Number of covered cells, or zero if detection did not run.
    #[must_use]
    pub fn covered(&self) -> usize {
        self.mask.as_ref().map_or(0, MaskState::count)
    }
}

/// Detects marks on sheets laid out on a fixed grid.
///
/// Create once per manifest and reuse for every sheet in it.
#[derive(Debug, Clone, Copy)]
pub struct SheetEngine {
    grid: GridSize,
}

impl SheetEngine {
    /// Create an engine for `grid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGrid`] if the grid has a zero dimension.
    pub fn new(grid: GridSize) -> Result<Self> {
        grid.validate()?;
        Ok(Self { grid })
    }

    /// The grid this engine classifies against.
    #[must_use]
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Decode a sheet image from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the file cannot be opened or decoded.
    #[allow(clippy::unused_self)] // sheets are decoded the same for every grid
    pub fn load_sheet(&self, config: &SheetConfig) -> Result<Sheet> {
        let image = image::open(&config.path)?.to_rgba8();
        debug!(
            "loaded {} ({}x{})",
            config.path.display(),
            image.width(),
            image.height()
        );
        Ok(Sheet {
            image,
            mode: config.detection,
            row_offset: config.row_offset,
        })
    }

    /// Classify a loaded sheet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for an empty image.
    pub fn detect(&self, sheet: &Sheet) -> Result<MaskState> {
        classify_image(&sheet.image, sheet.mode, self.grid)
    }

    /// Process a single sheet: load, detect, and optionally save a preview.
    #[must_use]
    pub fn process_sheet(
        &self,
        config: &SheetConfig,
        preview_path: Option<&Path>,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let sheet = match self.load_sheet(config) {
            Ok(sheet) => sheet,
            Err(e) => return ProcessResult::failed(&config.path, format!("Failed to load: {e}")),
        };

        let mask = match self.detect(&sheet) {
            Ok(mask) => mask,
            Err(e) => return ProcessResult::failed(&config.path, format!("Detection failed: {e}")),
        };

        let mut result = ProcessResult {
            path: config.path.clone(),
            success: true,
            dimensions: Some(sheet.image.dimensions()),
            mask: None,
            preview: None,
            message: format!("{} of {} cells covered", mask.count(), self.grid.cell_count()),
        };

        if let Some(output) = preview_path {
            let mut image = sheet.image;
            preview::paint_mask(&mut image, &mask, sheet.row_offset);
            if let Err(e) = ensure_parent(output).and_then(|()| save_image(&image, output)) {
                if !opts.quiet {
                    warn!("could not write preview {}: {e}", output.display());
                }
                result.success = false;
                result.message = format!("Failed to save preview: {e}");
            } else {
                result.preview = Some(output.to_path_buf());
            }
        }

        result.mask = Some(mask);
        result
    }

    /// Process every sheet of a manifest.
    ///
    /// Previews are written into `output_dir` when it is given, named
    /// `{page:02}_{file name}` with the sheet's 1-based position in the
    /// manifest, so sheets sharing a file name never overwrite each other.
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Returns one [`ProcessResult`] per sheet, in manifest order.
    #[must_use]
    pub fn process_manifest(
        &self,
        manifest: &Manifest,
        output_dir: Option<&Path>,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        if let Some(dir) = output_dir {
            if let Err(e) = std::fs::create_dir_all(dir) {
                return vec![ProcessResult::failed(
                    dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        let process = |(index, config): (usize, &SheetConfig)| {
            let preview = output_dir.map(|dir| preview_path_in(dir, index + 1, &config.path));
            self.process_sheet(config, preview.as_deref(), opts)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            manifest.sheets.par_iter().enumerate().map(process).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            manifest.sheets.iter().enumerate().map(process).collect()
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Preview location for the sheet at 1-based `page` of a manifest.
fn preview_path_in(dir: &Path, page: usize, sheet: &Path) -> PathBuf {
    let name = match sheet.file_name() {
        Some(name) => name.to_string_lossy(),
        None => {
            warn!("sheet path {} has no file name", sheet.display());
            "sheet.png".into()
        }
    };
    dir.join(format!("{page:02}_{name}"))
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA image with format-specific settings.
///
/// JPEG has no alpha channel, so it is written as RGB at full quality.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let dyn_img = DynamicImage::ImageRgba8(img.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&DynamicImage::ImageRgb8(dyn_img.to_rgb8()))?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            dyn_img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default preview path from an input path.
///
/// Example: `"sheet1.jpg"` becomes `"sheet1_masked.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_masked.{ext}"))
}
