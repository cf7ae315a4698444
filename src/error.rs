//! Error types for the sheet-curtain crate.

/// Errors that can occur during detection, sheet loading and preview output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The image has a zero width or height.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// The grid has zero columns or zero rows.
    #[error("invalid grid {columns}x{rows}: both dimensions must be non-zero")]
    InvalidGrid {
        /// Number of grid columns.
        columns: usize,
        /// Number of grid rows.
        rows: usize,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// The sheet manifest could not be parsed.
    #[error("invalid sheet manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
