//! Error types for the blemish-removal crate.

/// Errors that can occur while building a healing session or processing clicks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source image decoded to zero pixels.
    #[error("source image is empty")]
    EmptyImage,

    /// The image is too small to hold even one patch.
    #[error("image too small ({width}x{height}) for {patch_size}x{patch_size} patch")]
    ImageTooSmall {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Configured patch side length in pixels.
        patch_size: u32,
    },

    /// A click coordinate fell outside the working image.
    #[error("click ({x},{y}) outside image bounds ({width}x{height})")]
    ClickOutOfBounds {
        /// Click x coordinate.
        x: u32,
        /// Click y coordinate.
        y: u32,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
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
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
