//! Healing session: owns the working image and runs the click pipeline.

use std::path::{Path, PathBuf};

use image::{imageops, DynamicImage, GrayImage, ImageFormat, RgbImage};

use crate::blending;
use crate::candidates;
use crate::error::{Error, Result};
use crate::scoring;

/// Tuning knobs for a healing session.
///
/// Everything else (mask radius, blur kernel, padding border) derives from
/// `patch_size`.
#[derive(Debug, Clone, Copy)]
pub struct HealConfig {
    /// Side length of the clone patch in pixels.
    pub patch_size: u32,
}

impl Default for HealConfig {
    fn default() -> Self {
        Self { patch_size: 40 }
    }
}

impl HealConfig {
    /// Reflected border width added around the working image per click.
    ///
    /// Twice the patch size, which always exceeds the farthest candidate
    /// pixel offset of `1.5 * patch_size` from a click center.
    #[must_use]
    pub fn border(&self) -> u32 {
        2 * self.patch_size
    }
}

/// A point-and-click healing session over one image.
///
/// The session is a synchronous state machine: it sits `Idle` between events,
/// a [`heal`](HealSession::heal) call runs the full pipeline
/// (pad → enumerate candidates → score → select → clone → crop) to completion
/// before returning, and [`reset`](HealSession::reset) restores the original
/// image from any state. The working image only ever changes at the end of a
/// completed pipeline run; a failed precondition leaves it untouched.
///
/// ```no_run
/// use blemish_removal::{HealConfig, HealSession};
///
/// let img = image::open("portrait.png").unwrap().to_rgb8();
/// let mut session = HealSession::new(img, HealConfig::default()).unwrap();
/// session.heal(120, 85).unwrap();
/// session.working().save("healed.png").unwrap();
/// ```
pub struct HealSession {
    config: HealConfig,
    original: RgbImage,
    working: RgbImage,
    mask: GrayImage,
}

impl HealSession {
    /// Create a session over a loaded image.
    ///
    /// Precomputes the soft blend mask for the configured patch size.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyImage`] if the image has zero pixels,
    /// [`Error::ImageTooSmall`] if either dimension is smaller than one patch.
    pub fn new(image: RgbImage, config: HealConfig) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage);
        }
        if width < config.patch_size || height < config.patch_size {
            return Err(Error::ImageTooSmall {
                width,
                height,
                patch_size: config.patch_size,
            });
        }

        let mask = blending::build_blend_mask(config.patch_size);
        Ok(Self {
            config,
            working: image.clone(),
            original: image,
            mask,
        })
    }

    /// Load an image from disk and build a session over it.
    ///
    /// # Errors
    ///
    /// Decoding failures surface as [`Error::Image`]; see [`HealSession::new`]
    /// for the dimension checks.
    pub fn from_path(path: &Path, config: HealConfig) -> Result<Self> {
        let img = image::open(path)?.to_rgb8();
        Self::new(img, config)
    }

    /// Heal one blemish: replace the patch around `(x, y)` with the smoothest
    /// of its 8 neighboring patches, seamlessly blended.
    ///
    /// Runs synchronously; on success the working image is updated in place
    /// (dimensions never change). On error nothing changes.
    ///
    /// # Errors
    ///
    /// [`Error::ClickOutOfBounds`] if `(x, y)` lies outside the image.
    pub fn heal(&mut self, x: u32, y: u32) -> Result<()> {
        let (width, height) = self.working.dimensions();
        if x >= width || y >= height {
            return Err(Error::ClickOutOfBounds {
                x,
                y,
                width,
                height,
            });
        }

        let border = self.config.border();
        let mut padded = candidates::pad_reflect(&self.working, border);

        // Click center in padded coordinates
        let (cx, cy) = (x + border, y + border);
        let ring = candidates::ring(cx, cy, self.config.patch_size);
        let best = scoring::select_smoothest(&padded, &ring);
        blending::seamless_clone(&mut padded, ring[best], &self.mask, cx, cy);

        // Commit: crop the border back off
        self.working = imageops::crop_imm(&padded, border, border, width, height).to_image();
        Ok(())
    }

    /// Restore the working image to the originally loaded pixels.
    pub fn reset(&mut self) {
        self.working = self.original.clone();
    }

    /// The current working image.
    #[must_use]
    pub fn working(&self) -> &RgbImage {
        &self.working
    }

    /// The originally loaded image.
    #[must_use]
    pub fn original(&self) -> &RgbImage {
        &self.original
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> HealConfig {
        self.config
    }

    /// The precomputed soft blend mask (one `patch_size` square).
    #[must_use]
    pub fn blend_mask(&self) -> &GrayImage {
        &self.mask
    }
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

/// Save an RGB image with format-specific quality settings.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let dyn_img = DynamicImage::ImageRgb8(img.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&dyn_img)?;
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

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_healed.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_healed.{ext}"))
}
