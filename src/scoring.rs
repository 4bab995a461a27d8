//! Patch smoothness scoring and candidate selection.
//!
//! A patch's roughness is the variance-like spread of its local second
//! derivative: convert to grayscale, apply a discrete Laplacian, then sum the
//! squared deviations of the absolute response from the patch mean. Flat,
//! uniformly-toned regions score near zero; texture, blemishes, and specular
//! highlights score high. The healing pipeline picks the lowest-scoring
//! candidate as the clone source.
//!
//! The 3x3 Laplacian kernel is a tuning choice, not a contract: any operator
//! that penalizes high local variance of edge energy will rank candidates the
//! same way on realistic skin/background imagery.

use image::RgbImage;

use crate::candidates::Region;

/// Convert an RGB image region to grayscale float values in `[0, 1]`.
///
/// Uses luminance formula: `0.299*R + 0.587*G + 0.114*B`.
fn region_to_grayscale(img: &RgbImage, region: Region) -> Vec<f32> {
    let mut gray = Vec::with_capacity((region.size * region.size) as usize);
    for dy in 0..region.size {
        for dx in 0..region.size {
            let px = img.get_pixel(region.x + dx, region.y + dy);
            let lum =
                0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]);
            gray.push(lum / 255.0);
        }
    }
    gray
}

/// Discrete 3x3 Laplacian response for a 2D float array.
///
/// Kernel `[0 1 0; 1 -4 1; 0 1 0]`. Border pixels are set to 0.
fn laplacian(data: &[f32], width: usize, height: usize) -> Vec<f32> {
    let mut result = vec![0.0_f32; width * height];
    if width < 3 || height < 3 {
        return result;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = data[y * width + x];
            result[y * width + x] = data[(y - 1) * width + x]
                + data[(y + 1) * width + x]
                + data[y * width + x - 1]
                + data[y * width + x + 1]
                - 4.0 * center;
        }
    }

    result
}

/// Roughness score for a patch: higher = rougher/noisier.
///
/// Sum over the patch of `(|laplacian| - mean(laplacian))^2`. No area
/// normalization is applied; patch size is constant across a session, so
/// scores stay comparable.
///
/// The region must lie fully inside `image` (guaranteed by the padded
/// coordinate space the pipeline operates in).
#[must_use]
pub fn roughness(image: &RgbImage, region: Region) -> f32 {
    let gray = region_to_grayscale(image, region);
    let side = region.size as usize;
    let response = laplacian(&gray, side, side);

    #[allow(clippy::cast_precision_loss)]
    let n = response.len() as f32;
    if n < 1.0 {
        return 0.0;
    }
    let mean = response.iter().sum::<f32>() / n;

    response.iter().map(|v| (v.abs() - mean).powi(2)).sum()
}

/// Index of the smoothest candidate; earliest index wins ties.
///
/// Scoring runs in parallel when the `cli` feature is enabled (via rayon);
/// the argmin pass is always sequential so the tie-break stays deterministic.
///
/// # Panics
///
/// Panics if `candidates` is empty (contract violation; the generator always
/// produces exactly 8).
#[must_use]
pub fn select_smoothest(image: &RgbImage, candidates: &[Region]) -> usize {
    assert!(!candidates.is_empty(), "candidate set must not be empty");

    #[cfg(feature = "cli")]
    let scores: Vec<f32> = {
        use rayon::prelude::*;
        candidates
            .par_iter()
            .map(|r| roughness(image, *r))
            .collect()
    };

    #[cfg(not(feature = "cli"))]
    let scores: Vec<f32> = candidates.iter().map(|r| roughness(image, *r)).collect();

    let mut best = 0;
    for (i, &score) in scores.iter().enumerate() {
        if score < scores[best] {
            best = i;
        }
    }
    best
}
