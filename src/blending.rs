//! Soft-mask construction and gradient-domain compositing.
//!
//! The clone step transplants the *gradients* of the chosen source patch into
//! the clicked location and solves for pixel values that match the surrounding
//! destination on the mask boundary (a Poisson solve via SOR relaxation).
//! Source gradients are scaled per channel by the ratio of destination to
//! source mean under the mask, so the destination's lighting is preserved
//! while the source's texture replaces the blemish. The result is feathered
//! through the soft mask; pixels where the mask is zero are never touched.

use image::{imageops, GrayImage, RgbImage};

use crate::candidates::Region;

/// Over-relaxation factor for the SOR solve.
const SOR_OMEGA: f32 = 1.85;

/// Upper bound on SOR sweeps per channel.
const MAX_ITERATIONS: usize = 500;

/// Stop iterating once the largest per-sweep update (in 0..255 units,
/// normalized space) falls below this.
const CONVERGENCE_TOLERANCE: f32 = 1e-4;

/// Minimum source mean before the proportional scale falls back to 1.0.
const MEAN_EPSILON: f32 = 1e-3;

/// Gaussian kernel side for softening the blend mask.
///
/// Derived from `patch_size / 2`, adjusted down to the nearest odd value and
/// clamped to at least 1 so the blur is always well-formed.
#[must_use]
pub fn blur_kernel_size(patch_size: u32) -> u32 {
    let mut k = patch_size / 2;
    if k % 2 == 0 {
        k = k.saturating_sub(1);
    }
    k.max(1)
}

/// Build the soft circular blend mask for a given patch size.
///
/// A filled circle of radius `patch_size / 3` centered in a
/// `patch_size x patch_size` square, edge-softened by a gaussian blur whose
/// kernel derives from `patch_size / 2` (see [`blur_kernel_size`]). Built once
/// per session and reused for every blend.
#[must_use]
pub fn build_blend_mask(patch_size: u32) -> GrayImage {
    let radius = i64::from(patch_size / 3);
    let center = i64::from(patch_size / 2);

    let mask = GrayImage::from_fn(patch_size, patch_size, |x, y| {
        let dx = i64::from(x) - center;
        let dy = i64::from(y) - center;
        if dx * dx + dy * dy <= radius * radius {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    });

    let kernel = blur_kernel_size(patch_size);
    #[allow(clippy::cast_precision_loss)]
    let sigma = 0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    imageops::blur(&mask, sigma.max(0.1))
}

/// Per-channel f32 planes for a square patch of `dest`.
fn extract_planes(dest: &RgbImage, region: Region) -> [Vec<f32>; 3] {
    let side = region.size as usize;
    let mut planes = [
        vec![0.0_f32; side * side],
        vec![0.0_f32; side * side],
        vec![0.0_f32; side * side],
    ];
    for dy in 0..region.size {
        for dx in 0..region.size {
            let px = dest.get_pixel(region.x + dx, region.y + dy);
            let i = (dy * region.size + dx) as usize;
            for ch in 0..3 {
                planes[ch][i] = f32::from(px[ch]) / 255.0;
            }
        }
    }
    planes
}

/// Mean of `plane` over pixels where `weights > 0`.
fn masked_mean(plane: &[f32], weights: &[f32]) -> f32 {
    let mut sum = 0.0_f32;
    let mut count = 0.0_f32;
    for (v, w) in plane.iter().zip(weights) {
        if *w > 0.0 {
            sum += v;
            count += 1.0;
        }
    }
    if count > 0.0 {
        sum / count
    } else {
        0.0
    }
}

/// Solve `laplacian(f) = laplacian(guide)` over `interior` with Dirichlet
/// boundary taken from `boundary` (the destination patch), by SOR sweeps.
///
/// `f` is initialized to the guide (the transplanted patch) on entry.
fn relax(f: &mut [f32], guide: &[f32], boundary: &[f32], interior: &[bool], side: usize) {
    for _ in 0..MAX_ITERATIONS {
        let mut max_delta = 0.0_f32;
        for y in 1..side - 1 {
            for x in 1..side - 1 {
                let i = y * side + x;
                if !interior[i] {
                    continue;
                }

                let value_at = |j: usize| if interior[j] { f[j] } else { boundary[j] };
                let neighbor_sum = value_at(i - 1) + value_at(i + 1) + value_at(i - side) + value_at(i + side);
                let guide_lap =
                    4.0 * guide[i] - (guide[i - 1] + guide[i + 1] + guide[i - side] + guide[i + side]);

                let relaxed = (neighbor_sum + guide_lap) * 0.25;
                let updated = f[i] + SOR_OMEGA * (relaxed - f[i]);
                let delta = (updated - f[i]).abs();
                if delta > max_delta {
                    max_delta = delta;
                }
                f[i] = updated;
            }
        }
        if max_delta < CONVERGENCE_TOLERANCE {
            break;
        }
    }
}

/// Seamlessly clone the `source` patch over the point `(cx, cy)` of `dest`,
/// in place.
///
/// `source` is a region *of `dest` itself* (the padded working image), the
/// same size as `mask`. Boundary pixels match the existing destination;
/// interior pixels follow the source's gradients scaled proportionally to the
/// destination's mean intensity, so lighting carries over. Only pixels under
/// the mask's nonzero footprint change.
pub fn seamless_clone(dest: &mut RgbImage, source: Region, mask: &GrayImage, cx: u32, cy: u32) {
    debug_assert_eq!(source.size, mask.width());
    let side = source.size as usize;
    if side < 3 {
        return;
    }
    let target = Region::centered(cx, cy, source.size);

    let src_planes = extract_planes(dest, source);
    let dst_planes = extract_planes(dest, target);

    let alpha: Vec<f32> = mask.pixels().map(|p| f32::from(p[0]) / 255.0).collect();

    // Interior of the solve: nonzero mask, away from the patch border so every
    // 4-neighbor lookup stays inside the patch. Border-adjacent mask values
    // are a few counts at most; they keep their destination value and the
    // feather hides them.
    let interior: Vec<bool> = (0..side * side)
        .map(|i| {
            let (x, y) = (i % side, i / side);
            alpha[i] > 0.0 && (1..side - 1).contains(&x) && (1..side - 1).contains(&y)
        })
        .collect();

    let mut solved = [Vec::new(), Vec::new(), Vec::new()];
    for ch in 0..3 {
        let src_mean = masked_mean(&src_planes[ch], &alpha);
        let dst_mean = masked_mean(&dst_planes[ch], &alpha);
        let scale = if src_mean > MEAN_EPSILON {
            dst_mean / src_mean
        } else {
            1.0
        };

        let guide: Vec<f32> = src_planes[ch].iter().map(|v| v * scale).collect();
        let mut f = guide.clone();
        relax(&mut f, &guide, &dst_planes[ch], &interior, side);
        solved[ch] = f;
    }

    for dy in 0..source.size {
        for dx in 0..source.size {
            let i = (dy * source.size + dx) as usize;
            let a = alpha[i];
            if a <= 0.0 {
                continue;
            }
            let px = dest.get_pixel_mut(target.x + dx, target.y + dy);
            for ch in 0..3 {
                let base = dst_planes[ch][i];
                let value = if interior[i] { solved[ch][i] } else { base };
                let blended = a * value + (1.0 - a) * base;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    px[ch] = (blended * 255.0).round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn blur_kernel_is_odd_and_positive() {
        assert_eq!(blur_kernel_size(40), 19);
        assert_eq!(blur_kernel_size(42), 21);
        assert_eq!(blur_kernel_size(4), 1);
        assert_eq!(blur_kernel_size(2), 1);
        assert_eq!(blur_kernel_size(1), 1);
        for p in 1..200 {
            let k = blur_kernel_size(p);
            assert!(k >= 1 && k % 2 == 1, "patch {p} gave kernel {k}");
        }
    }

    #[test]
    fn blend_mask_shape() {
        let mask = build_blend_mask(40);
        assert_eq!(mask.width(), 40);
        assert_eq!(mask.height(), 40);
        // Solid at the circle center, fully transparent in the corners.
        assert!(mask.get_pixel(20, 20)[0] > 250);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(39, 39)[0], 0);
    }

    #[test]
    fn blend_mask_edge_is_soft() {
        let mask = build_blend_mask(40);
        // Radius is 13; somewhere near it the alpha must be partial.
        let mut partial = 0;
        for x in 0..40 {
            let v = mask.get_pixel(x, 20)[0];
            if (11..245).contains(&v) {
                partial += 1;
            }
        }
        assert!(partial >= 4, "expected a soft falloff band, got {partial} partial pixels");
    }

    #[test]
    fn clone_on_flat_image_changes_nothing() {
        let mut img = RgbImage::from_pixel(300, 300, Rgb([128, 128, 128]));
        let before = img.clone();
        let mask = build_blend_mask(40);
        let source = Region { x: 60, y: 150, size: 40 };
        seamless_clone(&mut img, source, &mask, 150, 150);

        for (a, b) in img.pixels().zip(before.pixels()) {
            for ch in 0..3 {
                let diff = (i32::from(a[ch]) - i32::from(b[ch])).abs();
                assert!(diff <= 1, "flat clone moved a pixel by {diff}");
            }
        }
    }

    #[test]
    fn clone_only_touches_mask_footprint() {
        // Horizontal gradient destination, flat source region.
        let mut img = RgbImage::from_fn(300, 300, |x, _| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (x % 256) as u8;
            Rgb([v, v, v])
        });
        let before = img.clone();
        let mask = build_blend_mask(40);
        let source = Region { x: 10, y: 10, size: 40 };
        let (cx, cy) = (150, 150);
        seamless_clone(&mut img, source, &mask, cx, cy);

        let target = Region::centered(cx, cy, 40);
        for y in 0..img.height() {
            for x in 0..img.width() {
                let inside_patch = (target.x..target.x + 40).contains(&x)
                    && (target.y..target.y + 40).contains(&y);
                let under_mask =
                    inside_patch && mask.get_pixel(x - target.x, y - target.y)[0] > 0;
                if !under_mask {
                    assert_eq!(
                        img.get_pixel(x, y),
                        before.get_pixel(x, y),
                        "pixel ({x},{y}) outside the mask footprint changed"
                    );
                }
            }
        }
    }

    #[test]
    fn clone_replaces_a_blemish_with_surrounding_tone() {
        // Blue canvas with a red disc at the target; source is flat blue.
        let blue = Rgb([0, 0, 200]);
        let mut img = RgbImage::from_pixel(300, 300, blue);
        for dy in 0..10u32 {
            for dx in 0..10u32 {
                img.put_pixel(145 + dx, 145 + dy, Rgb([255, 0, 0]));
            }
        }
        let mask = build_blend_mask(40);
        let source = Region { x: 20, y: 20, size: 40 };
        seamless_clone(&mut img, source, &mask, 150, 150);

        // The formerly-red pixels sit well inside the mask and must now read blue.
        for dy in 0..10u32 {
            for dx in 0..10u32 {
                let px = img.get_pixel(145 + dx, 145 + dy);
                assert!(px[0] < 60, "red residue {} at ({dx},{dy})", px[0]);
                assert!(px[2] > 150, "blue not restored ({}) at ({dx},{dy})", px[2]);
            }
        }
    }
}
