//! Candidate patch enumeration and border padding.
//!
//! A click selects a square patch; the candidates to clone from are the 8
//! same-sized patches one `patch_size` step away in each compass direction.
//! All coordinates here live in *padded* image space: the working image is
//! first extended by a reflected border of `2 * patch_size`, which keeps every
//! candidate fully in bounds even for clicks on the image edge (the farthest
//! candidate pixel is `1.5 * patch_size` from the click center).

use image::RgbImage;

/// An axis-aligned square sub-region of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Top-left x coordinate.
    pub x: u32,
    /// Top-left y coordinate.
    pub y: u32,
    /// Side length in pixels.
    pub size: u32,
}

impl Region {
    /// Square region of side `size` centered at `(cx, cy)`.
    ///
    /// The caller guarantees the center is at least `size * 1.5` away from the
    /// buffer origin, which the padded coordinate space always satisfies.
    #[must_use]
    pub fn centered(cx: u32, cy: u32, size: u32) -> Self {
        Self {
            x: cx - size / 2,
            y: cy - size / 2,
            size,
        }
    }

    /// Center point of the region.
    #[must_use]
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.size / 2, self.y + self.size / 2)
    }

    /// Whether this region shares any pixel with `other`.
    #[must_use]
    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.x + other.size
            && other.x < self.x + self.size
            && self.y < other.y + other.size
            && other.y < self.y + self.size
    }
}

/// Compass offsets for the candidate ring, in tie-break order
/// (row-major: NW, N, NE, W, E, SW, S, SE).
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Enumerate the 8 candidate regions around `(cx, cy)` in padded coordinates.
///
/// Each candidate is a `patch_size` square whose center is offset from the
/// click center by one `patch_size` step along a compass direction. The order
/// is fixed and is the tie-break contract for patch selection.
#[must_use]
pub fn ring(cx: u32, cy: u32, patch_size: u32) -> [Region; 8] {
    NEIGHBOR_OFFSETS.map(|(dx, dy)| {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let ncx = (i64::from(cx) + i64::from(dx) * i64::from(patch_size)) as u32;
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let ncy = (i64::from(cy) + i64::from(dy) * i64::from(patch_size)) as u32;
        Region::centered(ncx, ncy, patch_size)
    })
}

/// Fold a coordinate back into `[0, len)` by edge reflection.
///
/// Reflection repeats the edge pixel (`cba|abc...`), matching the padding the
/// healing pipeline expects. The loop handles borders wider than the image.
fn reflect(mut v: i64, len: i64) -> i64 {
    debug_assert!(len > 0);
    loop {
        if v < 0 {
            v = -v - 1;
        } else if v >= len {
            v = 2 * len - 1 - v;
        } else {
            return v;
        }
    }
}

/// Extend `image` on all sides by `border` pixels of reflected content.
#[must_use]
pub fn pad_reflect(image: &RgbImage, border: u32) -> RgbImage {
    let (w, h) = (image.width(), image.height());
    let out_w = w + 2 * border;
    let out_h = h + 2 * border;

    RgbImage::from_fn(out_w, out_h, |x, y| {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let sx = reflect(i64::from(x) - i64::from(border), i64::from(w)) as u32;
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let sy = reflect(i64::from(y) - i64::from(border), i64::from(h)) as u32;
        *image.get_pixel(sx, sy)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn ring_returns_eight_patch_sized_regions() {
        let regions = ring(100, 100, 40);
        assert_eq!(regions.len(), 8);
        for r in &regions {
            assert_eq!(r.size, 40);
        }
    }

    #[test]
    fn ring_centers_are_one_patch_step_from_click() {
        let patch = 40;
        let regions = ring(200, 160, patch);
        for (r, (dx, dy)) in regions.iter().zip(NEIGHBOR_OFFSETS) {
            let (cx, cy) = r.center();
            assert_eq!(i64::from(cx), 200 + i64::from(dx) * i64::from(patch));
            assert_eq!(i64::from(cy), 160 + i64::from(dy) * i64::from(patch));
        }
    }

    #[test]
    fn ring_never_overlaps_center_region() {
        let center = Region::centered(100, 100, 40);
        for r in ring(100, 100, 40) {
            assert!(!r.overlaps(&center), "candidate {r:?} overlaps the click region");
        }
    }

    #[test]
    fn ring_order_is_row_major() {
        // NW first, SE last: the deterministic tie-break order.
        let regions = ring(100, 100, 40);
        assert_eq!(regions[0].center(), (60, 60));
        assert_eq!(regions[7].center(), (140, 140));
    }

    #[test]
    fn reflect_folds_into_range() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-2, 5), 1);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(6, 5), 3);
        assert_eq!(reflect(2, 5), 2);
        // Border wider than the image folds repeatedly
        assert_eq!(reflect(-4, 2), 0);
        assert_eq!(reflect(7, 2), 0);
    }

    #[test]
    fn pad_reflect_dimensions_and_edge_values() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, Rgb([10, 0, 0]));
        img.put_pixel(1, 0, Rgb([20, 0, 0]));
        img.put_pixel(2, 0, Rgb([30, 0, 0]));

        let padded = pad_reflect(&img, 2);
        assert_eq!(padded.width(), 7);
        assert_eq!(padded.height(), 6);

        // Interior is a straight copy
        assert_eq!(padded.get_pixel(2, 2), &Rgb([10, 0, 0]));
        // x = 0 maps to source x = 1, x = 1 maps to source x = 0
        assert_eq!(padded.get_pixel(0, 2), &Rgb([20, 0, 0]));
        assert_eq!(padded.get_pixel(1, 2), &Rgb([10, 0, 0]));
        // Right side mirrors the last column first
        assert_eq!(padded.get_pixel(5, 2), &Rgb([30, 0, 0]));
        assert_eq!(padded.get_pixel(6, 2), &Rgb([20, 0, 0]));
    }

    #[test]
    fn pad_reflect_preserves_flat_images() {
        let img = RgbImage::from_pixel(10, 10, Rgb([7, 8, 9]));
        let padded = pad_reflect(&img, 20);
        for px in padded.pixels() {
            assert_eq!(px, &Rgb([7, 8, 9]));
        }
    }
}
