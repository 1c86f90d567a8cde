//! Cubic convolution resampling of RGBA source images.
//!
//! Each output pixel is the weighted sum of the 4×4 texels around the sample
//! point. Per-axis weights come from the cubic convolution kernel with
//! sharpness `a = -1`:
//!
//! ```text
//! w(d) = (a+2)|d|³ − (a+3)|d|² + 1       |d| < 1
//! w(d) = a|d|³ − 5a|d|² + 8a|d| − 4a     1 ≤ |d| < 2
//! w(d) = 0                               otherwise
//! ```
//!
//! Weights are not renormalised. With `a = -1` the kernel overshoots near hard
//! edges, so channel sums are truncated and clamped into `0..=255`.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::casting::{f64_to_channel, f64_to_floor_i64, i64_to_clamped_pixel, i64_to_pixel_index};

/// Sharpness parameter of the kernel.
pub const CUBIC_A: f64 = -1.0;

/// Fully transparent black.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// How texels outside the source image are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Outside texels contribute transparent black (0, 0, 0, 0).
    #[default]
    Transparent,
    /// Outside texels repeat the nearest edge texel.
    Clamp,
}

/// Cubic convolution weight for a signed distance `d` between sample and texel.
#[inline]
#[must_use]
pub fn cubic_weight(d: f64) -> f64 {
    let a = CUBIC_A;
    let d = d.abs();
    if d < 1.0 {
        (a + 2.0) * d * d * d - (a + 3.0) * d * d + 1.0
    } else if d < 2.0 {
        a * d * d * d - 5.0 * a * d * d + 8.0 * a * d - 4.0 * a
    } else {
        0.0
    }
}

/// Fetch a texel, applying `edge` for coordinates outside the image.
#[inline]
fn texel(source: &RgbaImage, x: i64, y: i64, edge: EdgePolicy) -> Rgba<u8> {
    match edge {
        EdgePolicy::Transparent => {
            match (i64_to_pixel_index(x, source.width()), i64_to_pixel_index(y, source.height())) {
                (Some(px), Some(py)) => *source.get_pixel(px, py),
                _ => TRANSPARENT,
            }
        }
        EdgePolicy::Clamp => {
            if source.width() == 0 || source.height() == 0 {
                return TRANSPARENT;
            }
            let px = i64_to_clamped_pixel(x, source.width());
            let py = i64_to_clamped_pixel(y, source.height());
            *source.get_pixel(px, py)
        }
    }
}

/// Sample `source` at the real-valued texel coordinate `(sx, sy)`.
///
/// Non-finite coordinates yield transparent black.
#[must_use]
pub fn sample_cubic(source: &RgbaImage, sx: f64, sy: f64, edge: EdgePolicy) -> Rgba<u8> {
    let (Some(ix), Some(iy)) = (f64_to_floor_i64(sx), f64_to_floor_i64(sy)) else {
        return TRANSPARENT;
    };

    let mut sum = [0.0_f64; 4];
    for y in (iy - 1)..=(iy + 2) {
        #[allow(clippy::cast_precision_loss)]
        let weight_y = cubic_weight(y as f64 - sy);
        if weight_y == 0.0 {
            continue;
        }
        for x in (ix - 1)..=(ix + 2) {
            #[allow(clippy::cast_precision_loss)]
            let weight = weight_y * cubic_weight(x as f64 - sx);
            if weight == 0.0 {
                continue;
            }
            let color = texel(source, x, y, edge);
            for (acc, &channel) in sum.iter_mut().zip(color.0.iter()) {
                *acc += f64::from(channel) * weight;
            }
        }
    }

    Rgba(sum.map(f64_to_channel))
}
