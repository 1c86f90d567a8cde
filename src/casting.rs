//! Checked numeric conversions for pixel and tile arithmetic.
//!
//! # Design Decisions
//!
//! ## Tile coordinates (`f64` → `i64`)
//! Global pixel positions are floor-divided by the tile size. The intermediate
//! stays signed so that footprints hanging off the west or north edge of the
//! world can be detected before clipping.
//!
//! ## Channel values (`f64` → `u8`)
//! Cubic convolution overshoots near hard edges. Sums are truncated toward
//! zero and then clamped into `0..=255`, so an overshoot saturates instead of
//! wrapping around.
//!
//! ## Source pixel lookups (`i64` → `u32`)
//! Resampling neighbours can be negative or past the image edge; lookups go
//! through [`i64_to_pixel_index`] which rejects both.

use crate::geometry::TILE_SIZE;

/// Floor a global pixel position to a signed tile coordinate.
///
/// Returns `None` for NaN or infinite input, or values beyond `i64`.
#[inline]
#[must_use]
pub fn f64_to_tile_coord(global_px: f64) -> Option<i64> {
    let tile = (global_px / f64::from(TILE_SIZE)).floor();
    if !tile.is_finite() || tile < i64::MIN as f64 || tile > i64::MAX as f64 {
        return None;
    }
    // Safety: finite and range-checked above
    #[allow(clippy::cast_possible_truncation)]
    let coord = tile as i64;
    Some(coord)
}

/// Clamp a signed tile coordinate into `0..=last`.
#[inline]
#[must_use]
pub fn i64_to_clamped_u32(value: i64, last: i64) -> u32 {
    let clamped = value.clamp(0, last.clamp(0, i64::from(u32::MAX)));
    // Safety: clamped into u32 range above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = clamped as u32;
    value
}

/// Floor a real source coordinate to the integer texel it falls in.
///
/// Non-finite input maps to `None`.
#[inline]
#[must_use]
pub fn f64_to_floor_i64(value: f64) -> Option<i64> {
    let floored = value.floor();
    if !floored.is_finite() || floored < i64::MIN as f64 || floored > i64::MAX as f64 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let texel = floored as i64;
    Some(texel)
}

/// Convert a signed texel coordinate to an index, returning `None` outside `0..max_value`.
#[inline]
#[must_use]
pub fn i64_to_pixel_index(value: i64, max_value: u32) -> Option<u32> {
    if value < 0 || value >= i64::from(max_value) {
        return None;
    }
    // Safety: 0 <= value < max_value <= u32::MAX
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = value as u32;
    Some(index)
}

/// Clamp a signed texel coordinate into `0..max_value`.
#[inline]
#[must_use]
pub fn i64_to_clamped_pixel(value: i64, max_value: u32) -> u32 {
    i64_to_clamped_u32(value, i64::from(max_value) - 1)
}

/// Store a weighted channel sum into a byte: truncate toward zero, then clamp.
#[inline]
#[must_use]
pub fn f64_to_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    // Safety: clamped into 0..=255 before the cast
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let channel = value.trunc().clamp(0.0, 255.0) as u8;
    channel
}

/// Convert a signed zoom computation to a zoom level, returning `None` if negative or above `u8`.
#[inline]
#[must_use]
pub fn i64_to_zoom(value: i64) -> Option<u8> {
    u8::try_from(value).ok()
}
