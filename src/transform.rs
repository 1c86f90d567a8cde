//! Coordinate transform capability between source pixels and Mercator meters.
//!
//! The real maps use a triangulated control-point mesh whose lookup lives
//! outside this crate. The pyramid code only relies on [`CoordTransform`]:
//!
//! - `inverse == false`: source pixel `[x, y]` → Mercator meters
//! - `inverse == true`: Mercator meters → source pixel
//!
//! `stateful` is forwarded untouched; mesh implementations use it to reuse the
//! previous triangle lookup between neighbouring points.

use crate::geometry::MercatorExtent;

/// A point the transform could not resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformError {
    /// The input point
    pub point: [f64; 2],
    /// Direction that failed
    pub inverse: bool,
    /// Human readable cause
    pub reason: String,
}

impl TransformError {
    pub fn new(point: [f64; 2], inverse: bool, reason: impl Into<String>) -> Self {
        Self { point, inverse, reason: reason.into() }
    }
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let direction = if self.inverse { "Mercator → pixel" } else { "pixel → Mercator" };
        write!(
            f,
            "{direction} transform of ({}, {}) failed: {}",
            self.point[0], self.point[1], self.reason
        )
    }
}

impl std::error::Error for TransformError {}

/// Forward/inverse mapping between source pixel space and Mercator space.
pub trait CoordTransform {
    /// Map `point` forward (pixel → Mercator) or, with `inverse`, back.
    ///
    /// # Errors
    /// Returns a [`TransformError`] when the point cannot be resolved.
    fn transform(&self, point: [f64; 2], inverse: bool, stateful: bool) -> Result<[f64; 2], TransformError>;
}

impl<T: CoordTransform + ?Sized> CoordTransform for &T {
    fn transform(&self, point: [f64; 2], inverse: bool, stateful: bool) -> Result<[f64; 2], TransformError> {
        (**self).transform(point, inverse, stateful)
    }
}

impl<T: CoordTransform + ?Sized> CoordTransform for Box<T> {
    fn transform(&self, point: [f64; 2], inverse: bool, stateful: bool) -> Result<[f64; 2], TransformError> {
        (**self).transform(point, inverse, stateful)
    }
}

/// Pixel coordinates are Mercator meters.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl CoordTransform for IdentityTransform {
    fn transform(&self, point: [f64; 2], _inverse: bool, _stateful: bool) -> Result<[f64; 2], TransformError> {
        Ok(point)
    }
}

/// Six-parameter affine mapping from pixels to Mercator meters.
///
/// `X = a·x + b·y + c`, `Y = d·x + e·y + f`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    coeffs: [f64; 6],
    det: f64,
}

impl AffineTransform {
    /// Build from `[a, b, c, d, e, f]`.
    ///
    /// # Errors
    /// Returns an error if the matrix is singular or a coefficient is not finite.
    pub fn new(coeffs: [f64; 6]) -> Result<Self, TransformError> {
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(TransformError::new([0.0, 0.0], false, "non-finite affine coefficient"));
        }
        let [a, b, _, d, e, _] = coeffs;
        let det = a * e - b * d;
        if det == 0.0 || !det.is_finite() {
            return Err(TransformError::new([0.0, 0.0], false, "singular affine matrix"));
        }
        Ok(Self { coeffs, det })
    }

    /// Stretch a `width × height` image north-up over `extent`.
    ///
    /// Pixel `(0, 0)` lands on the north-west corner and `(width, height)` on
    /// the south-east corner.
    ///
    /// # Errors
    /// Returns an error for an empty image or a degenerate extent.
    pub fn north_up(width: u32, height: u32, extent: MercatorExtent) -> Result<Self, TransformError> {
        if width == 0 || height == 0 {
            return Err(TransformError::new(
                [f64::from(width), f64::from(height)],
                false,
                "image has no pixels",
            ));
        }
        let sx = (extent.max_x - extent.min_x) / f64::from(width);
        let sy = (extent.max_y - extent.min_y) / f64::from(height);
        Self::new([sx, 0.0, extent.min_x, 0.0, -sy, extent.max_y])
    }
}

impl CoordTransform for AffineTransform {
    fn transform(&self, point: [f64; 2], inverse: bool, _stateful: bool) -> Result<[f64; 2], TransformError> {
        let [a, b, c, d, e, f] = self.coeffs;
        let [x, y] = point;
        let out = if inverse {
            let (dx, dy) = (x - c, y - f);
            [(e * dx - b * dy) / self.det, (a * dy - d * dx) / self.det]
        } else {
            [a * x + b * y + c, d * x + e * y + f]
        };
        if out[0].is_finite() && out[1].is_finite() {
            Ok(out)
        } else {
            Err(TransformError::new(point, inverse, "result is not finite"))
        }
    }
}
