use tracing::debug;

use crate::math::{GeoTransform, LatLon, degree_lon};

/// Span bounds and wheel sensitivity for a [`Viewport`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpanLimits {
    pub min_span: f64,
    pub max_span: f64,
    /// Degrees of span removed per unit of wheel delta.
    pub zoom_sensitivity: f64,
}

impl Default for SpanLimits {
    fn default() -> Self {
        Self {
            min_span: 0.001,
            max_span: 0.2,
            zoom_sensitivity: 0.000_01,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportError {
    NonFinite,
    InvalidLimits { min: f64, max: f64 },
    SpanOutOfBounds { span: f64, min: f64, max: f64 },
    LatitudeOutOfRange(f64),
}

impl std::fmt::Display for ViewportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewportError::NonFinite => write!(f, "viewport values must be finite"),
            ViewportError::InvalidLimits { min, max } => {
                write!(f, "invalid span limits: min={min} max={max}")
            }
            ViewportError::SpanOutOfBounds { span, min, max } => {
                write!(f, "span {span} outside [{min}, {max}]")
            }
            ViewportError::LatitudeOutOfRange(lat) => {
                write!(f, "center latitude {lat} outside (-90, 90)")
            }
        }
    }
}

impl std::error::Error for ViewportError {}

/// Visible geographic window: a centre plus the span in degrees on each axis.
///
/// Invariant: `limits.min_span <= span <= limits.max_span`, and every field is
/// finite. Operations that would break it leave the viewport untouched and
/// report `false`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    center: LatLon,
    span: f64,
    limits: SpanLimits,
}

impl Viewport {
    pub fn new(center: LatLon, span: f64, limits: SpanLimits) -> Result<Self, ViewportError> {
        if !center.is_finite()
            || !span.is_finite()
            || !limits.min_span.is_finite()
            || !limits.max_span.is_finite()
            || !limits.zoom_sensitivity.is_finite()
        {
            return Err(ViewportError::NonFinite);
        }
        if limits.min_span <= 0.0 || limits.min_span > limits.max_span {
            return Err(ViewportError::InvalidLimits {
                min: limits.min_span,
                max: limits.max_span,
            });
        }
        if span < limits.min_span || span > limits.max_span {
            return Err(ViewportError::SpanOutOfBounds {
                span,
                min: limits.min_span,
                max: limits.max_span,
            });
        }
        if center.lat.abs() >= 90.0 {
            return Err(ViewportError::LatitudeOutOfRange(center.lat));
        }
        Ok(Self {
            center,
            span,
            limits,
        })
    }

    pub fn center(&self) -> LatLon {
        self.center
    }

    pub fn span(&self) -> f64 {
        self.span
    }

    pub fn limits(&self) -> SpanLimits {
        self.limits
    }

    pub fn transform(&self, size_px: f64) -> GeoTransform {
        GeoTransform::new(self.center, self.span, size_px)
    }

    /// Longitude span corrected for the current centre latitude.
    pub fn degree_lon(&self) -> f64 {
        degree_lon(self.span, self.center.lat)
    }

    /// Moves the centre by a pointer delta on a canvas of `size_px` pixels.
    ///
    /// Returns `true` if the centre changed.
    pub fn pan(&mut self, dx_px: f64, dy_px: f64, size_px: f64) -> bool {
        if !size_px.is_finite() || size_px <= 0.0 {
            debug!(size_px, "pan ignored: bad canvas size");
            return false;
        }
        let next = LatLon {
            lat: self.center.lat + (-dy_px / size_px) * self.span,
            lon: self.center.lon + (dx_px / size_px) * self.degree_lon(),
        };
        if !next.is_finite() || next.lat.abs() >= 90.0 {
            debug!(dx_px, dy_px, "pan rejected");
            return false;
        }
        if next == self.center {
            return false;
        }
        self.center = next;
        true
    }

    /// Narrows (positive delta) or widens (negative delta) the span.
    ///
    /// The candidate span must lie strictly inside the limits; anything else
    /// is ignored. Returns `true` if the span changed.
    pub fn zoom(&mut self, wheel_delta: f64) -> bool {
        let candidate = self.span - self.limits.zoom_sensitivity * wheel_delta;
        if !candidate.is_finite() {
            debug!(wheel_delta, "zoom rejected: non-finite span");
            return false;
        }
        if candidate <= self.limits.min_span || candidate >= self.limits.max_span {
            debug!(wheel_delta, candidate, "zoom ignored: span out of bounds");
            return false;
        }
        if candidate == self.span {
            return false;
        }
        self.span = candidate;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{SpanLimits, Viewport, ViewportError};
    use crate::math::LatLon;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn limits() -> SpanLimits {
        SpanLimits {
            min_span: 0.001,
            max_span: 0.1,
            zoom_sensitivity: 0.0001,
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(LatLon::new(41.8268, -71.4025), 0.005, limits()).unwrap()
    }

    #[test]
    fn rejects_out_of_bounds_initial_span() {
        let err = Viewport::new(LatLon::new(0.0, 0.0), 0.5, limits()).unwrap_err();
        assert!(matches!(err, ViewportError::SpanOutOfBounds { .. }));
        let err = Viewport::new(LatLon::new(f64::NAN, 0.0), 0.005, limits()).unwrap_err();
        assert_eq!(err, ViewportError::NonFinite);
    }

    #[test]
    fn pan_down_moves_center_south() {
        let mut v = viewport();
        assert!(v.pan(0.0, 60.0, 600.0));
        assert_close(v.center().lat, 41.8268 - 0.1 * 0.005, 1e-12);
        assert_close(v.center().lon, -71.4025, 1e-12);
    }

    #[test]
    fn pan_right_uses_latitude_corrected_longitude() {
        let mut v = viewport();
        let dlon = v.degree_lon();
        assert!(v.pan(300.0, 0.0, 600.0));
        assert_close(v.center().lon, -71.4025 + 0.5 * dlon, 1e-12);
        assert!(dlon > v.span());
    }

    #[test]
    fn pan_rejects_non_finite_deltas() {
        let mut v = viewport();
        let before = v;
        assert!(!v.pan(f64::NAN, 0.0, 600.0));
        assert!(!v.pan(f64::INFINITY, 0.0, 600.0));
        assert!(!v.pan(10.0, 10.0, 0.0));
        assert_eq!(v, before);
    }

    #[test]
    fn pan_cannot_cross_a_pole() {
        let mut v = Viewport::new(LatLon::new(89.99, 0.0), 0.05, limits()).unwrap();
        assert!(!v.pan(0.0, -600.0, 600.0));
        assert_close(v.center().lat, 89.99, 1e-12);
    }

    #[test]
    fn zoom_applies_inside_bounds() {
        let mut v = viewport();
        assert!(v.zoom(10.0));
        assert_close(v.span(), 0.004, 1e-12);
        assert!(v.zoom(-20.0));
        assert_close(v.span(), 0.006, 1e-12);
    }

    #[test]
    fn zoom_past_a_bound_leaves_span_unchanged() {
        let mut v = viewport();
        assert!(!v.zoom(45.0));
        assert_close(v.span(), 0.005, 1e-12);
        assert!(!v.zoom(-1_000.0));
        assert_close(v.span(), 0.005, 1e-12);
        assert!(!v.zoom(f64::NAN));
        assert_close(v.span(), 0.005, 1e-12);
    }

    #[test]
    fn zoom_bounds_are_exclusive() {
        let limits = SpanLimits {
            min_span: 0.5,
            max_span: 2.0,
            zoom_sensitivity: 0.25,
        };
        let mut v = Viewport::new(LatLon::new(0.0, 0.0), 1.0, limits).unwrap();
        assert!(!v.zoom(2.0));
        assert!(!v.zoom(-4.0));
        assert_eq!(v.span(), 1.0);
        assert!(v.zoom(1.0));
        assert_eq!(v.span(), 0.75);
    }
}
