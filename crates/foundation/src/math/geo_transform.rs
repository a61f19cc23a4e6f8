/// Kilometres per degree of latitude.
pub const KM_PER_DEG_LAT: f64 = 110.574;
/// Kilometres per degree of longitude at the equator.
pub const KM_PER_DEG_LON_EQUATOR: f64 = 111.320;

/// Geographic point in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Canvas position in pixels, origin top-left, y growing downwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Linear mapping between degrees and pixels for one view of a square canvas.
///
/// The visible window is `span` degrees on each axis, centred on `center`.
/// Screen y is flipped so that north is up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoTransform {
    center: LatLon,
    span: f64,
    size_px: f64,
}

impl GeoTransform {
    pub fn new(center: LatLon, span: f64, size_px: f64) -> Self {
        Self {
            center,
            span,
            size_px,
        }
    }

    pub fn size_px(&self) -> f64 {
        self.size_px
    }

    pub fn px_per_degree(&self) -> f64 {
        self.size_px / self.span
    }

    pub fn forward(&self, p: LatLon) -> ScreenPoint {
        let scale = self.px_per_degree();
        let half = self.span / 2.0;
        ScreenPoint {
            x: (p.lon - self.center.lon + half) * scale,
            y: self.size_px - (p.lat - self.center.lat + half) * scale,
        }
    }

    pub fn inverse(&self, p: ScreenPoint) -> LatLon {
        let scale = self.px_per_degree();
        let half = self.span / 2.0;
        LatLon {
            lat: (self.size_px - p.y) / scale - half + self.center.lat,
            lon: p.x / scale - half + self.center.lon,
        }
    }
}

/// Degrees of longitude covering the same ground distance as `span` degrees
/// of latitude at `lat_deg`.
pub fn degree_lon(span: f64, lat_deg: f64) -> f64 {
    span * KM_PER_DEG_LAT / (KM_PER_DEG_LON_EQUATOR * lat_deg.to_radians().cos())
}

#[cfg(test)]
mod tests {
    use super::{GeoTransform, LatLon, ScreenPoint, degree_lon};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn providence() -> GeoTransform {
        GeoTransform::new(LatLon::new(41.8268, -71.4025), 0.005, 600.0)
    }

    #[test]
    fn center_maps_to_canvas_middle() {
        let t = providence();
        let p = t.forward(LatLon::new(41.8268, -71.4025));
        assert_close(p.x, 300.0, 1e-6);
        assert_close(p.y, 300.0, 1e-6);
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let t = providence();
        let north = t.forward(LatLon::new(41.8278, -71.4025));
        let east = t.forward(LatLon::new(41.8268, -71.4015));
        assert!(north.y < 300.0);
        assert!(east.x > 300.0);
    }

    #[test]
    fn corners_span_the_canvas() {
        let t = providence();
        let top_left = t.forward(LatLon::new(41.8268 + 0.0025, -71.4025 - 0.0025));
        assert_close(top_left.x, 0.0, 1e-6);
        assert_close(top_left.y, 0.0, 1e-6);
    }

    #[test]
    fn inverse_undoes_forward() {
        let t = GeoTransform::new(LatLon::new(-33.86, 151.21), 0.02, 512.0);
        let g = LatLon::new(-33.861, 151.213);
        let back = t.inverse(t.forward(g));
        assert_close(back.lat, g.lat, 1e-9);
        assert_close(back.lon, g.lon, 1e-9);
    }

    #[test]
    fn forward_undoes_inverse() {
        let t = providence();
        for p in [
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(599.5, 0.25),
            ScreenPoint::new(123.0, 456.0),
        ] {
            let back = t.forward(t.inverse(p));
            assert_close(back.x, p.x, 1e-6);
            assert_close(back.y, p.y, 1e-6);
        }
    }

    #[test]
    fn degree_lon_grows_with_latitude() {
        assert_close(degree_lon(1.0, 0.0), 110.574 / 111.320, 1e-12);
        assert!(degree_lon(1.0, 60.0) > 1.9 * degree_lon(1.0, 0.0));
        assert_close(degree_lon(1.0, -45.0), degree_lon(1.0, 45.0), 1e-12);
    }
}
