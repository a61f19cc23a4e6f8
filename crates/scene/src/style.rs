use crate::surface::Color;

/// Traffic weight above which an edge is drawn red.
pub const HEAVY_TRAFFIC: f64 = 5.0;
/// Traffic weight above which an edge is drawn yellow.
pub const MODERATE_TRAFFIC: f64 = 2.0;

/// Stroke and marker parameters for the map render pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapStyle {
    pub edge_width_px: f64,
    pub path_width_px: f64,
    pub endpoint_radius_px: f64,
    pub start_color: Color,
    pub finish_color: Color,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            edge_width_px: 1.0,
            path_width_px: 4.0,
            endpoint_radius_px: 5.0,
            start_color: Color::BLUE,
            finish_color: Color::PURPLE,
        }
    }
}

impl MapStyle {
    pub fn edge_width(&self, on_path: bool) -> f64 {
        if on_path {
            self.path_width_px
        } else {
            self.edge_width_px
        }
    }
}

pub fn traffic_color(weight: f64) -> Color {
    if weight > HEAVY_TRAFFIC {
        Color::RED
    } else if weight > MODERATE_TRAFFIC {
        Color::YELLOW
    } else {
        Color::GREEN
    }
}
