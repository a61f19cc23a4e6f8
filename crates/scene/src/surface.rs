use serde::Serialize;

/// Straight RGBA colour, components in `0.0..=1.0`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const RED: Color = Color([0.85, 0.1, 0.1, 1.0]);
    pub const YELLOW: Color = Color([0.95, 0.8, 0.1, 1.0]);
    pub const GREEN: Color = Color([0.1, 0.65, 0.2, 1.0]);
    pub const BLUE: Color = Color([0.15, 0.35, 0.9, 1.0]);
    pub const PURPLE: Color = Color([0.55, 0.2, 0.75, 1.0]);

    pub fn css(&self) -> String {
        let [r, g, b, a] = self.0;
        let r = (r.clamp(0.0, 1.0) * 255.0).round() as u32;
        let g = (g.clamp(0.0, 1.0) * 255.0).round() as u32;
        let b = (b.clamp(0.0, 1.0) * 255.0).round() as u32;
        let a = a.clamp(0.0, 1.0);
        format!("rgba({r},{g},{b},{a})")
    }
}

/// Drawing capabilities the map core needs from a canvas.
///
/// Coordinates are canvas pixels.
pub trait RenderSurface {
    fn clear_rect(&mut self);
    fn draw_segment(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, width: f64);
    fn draw_circle(&mut self, x: f64, y: f64, radius: f64, color: Color);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    Segment {
        from: (f64, f64),
        to: (f64, f64),
        color: Color,
        width: f64,
    },
    Circle {
        center: (f64, f64),
        radius: f64,
        color: Color,
    },
}

/// Headless surface that records every call, for tests and replay.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Calls since the most recent clear, i.e. the current frame.
    pub fn frame(&self) -> &[DrawCall] {
        let start = self
            .calls
            .iter()
            .rposition(|c| *c == DrawCall::Clear)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.calls[start..]
    }

    pub fn segments(&self) -> Vec<&DrawCall> {
        self.frame()
            .iter()
            .filter(|c| matches!(c, DrawCall::Segment { .. }))
            .collect()
    }

    pub fn circles(&self) -> Vec<&DrawCall> {
        self.frame()
            .iter()
            .filter(|c| matches!(c, DrawCall::Circle { .. }))
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == DrawCall::Clear).count()
    }
}

impl RenderSurface for RecordingSurface {
    fn clear_rect(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn draw_segment(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, width: f64) {
        self.calls.push(DrawCall::Segment {
            from: (x1, y1),
            to: (x2, y2),
            color,
            width,
        });
    }

    fn draw_circle(&mut self, x: f64, y: f64, radius: f64, color: Color) {
        self.calls.push(DrawCall::Circle {
            center: (x, y),
            radius,
            color,
        });
    }
}
