use serde::{Deserialize, Serialize};

use foundation::{LatLon, SpanLimits, Viewport, ViewportError};
use scene::MapStyle;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Client settings, usually supplied by the host page as JSON.
///
/// Every field is optional in the JSON; missing ones take the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for backend endpoints, e.g. `""` for same-origin or
    /// `"http://localhost:4567"`.
    pub base_url: String,
    /// Width and height of the square canvas.
    pub canvas_size_px: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Initial span in degrees of latitude.
    pub span: f64,
    pub min_span: f64,
    pub max_span: f64,
    /// Degrees of span per unit of wheel delta.
    pub zoom_sensitivity: f64,
    /// Period of the background refresh.
    pub refresh_interval_ms: u32,
    pub edge_width_px: f64,
    pub path_width_px: f64,
    pub endpoint_radius_px: f64,
    /// Max `tracing` level: trace, debug, info, warn or error.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            canvas_size_px: 600.0,
            center_lat: 41.8268,
            center_lon: -71.4025,
            span: 0.01,
            min_span: 0.001,
            max_span: 0.2,
            zoom_sensitivity: 0.000_01,
            refresh_interval_ms: 1000,
            edge_width_px: 1.0,
            path_width_px: 4.0,
            endpoint_radius_px: 5.0,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    Invalid { field: &'static str, reason: String },
    Viewport(ViewportError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
            ConfigError::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
            ConfigError::Viewport(err) => write!(f, "invalid initial viewport: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Viewport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ViewportError> for ConfigError {
    fn from(err: ViewportError) -> Self {
        ConfigError::Viewport(err)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive finite number, got {value}"),
        })
    }
}

impl ClientConfig {
    /// Parses and validates a JSON config. A blank string selects the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config = if json.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("canvas_size_px", self.canvas_size_px)?;
        if self.canvas_size_px.fract() != 0.0 || self.canvas_size_px > f64::from(u32::MAX) {
            return Err(ConfigError::Invalid {
                field: "canvas_size_px",
                reason: format!("expected a whole number of pixels, got {}", self.canvas_size_px),
            });
        }
        positive("edge_width_px", self.edge_width_px)?;
        positive("path_width_px", self.path_width_px)?;
        positive("endpoint_radius_px", self.endpoint_radius_px)?;
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "refresh_interval_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: format!("unknown level {:?}", self.log_level),
            });
        }
        self.viewport()?;
        Ok(())
    }

    pub fn span_limits(&self) -> SpanLimits {
        SpanLimits {
            min_span: self.min_span,
            max_span: self.max_span,
            zoom_sensitivity: self.zoom_sensitivity,
        }
    }

    pub fn viewport(&self) -> Result<Viewport, ViewportError> {
        Viewport::new(
            LatLon::new(self.center_lat, self.center_lon),
            self.span,
            self.span_limits(),
        )
    }

    pub fn style(&self) -> MapStyle {
        MapStyle {
            edge_width_px: self.edge_width_px,
            path_width_px: self.path_width_px,
            endpoint_radius_px: self.endpoint_radius_px,
            ..MapStyle::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ClientConfig, ConfigError};
    use foundation::ViewportError;

    #[test]
    fn blank_json_selects_defaults() {
        assert_eq!(ClientConfig::from_json("").unwrap(), ClientConfig::default());
        assert_eq!(ClientConfig::from_json("  \n").unwrap(), ClientConfig::default());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config =
            ClientConfig::from_json(r#"{"base_url": "http://localhost:4567", "span": 0.005}"#)
                .unwrap();
        assert_eq!(config.base_url, "http://localhost:4567");
        assert_eq!(config.span, 0.005);
        assert_eq!(config.canvas_size_px, 600.0);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ClientConfig::from_json(r#"{"canvas_size_px": 0}"#),
            Err(ConfigError::Invalid {
                field: "canvas_size_px",
                ..
            })
        ));
        assert!(matches!(
            ClientConfig::from_json(r#"{"canvas_size_px": 600.5}"#),
            Err(ConfigError::Invalid {
                field: "canvas_size_px",
                ..
            })
        ));
        assert!(ClientConfig::from_json(r#"{"canvas_size_px": 512}"#).is_ok());
        assert!(matches!(
            ClientConfig::from_json(r#"{"log_level": "loud"}"#),
            Err(ConfigError::Invalid {
                field: "log_level",
                ..
            })
        ));
        assert!(matches!(
            ClientConfig::from_json(r#"{"span": 0.5}"#),
            Err(ConfigError::Viewport(ViewportError::SpanOutOfBounds { .. }))
        ));
    }

    #[test]
    fn style_follows_widths() {
        let config = ClientConfig {
            path_width_px: 6.0,
            ..ClientConfig::default()
        };
        let style = config.style();
        assert_eq!(style.path_width_px, 6.0);
        assert_eq!(style.edge_width_px, 1.0);
    }
}
