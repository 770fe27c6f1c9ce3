use crate::{
    error::{ViewerError, ViewerResult},
    types::{LatLng, Millis},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable consulted for the map access token.
pub const ACCESS_TOKEN_ENV: &str = "LIVEMAP_ACCESS_TOKEN";

/// Inclusive integer range a speed class is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: u32,
    pub max: u32,
}

impl SpeedRange {
    pub const SLOW: SpeedRange = SpeedRange { min: 5, max: 15 };
    pub const FAST: SpeedRange = SpeedRange { min: 50, max: 70 };

    pub fn contains(&self, speed: u32) -> bool {
        (self.min..=self.max).contains(&speed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub entity_count: usize,
    pub center: LatLng,
    /// Half-width in degrees of the square entities spawn in.
    pub jitter_radius: f64,
    pub snapshot_delay_ms: Millis,
    pub update_interval_ms: Millis,
    /// Degrees of travel per tick per unit of speed class.
    pub base_movement_factor: f64,
    pub slow_speed: SpeedRange,
    pub fast_speed: SpeedRange,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            entity_count: 100,
            center: LatLng::new(-6.2, 106.8),
            jitter_radius: 0.1,
            snapshot_delay_ms: 100,
            update_interval_ms: 1000,
            base_movement_factor: 0.00009,
            slow_speed: SpeedRange::SLOW,
            fast_speed: SpeedRange::FAST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupAnchor {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    pub close_button: bool,
    /// Whether the backend itself closes the popup on any map click.
    /// The view decides that instead, so this stays off.
    pub close_on_click: bool,
    pub anchor: PopupAnchor,
    /// Pixel offset `[x, y]` from the anchor point.
    pub offset: [f64; 2],
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            close_button: true,
            close_on_click: false,
            anchor: PopupAnchor::Bottom,
            offset: [0.0, -15.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub access_token: Option<String>,
    pub style: String,
    /// Initial camera center as `[lng, lat]`.
    pub center: [f64; 2],
    pub zoom: f64,
    pub ease_duration_ms: Millis,
    pub popup: PopupConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            style: "mapbox://styles/mapbox/streets-v11".into(),
            center: [106.8456, -6.2088],
            zoom: 11.0,
            ease_duration_ms: 1000,
            popup: PopupConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub seed: u64,
    pub simulation: SimulationConfig,
    pub map: MapConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            simulation: SimulationConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Load from a JSON file such as `data/viewer.json`.
    /// In tests, use ViewerConfig::default_test().
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))
    }

    /// Parse and validate a config document.
    pub fn from_json(content: &str) -> ViewerResult<Self> {
        let config: ViewerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Take the access token from the environment when one is set there.
    pub fn apply_env(mut self) -> Self {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.map.access_token = Some(token);
            }
        }
        self
    }

    /// Reject configs the feed or the view cannot run with.
    /// A missing access token is not an error here; the view degrades instead.
    pub fn validate(&self) -> ViewerResult<()> {
        let sim = &self.simulation;
        if sim.update_interval_ms == 0 {
            return Err(invalid("simulation.update_interval_ms", "must be > 0"));
        }
        if sim.update_interval_ms <= sim.snapshot_delay_ms {
            return Err(invalid(
                "simulation.update_interval_ms",
                format!(
                    "must exceed snapshot_delay_ms ({}) so the snapshot lands first",
                    sim.snapshot_delay_ms
                ),
            ));
        }
        if !(sim.jitter_radius >= 0.0) {
            return Err(invalid("simulation.jitter_radius", "must be >= 0"));
        }
        if !(sim.base_movement_factor >= 0.0) {
            return Err(invalid("simulation.base_movement_factor", "must be >= 0"));
        }
        for (field, range) in [
            ("simulation.slow_speed", sim.slow_speed),
            ("simulation.fast_speed", sim.fast_speed),
        ] {
            if range.min > range.max {
                return Err(invalid(field, format!("min {} > max {}", range.min, range.max)));
            }
        }
        if sim.slow_speed.max >= sim.fast_speed.min {
            return Err(invalid(
                "simulation.fast_speed",
                "must lie entirely above slow_speed",
            ));
        }
        if self.map.ease_duration_ms == 0 {
            return Err(invalid("map.ease_duration_ms", "must be > 0"));
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            seed: 0xC0FF_EE00,
            simulation: SimulationConfig {
                entity_count: 10,
                ..SimulationConfig::default()
            },
            map: MapConfig {
                access_token: Some("pk.test-token".into()),
                ..MapConfig::default()
            },
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ViewerError {
    ViewerError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ViewerConfig::default().validate().expect("defaults are valid");
        ViewerConfig::default_test().validate().expect("test defaults are valid");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "seed": 7, "simulation": { "entity_count": 3 } }"#;
        let config: ViewerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.simulation.entity_count, 3);
        assert_eq!(config.simulation.update_interval_ms, 1000);
        assert_eq!(config.map.popup.anchor, PopupAnchor::Bottom);
        assert!(config.map.access_token.is_none());
    }

    #[test]
    fn overlapping_speed_ranges_are_rejected() {
        let mut config = ViewerConfig::default_test();
        config.simulation.fast_speed = SpeedRange { min: 10, max: 20 };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ViewerError::InvalidConfig { field: "simulation.fast_speed", .. }
        ));
    }

    #[test]
    fn update_interval_must_follow_snapshot_delay() {
        let mut config = ViewerConfig::default_test();
        config.simulation.snapshot_delay_ms = 1000;
        config.simulation.update_interval_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = ViewerConfig::from_json("{ \"seed\": \"x\" }").unwrap_err();
        assert!(matches!(err, ViewerError::Serialization(_)), "{err}");
    }

    #[test]
    fn bundled_config_is_valid() {
        let json = include_str!("../../data/viewer.json");
        let config = ViewerConfig::from_json(json).expect("bundled config");
        assert_eq!(config.simulation.entity_count, 100);
        assert_eq!(config.map.popup.offset, [0.0, -15.0]);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ViewerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("Cannot read"), "{err}");
    }
}
