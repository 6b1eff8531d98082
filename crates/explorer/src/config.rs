use std::collections::BTreeSet;

use clustering::{ClusterOptions, LocationPoint, ReadingOrder};
use foundation::bounds::GeoBounds;
use foundation::camera::{CameraConstraints, CameraState, LngLat, ZoomRange};
use serde::{Deserialize, Serialize};
use tracing::warn;
use viewport::MotionConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "failed to parse config: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Named camera preset shown in the region menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub label: String,
    pub center: LngLat,
    pub zoom: f64,
}

impl Region {
    pub fn camera(&self) -> CameraState {
        CameraState::new(self.center, self.zoom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Base projection scale at zoom 1.
    pub projection_scale: f64,
    pub default_view: CameraState,
    pub zoom: ZoomRange,
    /// Optional pan limit for the camera center.
    pub center_bounds: Option<GeoBounds>,
    /// Factor applied by the zoom buttons.
    pub zoom_step: f64,
    /// Zoom a selected location is brought to.
    pub select_zoom: f64,
    pub cluster: ClusterOptions,
    pub reading_order: ReadingOrder,
    pub motion: MotionConfig,
    pub regions: Vec<Region>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            projection_scale: 140.0,
            default_view: CameraState::at(0.0, 20.0, 1.2),
            zoom: ZoomRange::new(1.0, 5.0),
            center_bounds: None,
            zoom_step: 1.5,
            select_zoom: 3.0,
            cluster: ClusterOptions::default(),
            reading_order: ReadingOrder::default(),
            motion: MotionConfig::default(),
            regions: Vec::new(),
        }
    }
}

impl ExplorerConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: ExplorerConfig =
            serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validated()
    }

    /// Checks the config, repairing what can be repaired.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if !(self.projection_scale.is_finite() && self.projection_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "projection_scale must be positive, got {}",
                self.projection_scale
            )));
        }
        if !(self.zoom.min.is_finite() && self.zoom.max.is_finite()) {
            return Err(ConfigError::Invalid("zoom range must be finite".to_string()));
        }
        if self.zoom.min > self.zoom.max {
            warn!(
                min = self.zoom.min,
                max = self.zoom.max,
                "inverted zoom range, swapping"
            );
            self.zoom = ZoomRange::new(self.zoom.min, self.zoom.max);
        }
        if let Some(bounds) = self.center_bounds {
            if !bounds.is_finite() {
                return Err(ConfigError::Invalid("center_bounds must be finite".to_string()));
            }
            let ordered = bounds.normalized();
            if ordered != bounds {
                warn!(?bounds, "inverted center_bounds, swapping");
                self.center_bounds = Some(ordered);
            }
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ConfigError::Invalid(format!(
                "zoom_step must be greater than 1, got {}",
                self.zoom_step
            )));
        }
        if !self.select_zoom.is_finite() {
            return Err(ConfigError::Invalid("select_zoom must be finite".to_string()));
        }
        self.cluster
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let mut seen = BTreeSet::new();
        for region in &self.regions {
            if !seen.insert(region.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate region id {:?}",
                    region.id
                )));
            }
        }
        Ok(self)
    }

    pub fn constraints(&self) -> CameraConstraints {
        CameraConstraints {
            zoom: self.zoom,
            center_bounds: self.center_bounds,
        }
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }
}

/// Parses a JSON array of location records.
pub fn locations_from_json_str(s: &str) -> Result<Vec<LocationPoint>, ConfigError> {
    serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
}
