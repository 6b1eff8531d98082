use foundation::ids::ClusterId;
use serde::{Deserialize, Serialize};

use crate::error::ClusterError;

/// Index-build configuration. Fixed for the lifetime of a [`ClusterIndex`].
///
/// [`ClusterIndex`]: crate::ClusterIndex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    /// Aggregation radius in pixels of a tile of `extent` pixels.
    pub radius: f64,
    /// Tile extent the radius is measured against.
    pub extent: f64,
    /// Coarsest zoom that gets aggregates.
    pub min_zoom: u8,
    /// Finest zoom that gets aggregates; above it every point is a singleton.
    pub max_zoom: u8,
    /// Smallest group that forms an aggregate.
    pub min_points: usize,
    /// Leaf size of the spatial tree.
    pub node_size: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius: 60.0,
            extent: 512.0,
            min_zoom: 0,
            max_zoom: 6,
            min_points: 2,
            node_size: 64,
        }
    }
}

impl ClusterOptions {
    pub fn validate(&self) -> Result<(), ClusterError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ClusterError::InvalidOptions(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(ClusterError::InvalidOptions(format!(
                "extent must be positive, got {}",
                self.extent
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ClusterError::InvalidOptions(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        // The raw-point level sits at max_zoom + 1 and must fit in a ClusterId.
        if self.max_zoom >= ClusterId::MAX_ORIGIN_ZOOM {
            return Err(ClusterError::InvalidOptions(format!(
                "max_zoom must be below {}, got {}",
                ClusterId::MAX_ORIGIN_ZOOM,
                self.max_zoom
            )));
        }
        if self.min_points < 2 {
            return Err(ClusterError::InvalidOptions(
                "min_points must be at least 2".to_string(),
            ));
        }
        if self.node_size == 0 {
            return Err(ClusterError::InvalidOptions(
                "node_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Aggregation radius at `zoom` in unit-square coordinates.
    pub fn unit_radius(&self, zoom: u8) -> f64 {
        self.radius / (self.extent * 2f64.powi(i32::from(zoom)))
    }

    /// Rounds a (possibly fractional) camera zoom to an index level and clamps
    /// it into `[min_zoom, max_zoom + 1]`.
    pub fn level_for(&self, zoom: f64) -> u8 {
        let max_level = f64::from(self.max_zoom) + 1.0;
        if zoom.is_nan() {
            return self.min_zoom;
        }
        zoom.round().clamp(f64::from(self.min_zoom), max_level) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::ClusterOptions;
    use crate::error::ClusterError;

    #[test]
    fn defaults_validate() {
        assert_eq!(ClusterOptions::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_options() {
        let bad = [
            ClusterOptions {
                radius: 0.0,
                ..Default::default()
            },
            ClusterOptions {
                min_zoom: 4,
                max_zoom: 3,
                ..Default::default()
            },
            ClusterOptions {
                max_zoom: 31,
                ..Default::default()
            },
            ClusterOptions {
                min_points: 1,
                ..Default::default()
            },
        ];
        for opts in bad {
            assert!(matches!(opts.validate(), Err(ClusterError::InvalidOptions(_))));
        }
    }

    #[test]
    fn level_rounds_instead_of_truncating() {
        let opts = ClusterOptions::default();
        assert_eq!(opts.level_for(2.49), 2);
        assert_eq!(opts.level_for(2.5), 3);
        assert_eq!(opts.level_for(2.9), 3);
    }

    #[test]
    fn level_clamps_to_supported_range() {
        let opts = ClusterOptions {
            min_zoom: 1,
            max_zoom: 6,
            ..Default::default()
        };
        assert_eq!(opts.level_for(-3.0), 1);
        assert_eq!(opts.level_for(42.0), 7);
        assert_eq!(opts.level_for(f64::INFINITY), 7);
        assert_eq!(opts.level_for(f64::NAN), 1);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let opts: ClusterOptions = serde_json::from_str(r#"{"radius": 40}"#).unwrap();
        assert_eq!(opts.radius, 40.0);
        assert_eq!(opts.max_zoom, 6);
    }
}
