//! Camera state for a pan/zoom map surface.
//!
//! A [`CameraState`] is the `(center, zoom)` pair the viewport animator owns.
//! Everything downstream (bounding boxes, cluster queries) is derived from it.

use serde::{Deserialize, Serialize};

use crate::bounds::{GeoBounds, clamp_between};

/// Latitude guard for the Mercator singularity at the poles (degrees).
pub const MAX_LATITUDE: f64 = 85.0;

pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
}

/// A geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn as_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Inclusive zoom interval.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    /// Builds a range, swapping the ends if they arrive inverted.
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Deserialized ranges skip [`Self::new`], so the ends are ordered here
    /// too.
    pub fn clamp(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min.min(self.max);
        }
        clamp_between(zoom, self.min, self.max)
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 1.0, max: 5.0 }
    }
}

/// Center + zoom of the camera.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LngLat,
    pub zoom: f64,
}

impl CameraState {
    pub fn new(center: LngLat, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn at(lng: f64, lat: f64, zoom: f64) -> Self {
        Self::new(LngLat::new(lng, lat), zoom)
    }

    /// Largest absolute per-channel difference: `(lng, lat, zoom)`.
    pub fn delta(&self, other: &CameraState) -> (f64, f64, f64) {
        (
            (self.center.lng - other.center.lng).abs(),
            (self.center.lat - other.center.lat).abs(),
            (self.zoom - other.zoom).abs(),
        )
    }
}

impl Default for CameraState {
    fn default() -> Self {
        CameraState::at(0.0, 20.0, 1.2)
    }
}

/// Limits every camera state must satisfy.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConstraints {
    pub zoom: ZoomRange,
    /// Optional pan limit for the center. Latitude is always clamped to
    /// ±[`MAX_LATITUDE`] on top of this.
    pub center_bounds: Option<GeoBounds>,
}

impl CameraConstraints {
    pub fn new(zoom: ZoomRange) -> Self {
        Self {
            zoom,
            center_bounds: None,
        }
    }

    pub fn apply(&self, camera: CameraState) -> CameraState {
        let mut center = camera.center;
        if let Some(bounds) = self.center_bounds {
            center = bounds.clamp(center);
        }
        center.lat = clamp_latitude(center.lat);
        CameraState::new(center, self.zoom.clamp(camera.zoom))
    }
}
