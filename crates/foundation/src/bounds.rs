use serde::{Deserialize, Serialize};

use crate::camera::{LngLat, MAX_LATITUDE};

/// Axis-aligned box in an arbitrary planar space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }
}

/// Geographic rectangle in degrees: `(min_lng, min_lat, max_lng, max_lat)`.
///
/// Longitudes are not wrapped; a box derived from a wide viewport may extend
/// past ±180°. Consumers that need a wrapped query split it themselves.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// Everything visible; also the fallback for unknown viewport geometry.
    pub const FULL_WORLD: GeoBounds = GeoBounds {
        min_lng: -180.0,
        min_lat: -MAX_LATITUDE,
        max_lng: 180.0,
        max_lat: MAX_LATITUDE,
    };

    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }

    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.min_lng + self.max_lng) * 0.5,
            (self.min_lat + self.max_lat) * 0.5,
        )
    }

    /// Inclusive containment, no antimeridian wrapping.
    pub fn contains(&self, p: LngLat) -> bool {
        p.lng >= self.min_lng && p.lng <= self.max_lng && p.lat >= self.min_lat && p.lat <= self.max_lat
    }

    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }

    /// The same box with each axis ordered `min <= max`.
    pub fn normalized(&self) -> GeoBounds {
        GeoBounds::new(
            self.min_lng.min(self.max_lng),
            self.min_lat.min(self.max_lat),
            self.min_lng.max(self.max_lng),
            self.min_lat.max(self.max_lat),
        )
    }

    /// Clamp a point into the box. Inverted edges are read in order.
    pub fn clamp(&self, p: LngLat) -> LngLat {
        LngLat::new(
            clamp_between(p.lng, self.min_lng, self.max_lng),
            clamp_between(p.lat, self.min_lat, self.max_lat),
        )
    }
}

/// `v` pulled into `[min(a, b), max(a, b)]`. NaN operands fall back to the
/// other side instead of panicking.
pub(crate) fn clamp_between(v: f64, a: f64, b: f64) -> f64 {
    v.max(a.min(b)).min(a.max(b))
}

#[cfg(test)]
mod tests {
    use super::{Aabb2, GeoBounds};
    use crate::camera::LngLat;

    #[test]
    fn full_world_matches_mercator_limits() {
        assert_eq!(GeoBounds::FULL_WORLD.as_array(), [-180.0, -85.0, 180.0, 85.0]);
        assert_eq!(GeoBounds::FULL_WORLD.width(), 360.0);
        assert_eq!(GeoBounds::FULL_WORLD.height(), 170.0);
    }

    #[test]
    fn contains_is_inclusive() {
        let b = GeoBounds::new(-10.0, -5.0, 10.0, 5.0);
        assert!(b.contains(LngLat::new(10.0, 5.0)));
        assert!(b.contains(LngLat::new(0.0, 0.0)));
        assert!(!b.contains(LngLat::new(10.5, 0.0)));
        assert_eq!(b.center(), LngLat::new(0.0, 0.0));
    }

    #[test]
    fn clamp_pulls_point_inside() {
        let b = GeoBounds::new(-10.0, -5.0, 10.0, 5.0);
        assert_eq!(b.clamp(LngLat::new(50.0, -60.0)), LngLat::new(10.0, -5.0));
    }

    #[test]
    fn clamp_tolerates_inverted_and_nan_edges() {
        let inverted = GeoBounds::new(20.0, 10.0, -20.0, -10.0);
        assert_eq!(inverted.clamp(LngLat::new(50.0, -60.0)), LngLat::new(20.0, -10.0));
        assert_eq!(inverted.normalized(), GeoBounds::new(-20.0, -10.0, 20.0, 10.0));

        let nan = GeoBounds::new(f64::NAN, -5.0, 10.0, f64::NAN);
        assert!(!nan.is_finite());
        assert_eq!(nan.clamp(LngLat::new(50.0, -60.0)), LngLat::new(10.0, -5.0));
    }

    #[test]
    fn aabb2_contains_edges() {
        let a = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        assert!(a.contains([1.0, 0.0]));
        assert!(!a.contains([1.0001, 0.5]));
    }
}
