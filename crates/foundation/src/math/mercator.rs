//! Web-Mercator projection between geographic degrees and screen pixels.
//!
//! Two flavours live here:
//! - [`MercatorProjection`]: a camera-centered screen projection, used to turn a
//!   camera state plus a viewport size into a [`GeoBounds`].
//! - `unit_*` helpers: the same projection normalized to the unit square, used
//!   by spatial indexes that need a zoom-independent planar space.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::bounds::GeoBounds;
use crate::camera::{CameraState, LngLat, clamp_latitude};

/// Mercator ordinate of a latitude given in radians.
pub fn mercator_y(lat_rad: f64) -> f64 {
    (FRAC_PI_4 + lat_rad / 2.0).tan().ln()
}

/// Latitude in degrees for a Mercator ordinate.
pub fn inverse_mercator_y(y: f64) -> f64 {
    (2.0 * y.exp().atan() - FRAC_PI_2).to_degrees()
}

/// Screen projection centered on a camera.
///
/// Pixel space has its origin at the top-left corner of the viewport with y
/// growing downward, so north maps to smaller y. The effective scale is
/// `scale * camera.zoom`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MercatorProjection {
    scale: f64,
    translate: [f64; 2],
}

impl MercatorProjection {
    /// Returns `None` for degenerate geometry (non-positive or non-finite
    /// size, scale or zoom).
    pub fn centered(width: f64, height: f64, camera: &CameraState, scale: f64) -> Option<Self> {
        let k = scale * camera.zoom;
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(width) || !usable(height) || !usable(scale) || !usable(k) {
            return None;
        }

        let center_x = k * camera.center.lng.to_radians();
        let center_y = k * mercator_y(clamp_latitude(camera.center.lat).to_radians());
        Some(Self {
            scale: k,
            translate: [width / 2.0 - center_x, height / 2.0 + center_y],
        })
    }

    /// Geographic → pixel. Latitude is clamped before projecting.
    pub fn project(&self, p: LngLat) -> [f64; 2] {
        let x = self.translate[0] + self.scale * p.lng.to_radians();
        let y = self.translate[1] - self.scale * mercator_y(clamp_latitude(p.lat).to_radians());
        [x, y]
    }

    /// Pixel → geographic. Exactly inverts [`Self::project`] for unclamped
    /// latitudes; the result latitude is re-clamped.
    pub fn unproject(&self, px: [f64; 2]) -> LngLat {
        let lng = ((px[0] - self.translate[0]) / self.scale).to_degrees();
        let lat = inverse_mercator_y((self.translate[1] - px[1]) / self.scale);
        LngLat::new(lng, clamp_latitude(lat))
    }
}

/// Geographic box visible through a `width x height` viewport.
///
/// Corners come from the viewport edges `(0, 0)` and `(width, height)`
/// through the inverse transform. Degenerate input yields
/// [`GeoBounds::FULL_WORLD`].
pub fn bounds_for(width: f64, height: f64, camera: &CameraState, scale: f64) -> GeoBounds {
    let Some(projection) = MercatorProjection::centered(width, height, camera, scale) else {
        return GeoBounds::FULL_WORLD;
    };

    let top_left = projection.unproject([0.0, 0.0]);
    let bottom_right = projection.unproject([width, height]);
    GeoBounds::new(top_left.lng, bottom_right.lat, bottom_right.lng, top_left.lat)
}

/// Longitude → x in `[0, 1]`.
pub fn unit_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Latitude → y in `[0, 1]`, north at 0.
pub fn unit_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

pub fn unit_x_to_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

pub fn unit_y_to_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0).to_radians();
    (y2.exp().atan() * 360.0 / PI) - 90.0
}
