//! Keyboard/tab traversal order for visible features.
//!
//! Features are grouped into latitude bands of `band_width_deg`. Bands run
//! north to south; inside a band features run west to east. The pass never
//! looks at the index, so the result does not depend on query order.

use core::cmp::Ordering;

use foundation::math::precision::{band_index, stable_total_cmp_f64};
use serde::{Deserialize, Serialize};

use crate::feature::ClusterFeature;

pub const DEFAULT_BAND_WIDTH_DEG: f64 = 10.0;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingOrder {
    pub band_width_deg: f64,
}

impl Default for ReadingOrder {
    fn default() -> Self {
        Self {
            band_width_deg: DEFAULT_BAND_WIDTH_DEG,
        }
    }
}

impl ReadingOrder {
    pub fn new(band_width_deg: f64) -> Self {
        Self { band_width_deg }
    }

    fn width(&self) -> f64 {
        if self.band_width_deg.is_finite() && self.band_width_deg > 0.0 {
            self.band_width_deg
        } else {
            DEFAULT_BAND_WIDTH_DEG
        }
    }

    pub fn band(&self, latitude: f64) -> i64 {
        band_index(latitude, self.width())
    }

    pub fn compare(&self, a: &ClusterFeature, b: &ClusterFeature) -> Ordering {
        let (pa, pb) = (a.position(), b.position());
        self.band(pb.lat)
            .cmp(&self.band(pa.lat))
            .then_with(|| stable_total_cmp_f64(pa.lng, pb.lng))
            .then_with(|| a.key().cmp(&b.key()))
    }

    pub fn sort(&self, features: &mut [ClusterFeature]) {
        features.sort_by(|a, b| self.compare(a, b));
    }

    pub fn sorted(&self, mut features: Vec<ClusterFeature>) -> Vec<ClusterFeature> {
        self.sort(&mut features);
        features
    }
}
