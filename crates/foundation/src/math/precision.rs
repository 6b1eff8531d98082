//! Deterministic float ordering.
//!
//! Sorting by raw `partial_cmp` is not total: NaN compares as unordered and
//! `-0.0 == 0.0` leaves ties to the sort algorithm. Everything that orders
//! coordinates for display or indexing goes through these helpers instead.

use core::cmp::Ordering;

/// Folds `-0.0` into `0.0` and every NaN payload into one NaN.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Total, platform-independent ordering of two floats.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

/// `floor(value / width)` as a band index, saturating for non-finite input.
pub fn band_index(value: f64, width: f64) -> i64 {
    let band = (value / width).floor();
    if band.is_nan() {
        0
    } else {
        band.clamp(i64::MIN as f64, i64::MAX as f64) as i64
    }
}
