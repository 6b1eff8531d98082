use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::throttle::MotionEpsilon;

/// Named transition lengths, in seconds.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionDurations {
    pub base: f64,
    pub slow: f64,
    pub zoom: f64,
}

impl Default for MotionDurations {
    fn default() -> Self {
        Self {
            base: 0.35,
            slow: 1.0,
            zoom: 0.6,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationClass {
    Base,
    Slow,
    #[default]
    Zoom,
}

impl MotionDurations {
    /// Seconds for `class`. Negative or NaN lengths count as zero.
    pub fn seconds(&self, class: DurationClass) -> f64 {
        let s = match class {
            DurationClass::Base => self.base,
            DurationClass::Slow => self.slow,
            DurationClass::Zoom => self.zoom,
        };
        if s.is_nan() { 0.0 } else { s.max(0.0) }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub durations: MotionDurations,
    pub easing: Easing,
    /// Minimum spacing between intermediate snapshots.
    pub throttle_interval_s: f64,
    pub epsilon: MotionEpsilon,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            durations: MotionDurations::default(),
            easing: Easing::InOutCubic,
            throttle_interval_s: 0.033,
            epsilon: MotionEpsilon::default(),
        }
    }
}
