use foundation::camera::CameraState;
use foundation::time::Time;
use serde::{Deserialize, Serialize};

/// Per-channel motion below which an intermediate snapshot is not worth
/// publishing.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionEpsilon {
    pub lng: f64,
    pub lat: f64,
    pub zoom: f64,
}

impl Default for MotionEpsilon {
    fn default() -> Self {
        Self {
            lng: 0.02,
            lat: 0.02,
            zoom: 0.005,
        }
    }
}

impl MotionEpsilon {
    /// True when any channel moved by at least its epsilon.
    pub fn exceeded(&self, a: &CameraState, b: &CameraState) -> bool {
        let (dlng, dlat, dzoom) = a.delta(b);
        dlng >= self.lng || dlat >= self.lat || dzoom >= self.zoom
    }
}

/// Publish cursor for one transition.
///
/// Intermediate snapshots pass only when `interval_s` has elapsed since the
/// last publish and the camera moved past `epsilon`. Endpoints bypass the
/// throttle and only update the cursor.
#[derive(Debug, Clone)]
pub struct PublishThrottle {
    interval_s: f64,
    epsilon: MotionEpsilon,
    last: Option<(Time, CameraState)>,
}

impl PublishThrottle {
    pub fn new(interval_s: f64, epsilon: MotionEpsilon) -> Self {
        Self {
            interval_s: if interval_s.is_nan() { 0.0 } else { interval_s.max(0.0) },
            epsilon,
            last: None,
        }
    }

    pub fn should_publish(&self, now: Time, camera: &CameraState) -> bool {
        match &self.last {
            None => true,
            Some((at, published)) => {
                now.since(*at) >= self.interval_s && self.epsilon.exceeded(camera, published)
            }
        }
    }

    pub fn record(&mut self, now: Time, camera: CameraState) {
        self.last = Some((now, camera));
    }

    pub fn last(&self) -> Option<&(Time, CameraState)> {
        self.last.as_ref()
    }
}
