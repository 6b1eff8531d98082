use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Symmetric easing curves. Every curve maps `[0, 1]` onto `[0, 1]`
/// monotonically with `f(0) = 0` and `f(1) = 1`, so tweened channels never
/// overshoot their endpoints.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    InOutQuad,
    #[default]
    InOutCubic,
    InOutSine,
}

impl Easing {
    /// Input outside `[0, 1]` is clamped; NaN maps to 0.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
        }
    }
}

/// `a + (b - a) * t`, returning `b` exactly at `t == 1`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    if t >= 1.0 { b } else { a + (b - a) * t }
}

#[cfg(test)]
mod tests {
    use super::{Easing, lerp};

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::InOutQuad,
        Easing::InOutCubic,
        Easing::InOutSine,
    ];

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn endpoints_are_exact() {
        for e in ALL {
            assert_eq!(e.apply(0.0), 0.0, "{e:?}");
            assert_eq!(e.apply(1.0), 1.0, "{e:?}");
        }
    }

    #[test]
    fn curves_are_symmetric() {
        for e in ALL {
            assert_close(e.apply(0.5), 0.5);
            for i in 0..=20 {
                let t = i as f64 / 20.0;
                assert_close(e.apply(t) + e.apply(1.0 - t), 1.0);
            }
        }
    }

    #[test]
    fn curves_are_monotonic_without_overshoot() {
        for e in ALL {
            let mut prev = 0.0;
            for i in 0..=1000 {
                let v = e.apply(i as f64 / 1000.0);
                assert!(v >= prev, "{e:?} decreased at step {i}");
                assert!((0.0..=1.0).contains(&v));
                prev = v;
            }
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(Easing::InOutCubic.apply(-2.0), 0.0);
        assert_eq!(Easing::InOutCubic.apply(3.0), 1.0);
        assert_eq!(Easing::InOutCubic.apply(f64::NAN), 0.0);
    }

    #[test]
    fn lerp_lands_on_target() {
        assert_eq!(lerp(0.1, 0.7, 1.0), 0.7);
        assert_eq!(lerp(3.0, 5.0, 0.0), 3.0);
        assert_close(lerp(0.0, 10.0, 0.25), 2.5);
    }
}
