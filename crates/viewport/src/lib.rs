pub mod animator;
pub mod config;
pub mod easing;
pub mod throttle;

pub use animator::*;
pub use config::*;
pub use easing::*;
pub use throttle::*;
