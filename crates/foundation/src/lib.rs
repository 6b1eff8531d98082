pub mod bounds;
pub mod camera;
pub mod ids;
pub mod math;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use camera::*;
pub use ids::*;
pub use time::*;
