pub mod error;
pub mod feature;
pub mod index;
pub mod options;
pub mod point;
pub mod reading_order;
pub mod source;
pub mod spatial;

pub use error::*;
pub use feature::*;
pub use index::*;
pub use options::*;
pub use point::*;
pub use reading_order::*;
pub use source::*;
