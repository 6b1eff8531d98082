pub mod config;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod navigation;

pub use config::*;
pub use error::*;
pub use explorer::*;
pub use filter::*;
pub use navigation::*;
