pub mod config;
pub mod overlay;

pub use config::*;
pub use overlay::*;
