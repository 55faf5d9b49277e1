pub mod config;
pub mod error;
pub mod fs;

pub use config::*;
pub use error::*;
pub use fs::*;
