pub mod config;
pub mod error;
pub mod types;

pub use config::ParlaConfig;
pub use error::{ParlaError, Result};
pub use types::*;
