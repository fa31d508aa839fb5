//! Shared types, config, formulas and error definitions for stableman.

pub mod config;
pub mod error;
pub mod feels_like;
pub mod types;

pub use config::AppConfig;
pub use error::Error;
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
