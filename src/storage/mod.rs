//! Configuration storage.

pub mod config;
pub mod paths;

pub use config::{Config, ConfigSource, ResolvedConfig};
pub use paths::AppPaths;
