//! CLI argument parsing and command dispatch.

pub mod args;
pub mod dashboard;
pub mod report;

pub use args::{Cli, Commands, OutputFormat};
