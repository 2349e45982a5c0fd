//! Utility functions.

pub mod env;
pub mod format;
pub mod time;

pub use format::{format_credits, format_jobs, format_storage_tb, format_thousands};
pub use time::{format_elapsed_ms, format_relative_time};
