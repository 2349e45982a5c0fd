//! Shared helpers for integration tests.
//!
//! - `fixtures`: SQL API response bodies and mock-server setup
//! - `log_capture`: in-memory tracing subscriber for log assertions
//! - `logger`: per-test phase and timing output

pub mod fixtures;
pub mod log_capture;
pub mod logger;
