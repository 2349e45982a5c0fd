//! HTTP client utilities.
//!
//! Provides the shared HTTP client behind the SQL API session.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::error::{Result, SfcostError};

/// Slack added on top of the statement timeout for the transport timeout.
///
/// The SQL API enforces the statement timeout server-side; the client
/// timeout only guards against a hung connection.
pub const TRANSPORT_SLACK: Duration = Duration::from_secs(15);

/// User agent sent with every request.
#[must_use]
pub fn user_agent() -> String {
    format!("sfcost/{}", env!("CARGO_PKG_VERSION"))
}

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(statement_timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(statement_timeout + TRANSPORT_SLACK)
        .user_agent(user_agent())
        .build()
        .map_err(|e| SfcostError::Network(e.to_string()))
}

/// Map a transport error into the sfcost taxonomy.
#[must_use]
pub fn map_transport_error(err: &reqwest::Error, timeout_secs: u64) -> SfcostError {
    if err.is_timeout() {
        SfcostError::Timeout(timeout_secs)
    } else {
        SfcostError::Network(err.to_string())
    }
}
