//! Analytical session over the Snowflake SQL API.
//!
//! [`WarehouseSession`] is the seam every page section goes through.
//! [`SqlApiSession`] is the production implementation: it submits a
//! statement, waits out `202 Accepted` by polling the status URL, and
//! concatenates every result partition in order.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::http::{build_client, map_transport_error};
use super::query::Statement;
use super::result_set::{ColumnMeta, ResultSet};
use crate::error::{Result, SfcostError};

/// Executes one statement and returns its complete result set.
pub trait WarehouseSession: Send + Sync {
    fn execute(&self, statement: &Statement) -> impl Future<Output = Result<ResultSet>> + Send;
}

// =============================================================================
// Credentials
// =============================================================================

/// How the bearer token was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    #[default]
    Oauth,
    KeypairJwt,
    Pat,
}

impl TokenType {
    /// Value of `X-Snowflake-Authorization-Token-Type`.
    #[must_use]
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::Oauth => "OAUTH",
            Self::KeypairJwt => "KEYPAIR_JWT",
            Self::Pat => "PROGRAMMATIC_ACCESS_TOKEN",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oauth => "oauth",
            Self::KeypairJwt => "keypair_jwt",
            Self::Pat => "pat",
        }
    }
}

impl FromStr for TokenType {
    type Err = SfcostError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oauth" => Ok(Self::Oauth),
            "keypair_jwt" | "jwt" => Ok(Self::KeypairJwt),
            "pat" | "programmatic_access_token" => Ok(Self::Pat),
            other => Err(SfcostError::ConfigInvalid {
                key: "connection.token_type".to_string(),
                value: other.to_string(),
                message: "expected oauth, keypair_jwt or pat".to_string(),
            }),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Everything needed to talk to one account.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub account_url: String,
    pub token: AccessToken,
    pub token_type: TokenType,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub database: Option<String>,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    statement: &'a str,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, WireBinding>,
}

#[derive(Debug, Serialize)]
struct WireBinding {
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    statement_status_url: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    sql_state: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    num_rows: Option<u64>,
    #[serde(default)]
    row_type: Vec<ColumnMeta>,
    #[serde(default)]
    partition_info: Vec<PartitionInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartitionInfo {
    #[serde(default)]
    row_count: u64,
}

#[derive(Debug, Deserialize)]
struct PartitionResponse {
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

enum Progress {
    Done(StatementResponse),
    Running(String),
}

// =============================================================================
// SqlApiSession
// =============================================================================

/// [`WarehouseSession`] over `POST /api/v2/statements`.
#[derive(Debug, Clone)]
pub struct SqlApiSession {
    client: Client,
    settings: SessionSettings,
}

impl SqlApiSession {
    /// Build a session with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SfcostError::AuthNotConfigured`] for an empty token, or a
    /// network error if the client cannot be built.
    pub fn new(settings: SessionSettings) -> Result<Self> {
        if settings.token.is_empty() {
            return Err(SfcostError::AuthNotConfigured {
                account: settings.account_url,
            });
        }
        let client = build_client(settings.timeout)?;
        Ok(Self { client, settings })
    }

    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.settings.account_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.settings.token.expose())
            .header(
                "X-Snowflake-Authorization-Token-Type",
                self.settings.token_type.header_value(),
            )
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn timeout_secs(&self) -> u64 {
        self.settings.timeout.as_secs()
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| map_transport_error(&e, self.timeout_secs()))
    }

    async fn submit(&self, statement: &Statement) -> Result<Response> {
        let bindings = statement
            .bindings
            .iter()
            .enumerate()
            .map(|(idx, b)| {
                (
                    (idx + 1).to_string(),
                    WireBinding {
                        kind: b.sql_type(),
                        value: b.wire_value(),
                    },
                )
            })
            .collect();

        let body = SubmitRequest {
            statement: &statement.sql,
            timeout: self.timeout_secs(),
            warehouse: self.settings.warehouse.as_deref(),
            role: self.settings.role.as_deref(),
            database: self.settings.database.as_deref(),
            bindings,
        };

        let request = self
            .client
            .post(self.url("/api/v2/statements"))
            .query(&[("nullable", "true")])
            .json(&body);
        self.send(request).await
    }

    /// Classify a response into finished, still running, or an error.
    async fn progress(&self, response: Response) -> Result<Progress> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(&e, self.timeout_secs()))?;

        match status {
            StatusCode::OK => Ok(Progress::Done(serde_json::from_str(&text)?)),
            StatusCode::ACCEPTED => {
                let body: StatementResponse = serde_json::from_str(&text)?;
                let url = body
                    .statement_status_url
                    .or_else(|| {
                        body.statement_handle
                            .map(|h| format!("/api/v2/statements/{h}"))
                    })
                    .ok_or_else(|| SfcostError::ApiError {
                        status: status.as_u16(),
                        message: "statement accepted without a status URL".to_string(),
                    })?;
                Ok(Progress::Running(url))
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body: StatementResponse = serde_json::from_str(&text).unwrap_or_default();
                Err(SfcostError::QueryFailed {
                    code: body.code.unwrap_or_default(),
                    sql_state: body.sql_state.unwrap_or_default(),
                    message: body.message.unwrap_or(text),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SfcostError::AuthRejected {
                status: status.as_u16(),
                message: error_message(&text),
            }),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Err(SfcostError::Timeout(self.timeout_secs()))
            }
            _ => Err(SfcostError::ApiError {
                status: status.as_u16(),
                message: error_message(&text),
            }),
        }
    }

    async fn wait_for_completion(
        &self,
        first: Response,
        deadline: Instant,
    ) -> Result<StatementResponse> {
        let mut progress = self.progress(first).await?;
        loop {
            match progress {
                Progress::Done(body) => return Ok(body),
                Progress::Running(status_url) => {
                    if Instant::now() >= deadline {
                        return Err(SfcostError::Timeout(self.timeout_secs()));
                    }
                    trace!(url = %status_url, "statement still running");
                    tokio::time::sleep(self.settings.poll_interval).await;
                    let response = self.send(self.client.get(self.url(&status_url))).await?;
                    progress = self.progress(response).await?;
                }
            }
        }
    }

    async fn fetch_partition(
        &self,
        handle: &str,
        partition: usize,
    ) -> Result<Vec<Vec<Option<String>>>> {
        let request = self
            .client
            .get(self.url(&format!("/api/v2/statements/{handle}")))
            .query(&[("partition", partition.to_string())]);
        let response = self.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SfcostError::ApiError {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: PartitionResponse = response
            .json()
            .await
            .map_err(|e| SfcostError::Network(e.to_string()))?;
        Ok(body.data)
    }

    #[instrument(skip_all, fields(bindings = statement.bindings.len()))]
    async fn run(&self, statement: &Statement) -> Result<ResultSet> {
        let started = Instant::now();
        let deadline = started + self.settings.timeout;

        let response = self.submit(statement).await?;
        let body = self.wait_for_completion(response, deadline).await?;

        let meta = body.result_set_meta_data.unwrap_or_default();
        let mut result = ResultSet::new(meta.row_type, body.data.unwrap_or_default());

        if meta.partition_info.len() > 1 {
            let handle = body.statement_handle.ok_or_else(|| SfcostError::ApiError {
                status: 200,
                message: "partitioned result without a statement handle".to_string(),
            })?;
            for partition in 1..meta.partition_info.len() {
                let rows = self.fetch_partition(&handle, partition).await?;
                trace!(
                    partition,
                    expected = meta.partition_info[partition].row_count,
                    received = rows.len(),
                    "fetched partition"
                );
                result.extend_rows(rows);
            }
        }

        debug!(
            rows = result.len(),
            declared_rows = meta.num_rows,
            elapsed_ms = started.elapsed().as_millis(),
            "statement complete"
        );
        Ok(result)
    }
}

impl WarehouseSession for SqlApiSession {
    fn execute(&self, statement: &Statement) -> impl Future<Output = Result<ResultSet>> + Send {
        self.run(statement)
    }
}

/// Pull `message` out of an SQL API error body, or fall back to the raw text.
fn error_message(text: &str) -> String {
    serde_json::from_str::<StatementResponse>(text)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(token: &str) -> SessionSettings {
        SessionSettings {
            account_url: "https://acme.snowflakecomputing.com/".to_string(),
            token: AccessToken::new(token),
            token_type: TokenType::Pat,
            warehouse: None,
            role: None,
            database: None,
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn token_type_parsing() {
        assert_eq!("OAuth".parse::<TokenType>().unwrap(), TokenType::Oauth);
        assert_eq!(
            "keypair_jwt".parse::<TokenType>().unwrap(),
            TokenType::KeypairJwt
        );
        assert_eq!("pat".parse::<TokenType>().unwrap(), TokenType::Pat);
        assert!("basic".parse::<TokenType>().is_err());
        assert_eq!(TokenType::Pat.header_value(), "PROGRAMMATIC_ACCESS_TOKEN");
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let token = AccessToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "AccessToken(***)");
        let s = format!("{:?}", settings("secret-value"));
        assert!(!s.contains("secret-value"));
    }

    #[test]
    fn empty_token_is_not_configured() {
        let err = SqlApiSession::new(settings("  ")).unwrap_err();
        assert!(matches!(err, SfcostError::AuthNotConfigured { .. }));
    }

    #[test]
    fn url_joins_relative_paths() {
        let session = SqlApiSession::new(settings("t")).unwrap();
        assert_eq!(
            session.url("/api/v2/statements"),
            "https://acme.snowflakecomputing.com/api/v2/statements"
        );
        assert_eq!(session.url("https://other/x"), "https://other/x");
    }

    #[test]
    fn error_message_prefers_json_message() {
        assert_eq!(
            error_message(r#"{"code":"390303","message":"Invalid OAuth access token."}"#),
            "Invalid OAuth access token."
        );
        assert_eq!(error_message(" plain text "), "plain text");
    }
}
