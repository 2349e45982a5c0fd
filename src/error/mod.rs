//! Error types for sfcost.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into six main categories:
//! - **Authentication**: Missing or rejected access tokens
//! - **Network**: Connection failures and timeouts against the SQL API
//! - **Configuration**: Config file parsing, validation, or missing values
//! - **Input**: Date-range picker input that halts the page
//! - **Query**: Statement failures and result decoding problems
//! - **Internal**: Unexpected errors, bugs, or unclassified issues
//!
//! Each error has a stable error code (e.g., `SFCOST-A001`) for programmatic handling.
//!
//! Query errors are usually not fatal: the page loader turns them into an
//! inline warning for the one section that failed. Input, configuration and
//! authentication errors stop the page before any statement is issued.

pub mod suggestions;

use chrono::NaiveDate;
use thiserror::Error;

pub use suggestions::FixSuggestion;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Authentication issues (missing or rejected tokens).
    Authentication,
    /// Network issues (timeout, connection refused, TLS).
    Network,
    /// Configuration issues (parse errors, invalid values, missing settings).
    Configuration,
    /// Invalid or incomplete date-range input.
    Input,
    /// Statement execution and result decoding issues.
    Query,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication error",
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Input => "Input error",
            Self::Query => "Query error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Authentication => "A",
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Input => "I",
            Self::Query => "Q",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Page rendered (possibly with section warnings)
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Date-range input rejected, page halted
    InvalidInput = 2,
    /// Configuration or authentication settings unusable
    ConfigError = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for sfcost operations.
#[derive(Error, Debug)]
pub enum SfcostError {
    // ==========================================================================
    // Authentication errors (Category: Authentication)
    // ==========================================================================
    /// No access token could be found for the account.
    #[error("no access token configured for {account}")]
    AuthNotConfigured { account: String },

    /// The SQL API rejected the access token.
    #[error("access token rejected (HTTP {status}): {message}")]
    AuthRejected { status: u16, message: String },

    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Statement did not complete within the configured timeout.
    #[error("statement timed out after {0}s")]
    Timeout(u64),

    /// Transport-level failure talking to the SQL API.
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    /// A required setting has no value from any source.
    #[error("missing required setting '{key}'")]
    ConfigMissing { key: String },

    // ==========================================================================
    // Input errors (Category: Input)
    // ==========================================================================
    /// Only one of the two dates was chosen.
    #[error("please select an end date")]
    IncompleteDateRange,

    /// Start date is not strictly before end date.
    #[error("end date must fall after start date (start {start}, end {end})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// A bound lies past the picker's ceiling.
    #[error("date {date} is after today ({today})")]
    DateAfterToday { date: NaiveDate, today: NaiveDate },

    /// A date argument could not be parsed.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    // ==========================================================================
    // Query errors (Category: Query)
    // ==========================================================================
    /// The warehouse rejected or failed the statement.
    #[error("SQL execution error {code} ({sql_state}): {message}")]
    QueryFailed {
        code: String,
        sql_state: String,
        message: String,
    },

    /// The SQL API answered with an unexpected HTTP status.
    #[error("SQL API returned HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The result set had no rows where one was required.
    #[error("{0} returned no rows")]
    EmptyResult(String),

    /// A required value was NULL.
    #[error("column {0} is null")]
    NullValue(String),

    /// The result set lacks an expected column.
    #[error("result set has no column {0}")]
    MissingColumn(String),

    /// A value could not be decoded into the expected type.
    #[error("cannot read {column} value '{value}' as {expected}")]
    ParseValue {
        column: String,
        value: String,
        expected: &'static str,
    },

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SfcostError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::IncompleteDateRange
            | Self::InvalidDateRange { .. }
            | Self::DateAfterToday { .. }
            | Self::InvalidDate(_) => ExitCode::InvalidInput,

            Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::ConfigMissing { .. }
            | Self::AuthNotConfigured { .. } => ExitCode::ConfigError,

            Self::Timeout(_) => ExitCode::Timeout,

            Self::AuthRejected { .. }
            | Self::Network(_)
            | Self::QueryFailed { .. }
            | Self::ApiError { .. }
            | Self::EmptyResult(_)
            | Self::NullValue(_)
            | Self::MissingColumn(_)
            | Self::ParseValue { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthNotConfigured { .. } | Self::AuthRejected { .. } => {
                ErrorCategory::Authentication
            }

            Self::Timeout(_) | Self::Network(_) => ErrorCategory::Network,

            Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::ConfigMissing { .. } => ErrorCategory::Configuration,

            Self::IncompleteDateRange
            | Self::InvalidDateRange { .. }
            | Self::DateAfterToday { .. }
            | Self::InvalidDate(_) => ErrorCategory::Input,

            Self::QueryFailed { .. }
            | Self::ApiError { .. }
            | Self::EmptyResult(_)
            | Self::NullValue(_)
            | Self::MissingColumn(_)
            | Self::ParseValue { .. } => ErrorCategory::Query,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `SFCOST-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AuthNotConfigured { .. } => "SFCOST-A001",
            Self::AuthRejected { .. } => "SFCOST-A002",

            Self::Timeout(_) => "SFCOST-N001",
            Self::Network(_) => "SFCOST-N099",

            Self::ConfigMissing { .. } => "SFCOST-C001",
            Self::ConfigParse { .. } => "SFCOST-C002",
            Self::ConfigInvalid { .. } => "SFCOST-C003",

            Self::IncompleteDateRange => "SFCOST-I001",
            Self::InvalidDateRange { .. } => "SFCOST-I002",
            Self::DateAfterToday { .. } => "SFCOST-I003",
            Self::InvalidDate(_) => "SFCOST-I004",

            Self::QueryFailed { .. } => "SFCOST-Q001",
            Self::ApiError { .. } => "SFCOST-Q002",
            Self::EmptyResult(_) => "SFCOST-Q010",
            Self::NullValue(_) => "SFCOST-Q011",
            Self::MissingColumn(_) => "SFCOST-Q012",
            Self::ParseValue { .. } => "SFCOST-Q013",

            Self::Io(_) => "SFCOST-X001",
            Self::Json(_) => "SFCOST-X002",
            Self::Other(_) => "SFCOST-X099",
        }
    }

    /// Returns whether retrying the same statement could plausibly succeed.
    ///
    /// Informational only: sfcost executes every statement exactly once.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
            || matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Returns actionable fix suggestions for this error.
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        match self {
            Self::AuthNotConfigured { account } => {
                suggestions::auth_not_configured_suggestions(account)
            }
            Self::AuthRejected { status, .. } => suggestions::auth_rejected_suggestions(*status),

            Self::Timeout(seconds) => suggestions::timeout_suggestions(*seconds),
            Self::Network(msg) => suggestions::network_suggestions(msg),

            Self::ConfigMissing { key } => suggestions::config_missing_suggestions(key),
            Self::ConfigParse { path, message } => {
                suggestions::config_parse_suggestions(path, message)
            }
            Self::ConfigInvalid {
                key,
                value,
                message,
            } => suggestions::config_invalid_suggestions(key, value, message),

            Self::IncompleteDateRange => suggestions::incomplete_range_suggestions(),
            Self::InvalidDateRange { start, end } => {
                suggestions::invalid_range_suggestions(*start, *end)
            }
            Self::DateAfterToday { today, .. } => suggestions::future_date_suggestions(*today),
            Self::InvalidDate(value) => suggestions::invalid_date_suggestions(value),

            Self::QueryFailed {
                sql_state, message, ..
            } => suggestions::query_failed_suggestions(sql_state, message),
            Self::ApiError { status, .. } => suggestions::api_error_suggestions(*status),
            Self::EmptyResult(what) => vec![FixSuggestion::new(
                vec!["sfcost report --range <earlier-start>..<end>".to_string()],
                format!("{what} had no data for the selected range."),
            )],
            Self::NullValue(_) | Self::MissingColumn(_) | Self::ParseValue { .. } => {
                vec![FixSuggestion::new(
                    vec!["sfcost report --log-level debug".to_string()],
                    "The account usage view returned data in an unexpected shape.",
                )]
            }

            Self::Io(err) => vec![FixSuggestion::new(
                vec!["# Check file permissions and disk space".to_string()],
                format!("I/O error: {err}. Check file permissions and available disk space."),
            )],
            Self::Json(err) => vec![FixSuggestion::new(
                vec!["sfcost report --log-level debug".to_string()],
                format!("JSON error: {err}. The SQL API response may be malformed."),
            )],
            Self::Other(err) => vec![FixSuggestion::new(
                vec!["sfcost report --log-level debug".to_string()],
                format!("Unexpected error: {err}. Please report this issue."),
            )],
        }
    }
}

/// Result type alias for sfcost operations.
pub type Result<T> = std::result::Result<T, SfcostError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_errors() -> Vec<SfcostError> {
        vec![
            SfcostError::AuthNotConfigured {
                account: "acme".to_string(),
            },
            SfcostError::AuthRejected {
                status: 401,
                message: "bad token".to_string(),
            },
            SfcostError::Timeout(60),
            SfcostError::Network("reset".to_string()),
            SfcostError::ConfigParse {
                path: "/tmp/config.toml".to_string(),
                message: "oops".to_string(),
            },
            SfcostError::ConfigInvalid {
                key: "report.usage_schema".to_string(),
                value: "x;".to_string(),
                message: "not an identifier".to_string(),
            },
            SfcostError::ConfigMissing {
                key: "connection.account_url".to_string(),
            },
            SfcostError::IncompleteDateRange,
            SfcostError::InvalidDateRange {
                start: date("2024-01-31"),
                end: date("2024-01-01"),
            },
            SfcostError::DateAfterToday {
                date: date("2030-01-01"),
                today: date("2024-01-01"),
            },
            SfcostError::InvalidDate("yesterday".to_string()),
            SfcostError::QueryFailed {
                code: "002003".to_string(),
                sql_state: "42S02".to_string(),
                message: "Object does not exist".to_string(),
            },
            SfcostError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            },
            SfcostError::EmptyResult("storage usage".to_string()),
            SfcostError::NullValue("BILLABLE_TB".to_string()),
            SfcostError::MissingColumn("CREDITS".to_string()),
            SfcostError::ParseValue {
                column: "CREDITS".to_string(),
                value: "abc".to_string(),
                expected: "number",
            },
            SfcostError::Other(anyhow::anyhow!("boom")),
        ]
    }

    #[test]
    fn error_category_code_prefix() {
        assert_eq!(ErrorCategory::Authentication.code_prefix(), "A");
        assert_eq!(ErrorCategory::Network.code_prefix(), "N");
        assert_eq!(ErrorCategory::Configuration.code_prefix(), "C");
        assert_eq!(ErrorCategory::Input.code_prefix(), "I");
        assert_eq!(ErrorCategory::Query.code_prefix(), "Q");
        assert_eq!(ErrorCategory::Internal.code_prefix(), "X");
    }

    #[test]
    fn error_codes_match_category_prefix() {
        for err in sample_errors() {
            let code = err.error_code();
            let expected = format!("SFCOST-{}", err.category().code_prefix());
            assert!(
                code.starts_with(&expected),
                "{code} should start with {expected}"
            );
        }
    }

    #[test]
    fn error_codes_are_unique() {
        use std::collections::HashSet;

        let errors = sample_errors();
        let codes: HashSet<_> = errors.iter().map(SfcostError::error_code).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn configuration_errors_have_stable_codes() {
        let mut codes: Vec<&str> = sample_errors()
            .iter()
            .filter(|e| e.category() == ErrorCategory::Configuration)
            .map(SfcostError::error_code)
            .collect();
        codes.sort_unstable();
        assert_eq!(codes, vec!["SFCOST-C001", "SFCOST-C002", "SFCOST-C003"]);
        for err in sample_errors()
            .iter()
            .filter(|e| e.category() == ErrorCategory::Configuration)
        {
            assert_eq!(err.exit_code(), ExitCode::ConfigError);
        }
    }

    #[test]
    fn input_errors_exit_with_invalid_input() {
        assert_eq!(
            SfcostError::IncompleteDateRange.exit_code(),
            ExitCode::InvalidInput
        );
        let err = SfcostError::InvalidDateRange {
            start: date("2024-01-31"),
            end: date("2024-01-01"),
        };
        assert_eq!(err.exit_code(), ExitCode::InvalidInput);
        assert_eq!(i32::from(err.exit_code()), 2);
    }

    #[test]
    fn missing_token_is_a_config_exit() {
        let err = SfcostError::AuthNotConfigured {
            account: "acme".to_string(),
        };
        assert_eq!(err.exit_code(), ExitCode::ConfigError);
        assert_eq!(err.category(), ErrorCategory::Authentication);
    }

    #[test]
    fn incomplete_range_message_matches_picker() {
        assert_eq!(
            SfcostError::IncompleteDateRange.to_string(),
            "please select an end date"
        );
    }

    #[test]
    fn query_failed_message_keeps_raw_text() {
        let err = SfcostError::QueryFailed {
            code: "002003".to_string(),
            sql_state: "42S02".to_string(),
            message: "Object 'X' does not exist or not authorized.".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("002003"));
        assert!(text.contains("does not exist or not authorized"));
    }

    #[test]
    fn retryable_errors() {
        assert!(SfcostError::Timeout(5).is_retryable());
        assert!(
            SfcostError::ApiError {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !SfcostError::ApiError {
                status: 400,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!SfcostError::IncompleteDateRange.is_retryable());
    }

    #[test]
    fn every_error_has_suggestions() {
        for err in sample_errors() {
            assert!(
                !err.fix_suggestions().is_empty(),
                "{} should have suggestions",
                err.error_code()
            );
        }
    }
}
