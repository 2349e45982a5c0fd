//! Fix suggestion database for sfcost errors.
//!
//! Provides actionable fix suggestions mapped to specific error types,
//! including commands, context explanations, and prevention tips.

use chrono::{Duration, NaiveDate};

const SQL_API_AUTH_DOC: &str = "https://docs.snowflake.com/developer-guide/sql-api/authenticating";
const ACCOUNT_USAGE_DOC: &str = "https://docs.snowflake.com/sql-reference/account-usage";

// =============================================================================
// Fix Suggestion Types
// =============================================================================

/// A fix suggestion for an error.
///
/// Contains actionable information to help users resolve errors.
#[derive(Debug, Clone)]
pub struct FixSuggestion {
    /// Primary fix commands in order of preference.
    /// These should be copy-paste ready for the terminal.
    pub commands: Vec<String>,

    /// Explanation of why this error occurred.
    pub context: String,

    /// Tips to prevent this error in the future.
    pub prevention: Option<String>,

    /// Link to documentation for more information.
    pub doc_url: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
            doc_url: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }

    /// Builder: adds documentation URL.
    #[must_use]
    pub fn with_doc_url(mut self, url: impl Into<String>) -> Self {
        self.doc_url = Some(url.into());
        self
    }
}

// =============================================================================
// Suggestion Generators
// =============================================================================

/// Generates fix suggestions when no token can be found.
#[must_use]
pub fn auth_not_configured_suggestions(account: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec![
                "export SFCOST_TOKEN=<access-token>".to_string(),
                "# or set connection.token_file in config.toml".to_string(),
            ],
            format!(
                "No access token was found for {account}. sfcost looks in SFCOST_TOKEN, \
                 then the configured token file, then the system keyring."
            ),
        )
        .with_doc_url(SQL_API_AUTH_DOC),
    ]
}

/// Generates fix suggestions for a token the SQL API refused.
#[must_use]
pub fn auth_rejected_suggestions(status: u16) -> Vec<FixSuggestion> {
    let context = if status == 403 {
        "The token was accepted but the role lacks access to the account usage views. \
         Grant IMPORTED PRIVILEGES on the SNOWFLAKE database or pick another role."
    } else {
        "The SQL API did not accept the access token. It may have expired, or the \
         token type does not match the token."
    };
    vec![
        FixSuggestion::new(
            vec![
                "sfcost report --role ACCOUNTADMIN".to_string(),
                "export SFCOST_TOKEN_TYPE=oauth".to_string(),
            ],
            context,
        )
        .with_doc_url(SQL_API_AUTH_DOC),
    ]
}

/// Generates fix suggestions for timeout errors.
#[must_use]
pub fn timeout_suggestions(seconds: u64) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec![format!("sfcost report --timeout {}", seconds.saturating_mul(2))],
            format!(
                "A statement did not finish within {seconds}s. Account usage views over \
                 long ranges can be slow on a small warehouse."
            ),
        )
        .with_prevention("Narrow the date range or use a larger warehouse."),
    ]
}

/// Generates fix suggestions for transport failures.
#[must_use]
pub fn network_suggestions(message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![
            "sfcost report --log-level debug".to_string(),
            "curl -I $SFCOST_ACCOUNT_URL".to_string(),
        ],
        format!("Could not reach the SQL API: {message}. Check the account URL and network."),
    )]
}

/// Generates fix suggestions for a setting with no value.
#[must_use]
pub fn config_missing_suggestions(key: &str) -> Vec<FixSuggestion> {
    let env_hint = match key {
        "connection.account_url" => "export SFCOST_ACCOUNT_URL=https://<account>.snowflakecomputing.com",
        "connection.warehouse" => "export SFCOST_WAREHOUSE=<warehouse>",
        _ => "# edit config.toml",
    };
    vec![FixSuggestion::new(
        vec![env_hint.to_string()],
        format!("The setting '{key}' has no value in flags, environment, or config file."),
    )]
}

/// Generates fix suggestions for config parse errors.
#[must_use]
pub fn config_parse_suggestions(path: &str, message: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec![format!("$EDITOR {path}")],
            format!("The config file has a syntax error. The TOML parser reported: {message}"),
        )
        .with_prevention("Use a TOML-aware editor with syntax highlighting."),
    ]
}

/// Generates fix suggestions for invalid config value errors.
#[must_use]
pub fn config_invalid_suggestions(key: &str, value: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["# Edit config.toml and fix the value".to_string()],
        format!("The value '{value}' for '{key}' is invalid: {message}"),
    )]
}

/// Generates fix suggestions when only one date was given.
#[must_use]
pub fn incomplete_range_suggestions() -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["sfcost report --start 2024-01-01 --end 2024-01-31".to_string()],
        "Both a start and an end date are needed before the page can load.",
    )]
}

/// Generates fix suggestions for a reversed or empty range.
#[must_use]
pub fn invalid_range_suggestions(start: NaiveDate, end: NaiveDate) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("sfcost report --range {end}..{start}")],
        format!("The start date {start} must be strictly before the end date {end}."),
    )]
}

/// Generates fix suggestions for a date past today.
#[must_use]
pub fn future_date_suggestions(today: NaiveDate) -> Vec<FixSuggestion> {
    let start = today - Duration::days(31);
    vec![FixSuggestion::new(
        vec![format!("sfcost report --range {start}..{today}")],
        format!("Dates cannot be later than today ({today})."),
    )]
}

/// Generates fix suggestions for an unparseable date.
#[must_use]
pub fn invalid_date_suggestions(value: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["sfcost report --start 2024-01-01 --end 2024-01-31".to_string()],
        format!("'{value}' is not a calendar date. Use the YYYY-MM-DD form."),
    )]
}

/// Generates fix suggestions for a failed statement.
#[must_use]
pub fn query_failed_suggestions(sql_state: &str, message: &str) -> Vec<FixSuggestion> {
    // 42S02: object does not exist or not authorized
    if sql_state == "42S02" {
        return vec![
            FixSuggestion::new(
                vec![
                    "sfcost report --role ACCOUNTADMIN".to_string(),
                    "# or set report.usage_schema in config.toml".to_string(),
                ],
                format!(
                    "{message}. The role cannot see the account usage view, or the \
                     usage schema is wrong."
                ),
            )
            .with_doc_url(ACCOUNT_USAGE_DOC),
        ];
    }
    vec![FixSuggestion::new(
        vec!["sfcost report --log-level debug".to_string()],
        format!("The warehouse failed the statement: {message}"),
    )]
}

/// Generates fix suggestions for unexpected HTTP statuses.
#[must_use]
pub fn api_error_suggestions(status: u16) -> Vec<FixSuggestion> {
    let context = if status >= 500 {
        format!("The SQL API returned HTTP {status}. The service may be degraded; try again shortly.")
    } else {
        format!("The SQL API returned HTTP {status}. Check the account URL and request settings.")
    };
    vec![FixSuggestion::new(
        vec!["sfcost report --log-level debug".to_string()],
        context,
    )]
}

// =============================================================================
// Tests
// =============================================================================
