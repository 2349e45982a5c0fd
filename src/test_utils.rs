//! Test utilities for sfcost.
//!
//! Provides shared helpers, test data factories, a recording
//! [`WarehouseSession`] and assertion macros for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sfcost::test_utils::*;
//!
//! let session = MockSession::with_full_page();
//! let page = make_test_page();
//! let dir = TestDir::new();
//! dir.create_file("config.toml", "[general]\ntimeout_seconds = 30");
//! ```

use std::fs;
use std::future::Future;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::cli::args::OutputFormat;
use crate::core::date_range::{DEFAULT_LOOKBACK_DAYS, DateRange, DateRangeInput};
use crate::core::models::{DashboardPage, QueryCostRow, Section, WarehouseCredits};
use crate::core::query::Statement;
use crate::core::result_set::{ColumnMeta, ResultSet};
use crate::core::session::{TokenType, WarehouseSession};
use crate::core::views::DEFAULT_USAGE_SCHEMA;
use crate::error::{Result, SfcostError};
use crate::storage::config::{ConfigSources, ResolvedConfig};

// =============================================================================
// Statement keys
// =============================================================================

/// SQL fragments that identify each section's statement.
pub const CREDITS_USED_SQL: &str = "AS CREDITS FROM";
pub const JOBS_EXECUTED_SQL: &str = "AS ROW_COUNT";
pub const BILLABLE_STORAGE_SQL: &str = "AS BILLABLE_TB";
pub const QUERY_COSTS_SQL: &str = "QUERY_ATTRIBUTION_HISTORY";
pub const WAREHOUSE_CREDITS_SQL: &str = "AS TOTAL_CREDITS_USED";

/// Columns of the cost-per-query statement when elapsed time is formatted locally.
pub const QUERY_COST_COLUMNS: [&str; 12] = [
    "QUERY_ID",
    "CREDITS_ATTRIBUTED_COMPUTE",
    "START_TIME",
    "END_TIME",
    "QUERY_TYPE",
    "SCHEMA",
    "ROLE_USER",
    "EXECUTION_STATUS",
    "TOTAL_ELAPSED_MS",
    "ROWS_PRODUCED",
    "WAREHOUSE_NAME",
    "QUERY_TEXT",
];

// =============================================================================
// Mock Session
// =============================================================================

type ErrorFactory = Arc<dyn Fn() -> SfcostError + Send + Sync>;

#[derive(Clone)]
enum Reply {
    Rows(ResultSet),
    Fail(ErrorFactory),
}

/// A [`WarehouseSession`] that records every statement and answers from
/// canned replies keyed by SQL substring. The first matching key wins;
/// unmatched statements fail.
#[derive(Default)]
pub struct MockSession {
    replies: Vec<(String, Reply)>,
    executed: Mutex<Vec<Statement>>,
}

impl MockSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `sql` with `rows`.
    #[must_use]
    pub fn with_rows(mut self, sql: &str, rows: ResultSet) -> Self {
        self.replies.push((sql.to_string(), Reply::Rows(rows)));
        self
    }

    /// Fail statements containing `sql` with a fresh error from `make`.
    #[must_use]
    pub fn with_error(
        mut self,
        sql: &str,
        make: impl Fn() -> SfcostError + Send + Sync + 'static,
    ) -> Self {
        self.replies.push((sql.to_string(), Reply::Fail(Arc::new(make))));
        self
    }

    /// Canned replies for all five sections, matching [`make_test_page`].
    #[must_use]
    pub fn with_full_page() -> Self {
        Self::new()
            .with_rows(CREDITS_USED_SQL, single_value("CREDITS", Some("1234.567")))
            .with_rows(JOBS_EXECUTED_SQL, single_value("ROW_COUNT", Some("98765")))
            .with_rows(BILLABLE_STORAGE_SQL, single_value("BILLABLE_TB", Some("12.3456")))
            .with_rows(QUERY_COSTS_SQL, make_test_query_cost_set())
            .with_rows(WAREHOUSE_CREDITS_SQL, make_test_warehouse_set())
    }

    /// Statements executed so far, in order.
    #[must_use]
    pub fn statements(&self) -> Vec<Statement> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reply(&self, statement: &Statement) -> Result<ResultSet> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement.clone());

        match self
            .replies
            .iter()
            .find(|(key, _)| statement.sql.contains(key.as_str()))
        {
            Some((_, Reply::Rows(rows))) => Ok(rows.clone()),
            Some((_, Reply::Fail(make))) => Err(make()),
            None => Err(SfcostError::Other(anyhow::anyhow!(
                "no canned reply for: {}",
                statement.sql
            ))),
        }
    }
}

impl WarehouseSession for MockSession {
    fn execute(&self, statement: &Statement) -> impl Future<Output = Result<ResultSet>> + Send {
        let result = self.reply(statement);
        async move { result }
    }
}

// =============================================================================
// Result Set Builders
// =============================================================================

/// Build a result set of text columns.
#[must_use]
pub fn make_result_set(columns: &[&str], rows: &[Vec<Option<&str>>]) -> ResultSet {
    ResultSet::new(
        columns.iter().map(|c| ColumnMeta::new(*c, "text")).collect(),
        rows.iter()
            .map(|r| r.iter().map(|v| v.map(str::to_string)).collect())
            .collect(),
    )
}

/// A one-row, one-column aggregate.
#[must_use]
pub fn single_value(column: &str, value: Option<&str>) -> ResultSet {
    make_result_set(&[column], &[vec![value]])
}

/// Cost-per-query rows: three queries, one without attributed credits,
/// deliberately out of order.
#[must_use]
pub fn make_test_query_cost_set() -> ResultSet {
    let row = |id: &'static str, credits: Option<&'static str>, ms: &'static str| {
        vec![
            Some(id),
            credits,
            Some("1704103200.000000000"),
            Some("1704103260.500000000"),
            Some("SELECT"),
            Some("ANALYTICS.PUBLIC"),
            Some("ALICE (ANALYST)"),
            Some("SUCCESS"),
            Some(ms),
            Some("42"),
            Some("REPORTING_WH"),
            Some("SELECT * FROM orders"),
        ]
    };
    make_result_set(
        &QUERY_COST_COLUMNS,
        &[
            row("01b2-small", Some("0.0125"), "850"),
            row("01b2-none", None, "1200"),
            row("01b2-large", Some("3.5"), "60500"),
        ],
    )
}

/// Warehouse credit rows, already descending.
#[must_use]
pub fn make_test_warehouse_set() -> ResultSet {
    make_result_set(
        &["WAREHOUSE_NAME", "TOTAL_CREDITS_USED"],
        &[
            vec![Some("REPORTING_WH"), Some("812.25")],
            vec![Some("ETL_WH"), Some("402.3")],
            vec![Some("ADHOC_WH"), Some("20.017")],
        ],
    )
}

// =============================================================================
// Test Data Factories
// =============================================================================

/// A cost row with realistic values and the given id and credits.
#[must_use]
pub fn make_test_query_cost_row(query_id: &str, credits: Option<f64>) -> QueryCostRow {
    QueryCostRow {
        query_id: query_id.to_string(),
        credits_attributed_compute: credits,
        start_time: Utc.timestamp_opt(1_704_103_200, 0).single(),
        end_time: Utc.timestamp_opt(1_704_103_260, 0).single(),
        query_type: Some("SELECT".to_string()),
        schema: Some("ANALYTICS.PUBLIC".to_string()),
        role_user: Some("ALICE (ANALYST)".to_string()),
        execution_status: Some("SUCCESS".to_string()),
        total_elapsed_time: Some("1m 0s".to_string()),
        rows_produced: Some(42),
        warehouse_name: Some("REPORTING_WH".to_string()),
        query_text: Some("SELECT * FROM orders".to_string()),
    }
}

#[must_use]
pub fn make_test_warehouse_credits(name: &str, credits: Option<f64>) -> WarehouseCredits {
    WarehouseCredits {
        warehouse_name: name.to_string(),
        total_credits_used: credits,
    }
}

/// A validated range; panics on an invalid one.
///
/// # Panics
///
/// Panics unless `start < end`.
#[must_use]
pub fn make_test_range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRangeInput::new(Some(start), Some(end))
        .validate(end)
        .expect("test range must be valid")
}

/// A fully loaded page for 2024-01-01..2024-01-31.
///
/// # Panics
///
/// Never; the dates are constants.
#[must_use]
pub fn make_test_page() -> DashboardPage {
    make_test_page_for(
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date"),
    )
}

/// A fully loaded page for the given range, every section ready.
#[must_use]
pub fn make_test_page_for(start: NaiveDate, end: NaiveDate) -> DashboardPage {
    DashboardPage {
        range: make_test_range(start, end),
        credits_used: Section::ready(1234.567),
        jobs_executed: Section::ready(98_765),
        billable_storage_tb: Section::ready(12.3456),
        query_costs: Section::ready(vec![
            make_test_query_cost_row("01b2-large", Some(3.5)),
            make_test_query_cost_row("01b2-small", Some(0.0125)),
            make_test_query_cost_row("01b2-none", None),
        ]),
        warehouse_credits: Section::ready(vec![
            make_test_warehouse_credits("REPORTING_WH", Some(812.25)),
            make_test_warehouse_credits("ETL_WH", Some(402.3)),
            make_test_warehouse_credits("ADHOC_WH", Some(20.017)),
        ]),
        generated_at: Utc::now(),
    }
}

/// Resolved configuration with defaults and a test account URL.
#[must_use]
pub fn make_test_config(format: OutputFormat) -> ResolvedConfig {
    ResolvedConfig {
        format,
        timeout: Duration::from_secs(30),
        poll_interval: Duration::from_millis(10),
        no_color: true,
        pretty: false,
        log_level: None,
        account_url: Some("https://acme-test.snowflakecomputing.com".to_string()),
        token_type: TokenType::default(),
        token_file: None,
        warehouse: Some("REPORTING_WH".to_string()),
        role: None,
        database: None,
        lookback_days: DEFAULT_LOOKBACK_DAYS,
        usage_schema: DEFAULT_USAGE_SCHEMA.to_string(),
        duration_function: None,
        sources: ConfigSources::default(),
    }
}

/// Sample config TOML content for testing.
#[must_use]
pub fn make_test_config_toml(account_url: &str) -> String {
    format!(
        r#"[connection]
account_url = "{account_url}"
token_type = "oauth"
warehouse = "REPORTING_WH"

[general]
timeout_seconds = 30
poll_interval_millis = 10
log_level = "warn"

[report]
lookback_days = 31

[output]
format = "human"
color = false
pretty = false
"#
    )
}

// =============================================================================
// Test Directory Helper
// =============================================================================

/// An isolated temporary directory, removed on drop.
///
/// # Examples
///
/// ```rust,ignore
/// use sfcost::test_utils::TestDir;
///
/// let dir = TestDir::new();
/// dir.create_file("config.toml", "[general]\ntimeout_seconds = 30");
/// assert!(dir.file_exists("config.toml"));
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
///
/// # Examples
///
/// ```rust,ignore
/// use sfcost::assert_contains;
///
/// assert_contains!("Credits Used: 1,234.57", "1,234.57");
/// ```
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
    ($haystack:expr, $needle:expr, $($arg:tt)*) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            $($arg)*
        );
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
    ($haystack:expr, $needle:expr, $($arg:tt)*) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            $($arg)*
        );
    };
}

/// Assert that a string is valid JSON.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {
        let json = $json;
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(_) => {}
            Err(e) => {
                panic!(
                    "Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}",
                    e, json
                );
            }
        }
    };
}

/// Assert that a string contains ANSI escape codes.
#[macro_export]
macro_rules! assert_ansi_codes {
    ($text:expr) => {
        let text = $text;
        assert!(
            text.contains('\x1b'),
            "Expected string to contain ANSI escape codes, but none found.\n\nActual string:\n{:?}",
            text
        );
    };
}

/// Assert that a string does NOT contain ANSI escape codes.
#[macro_export]
macro_rules! assert_no_ansi_codes {
    ($text:expr) => {
        let text = $text;
        assert!(
            !text.contains('\x1b'),
            "Expected string to NOT contain ANSI escape codes.\n\nActual string:\n{:?}",
            text
        );
    };
}

/// Assert approximate floating point equality.
///
/// # Examples
///
/// ```rust,ignore
/// use sfcost::assert_float_eq;
///
/// assert_float_eq!(12.3456, 12.3456000001);
/// assert_float_eq!(1234.5, 1234.57, 0.1); // Custom epsilon
/// ```
#[macro_export]
macro_rules! assert_float_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_float_eq!($left, $right, f64::EPSILON * 100.0)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = $epsilon;
        assert!(
            (left - right).abs() < epsilon,
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    };
}

// =============================================================================
// Test Helpers
// =============================================================================

/// Strip ANSI escape codes from a string.
#[must_use]
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                // CSI runs until its final letter
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}
