//! Account usage views and the five statements a page load issues.

use std::sync::LazyLock;

use regex::Regex;

use super::date_range::DateRange;
use super::query::{Agg, Predicate, SortOrder, Statement, TableQuery};

/// Default schema holding the account usage views.
pub const DEFAULT_USAGE_SCHEMA: &str = "SNOWFLAKE.ACCOUNT_USAGE";

pub const METERING_HISTORY: &str = "METERING_HISTORY";
pub const QUERY_HISTORY: &str = "QUERY_HISTORY";
pub const QUERY_ATTRIBUTION_HISTORY: &str = "QUERY_ATTRIBUTION_HISTORY";
pub const STORAGE_USAGE: &str = "STORAGE_USAGE";
pub const WAREHOUSE_METERING_HISTORY: &str = "WAREHOUSE_METERING_HISTORY";

/// Bytes per terabyte (1024^4).
pub const BYTES_PER_TB: u64 = 1_099_511_627_776;

static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Unquoted identifiers, optionally dotted (DB.SCHEMA or DB.SCHEMA.FUNC)
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*){0,2}$").unwrap()
});

/// Check that `value` is a plain, optionally dotted SQL identifier.
#[must_use]
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_REGEX.is_match(value)
}

/// Where the views live and how elapsed time is formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageViews {
    schema: String,
    duration_function: Option<String>,
}

impl Default for UsageViews {
    fn default() -> Self {
        Self::new(DEFAULT_USAGE_SCHEMA, None)
    }
}

impl UsageViews {
    /// Identifiers are expected to be validated at config load.
    #[must_use]
    pub fn new(schema: impl Into<String>, duration_function: Option<String>) -> Self {
        Self {
            schema: schema.into(),
            duration_function,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Whether elapsed time is formatted server-side.
    #[must_use]
    pub const fn formats_duration_remotely(&self) -> bool {
        self.duration_function.is_some()
    }

    /// Fully qualified view name.
    #[must_use]
    pub fn view(&self, name: &str) -> String {
        format!("{}.{name}", self.schema)
    }

    /// Credits Used tile: summed metering credits.
    #[must_use]
    pub fn credits_used(&self, range: &DateRange) -> Statement {
        Statement::new(format!(
            "SELECT SUM(CREDITS_USED)::FLOAT AS CREDITS FROM {} \
             WHERE START_TIME BETWEEN ? AND ?",
            self.view(METERING_HISTORY)
        ))
        .bind(range.start())
        .bind(range.end())
    }

    /// Total # Jobs Executed tile: query history row count.
    #[must_use]
    pub fn jobs_executed(&self, range: &DateRange) -> Statement {
        TableQuery::table(self.view(QUERY_HISTORY))
            .filter(Predicate::between("START_TIME", range.start(), range.end()))
            .count()
    }

    /// Current Storage (TB) tile: average billable bytes in TB.
    #[must_use]
    pub fn billable_storage(&self, range: &DateRange) -> Statement {
        TableQuery::table(self.view(STORAGE_USAGE))
            .agg(
                Agg::avg(format!(
                    "(STORAGE_BYTES + STAGE_BYTES + FAILSAFE_BYTES) / {BYTES_PER_TB}"
                ))
                .alias("BILLABLE_TB"),
            )
            .filter(Predicate::between("USAGE_DATE", range.start(), range.end()))
            .to_statement()
    }

    /// Cost per query table.
    ///
    /// Filters on the attribution start date and end date separately, not
    /// with `BETWEEN`.
    #[must_use]
    pub fn query_costs(&self, range: &DateRange) -> Statement {
        let elapsed = self.duration_function.as_ref().map_or_else(
            || "qh.TOTAL_ELAPSED_TIME AS TOTAL_ELAPSED_MS".to_string(),
            |func| format!("{func}(qh.TOTAL_ELAPSED_TIME) AS TOTAL_ELAPSED_TIME"),
        );

        Statement::new(format!(
            "SELECT \
                qath.QUERY_ID, \
                qath.CREDITS_ATTRIBUTED_COMPUTE, \
                qath.START_TIME, \
                qath.END_TIME, \
                qh.QUERY_TYPE, \
                qh.DATABASE_NAME || '.' || qh.SCHEMA_NAME AS SCHEMA, \
                qh.USER_NAME || ' (' || qh.ROLE_NAME || ')' AS ROLE_USER, \
                qh.EXECUTION_STATUS, \
                {elapsed}, \
                qh.ROWS_PRODUCED, \
                qath.WAREHOUSE_NAME, \
                qh.QUERY_TEXT \
             FROM {qath} qath \
             INNER JOIN {qh} qh ON qath.QUERY_ID = qh.QUERY_ID \
             WHERE qath.START_TIME::DATE >= ? AND qath.END_TIME::DATE <= ? \
             ORDER BY qath.CREDITS_ATTRIBUTED_COMPUTE DESC NULLS LAST",
            qath = self.view(QUERY_ATTRIBUTION_HISTORY),
            qh = self.view(QUERY_HISTORY),
        ))
        .bind(range.start())
        .bind(range.end())
    }

    /// Credit Usage by Warehouse chart.
    #[must_use]
    pub fn warehouse_credits(&self, range: &DateRange) -> Statement {
        TableQuery::table(self.view(WAREHOUSE_METERING_HISTORY))
            .select(["WAREHOUSE_NAME", "CREDITS_USED"])
            .filter(Predicate::between("START_TIME", range.start(), range.end()))
            .group_by(["WAREHOUSE_NAME"])
            .agg(Agg::sum("CREDITS_USED").cast_float().alias("TOTAL_CREDITS_USED"))
            .sort("TOTAL_CREDITS_USED", SortOrder::Desc)
            .to_statement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::date_range::DateRangeInput;
    use crate::core::query::Binding;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        let d = |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        DateRangeInput::new(Some(d("2024-01-01")), Some(d("2024-01-31")))
            .validate(d("2024-02-01"))
            .unwrap()
    }

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("SNOWFLAKE.ACCOUNT_USAGE"));
        assert!(is_valid_identifier("my_db.utils.pretty_print_duration"));
        assert!(!is_valid_identifier("a.b.c.d"));
        assert!(!is_valid_identifier("X; DROP TABLE Y"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1ABC"));
    }

    #[test]
    fn every_statement_binds_the_range() {
        let views = UsageViews::default();
        let r = range();
        for stmt in [
            views.credits_used(&r),
            views.jobs_executed(&r),
            views.billable_storage(&r),
            views.query_costs(&r),
            views.warehouse_credits(&r),
        ] {
            assert_eq!(stmt.placeholder_count(), 2, "{}", stmt.sql);
            assert_eq!(
                stmt.bindings,
                vec![Binding::Date(r.start()), Binding::Date(r.end())]
            );
            assert!(!stmt.sql.contains("2024-01-01"));
        }
    }

    #[test]
    fn storage_divides_by_terabyte() {
        let stmt = UsageViews::default().billable_storage(&range());
        assert!(stmt.sql.contains("/ 1099511627776"));
        assert!(stmt.sql.contains("AS BILLABLE_TB"));
        assert!(stmt.sql.contains("SNOWFLAKE.ACCOUNT_USAGE.STORAGE_USAGE"));
    }

    #[test]
    fn cost_table_uses_mixed_columns() {
        let stmt = UsageViews::default().query_costs(&range());
        assert!(stmt.sql.contains("qath.START_TIME::DATE >= ?"));
        assert!(stmt.sql.contains("qath.END_TIME::DATE <= ?"));
        assert!(stmt.sql.contains("ORDER BY qath.CREDITS_ATTRIBUTED_COMPUTE DESC"));
    }

    #[test]
    fn duration_function_is_applied_when_configured() {
        let local = UsageViews::default().query_costs(&range());
        assert!(local.sql.contains("TOTAL_ELAPSED_MS"));

        let remote = UsageViews::new(
            "ACME.USAGE",
            Some("UTIL_DB.UTILS.PRETTY_PRINT_DURATION".to_string()),
        )
        .query_costs(&range());
        assert!(
            remote
                .sql
                .contains("UTIL_DB.UTILS.PRETTY_PRINT_DURATION(qh.TOTAL_ELAPSED_TIME)")
        );
        assert!(remote.sql.contains("FROM ACME.USAGE.QUERY_ATTRIBUTION_HISTORY"));
    }
}
