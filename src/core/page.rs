//! One page load.
//!
//! Validates the date range first, then issues the five section statements
//! concurrently. Each section resolves to its own [`Section`]; a failure in
//! one never affects the others.

use std::cmp::Ordering;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::date_range::{DateRange, DateRangeInput};
use super::models::{DashboardPage, QueryCostRow, Section, SectionId, WarehouseCredits};
use super::session::WarehouseSession;
use super::views::UsageViews;
use crate::error::Result;
use crate::util::time::format_elapsed_ms;

/// Validate `input` against `today` and load the page.
///
/// # Errors
///
/// Returns the date-range error without issuing any statement when the
/// input is incomplete or invalid.
pub async fn load_from_input<S: WarehouseSession>(
    session: &S,
    views: &UsageViews,
    input: DateRangeInput,
    today: NaiveDate,
) -> Result<DashboardPage> {
    let range = input.validate(today)?;
    Ok(load_page(session, views, range).await)
}

/// Load every section of the page for a validated range.
pub async fn load_page<S: WarehouseSession>(
    session: &S,
    views: &UsageViews,
    range: DateRange,
) -> DashboardPage {
    let started = Instant::now();
    info!(start = %range.start(), end = %range.end(), "loading page");

    let (credits_used, jobs_executed, billable_storage_tb, query_costs, warehouse_credits) =
        futures::join!(
            guarded(
                SectionId::CreditsUsed,
                fetch_credits_used(session, views, &range)
            ),
            guarded(
                SectionId::JobsExecuted,
                fetch_jobs_executed(session, views, &range)
            ),
            guarded(
                SectionId::BillableStorage,
                fetch_billable_storage(session, views, &range)
            ),
            guarded(
                SectionId::QueryCosts,
                fetch_query_costs(session, views, &range)
            ),
            guarded(
                SectionId::WarehouseCredits,
                fetch_warehouse_credits(session, views, &range)
            ),
        );

    let page = DashboardPage {
        range,
        credits_used,
        jobs_executed,
        billable_storage_tb,
        query_costs,
        warehouse_credits,
        generated_at: Utc::now(),
    };

    info!(
        ready = page.ready_count(),
        elapsed_ms = started.elapsed().as_millis(),
        "page loaded"
    );
    page
}

async fn guarded<T>(id: SectionId, fetch: impl Future<Output = Result<T>>) -> Section<T> {
    match fetch.await {
        Ok(value) => {
            debug!(section = id.title(), "section ready");
            Section::ready(value)
        }
        Err(err) => {
            warn!(
                section = id.title(),
                code = err.error_code(),
                error = %err,
                "section failed"
            );
            Section::failed(err.to_string())
        }
    }
}

/// Credits Used tile.
///
/// # Errors
///
/// Statement failures, an empty result or a NULL sum.
pub async fn fetch_credits_used<S: WarehouseSession>(
    session: &S,
    views: &UsageViews,
    range: &DateRange,
) -> Result<f64> {
    let rs = session.execute(&views.credits_used(range)).await?;
    rs.first_row("credit metering")?.f64("CREDITS")
}

/// Total # Jobs Executed tile.
///
/// # Errors
///
/// Statement failures or an empty result.
pub async fn fetch_jobs_executed<S: WarehouseSession>(
    session: &S,
    views: &UsageViews,
    range: &DateRange,
) -> Result<u64> {
    let rs = session.execute(&views.jobs_executed(range)).await?;
    rs.first_row("query history")?.u64("ROW_COUNT")
}

/// Current Storage (TB) tile.
///
/// # Errors
///
/// Statement failures, an empty result or a NULL average.
pub async fn fetch_billable_storage<S: WarehouseSession>(
    session: &S,
    views: &UsageViews,
    range: &DateRange,
) -> Result<f64> {
    let rs = session.execute(&views.billable_storage(range)).await?;
    rs.first_row("storage usage")?.f64("BILLABLE_TB")
}

/// Cost per query table, credits descending.
///
/// # Errors
///
/// Statement failures (including a failing duration function) or a row
/// that cannot be decoded.
pub async fn fetch_query_costs<S: WarehouseSession>(
    session: &S,
    views: &UsageViews,
    range: &DateRange,
) -> Result<Vec<QueryCostRow>> {
    let rs = session.execute(&views.query_costs(range)).await?;
    let remote_duration = views.formats_duration_remotely();

    let mut rows = rs
        .rows()
        .map(|row| {
            let total_elapsed_time = if remote_duration {
                row.opt_text("TOTAL_ELAPSED_TIME")?
            } else {
                row.opt_u64("TOTAL_ELAPSED_MS")?.map(format_elapsed_ms)
            };
            Ok(QueryCostRow {
                query_id: row.text("QUERY_ID")?,
                credits_attributed_compute: row.opt_f64("CREDITS_ATTRIBUTED_COMPUTE")?,
                start_time: row.opt_timestamp("START_TIME")?,
                end_time: row.opt_timestamp("END_TIME")?,
                query_type: row.opt_text("QUERY_TYPE")?,
                schema: row.opt_text("SCHEMA")?,
                role_user: row.opt_text("ROLE_USER")?,
                execution_status: row.opt_text("EXECUTION_STATUS")?,
                total_elapsed_time,
                rows_produced: row.opt_u64("ROWS_PRODUCED")?,
                warehouse_name: row.opt_text("WAREHOUSE_NAME")?,
                query_text: row.opt_text("QUERY_TEXT")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    sort_query_costs(&mut rows);
    Ok(rows)
}

/// Credit Usage by Warehouse chart, credits descending.
///
/// # Errors
///
/// Statement failures or a row that cannot be decoded.
pub async fn fetch_warehouse_credits<S: WarehouseSession>(
    session: &S,
    views: &UsageViews,
    range: &DateRange,
) -> Result<Vec<WarehouseCredits>> {
    let rs = session.execute(&views.warehouse_credits(range)).await?;
    let mut rows = rs
        .rows()
        .map(|row| {
            Ok(WarehouseCredits {
                warehouse_name: row.opt_text("WAREHOUSE_NAME")?.unwrap_or_default(),
                total_credits_used: row.opt_f64("TOTAL_CREDITS_USED")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    sort_warehouse_credits(&mut rows);
    Ok(rows)
}

/// Descending with NULL last; equal keys keep their relative order.
fn desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by attributed credits, descending, NULL last.
pub fn sort_query_costs(rows: &mut [QueryCostRow]) {
    rows.sort_by(|a, b| {
        desc_nulls_last(a.credits_attributed_compute, b.credits_attributed_compute)
    });
}

/// Stable sort by summed credits, descending, NULL last.
pub fn sort_warehouse_credits(rows: &mut [WarehouseCredits]) {
    rows.sort_by(|a, b| desc_nulls_last(a.total_credits_used, b.total_credits_used));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SfcostError;
    use crate::test_utils::{
        CREDITS_USED_SQL, MockSession, QUERY_COSTS_SQL, make_result_set, make_test_query_cost_row,
        make_test_range, make_test_warehouse_credits, single_value,
    };
    use tracing_test::traced_test;

    fn january() -> DateRange {
        make_test_range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn query_costs_sort_desc_with_nulls_last() {
        let mut rows = vec![
            make_test_query_cost_row("a", None),
            make_test_query_cost_row("b", Some(1.0)),
            make_test_query_cost_row("c", Some(5.0)),
            make_test_query_cost_row("d", Some(1.0)),
        ];
        sort_query_costs(&mut rows);
        let ids: Vec<&str> = rows.iter().map(|r| r.query_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn warehouse_credits_sort_desc() {
        let mut rows = vec![
            make_test_warehouse_credits("SMALL_WH", Some(2.0)),
            make_test_warehouse_credits("BIG_WH", Some(40.0)),
            make_test_warehouse_credits("IDLE_WH", None),
        ];
        sort_warehouse_credits(&mut rows);
        let names: Vec<&str> = rows.iter().map(|r| r.warehouse_name.as_str()).collect();
        assert_eq!(names, vec!["BIG_WH", "SMALL_WH", "IDLE_WH"]);
    }

    #[tokio::test]
    async fn full_page_from_canned_replies() {
        let session = MockSession::with_full_page();
        let page = load_page(&session, &UsageViews::default(), january()).await;

        assert_eq!(page.ready_count(), 5);
        let ids: Vec<&str> = page
            .query_costs
            .value()
            .unwrap()
            .iter()
            .map(|r| r.query_id.as_str())
            .collect();
        assert_eq!(ids.last(), Some(&"01b2-none"));
        assert_eq!(session.statements().len(), 5);
    }

    #[tokio::test]
    async fn null_credit_sum_fails_the_tile() {
        let session =
            MockSession::new().with_rows(CREDITS_USED_SQL, single_value("CREDITS", None));
        let err = fetch_credits_used(&session, &UsageViews::default(), &january())
            .await
            .unwrap_err();
        assert!(matches!(err, SfcostError::NullValue(ref c) if c == "CREDITS"));
    }

    #[tokio::test]
    async fn remote_duration_column_is_passed_through() {
        let views = UsageViews::new(
            "SNOWFLAKE.ACCOUNT_USAGE",
            Some("UTIL.PRETTY_PRINT_DURATION".to_string()),
        );
        let session = MockSession::new().with_rows(
            QUERY_COSTS_SQL,
            make_result_set(
                &[
                    "QUERY_ID",
                    "CREDITS_ATTRIBUTED_COMPUTE",
                    "START_TIME",
                    "END_TIME",
                    "QUERY_TYPE",
                    "SCHEMA",
                    "ROLE_USER",
                    "EXECUTION_STATUS",
                    "TOTAL_ELAPSED_TIME",
                    "ROWS_PRODUCED",
                    "WAREHOUSE_NAME",
                    "QUERY_TEXT",
                ],
                &[vec![
                    Some("q1"),
                    Some("0.5"),
                    None,
                    None,
                    Some("SELECT"),
                    None,
                    None,
                    Some("SUCCESS"),
                    Some("2 minutes"),
                    None,
                    None,
                    None,
                ]],
            ),
        );

        let rows = fetch_query_costs(&session, &views, &january()).await.unwrap();
        assert_eq!(rows[0].total_elapsed_time.as_deref(), Some("2 minutes"));
        assert!(session.statements()[0].sql.contains("UTIL.PRETTY_PRINT_DURATION"));
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_sections_are_logged() {
        let page = load_page(&MockSession::new(), &UsageViews::default(), january()).await;
        assert_eq!(page.ready_count(), 0);
        assert!(logs_contain("section failed"));
        assert!(logs_contain("page loaded"));
    }
}
