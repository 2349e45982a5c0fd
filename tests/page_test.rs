//! Page loading end to end against a mock SQL API.

mod common;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::MockServer;

use sfcost::core::date_range::DateRangeInput;
use sfcost::core::models::SectionId;
use sfcost::core::page::{load_from_input, load_page};
use sfcost::core::views::UsageViews;
use sfcost::error::SfcostError;
use sfcost::test_utils::{
    BILLABLE_STORAGE_SQL, CREDITS_USED_SQL, JOBS_EXECUTED_SQL, MockSession, QUERY_COSTS_SQL,
    WAREHOUSE_CREDITS_SQL, make_test_range, make_test_warehouse_set, single_value,
};

use common::fixtures::{mount_full_page, session, storage_rows};
use common::logger::TestLogger;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[tokio::test]
async fn full_page_loads_every_section() {
    let log = TestLogger::new("full_page_loads_every_section");
    let server = MockServer::start().await;
    mount_full_page(&server, &storage_rows()).await;

    log.phase("load");
    let range = make_test_range(d(2024, 1, 1), d(2024, 1, 31));
    let page = load_page(&session(&server), &UsageViews::default(), range).await;

    log.phase("verify");
    assert_eq!(page.ready_count(), 5);
    assert!(page.warnings().is_empty());
    assert!((page.credits_used.value().unwrap() - 1234.567).abs() < 1e-9);
    assert_eq!(page.jobs_executed.value(), Some(&98_765));
    assert!((page.billable_storage_tb.value().unwrap() - 12.3456).abs() < 1e-9);

    let queries = page.query_costs.value().unwrap();
    let ids: Vec<&str> = queries.iter().map(|q| q.query_id.as_str()).collect();
    assert_eq!(ids, vec!["01b2-large", "01b2-small"]);
    assert_eq!(queries[0].total_elapsed_time.as_deref(), Some("1m"));

    let warehouses = page.warehouse_credits.value().unwrap();
    assert_eq!(warehouses[0].warehouse_name, "REPORTING_WH");
    assert_eq!(warehouses.len(), 2);

    assert_eq!(server.received_requests().await.unwrap().len(), 5);
    log.finish_ok();
}

#[tokio::test]
async fn empty_storage_view_fails_only_its_tile() {
    let (log, capture) = TestLogger::with_capture("empty_storage_view_fails_only_its_tile");
    let server = MockServer::start().await;
    mount_full_page(&server, &[]).await;

    let range = make_test_range(d(2024, 1, 1), d(2024, 1, 31));
    let page = load_page(&session(&server), &UsageViews::default(), range).await;

    assert_eq!(page.ready_count(), 4);
    let warnings = page.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].section, SectionId::BillableStorage);
    assert_eq!(warnings[0].message, "storage usage returned no rows");

    capture.assert_logged_at_level(tracing::Level::WARN, "section failed");
    capture.assert_field_logged("code", "SFCOST-Q010");
    log.finish_ok();
}

#[tokio::test]
async fn null_storage_average_is_a_failure() {
    let server = MockServer::start().await;
    mount_full_page(&server, &[vec![json!(null)]]).await;

    let range = make_test_range(d(2024, 1, 1), d(2024, 1, 31));
    let page = load_page(&session(&server), &UsageViews::default(), range).await;

    assert!(!page.billable_storage_tb.is_ready());
    assert!(page.billable_storage_tb.warning().unwrap().contains("BILLABLE_TB"));
    assert!(page.credits_used.is_ready());
}

#[tokio::test]
async fn invalid_input_issues_no_statements() {
    let session = MockSession::with_full_page();
    let today = d(2024, 2, 15);

    let reversed = DateRangeInput::new(Some(d(2024, 2, 1)), Some(d(2024, 1, 1)));
    let err = load_from_input(&session, &UsageViews::default(), reversed, today)
        .await
        .unwrap_err();
    assert!(matches!(err, SfcostError::InvalidDateRange { .. }));

    let open = DateRangeInput::new(Some(d(2024, 1, 1)), None);
    let err = load_from_input(&session, &UsageViews::default(), open, today)
        .await
        .unwrap_err();
    assert!(matches!(err, SfcostError::IncompleteDateRange));

    let future = DateRangeInput::new(Some(d(2024, 1, 1)), Some(d(2024, 3, 1)));
    let err = load_from_input(&session, &UsageViews::default(), future, today)
        .await
        .unwrap_err();
    assert!(matches!(err, SfcostError::DateAfterToday { .. }));

    assert!(session.statements().is_empty());
}

#[tokio::test]
async fn every_statement_binds_the_same_range() {
    let session = MockSession::with_full_page();
    let input = DateRangeInput::new(Some(d(2024, 1, 1)), Some(d(2024, 1, 31)));
    let page = load_from_input(&session, &UsageViews::default(), input, d(2024, 2, 15))
        .await
        .unwrap();
    assert_eq!(page.ready_count(), 5);

    let statements = session.statements();
    assert_eq!(statements.len(), 5);
    for statement in &statements {
        assert_eq!(statement.bindings.len(), statement.placeholder_count());
        assert!(!statement.bindings.is_empty());
    }
}

#[tokio::test]
async fn failing_table_leaves_other_sections_ready() {
    let session = MockSession::new()
        .with_error(QUERY_COSTS_SQL, || SfcostError::QueryFailed {
            code: "002003".to_string(),
            sql_state: "42S02".to_string(),
            message: "Unknown function PRETTY_PRINT_DURATION".to_string(),
        })
        .with_rows(CREDITS_USED_SQL, single_value("CREDITS", Some("1.5")))
        .with_rows(JOBS_EXECUTED_SQL, single_value("ROW_COUNT", Some("2")))
        .with_rows(BILLABLE_STORAGE_SQL, single_value("BILLABLE_TB", Some("0.5")))
        .with_rows(WAREHOUSE_CREDITS_SQL, make_test_warehouse_set());

    let range = make_test_range(d(2024, 1, 1), d(2024, 1, 31));
    let page = load_page(&session, &UsageViews::default(), range).await;

    assert_eq!(page.ready_count(), 4);
    assert!(
        page.query_costs
            .warning()
            .unwrap()
            .contains("PRETTY_PRINT_DURATION")
    );
    assert!(page.warehouse_credits.is_ready());
    assert_eq!(session.statements().len(), 5);
}
