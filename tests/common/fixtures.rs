//! SQL API response bodies and a ready-made mock account.
#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sfcost::core::session::{AccessToken, SessionSettings, SqlApiSession, TokenType};

pub const TEST_TOKEN: &str = "test-access-token";

/// A `200 OK` statement body with one partition.
pub fn statement_ok(columns: &[&str], rows: &[Vec<Value>]) -> Value {
    let row_type: Vec<Value> = columns
        .iter()
        .map(|c| json!({"name": c, "type": "text", "nullable": true}))
        .collect();
    json!({
        "resultSetMetaData": {
            "numRows": rows.len(),
            "format": "jsonv2",
            "rowType": row_type,
            "partitionInfo": [{"rowCount": rows.len()}]
        },
        "data": rows,
        "code": "090001",
        "statementHandle": "01b2c3d4-0000-0000-0000-000000000001",
        "message": "Statement executed successfully."
    })
}

/// A `202 Accepted` body pointing at the status URL for `handle`.
pub fn statement_running(handle: &str) -> Value {
    json!({
        "code": "333334",
        "message": "Asynchronous execution in progress.",
        "statementHandle": handle,
        "statementStatusUrl": format!("/api/v2/statements/{handle}")
    })
}

/// A `422` SQL compilation error.
pub fn statement_failed(message: &str) -> Value {
    json!({
        "code": "002003",
        "sqlState": "42S02",
        "message": message,
        "statementHandle": "01b2c3d4-0000-0000-0000-0000000000ff"
    })
}

/// Session settings pointing at a mock server.
pub fn session_settings(server: &MockServer) -> SessionSettings {
    SessionSettings {
        account_url: server.uri(),
        token: AccessToken::new(TEST_TOKEN),
        token_type: TokenType::Oauth,
        warehouse: Some("REPORTING_WH".to_string()),
        role: Some("ACCOUNTADMIN".to_string()),
        database: None,
        timeout: std::time::Duration::from_secs(5),
        poll_interval: std::time::Duration::from_millis(10),
    }
}

pub fn session(server: &MockServer) -> SqlApiSession {
    SqlApiSession::new(session_settings(server)).expect("session")
}

async fn mount_statement(server: &MockServer, fragment: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path("/api/v2/statements"))
        .and(body_string_contains(fragment))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount replies for all five page statements. `storage_rows` lets a test
/// empty out the storage view.
pub async fn mount_full_page(server: &MockServer, storage_rows: &[Vec<Value>]) {
    mount_statement(
        server,
        "AS CREDITS FROM",
        statement_ok(&["CREDITS"], &[vec![json!("1234.567")]]),
    )
    .await;
    mount_statement(
        server,
        "AS ROW_COUNT",
        statement_ok(&["ROW_COUNT"], &[vec![json!("98765")]]),
    )
    .await;
    mount_statement(
        server,
        "AS BILLABLE_TB",
        statement_ok(&["BILLABLE_TB"], storage_rows),
    )
    .await;
    mount_statement(
        server,
        "QUERY_ATTRIBUTION_HISTORY",
        statement_ok(
            &[
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
            ],
            &[
                query_row("01b2-small", json!("0.0125")),
                query_row("01b2-large", json!("3.5")),
            ],
        ),
    )
    .await;
    mount_statement(
        server,
        "AS TOTAL_CREDITS_USED",
        statement_ok(
            &["WAREHOUSE_NAME", "TOTAL_CREDITS_USED"],
            &[
                vec![json!("REPORTING_WH"), json!("812.25")],
                vec![json!("ETL_WH"), json!("402.3")],
            ],
        ),
    )
    .await;
}

fn query_row(id: &str, credits: Value) -> Vec<Value> {
    vec![
        json!(id),
        credits,
        json!("1704103200.000000000"),
        json!("1704103260.500000000"),
        json!("SELECT"),
        json!("ANALYTICS.PUBLIC"),
        json!("ALICE (ANALYST)"),
        json!("SUCCESS"),
        json!("60500"),
        json!("42"),
        json!("REPORTING_WH"),
        json!("SELECT * FROM orders"),
    ]
}

/// One storage row, 12.3456 TB.
pub fn storage_rows() -> Vec<Vec<Value>> {
    vec![vec![json!("12.3456")]]
}
