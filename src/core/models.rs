//! Page data models and the robot output envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::date_range::DateRange;
use crate::error::SfcostError;

/// Schema version stamped on every JSON envelope.
pub const SCHEMA_VERSION: &str = "sfcost.v1";

/// Documentation for the attribution view, shown under the page title.
pub const ATTRIBUTION_DOC_URL: &str =
    "https://docs.snowflake.com/sql-reference/account-usage/query_attribution_history";

pub const PAGE_TITLE: &str = "Per Query Cost Attribution";

pub const PAGE_CAPTION: &str =
    "Credit usage per query, based on the query_attribution_history view";

// =============================================================================
// Section outcome
// =============================================================================

/// Outcome of one independently fetched page section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Section<T> {
    Ready { value: T },
    Failed { message: String },
}

impl<T> Section<T> {
    #[must_use]
    pub const fn ready(value: T) -> Self {
        Self::Ready { value }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// The value, if the section rendered.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Ready { value } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    /// The warning text, if the section failed.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Ready { .. } => None,
            Self::Failed { message } => Some(message),
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

impl<T> From<Result<T, SfcostError>> for Section<T> {
    fn from(result: Result<T, SfcostError>) -> Self {
        match result {
            Ok(value) => Self::ready(value),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}

/// The five sections of the page, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionId {
    CreditsUsed,
    JobsExecuted,
    BillableStorage,
    QueryCosts,
    WarehouseCredits,
}

impl SectionId {
    pub const ALL: [Self; 5] = [
        Self::CreditsUsed,
        Self::JobsExecuted,
        Self::BillableStorage,
        Self::QueryCosts,
        Self::WarehouseCredits,
    ];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::CreditsUsed => "Credits Used",
            Self::JobsExecuted => "Total # Jobs Executed",
            Self::BillableStorage => "Current Storage (TB)",
            Self::QueryCosts => "Cost per query",
            Self::WarehouseCredits => "Credit Usage by Warehouse",
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// One attributed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCostRow {
    pub query_id: String,
    pub credits_attributed_compute: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub query_type: Option<String>,
    pub schema: Option<String>,
    pub role_user: Option<String>,
    pub execution_status: Option<String>,
    pub total_elapsed_time: Option<String>,
    pub rows_produced: Option<u64>,
    pub warehouse_name: Option<String>,
    pub query_text: Option<String>,
}

/// Summed credits for one warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseCredits {
    pub warehouse_name: String,
    pub total_credits_used: Option<f64>,
}

// =============================================================================
// Page
// =============================================================================

/// A fully loaded page: the range plus each section's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPage {
    pub range: DateRange,
    pub credits_used: Section<f64>,
    pub jobs_executed: Section<u64>,
    pub billable_storage_tb: Section<f64>,
    pub query_costs: Section<Vec<QueryCostRow>>,
    pub warehouse_credits: Section<Vec<WarehouseCredits>>,
    pub generated_at: DateTime<Utc>,
}

/// A failed section's inline warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionWarning {
    pub section: SectionId,
    pub message: String,
}

impl DashboardPage {
    fn warning_for(&self, id: SectionId) -> Option<&str> {
        match id {
            SectionId::CreditsUsed => self.credits_used.warning(),
            SectionId::JobsExecuted => self.jobs_executed.warning(),
            SectionId::BillableStorage => self.billable_storage_tb.warning(),
            SectionId::QueryCosts => self.query_costs.warning(),
            SectionId::WarehouseCredits => self.warehouse_credits.warning(),
        }
    }

    /// One warning per failed section, in render order.
    #[must_use]
    pub fn warnings(&self) -> Vec<SectionWarning> {
        SectionId::ALL
            .into_iter()
            .filter_map(|id| {
                self.warning_for(id).map(|message| SectionWarning {
                    section: id,
                    message: message.to_string(),
                })
            })
            .collect()
    }

    #[must_use]
    pub fn ready_count(&self) -> usize {
        SectionId::ALL.len() - self.warnings().len()
    }
}

// =============================================================================
// Robot Output
// =============================================================================

/// Top-level JSON envelope for robot mode output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub data: T,

    #[serde(default)]
    pub errors: Vec<String>,

    pub meta: RobotMeta,
}

/// Metadata for robot output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotMeta {
    pub format: String,
    pub flags: Vec<String>,
    pub runtime: String,
}

impl<T> RobotOutput<T> {
    /// Create with errors.
    pub fn with_errors(command: impl Into<String>, data: T, errors: Vec<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            command: command.into(),
            data,
            errors,
            meta: RobotMeta {
                format: "json".to_string(),
                flags: Vec::new(),
                runtime: "cli".to_string(),
            },
        }
    }

    /// Create a new robot output envelope.
    pub fn new(command: impl Into<String>, data: T) -> Self {
        Self::with_errors(command, data, Vec::new())
    }
}

impl RobotOutput<DashboardPage> {
    /// Report envelope: section warnings become `errors` prefixed with the section title.
    #[must_use]
    pub fn report(page: DashboardPage) -> Self {
        let errors = page
            .warnings()
            .into_iter()
            .map(|w| format!("{}: {}", w.section.title(), w.message))
            .collect();
        Self::with_errors("report", page, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_test_page;
    use crate::{assert_contains, assert_json_valid};

    #[test]
    fn section_serializes_with_status_tag() {
        let ready: Section<f64> = Section::ready(1.5);
        let json = serde_json::to_value(&ready).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["value"], 1.5);

        let failed: Section<f64> = Section::failed("boom");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn section_from_result_keeps_error_text() {
        let section: Section<u64> = Err(SfcostError::EmptyResult("storage usage".into())).into();
        assert_eq!(section.warning(), Some("storage usage returned no rows"));
        assert!(section.value().is_none());
    }

    #[test]
    fn warnings_follow_render_order() {
        let mut page = make_test_page();
        page.warehouse_credits = Section::failed("chart down");
        page.credits_used = Section::failed("tile down");
        let warnings = page.warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].section, SectionId::CreditsUsed);
        assert_eq!(warnings[1].section, SectionId::WarehouseCredits);
        assert_eq!(page.ready_count(), 3);
    }

    #[test]
    fn report_envelope() {
        let mut page = make_test_page();
        page.billable_storage_tb = Section::failed("no rows");
        let output = RobotOutput::report(page);
        let json = serde_json::to_string(&output).unwrap();
        assert_json_valid!(&json);
        assert_contains!(&json, "sfcost.v1");
        assert_eq!(output.errors, vec!["Current Storage (TB): no rows".to_string()]);
        assert_eq!(output.command, "report");
    }
}
