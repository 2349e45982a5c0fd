//! Reusable rich output components for the cost attribution page.
//!
//! Each component wraps rich_rust segments and implements [`Renderable`]
//! for both styled and plain text output.
//!
//! ## Components
//!
//! - [`MetricTile`] / [`TileRow`] - Headline numbers of the account summary
//! - [`CostTable`] - Per-query attributed credits
//! - [`CreditChart`] - Horizontal bars of credits per warehouse
//! - [`WarningPanel`] - Inline warnings for failed sections
//!
//! [`Renderable`]: crate::rich::Renderable

mod cost_table;
mod credit_chart;
mod formatters;
mod metric_tile;
mod warning_panel;

pub use cost_table::{COLUMNS as COST_TABLE_COLUMNS, CostTable, row_cells};
pub use credit_chart::CreditChart;
pub use formatters::*;
pub use metric_tile::{MetricTile, TileRow};
pub use warning_panel::WarningPanel;
