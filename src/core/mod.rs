//! Core data models, the warehouse session and the page loader.

pub mod date_range;
pub mod http;
pub mod logging;
pub mod models;
pub mod page;
pub mod query;
pub mod result_set;
pub mod session;
pub mod views;

pub use date_range::{DateRange, DateRangeInput};
pub use models::{
    DashboardPage, QueryCostRow, RobotOutput, Section, SectionId, SectionWarning,
    WarehouseCredits,
};
pub use page::{load_from_input, load_page};
pub use query::{Binding, Statement, TableQuery};
pub use result_set::{ColumnMeta, ResultSet};
pub use session::{AccessToken, SessionSettings, SqlApiSession, TokenType, WarehouseSession};
pub use views::UsageViews;
