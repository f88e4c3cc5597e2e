//! The analytics and period report pages.

mod analytics_page;
mod reports_page;

pub use analytics_page::{AnalyticsPageState, get_analytics_page};
pub use reports_page::{ReportQuery, ReportsPageState, get_reports_page};
