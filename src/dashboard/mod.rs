//! The landing page for logged in users: balance, this month's figures,
//! recent transactions and spending charts.

mod cards;
pub(crate) mod charts;
mod handlers;
mod tables;

pub use handlers::{DashboardState, get_dashboard_page};
