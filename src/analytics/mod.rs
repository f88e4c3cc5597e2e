//! Pure functions that turn a user's transactions into balances, spending
//! patterns, recommendations and summary statistics.
//!
//! Everything except [get_ledger] works on rows that have already been
//! loaded, ordered oldest first.

mod balance;
mod patterns;
mod periods;
mod recommendations;
mod stats;
mod trends;

use rusqlite::Connection;

use crate::{
    Error,
    auth::UserID,
    transaction::query::{SortOrder, TransactionFilter, TransactionRow, get_transaction_rows},
};

pub use balance::{
    CategoryTotal, Totals, calculate_balance, expenses_by_category, month_start, monthly_totals,
    totals,
};
pub use patterns::{MIN_OBSERVATIONS, SpendingPattern, Trend, analyze_spending_patterns};
pub use periods::{PeriodSummary, ReportPeriod, period_report};
pub use recommendations::{
    Priority, RecommendationDraft, RecommendationType, generate_recommendations,
};
pub use stats::{DashboardStats, RECENT_TRANSACTION_COUNT, compute_dashboard_stats};
pub use trends::{
    DEFAULT_TREND_DAYS, DailyTotal, Insight, Predictions, clamp_trend_days, daily_totals,
    predict_spending,
};

/// All of a user's transactions, oldest first.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn get_ledger(user_id: UserID, connection: &Connection) -> Result<Vec<TransactionRow>, Error> {
    get_transaction_rows(
        user_id,
        &TransactionFilter::default(),
        SortOrder::Ascending,
        None,
        connection,
    )
}
