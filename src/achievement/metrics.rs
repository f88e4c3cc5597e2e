//! The numbers that achievement conditions are checked against.

use std::collections::BTreeMap;

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    analytics::{get_ledger, totals},
    auth::UserID,
    budget_goal::count_budget_goals,
    insights::count_applied_recommendations,
    receipt::count_receipt_scans,
    transaction::query::TransactionRow,
};

/// Progress of one user towards every automatically awarded achievement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserMetrics {
    pub transaction_count: usize,
    pub budget_goals_count: u32,
    pub best_monthly_savings: f64,
    pub categories_used: usize,
    pub receipts_scanned: u32,
    pub longest_daily_streak: u32,
    pub recommendations_applied: u32,
}

impl UserMetrics {
    /// Gather the metrics for `user_id` from the database.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if any of the queries fail.
    pub fn load(user_id: UserID, connection: &Connection) -> Result<Self, Error> {
        let ledger = get_ledger(user_id, connection)?;

        let mut categories = ledger.iter().map(|row| row.category_id).collect::<Vec<_>>();
        categories.sort_unstable();
        categories.dedup();

        Ok(Self {
            transaction_count: ledger.len(),
            budget_goals_count: count_budget_goals(user_id, connection)?,
            best_monthly_savings: best_monthly_savings(&ledger),
            categories_used: categories.len(),
            receipts_scanned: count_receipt_scans(user_id, connection)?,
            longest_daily_streak: longest_daily_streak(ledger.iter().map(|row| row.date)),
            recommendations_applied: count_applied_recommendations(user_id, connection)?,
        })
    }

    /// The user's current value for `condition_type`, or `None` for
    /// conditions that are never awarded automatically.
    pub fn value_for(&self, condition_type: &str) -> Option<f64> {
        let value = match condition_type {
            "transaction_count" => self.transaction_count as f64,
            "budget_goals_count" => f64::from(self.budget_goals_count),
            "monthly_savings" => self.best_monthly_savings,
            "categories_used" => self.categories_used as f64,
            "receipts_scanned" => f64::from(self.receipts_scanned),
            "consecutive_days" => f64::from(self.longest_daily_streak),
            "ai_recommendations_used" => f64::from(self.recommendations_applied),
            _ => return None,
        };

        Some(value)
    }
}

/// The largest income minus expenses over any single calendar month, 0 if
/// there are no transactions.
pub fn best_monthly_savings(rows: &[TransactionRow]) -> f64 {
    let mut by_month: BTreeMap<(i32, u8), Vec<&TransactionRow>> = BTreeMap::new();

    for row in rows {
        by_month
            .entry((row.date.year(), u8::from(row.date.month())))
            .or_default()
            .push(row);
    }

    by_month
        .into_values()
        .map(|month| totals(month).balance())
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// The longest run of consecutive days in `dates`. Duplicates and order do
/// not matter.
pub fn longest_daily_streak(dates: impl IntoIterator<Item = Date>) -> u32 {
    let mut dates = dates.into_iter().collect::<Vec<_>>();
    dates.sort_unstable();
    dates.dedup();

    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<Date> = None;

    for date in dates {
        current = match previous.and_then(|previous| previous.next_day()) {
            Some(expected) if expected == date => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(date);
    }

    longest
}
