//! Summary numbers for the dashboard.

use time::Date;

use crate::{
    analytics::{CategoryTotal, expenses_by_category, monthly_totals, totals},
    transaction::query::TransactionRow,
};

/// How many of the latest transactions the dashboard lists.
pub const RECENT_TRANSACTION_COUNT: usize = 5;

/// Everything the dashboard shows about a user's finances.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    /// Newest first.
    pub recent_transactions: Vec<TransactionRow>,
    /// Expenses per category, largest first.
    pub category_totals: Vec<CategoryTotal>,
    pub transaction_count: usize,
    /// Days from the first transaction to today, inclusive. At least 1.
    pub days_with_data: i64,
    pub avg_transactions_per_day: f64,
    /// The share of this month's income that was not spent, as a percentage
    /// rounded to one decimal place.
    pub savings_rate: f64,
    /// This month's expenses divided by the day of the month.
    pub daily_average: f64,
}

fn round_to_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute the dashboard statistics for `rows` as of `today`.
pub fn compute_dashboard_stats(rows: &[TransactionRow], today: Date) -> DashboardStats {
    let all_time = totals(rows);
    let this_month = monthly_totals(rows, today);

    let mut recent_transactions = rows.to_vec();
    recent_transactions.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));
    recent_transactions.truncate(RECENT_TRANSACTION_COUNT);

    let days_with_data = rows
        .iter()
        .map(|row| row.date)
        .min()
        .map(|earliest| (today - earliest).whole_days() + 1)
        .unwrap_or(1)
        .max(1);

    let savings_rate = if this_month.income > 0.0 {
        round_to_one_decimal(this_month.balance() / this_month.income * 100.0)
    } else {
        0.0
    };

    DashboardStats {
        total_income: all_time.income,
        total_expenses: all_time.expenses,
        balance: all_time.balance(),
        monthly_income: this_month.income,
        monthly_expenses: this_month.expenses,
        recent_transactions,
        category_totals: expenses_by_category(rows),
        transaction_count: rows.len(),
        days_with_data,
        avg_transactions_per_day: rows.len() as f64 / days_with_data as f64,
        savings_rate,
        daily_average: this_month.expenses / f64::from(today.day().max(1)),
    }
}

#[cfg(test)]
mod dashboard_stats_tests {
    use time::macros::date;

    use crate::analytics::test_rows::{expense, income};

    use super::compute_dashboard_stats;

    #[test]
    fn no_transactions() {
        let stats = compute_dashboard_stats(&[], date!(2025 - 03 - 15));

        assert_eq!(stats.balance, 0.0);
        assert_eq!(stats.transaction_count, 0);
        assert_eq!(stats.days_with_data, 1);
        assert_eq!(stats.avg_transactions_per_day, 0.0);
        assert_eq!(stats.savings_rate, 0.0);
        assert_eq!(stats.daily_average, 0.0);
        assert!(stats.recent_transactions.is_empty());
        assert!(stats.category_totals.is_empty());
    }

    #[test]
    fn totals_and_monthly_figures() {
        let today = date!(2025 - 03 - 10);
        let rows = [
            income(1, 1000.0, date!(2025 - 02 - 01), 1),
            expense(2, 200.0, date!(2025 - 02 - 15), 2),
            income(3, 3000.0, date!(2025 - 03 - 01), 1),
            expense(4, 1000.0, date!(2025 - 03 - 05), 2),
        ];

        let stats = compute_dashboard_stats(&rows, today);

        assert_eq!(stats.total_income, 4000.0);
        assert_eq!(stats.total_expenses, 1200.0);
        assert_eq!(stats.balance, 2800.0);
        assert_eq!(stats.monthly_income, 3000.0);
        assert_eq!(stats.monthly_expenses, 1000.0);
        assert_eq!(stats.savings_rate, 66.7);
        assert_eq!(stats.daily_average, 100.0);
        assert_eq!(stats.days_with_data, 38);
        assert_eq!(stats.avg_transactions_per_day, 4.0 / 38.0);
    }

    #[test]
    fn recent_transactions_are_newest_five() {
        let rows = (1..=7)
            .map(|id| expense(id, 1.0, date!(2025 - 03 - 01), 1))
            .collect::<Vec<_>>();

        let stats = compute_dashboard_stats(&rows, date!(2025 - 03 - 02));

        let ids = stats
            .recent_transactions
            .iter()
            .map(|row| row.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, [7, 6, 5, 4, 3]);
    }

    #[test]
    fn category_totals_are_largest_first() {
        let rows = [
            expense(1, 10.0, date!(2025 - 03 - 01), 1),
            expense(2, 50.0, date!(2025 - 03 - 01), 2),
            expense(3, 15.0, date!(2025 - 03 - 02), 1),
        ];

        let stats = compute_dashboard_stats(&rows, date!(2025 - 03 - 02));

        assert_eq!(stats.category_totals.len(), 2);
        assert_eq!(stats.category_totals[0].category_id, 2);
        assert_eq!(stats.category_totals[1].total, 25.0);
        assert_eq!(stats.category_totals[1].count, 2);
    }
}
