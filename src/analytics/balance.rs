//! Income, expense and balance totals.

use std::collections::HashMap;

use time::{Date, Duration};

use crate::{
    category::CategoryId,
    transaction::{TransactionType, query::TransactionRow},
};

/// The summed income and expenses of a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expenses: f64,
}

impl Totals {
    /// Income minus expenses.
    pub fn balance(&self) -> f64 {
        self.income - self.expenses
    }

    fn add(&mut self, row: &TransactionRow) {
        match row.transaction_type {
            TransactionType::Income => self.income += row.amount,
            TransactionType::Expense => self.expenses += row.amount,
        }
    }
}

/// Sum income and expenses over `rows`.
pub fn totals<'a>(rows: impl IntoIterator<Item = &'a TransactionRow>) -> Totals {
    let mut totals = Totals::default();

    for row in rows {
        totals.add(row);
    }

    totals
}

/// The balance is always recomputed from the transactions, there is no stored running total.
pub fn calculate_balance(rows: &[TransactionRow]) -> f64 {
    totals(rows).balance()
}

/// The first day of the month that `date` falls in.
pub fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// Totals for the transactions dated from the start of `today`'s month onwards.
pub fn monthly_totals(rows: &[TransactionRow], today: Date) -> Totals {
    let start = month_start(today);

    totals(rows.iter().filter(|row| row.date >= start))
}

/// The expenses in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category_id: CategoryId,
    pub name: String,
    pub color: String,
    pub total: f64,
    pub count: usize,
}

/// Sum the expenses in `rows` per category, largest total first.
///
/// Categories with equal totals are ordered by name.
pub fn expenses_by_category<'a>(
    rows: impl IntoIterator<Item = &'a TransactionRow>,
) -> Vec<CategoryTotal> {
    let mut by_category: HashMap<CategoryId, CategoryTotal> = HashMap::new();

    for row in rows {
        if row.transaction_type != TransactionType::Expense {
            continue;
        }

        let entry = by_category
            .entry(row.category_id)
            .or_insert_with(|| CategoryTotal {
                category_id: row.category_id,
                name: row.category_name.clone(),
                color: row.category_color.clone(),
                total: 0.0,
                count: 0,
            });
        entry.total += row.amount;
        entry.count += 1;
    }

    let mut category_totals = by_category.into_values().collect::<Vec<_>>();
    category_totals.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    category_totals
}

#[cfg(test)]
mod balance_tests {
    use time::macros::date;

    use crate::analytics::test_rows::{expense, income};

    use super::{calculate_balance, expenses_by_category, month_start, monthly_totals, totals};

    #[test]
    fn balance_is_income_minus_expenses() {
        let rows = [
            income(1, 1000.0, date!(2025 - 01 - 01), 8),
            expense(2, 250.5, date!(2025 - 01 - 02), 1),
            expense(3, 49.5, date!(2025 - 01 - 03), 2),
            income(4, 100.0, date!(2025 - 01 - 04), 9),
        ];

        let totals = totals(&rows);

        assert_eq!(totals.income, 1100.0);
        assert_eq!(totals.expenses, 300.0);
        assert_eq!(calculate_balance(&rows), 800.0);
    }

    #[test]
    fn empty_balance_is_zero() {
        assert_eq!(calculate_balance(&[]), 0.0);
    }

    #[test]
    fn month_start_is_first_day() {
        assert_eq!(month_start(date!(2025 - 02 - 28)), date!(2025 - 02 - 01));
        assert_eq!(month_start(date!(2025 - 02 - 01)), date!(2025 - 02 - 01));
    }

    #[test]
    fn monthly_totals_ignore_earlier_months() {
        let rows = [
            expense(1, 10.0, date!(2025 - 01 - 31), 1),
            expense(2, 20.0, date!(2025 - 02 - 01), 1),
            income(3, 50.0, date!(2025 - 02 - 10), 8),
        ];

        let monthly = monthly_totals(&rows, date!(2025 - 02 - 15));

        assert_eq!(monthly.income, 50.0);
        assert_eq!(monthly.expenses, 20.0);
    }

    #[test]
    fn category_expenses_sorted_by_total() {
        let rows = [
            expense(1, 10.0, date!(2025 - 01 - 01), 1),
            expense(2, 30.0, date!(2025 - 01 - 02), 2),
            expense(3, 15.0, date!(2025 - 01 - 03), 1),
            income(4, 500.0, date!(2025 - 01 - 04), 3),
        ];

        let category_totals = expenses_by_category(&rows);

        assert_eq!(category_totals.len(), 2);
        assert_eq!(category_totals[0].category_id, 2);
        assert_eq!(category_totals[0].total, 30.0);
        assert_eq!(category_totals[1].category_id, 1);
        assert_eq!(category_totals[1].total, 25.0);
        assert_eq!(category_totals[1].count, 2);
    }
}
