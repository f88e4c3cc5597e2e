//! Classifies how spending in each category is changing over time.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    category::CategoryId,
    transaction::{TransactionType, query::TransactionRow},
};

/// Categories with fewer expenses than this are left out of the analysis.
pub const MIN_OBSERVATIONS: usize = 3;

const RECENT_WINDOW: usize = 3;
const INCREASE_THRESHOLD: f64 = 1.1;
const DECREASE_THRESHOLD: f64 = 0.9;
const MAX_CONFIDENCE: f64 = 0.9;

/// The direction recent spending is heading compared to earlier spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

/// The spending behaviour in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingPattern {
    pub category_id: CategoryId,
    pub category_name: String,
    /// Mean of every expense in the category.
    pub average_amount: f64,
    /// The expected size of the next expense, the mean of the recent window.
    pub predicted_next: f64,
    pub trend: Trend,
    /// Between 0.3 and 0.9, grows with the number of expenses.
    pub confidence_score: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.iter().sum::<f64>() / values.len() as f64
}

fn classify(recent_mean: f64, older_mean: f64) -> Trend {
    if recent_mean > older_mean * INCREASE_THRESHOLD {
        Trend::Increasing
    } else if recent_mean < older_mean * DECREASE_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Find the spending pattern of every category with at least
/// [MIN_OBSERVATIONS] expenses, ordered by category ID.
///
/// The last three expenses form the recent window. The older window is all
/// earlier expenses, or just the first one when there are exactly three.
/// Income is ignored.
pub fn analyze_spending_patterns(rows: &[TransactionRow]) -> Vec<SpendingPattern> {
    let mut by_category: BTreeMap<CategoryId, (&str, Vec<&TransactionRow>)> = BTreeMap::new();

    for row in rows {
        if row.transaction_type == TransactionType::Expense {
            by_category
                .entry(row.category_id)
                .or_insert_with(|| (&row.category_name, Vec::new()))
                .1
                .push(row);
        }
    }

    by_category
        .into_iter()
        .filter(|(_, (_, expenses))| expenses.len() >= MIN_OBSERVATIONS)
        .map(|(category_id, (category_name, mut expenses))| {
            expenses.sort_by_key(|row| (row.date, row.id));
            let amounts = expenses.iter().map(|row| row.amount).collect::<Vec<_>>();

            let count = amounts.len();
            let recent = &amounts[count - RECENT_WINDOW..];
            let older = if count > RECENT_WINDOW {
                &amounts[..count - RECENT_WINDOW]
            } else {
                &amounts[..1]
            };
            let recent_mean = mean(recent);

            SpendingPattern {
                category_id,
                category_name: category_name.to_owned(),
                average_amount: mean(&amounts),
                predicted_next: recent_mean,
                trend: classify(recent_mean, mean(older)),
                confidence_score: (count as f64 / 10.0).min(MAX_CONFIDENCE),
            }
        })
        .collect()
}
