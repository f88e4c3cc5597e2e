//! Day by day totals and spending forecasts.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Duration};

use crate::{
    analytics::{SpendingPattern, Trend},
    transaction::{TransactionType, query::TransactionRow},
};

/// The number of days in the spending trend when none is requested.
pub const DEFAULT_TREND_DAYS: u16 = 30;
const MAX_TREND_DAYS: u16 = 365;

/// Keep a requested number of days within 1 to 365, defaulting to
/// [DEFAULT_TREND_DAYS].
pub fn clamp_trend_days(days: Option<i64>) -> u16 {
    match days {
        Some(days) => days.clamp(1, i64::from(MAX_TREND_DAYS)) as u16,
        None => DEFAULT_TREND_DAYS,
    }
}

/// The income and expenses on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: Date,
    pub income: f64,
    pub expenses: f64,
}

/// One entry for each of the `days` days ending on `today`, oldest first.
///
/// Days without transactions have zero totals.
pub fn daily_totals(rows: &[TransactionRow], days: u16, today: Date) -> Vec<DailyTotal> {
    let start = today - Duration::days(i64::from(days) - 1);
    let mut by_date: BTreeMap<Date, DailyTotal> = (0..i64::from(days))
        .map(|offset| start + Duration::days(offset))
        .map(|date| {
            (
                date,
                DailyTotal {
                    date,
                    income: 0.0,
                    expenses: 0.0,
                },
            )
        })
        .collect();

    for row in rows {
        if let Some(total) = by_date.get_mut(&row.date) {
            match row.transaction_type {
                TransactionType::Income => total.income += row.amount,
                TransactionType::Expense => total.expenses += row.amount,
            }
        }
    }

    by_date.into_values().collect()
}

/// A note about a category whose spending is going up or down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub category: String,
    pub trend: Trend,
    pub message: String,
}

/// A forecast of next period's spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predictions {
    /// The sum of the predicted next expense in every category.
    pub predicted_total: f64,
    /// Mean confidence over all categories, 0 if there are none.
    pub average_confidence: f64,
    pub patterns: Vec<SpendingPattern>,
    pub insights: Vec<Insight>,
}

/// Aggregate the per-category `patterns` into a forecast.
pub fn predict_spending(patterns: Vec<SpendingPattern>) -> Predictions {
    let predicted_total = patterns.iter().map(|pattern| pattern.predicted_next).sum();
    let average_confidence = if patterns.is_empty() {
        0.0
    } else {
        patterns
            .iter()
            .map(|pattern| pattern.confidence_score)
            .sum::<f64>()
            / patterns.len() as f64
    };

    let insights = patterns.iter().filter_map(insight_for).collect();

    Predictions {
        predicted_total,
        average_confidence,
        patterns,
        insights,
    }
}

fn insight_for(pattern: &SpendingPattern) -> Option<Insight> {
    let message = match pattern.trend {
        Trend::Increasing => format!(
            "Spending on {} is trending up, expect around ${:.2} next time",
            pattern.category_name, pattern.predicted_next
        ),
        Trend::Decreasing => format!("Great! {} spending is decreasing", pattern.category_name),
        Trend::Stable => return None,
    };

    Some(Insight {
        category: pattern.category_name.clone(),
        trend: pattern.trend,
        message,
    })
}

#[cfg(test)]
mod trend_tests {
    use time::macros::date;

    use crate::analytics::{
        SpendingPattern, Trend,
        test_rows::{expense, income},
    };

    use super::{DEFAULT_TREND_DAYS, clamp_trend_days, daily_totals, predict_spending};

    #[test]
    fn days_are_clamped() {
        assert_eq!(clamp_trend_days(None), DEFAULT_TREND_DAYS);
        assert_eq!(clamp_trend_days(Some(0)), 1);
        assert_eq!(clamp_trend_days(Some(-5)), 1);
        assert_eq!(clamp_trend_days(Some(90)), 90);
        assert_eq!(clamp_trend_days(Some(10_000)), 365);
    }

    #[test]
    fn every_day_has_an_entry() {
        let today = date!(2025 - 03 - 10);
        let rows = [
            income(1, 100.0, date!(2025 - 03 - 08), 1),
            expense(2, 20.0, date!(2025 - 03 - 10), 2),
            expense(3, 5.0, date!(2025 - 03 - 10), 2),
            expense(4, 999.0, date!(2025 - 03 - 01), 2),
        ];

        let totals = daily_totals(&rows, 3, today);

        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].date, date!(2025 - 03 - 08));
        assert_eq!(totals[0].income, 100.0);
        assert_eq!(totals[1].income, 0.0);
        assert_eq!(totals[1].expenses, 0.0);
        assert_eq!(totals[2].date, today);
        assert_eq!(totals[2].expenses, 25.0);
    }

    #[test]
    fn empty_patterns_predict_nothing() {
        let predictions = predict_spending(Vec::new());

        assert_eq!(predictions.predicted_total, 0.0);
        assert_eq!(predictions.average_confidence, 0.0);
        assert!(predictions.insights.is_empty());
    }

    #[test]
    fn insights_only_for_changing_categories() {
        let pattern = |category_id: i64, trend: Trend, predicted_next: f64| SpendingPattern {
            category_id,
            category_name: format!("Category {category_id}"),
            average_amount: 10.0,
            predicted_next,
            trend,
            confidence_score: 0.5,
        };

        let predictions = predict_spending(vec![
            pattern(1, Trend::Increasing, 30.0),
            pattern(2, Trend::Stable, 12.5),
            pattern(3, Trend::Decreasing, 7.5),
        ]);

        assert_eq!(predictions.predicted_total, 50.0);
        assert_eq!(predictions.average_confidence, 0.5);
        assert_eq!(predictions.insights.len(), 2);
        assert_eq!(predictions.insights[0].category, "Category 1");
        assert_eq!(predictions.insights[0].trend, Trend::Increasing);
        assert_eq!(predictions.insights[1].category, "Category 3");
        assert_eq!(predictions.insights[1].trend, Trend::Decreasing);
        assert_eq!(
            predictions.insights[1].message,
            "Great! Category 3 spending is decreasing"
        );
    }
}
