//! Turns spending patterns into budget advice.

use std::str::FromStr;

use serde::Serialize;

use crate::{
    Error,
    analytics::{SpendingPattern, Trend},
    db::impl_text_column,
};

/// Patterns at or below this confidence do not produce budget advice.
const MIN_BUDGET_CONFIDENCE: f64 = 0.5;
const BUDGET_IMPACT_WEIGHT: f64 = 70.0;
/// Balances above this get a savings suggestion.
const SAVINGS_BALANCE_THRESHOLD: f64 = 1000.0;
const SAVINGS_IMPACT: f64 = 60.0;

/// What area of the user's finances a recommendation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Budget,
    Savings,
    Category,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Budget => "budget",
            RecommendationType::Savings => "savings",
            RecommendationType::Category => "category",
        }
    }
}

impl FromStr for RecommendationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "budget" => Ok(RecommendationType::Budget),
            "savings" => Ok(RecommendationType::Savings),
            "category" => Ok(RecommendationType::Category),
            other => Err(Error::InvalidEnumValue {
                kind: "recommendation type",
                value: other.to_owned(),
            }),
        }
    }
}

/// How urgently the user should act on a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::InvalidEnumValue {
                kind: "priority",
                value: other.to_owned(),
            }),
        }
    }
}

impl_text_column!(RecommendationType);
impl_text_column!(Priority);

/// A recommendation that has been generated but not stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationDraft {
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// 0 to 100, higher is shown first.
    pub impact_score: f64,
}

/// Build recommendations from `patterns` and the user's current `balance`,
/// highest impact first.
///
/// Recommendations with the same impact keep the order they were generated in.
pub fn generate_recommendations(
    patterns: &[SpendingPattern],
    balance: f64,
) -> Vec<RecommendationDraft> {
    let mut recommendations = patterns
        .iter()
        .filter(|pattern| {
            pattern.trend == Trend::Increasing && pattern.confidence_score > MIN_BUDGET_CONFIDENCE
        })
        .map(|pattern| RecommendationDraft {
            recommendation_type: RecommendationType::Budget,
            title: format!("Consider setting a budget for {}", pattern.category_name),
            description: format!(
                "Your {} spending is increasing. Average: ${:.2}",
                pattern.category_name, pattern.average_amount
            ),
            priority: Priority::Medium,
            impact_score: pattern.confidence_score * BUDGET_IMPACT_WEIGHT,
        })
        .collect::<Vec<_>>();

    if balance > SAVINGS_BALANCE_THRESHOLD {
        recommendations.push(RecommendationDraft {
            recommendation_type: RecommendationType::Savings,
            title: "Great job! Consider setting up a savings goal".to_owned(),
            description: format!("With ${balance:.2} balance, you could save 20% monthly"),
            priority: Priority::Low,
            impact_score: SAVINGS_IMPACT,
        });
    }

    // `sort_by` is stable.
    recommendations.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));

    recommendations
}

#[cfg(test)]
mod recommendation_tests {
    use crate::analytics::{SpendingPattern, Trend};

    use super::{Priority, RecommendationType, generate_recommendations};

    fn pattern(category_id: i64, trend: Trend, confidence_score: f64) -> SpendingPattern {
        SpendingPattern {
            category_id,
            category_name: format!("Category {category_id}"),
            average_amount: 12.5,
            predicted_next: 20.0,
            trend,
            confidence_score,
        }
    }

    #[test]
    fn nothing_to_recommend() {
        assert!(generate_recommendations(&[], 0.0).is_empty());
    }

    #[test]
    fn increasing_confident_pattern_gets_budget_advice() {
        let recommendations =
            generate_recommendations(&[pattern(1, Trend::Increasing, 0.8)], 0.0);

        assert_eq!(recommendations.len(), 1);
        let recommendation = &recommendations[0];
        assert_eq!(
            recommendation.recommendation_type,
            RecommendationType::Budget
        );
        assert_eq!(
            recommendation.title,
            "Consider setting a budget for Category 1"
        );
        assert_eq!(
            recommendation.description,
            "Your Category 1 spending is increasing. Average: $12.50"
        );
        assert_eq!(recommendation.priority, Priority::Medium);
        assert!((recommendation.impact_score - 56.0).abs() < 1e-9);
    }

    #[test]
    fn weak_or_flat_patterns_are_skipped() {
        let patterns = [
            pattern(1, Trend::Increasing, 0.5),
            pattern(2, Trend::Stable, 0.9),
            pattern(3, Trend::Decreasing, 0.9),
        ];

        assert!(generate_recommendations(&patterns, 0.0).is_empty());
    }

    #[test]
    fn savings_advice_only_above_threshold() {
        assert!(generate_recommendations(&[], 1000.0).is_empty());

        let recommendations = generate_recommendations(&[], 1500.0);

        assert_eq!(recommendations.len(), 1);
        assert_eq!(
            recommendations[0].recommendation_type,
            RecommendationType::Savings
        );
        assert_eq!(
            recommendations[0].description,
            "With $1500.00 balance, you could save 20% monthly"
        );
        assert_eq!(recommendations[0].priority, Priority::Low);
        assert_eq!(recommendations[0].impact_score, 60.0);
    }

    #[test]
    fn sorted_by_impact_keeping_ties_in_order() {
        let patterns = [
            pattern(1, Trend::Increasing, 0.6),
            pattern(2, Trend::Increasing, 0.9),
            pattern(3, Trend::Increasing, 0.6),
        ];

        let recommendations = generate_recommendations(&patterns, 2000.0);

        let titles = recommendations
            .iter()
            .map(|recommendation| recommendation.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            titles,
            [
                "Consider setting a budget for Category 2",
                "Great job! Consider setting up a savings goal",
                "Consider setting a budget for Category 1",
                "Consider setting a budget for Category 3",
            ]
        );
        assert!(
            recommendations
                .windows(2)
                .all(|pair| pair[0].impact_score >= pair[1].impact_score)
        );
    }

    #[test]
    fn round_trips_through_strings() {
        for priority in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(priority.as_str().parse::<Priority>().unwrap(), priority);
        }
        assert!("urgent".parse::<Priority>().is_err());
        assert!("bogus".parse::<RecommendationType>().is_err());
    }
}
