//! The data shown by each widget type and the JSON endpoint that serves it.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use time::{Date, Duration};

use crate::{
    AppState, Error,
    analytics::{Priority, calculate_balance, expenses_by_category, get_ledger},
    auth::UserID,
    budget_goal::get_goal_progress,
    insights::top_recommendations,
    timezone::local_today,
    widget::WidgetType,
};

const SPENDING_WINDOW_DAYS: i64 = 30;
const GOALS_LIMIT: usize = 5;
const RECOMMENDATIONS_LIMIT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    pub amount: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalSummary {
    pub category: String,
    pub target: f64,
    pub current: f64,
    pub progress: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationSummary {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub impact_score: f64,
}

/// The contents of a widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WidgetData {
    Balance {
        balance: f64,
        currency: &'static str,
    },
    /// Expenses in the last 30 days keyed by category name.
    SpendingChart(BTreeMap<String, CategorySpending>),
    Goals(Vec<GoalSummary>),
    Recommendations(Vec<RecommendationSummary>),
}

/// Compute what a `widget_type` widget shows for `user_id` as of `today`.
///
/// # Errors
/// Returns an [Error::SqlError] if the underlying data could not be read.
pub fn load_widget_data(
    widget_type: WidgetType,
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<WidgetData, Error> {
    match widget_type {
        WidgetType::Balance => Ok(WidgetData::Balance {
            balance: calculate_balance(&get_ledger(user_id, connection)?),
            currency: "USD",
        }),
        WidgetType::SpendingChart => {
            let since = today - Duration::days(SPENDING_WINDOW_DAYS);
            let ledger = get_ledger(user_id, connection)?;
            let spending = expenses_by_category(ledger.iter().filter(|row| row.date >= since))
                .into_iter()
                .map(|total| {
                    (
                        total.name,
                        CategorySpending {
                            amount: total.total,
                            color: total.color,
                        },
                    )
                })
                .collect();

            Ok(WidgetData::SpendingChart(spending))
        }
        WidgetType::Goals => {
            let goals = get_goal_progress(user_id, today, connection)?
                .into_iter()
                .take(GOALS_LIMIT)
                .map(|progress| GoalSummary {
                    category: progress.category_name,
                    target: progress.goal.target_amount,
                    current: progress.current_spent,
                    progress: progress.progress_percentage,
                    over_budget: progress.is_over_budget,
                })
                .collect();

            Ok(WidgetData::Goals(goals))
        }
        WidgetType::Recommendations => {
            let recommendations =
                top_recommendations(user_id, Some(RECOMMENDATIONS_LIMIT), connection)?
                    .into_iter()
                    .map(|recommendation| RecommendationSummary {
                        title: recommendation.title,
                        description: recommendation.description,
                        priority: recommendation.priority,
                        impact_score: recommendation.impact_score,
                    })
                    .collect();

            Ok(WidgetData::Recommendations(recommendations))
        }
    }
}

/// The state needed to serve widget data.
#[derive(Debug, Clone)]
pub struct WidgetDataState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for WidgetDataState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Serve the data for one widget type as JSON.
///
/// Unknown widget types get a 404 with a JSON error body.
pub async fn get_widget_data(
    State(state): State<WidgetDataState>,
    Extension(user_id): Extension<UserID>,
    Path(widget_type): Path<String>,
) -> Result<Response, Error> {
    let Ok(widget_type) = widget_type.parse::<WidgetType>() else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Unknown widget type"})),
        )
            .into_response());
    };

    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let data = load_widget_data(widget_type, user_id, today, &connection).inspect_err(|error| {
        tracing::error!("Could not load {widget_type} widget data for user {user_id}: {error}")
    })?;

    Ok(Json(data).into_response())
}

#[cfg(test)]
mod widget_data_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::Response,
    };
    use rusqlite::Connection;
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::{
        analytics::{Priority, RecommendationDraft, RecommendationType},
        auth::User,
        budget_goal::{BudgetPeriod, create_budget_goal},
        category::get_category_by_name,
        insights::store_recommendation,
        test_utils::{create_test_user, get_test_connection, response_json},
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::{WidgetDataState, get_widget_data};

    fn seed() -> (Connection, User) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let today = OffsetDateTime::now_utc().date();
        let food = get_category_by_name("Food", &connection).unwrap();
        let salary = get_category_by_name("Salary", &connection).unwrap();

        for (amount, transaction_type, date, category) in [
            (200.0, TransactionType::Income, today, salary.id),
            (30.0, TransactionType::Expense, today, food.id),
            (20.0, TransactionType::Expense, today - Duration::days(60), food.id),
        ] {
            create_transaction(
                Transaction::build(amount, transaction_type, date, category).description("Test"),
                user.id,
                &connection,
            )
            .unwrap();
        }
        create_budget_goal(user.id, food.id, 20.0, BudgetPeriod::Monthly, today, &connection)
            .unwrap();
        for impact_score in [10.0, 40.0, 30.0, 20.0] {
            store_recommendation(
                user.id,
                &RecommendationDraft {
                    recommendation_type: RecommendationType::Budget,
                    title: format!("Tip {impact_score}"),
                    description: "Spend less".to_owned(),
                    priority: Priority::Medium,
                    impact_score,
                },
                &connection,
            )
            .unwrap();
        }

        (connection, user)
    }

    async fn fetch(widget_type: &str) -> Response {
        let (connection, user) = seed();
        let state = WidgetDataState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        get_widget_data(
            State(state),
            Extension(user.id),
            Path(widget_type.to_owned()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn balance_widget() {
        let response = fetch("balance").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response_json(response).await,
            json!({"balance": 150.0, "currency": "USD"})
        );
    }

    #[tokio::test]
    async fn spending_chart_widget_only_covers_last_30_days() {
        let response = fetch("spending_chart").await;

        assert_eq!(
            response_json(response).await,
            json!({"Food": {"amount": 30.0, "color": "#28a745"}})
        );
    }

    #[tokio::test]
    async fn goals_widget() {
        let response = fetch("goals").await;

        assert_eq!(
            response_json(response).await,
            json!([{
                "category": "Food",
                "target": 20.0,
                "current": 30.0,
                "progress": 100.0,
                "over_budget": true,
            }])
        );
    }

    #[tokio::test]
    async fn recommendations_widget_shows_top_three() {
        let response = fetch("recommendations").await;

        let body = response_json(response).await;
        let titles = body
            .as_array()
            .unwrap()
            .iter()
            .map(|recommendation| recommendation["title"].as_str().unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["Tip 40", "Tip 30", "Tip 20"]);
        assert_eq!(body[0]["priority"], "medium");
    }

    #[tokio::test]
    async fn unknown_widget_type_is_not_found() {
        let response = fetch("weather").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response_json(response).await,
            json!({"error": "Unknown widget type"})
        );
    }
}
