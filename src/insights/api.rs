//! JSON endpoints used by charts and live widgets.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    analytics::{
        DailyTotal, analyze_spending_patterns, calculate_balance, clamp_trend_days, daily_totals,
        expenses_by_category, get_ledger, monthly_totals, predict_spending,
    },
    auth::UserID,
    timezone::local_today,
    transaction::query::TransactionRow,
};

/// The state needed by the analytics JSON endpoints.
#[derive(Debug, Clone)]
pub struct AnalyticsApiState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AnalyticsApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SpendingTrends {
    days: u16,
    trends: Vec<DailyTotal>,
}

#[derive(Debug, Serialize)]
struct LiveBalance {
    balance: f64,
    monthly_income: f64,
    monthly_expenses: f64,
}

#[derive(Debug, Serialize)]
struct CategoryChartEntry {
    category: String,
    amount: f64,
    color: String,
}

fn load_ledger(
    state: &AnalyticsApiState,
    user_id: UserID,
) -> Result<Vec<TransactionRow>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_ledger(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get transactions: {error}"))
}

/// Daily income and expenses for the last `days` days (default 30, at most 365).
pub async fn get_spending_trends(
    State(state): State<AnalyticsApiState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TrendsQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let days = clamp_trend_days(query.days);
    let ledger = load_ledger(&state, user_id)?;

    Ok(Json(SpendingTrends {
        days,
        trends: daily_totals(&ledger, days, today),
    })
    .into_response())
}

/// Per-category spending predictions and insights.
pub async fn get_predictions(
    State(state): State<AnalyticsApiState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let ledger = load_ledger(&state, user_id)?;

    Ok(Json(predict_spending(analyze_spending_patterns(&ledger))).into_response())
}

/// The current balance and this month's income and expenses.
pub async fn get_live_balance(
    State(state): State<AnalyticsApiState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let ledger = load_ledger(&state, user_id)?;
    let this_month = monthly_totals(&ledger, today);

    Ok(Json(LiveBalance {
        balance: calculate_balance(&ledger),
        monthly_income: this_month.income,
        monthly_expenses: this_month.expenses,
    })
    .into_response())
}

/// Expense totals per category with the category's color.
pub async fn get_chart_data(
    State(state): State<AnalyticsApiState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let ledger = load_ledger(&state, user_id)?;
    let entries = expenses_by_category(&ledger)
        .into_iter()
        .map(|total| CategoryChartEntry {
            category: total.name,
            amount: total.total,
            color: total.color,
        })
        .collect::<Vec<_>>();

    Ok(Json(entries).into_response())
}
