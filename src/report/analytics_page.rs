//! Detailed statistics and charts over all of a user's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    analytics::{
        DEFAULT_TREND_DAYS, DashboardStats, ReportPeriod, compute_dashboard_stats, daily_totals,
        get_ledger, period_report,
    },
    auth::UserID,
    dashboard::charts::{
        PageChart, category_chart, charts_script, charts_view, period_chart, trend_chart,
    },
    endpoints,
    html::{
        CARD_STYLE, ECHARTS_SCRIPT, HeadElement, PAGE_CONTAINER_STYLE, base, format_currency,
        page_header,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the analytics page.
#[derive(Debug, Clone)]
pub struct AnalyticsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AnalyticsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn get_analytics_page(
    State(state): State<AnalyticsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let ledger = get_ledger(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get transactions: {error}"))?;
    drop(connection);

    let stats = compute_dashboard_stats(&ledger, today);
    let charts = [
        PageChart::new(
            "monthly-chart",
            period_chart(
                &period_report(&ledger, ReportPeriod::Month, today),
                "Last 12 months",
            ),
        ),
        PageChart::new(
            "category-chart",
            category_chart(&stats.category_totals, "All time"),
        ),
        PageChart::new(
            "trend-chart",
            trend_chart(&daily_totals(&ledger, DEFAULT_TREND_DAYS, today)),
        ),
    ];

    Ok(analytics_view(&stats, &charts).into_response())
}

fn stat(id: &str, label: &str, value: &str) -> Markup {
    html!(
        div class=(CARD_STYLE) data-stat=(id)
        {
            dt class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            dd class="text-xl font-semibold" { (value) }
        }
    )
}

fn analytics_view(stats: &DashboardStats, charts: &[PageChart]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ANALYTICS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            (page_header("Analytics", Some((endpoints::REPORTS_VIEW, "View reports"))))

            dl class="grid grid-cols-2 lg:grid-cols-4 gap-4 w-full"
            {
                (stat("total-income", "Total income", &format_currency(stats.total_income)))
                (stat("total-expenses", "Total expenses", &format_currency(stats.total_expenses)))
                (stat("balance", "Balance", &format_currency(stats.balance)))
                (stat("transaction-count", "Transactions", &stats.transaction_count.to_string()))
                (stat("days-with-data", "Days tracked", &stats.days_with_data.to_string()))
                (stat(
                    "transactions-per-day",
                    "Transactions per day",
                    &format!("{:.2}", stats.avg_transactions_per_day),
                ))
                (stat("savings-rate", "Savings rate this month", &format!("{:.1}%", stats.savings_rate)))
                (stat("daily-average", "Daily spending this month", &format_currency(stats.daily_average)))
            }

            (charts_view(charts))
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        charts_script(charts),
    ];

    base("Analytics", &scripts, &content)
}
