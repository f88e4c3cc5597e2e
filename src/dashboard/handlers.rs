//! The dashboard page handler and view.

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
        DEFAULT_TREND_DAYS, DashboardStats, compute_dashboard_stats, daily_totals, get_ledger,
    },
    auth::UserID,
    dashboard::{
        cards::summary_cards_view,
        charts::{PageChart, category_chart, charts_script, charts_view, trend_chart},
        tables::{category_breakdown_table, recent_transactions_table},
    },
    endpoints,
    html::{ECHARTS_SCRIPT, HeadElement, PAGE_CONTAINER_STYLE, base, link, page_header},
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display a page with an overview of the user's finances.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
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

    if ledger.is_empty() {
        return Ok(dashboard_no_data_view().into_response());
    }

    let stats = compute_dashboard_stats(&ledger, today);
    let charts = [
        PageChart::new(
            "category-chart",
            category_chart(&stats.category_totals, "All time"),
        ),
        PageChart::new(
            "trend-chart",
            trend_chart(&daily_totals(&ledger, DEFAULT_TREND_DAYS, today)),
        ),
    ];

    Ok(dashboard_view(&stats, &charts).into_response())
}

fn dashboard_no_data_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "add a transaction");
    let receipt_link = link(endpoints::RECEIPTS_VIEW, "scan a receipt");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold" { "Nothing here yet..." }

            p
            {
                "Your balance and charts will show up here once you "
                (new_transaction_link) " or " (receipt_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn dashboard_view(stats: &DashboardStats, charts: &[PageChart]) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            (page_header("Dashboard", Some((endpoints::NEW_TRANSACTION_VIEW, "Add Transaction"))))
            (summary_cards_view(stats))
            (charts_view(charts))

            div class="grid grid-cols-1 xl:grid-cols-2 gap-4 w-full"
            {
                (recent_transactions_table(&stats.recent_transactions))
                (category_breakdown_table(&stats.category_totals))
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        charts_script(charts),
    ];

    base("Dashboard", &scripts, &content)
}

#[cfg(test)]
mod dashboard_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        auth::UserID,
        category::get_category_by_name,
        test_utils::{
            assert_valid_html, create_test_user, get_test_connection, parse_html_document,
        },
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::{DashboardState, get_dashboard_page};

    fn state(connection: Connection) -> DashboardState {
        DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn seed(user_id: UserID, connection: &Connection) {
        let today = OffsetDateTime::now_utc().date();
        let food = get_category_by_name("Food", connection).unwrap();
        let salary = get_category_by_name("Salary", connection).unwrap();

        create_transaction(
            Transaction::build(1000.0, TransactionType::Income, today, salary.id)
                .description("Pay day"),
            user_id,
            connection,
        )
        .unwrap();

        for i in 0..6 {
            create_transaction(
                Transaction::build(10.0 + f64::from(i), TransactionType::Expense, today, food.id)
                    .description(&format!("Lunch {i}")),
                user_id,
                connection,
            )
            .unwrap();
        }
    }

    #[tokio::test]
    async fn shows_empty_state_without_transactions() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        let response = get_dashboard_page(State(state(connection)), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert!(html.html().contains("Nothing here yet"));
    }

    #[tokio::test]
    async fn shows_stats_charts_and_recent_transactions() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        seed(user.id, &connection);

        let response = get_dashboard_page(State(state(connection)), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let balance = html
            .select(&Selector::parse("[data-stat='balance']").unwrap())
            .next()
            .expect("balance card");
        let balance_text = balance.text().collect::<String>();
        assert!(balance_text.contains("$925.00"), "got {balance_text}");

        let recent = html
            .select(&Selector::parse("[data-recent-transaction]").unwrap())
            .count();
        assert_eq!(recent, 5);

        for id in ["#category-chart", "#trend-chart"] {
            assert!(
                html.select(&Selector::parse(id).unwrap()).next().is_some(),
                "missing chart container {id}"
            );
        }
    }

    #[tokio::test]
    async fn only_shows_own_transactions() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other = crate::test_utils::create_named_test_user("other", &connection);
        seed(other.id, &connection);

        let response = get_dashboard_page(State(state(connection)), Extension(user.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert!(html.html().contains("Nothing here yet"));
    }
}
