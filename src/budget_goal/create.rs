//! The page and endpoint for setting a budget goal.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    achievement::award_achievements,
    auth::UserID,
    budget_goal::{BudgetPeriod, create_budget_goal},
    category::{Category, CategoryId, get_all_categories},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed to create a budget goal.
#[derive(Debug, Clone)]
pub struct CreateBudgetGoalState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateBudgetGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for a new budget goal.
#[derive(Debug, Deserialize)]
pub struct BudgetGoalForm {
    pub category_id: CategoryId,
    /// The most the user wants to spend in the period, in dollars.
    pub target_amount: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
}

fn budget_goal_form_view(
    categories: &[Category],
    form: Option<&BudgetGoalForm>,
    error_message: &str,
) -> Markup {
    let periods = [
        (BudgetPeriod::Weekly, "Weekly"),
        (BudgetPeriod::Monthly, "Monthly"),
        (BudgetPeriod::Yearly, "Yearly"),
    ];
    let selected_period = form.map(|form| form.period).unwrap_or_default();

    html! {
        form
            hx-post=(endpoints::BUDGET_GOALS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "New Budget Goal" }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    name="category_id"
                    id="category_id"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a category" }

                    @for category in categories {
                        option
                            value=(category.id)
                            selected[form.is_some_and(|form| form.category_id == category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="target_amount" class=(FORM_LABEL_STYLE) { "Target Amount" }

                input
                    name="target_amount"
                    id="target_amount"
                    type="number"
                    step="0.01"
                    min="0"
                    placeholder="0.00"
                    value=[form.map(|form| form.target_amount)]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="period" class=(FORM_LABEL_STYLE) { "Period" }

                select name="period" id="period" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for (period, label) in periods {
                        option value=(period) selected[period == selected_period] { (label) }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                " Create Goal"
            }
        }
    }
}

/// Render the page for creating a budget goal.
pub async fn get_new_budget_goal_page(
    State(state): State<CreateBudgetGoalState>,
) -> Result<Response, Error> {
    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(&connection)
            .inspect_err(|error| tracing::error!("Could not get categories: {error}"))?
    };

    let nav_bar = NavBar::new(endpoints::NEW_BUDGET_GOAL_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (budget_goal_form_view(&categories, None, "")) }
    };

    Ok(base("Create Budget Goal", &[], &content).into_response())
}

/// Create a goal starting today and redirect to the budget goals page.
pub async fn create_budget_goal_endpoint(
    State(state): State<CreateBudgetGoalState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetGoalForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = create_budget_goal(
        user_id,
        form.category_id,
        form.target_amount,
        form.period,
        today,
        &connection,
    );

    match result {
        Ok(goal) => {
            tracing::info!("Created budget goal {} for user {user_id}", goal.id);

            if let Err(error) = award_achievements(user_id, today, &connection) {
                tracing::error!("Could not award achievements to user {user_id}: {error}");
            }

            (
                HxRedirect(endpoints::BUDGET_GOALS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ (Error::NegativeTargetAmount | Error::InvalidCategory(_))) => {
            let categories = match get_all_categories(&connection) {
                Ok(categories) => categories,
                Err(error) => return error.into_alert_response(),
            };

            budget_goal_form_view(&categories, Some(&form), &format!("Error: {error}"))
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not create budget goal: {error}");
            error.into_alert_response()
        }
    }
}


#[cfg(test)]
mod create_budget_goal_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, routing::post};
    use axum_test::TestServer;

    use crate::{
        auth::UserID,
        budget_goal::get_active_budget_goals,
        category::get_category_by_name,
        endpoints,
        notification::get_notifications,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{CreateBudgetGoalState, create_budget_goal_endpoint};

    fn get_test_server() -> (TestServer, CreateBudgetGoalState, UserID, i64) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        let state = CreateBudgetGoalState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };
        let app = Router::new()
            .route(endpoints::BUDGET_GOALS_API, post(create_budget_goal_endpoint))
            .layer(Extension(user.id))
            .with_state(state.clone());

        (
            TestServer::new(app).expect("Could not create test server."),
            state,
            user.id,
            food.id,
        )
    }

    #[tokio::test]
    async fn creates_goal_and_redirects() {
        let (server, state, user_id, food_id) = get_test_server();

        let response = server
            .post(endpoints::BUDGET_GOALS_API)
            .form(&[
                ("category_id", food_id.to_string()),
                ("target_amount", "250".to_owned()),
                ("period", "weekly".to_owned()),
            ])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::BUDGET_GOALS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let goals = get_active_budget_goals(user_id, &connection).unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].target_amount, 250.0);
        let notifications = get_notifications(user_id, &connection).unwrap();
        assert!(
            notifications
                .iter()
                .any(|notification| notification.title.contains("Budget Planner")),
            "want first goal achievement, got {notifications:?}"
        );
    }

    #[tokio::test]
    async fn negative_target_rerenders_form() {
        let (server, state, user_id, food_id) = get_test_server();

        let response = server
            .post(endpoints::BUDGET_GOALS_API)
            .form(&[
                ("category_id", food_id.to_string()),
                ("target_amount", "-5".to_owned()),
                ("period", "monthly".to_owned()),
            ])
            .await;

        response.assert_status_ok();
        response.assert_text_contains("Target amount cannot be negative");
        let connection = state.db_connection.lock().unwrap();
        assert!(get_active_budget_goals(user_id, &connection).unwrap().is_empty());
    }
}
