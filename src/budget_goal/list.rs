//! The budget goals page with progress bars.

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
    auth::UserID,
    budget_goal::{GoalProgress, get_goal_progress},
    endpoints,
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, category_badge,
        edit_delete_action_links, format_currency, page_header,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the budget goals page.
#[derive(Debug, Clone)]
pub struct BudgetGoalsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetGoalsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Show every active goal with the amount spent so far, recomputed from
/// the user's transactions.
pub async fn get_budget_goals_page(
    State(state): State<BudgetGoalsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let goals = get_goal_progress(user_id, today, &connection)
        .inspect_err(|error| tracing::error!("Could not get budget goals: {error}"))?;

    Ok(budget_goals_view(&goals).into_response())
}

fn progress_bar_style(progress: &GoalProgress) -> &'static str {
    if progress.is_over_budget {
        "h-2.5 rounded-full bg-red-600"
    } else if progress.progress_percentage >= 80.0 {
        "h-2.5 rounded-full bg-yellow-400"
    } else {
        "h-2.5 rounded-full bg-green-500"
    }
}

fn goal_card(progress: &GoalProgress) -> Markup {
    let goal = &progress.goal;
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_BUDGET_GOAL, goal.id);
    let confirm_message = format!(
        "Are you sure you want to delete the {} budget for '{}'?",
        goal.period, progress.category_name
    );

    html!(
        li class=(CARD_STYLE) data-budget-goal="true" data-over-budget=[progress.is_over_budget.then_some("true")]
        {
            div class="flex items-start justify-between gap-3"
            {
                (category_badge(&progress.category_name, &progress.category_color))
                span class="text-sm capitalize text-gray-500 dark:text-gray-400" { (goal.period) }
            }

            div class="mt-3 flex justify-between text-sm tabular-nums"
            {
                span { (format_currency(progress.current_spent)) " of " (format_currency(goal.target_amount)) }
                span { (format!("{:.0}%", progress.progress_percentage)) }
            }

            div class="mt-1 w-full rounded-full bg-gray-200 h-2.5 dark:bg-gray-700"
            {
                div
                    class=(progress_bar_style(progress))
                    style=(format!("width: {:.1}%", progress.progress_percentage))
                {}
            }

            div class="mt-2 flex justify-between text-xs text-gray-500 dark:text-gray-400"
            {
                @if progress.is_over_budget {
                    span class="font-semibold text-red-600 dark:text-red-400" { "Over budget" }
                } @else {
                    span { (format_currency(progress.remaining_amount)) " remaining" }
                }

                span { (progress.days_remaining) " days left" }
            }

            div class="mt-3 text-sm"
            {
                (edit_delete_action_links(
                    None,
                    &delete_url,
                    &confirm_message,
                    "closest [data-budget-goal='true']",
                ))
            }
        }
    )
}

fn budget_goals_view(goals: &[GoalProgress]) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGET_GOALS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-5xl space-y-4"
            {
                (page_header("Budget Goals", Some((endpoints::NEW_BUDGET_GOAL_VIEW, "Create Goal"))))

                @if goals.is_empty() {
                    p class="text-gray-500 dark:text-gray-400"
                    {
                        "No budget goals yet. "
                        a href=(endpoints::NEW_BUDGET_GOAL_VIEW) class=(LINK_STYLE)
                        {
                            "Set your first goal"
                        }
                    }
                } @else {
                    ul class="grid gap-4 md:grid-cols-2 lg:grid-cols-3"
                    {
                        @for progress in goals {
                            (goal_card(progress))
                        }
                    }
                }
            }
        }
    );

    base("Budget Goals", &[], &content)
}

#[cfg(test)]
mod budget_goals_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        budget_goal::{BudgetPeriod, create_budget_goal},
        category::get_category_by_name,
        test_utils::{
            assert_valid_html, create_test_user, get_test_connection, parse_html_document,
        },
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::{BudgetGoalsPageState, get_budget_goals_page};

    #[tokio::test]
    async fn shows_goals_with_over_budget_flag() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        let transport = get_category_by_name("Transportation", &connection).unwrap();
        let today = OffsetDateTime::now_utc().date();
        create_budget_goal(user.id, food.id, 10.0, BudgetPeriod::Monthly, today, &connection)
            .unwrap();
        create_budget_goal(
            user.id,
            transport.id,
            100.0,
            BudgetPeriod::Weekly,
            today,
            &connection,
        )
        .unwrap();
        create_transaction(
            Transaction::build(25.0, TransactionType::Expense, today, food.id)
                .description("Dinner"),
            user.id,
            &connection,
        )
        .unwrap();
        let state = BudgetGoalsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_budget_goals_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let goals = html
            .select(&Selector::parse("[data-budget-goal]").unwrap())
            .count();
        assert_eq!(goals, 2);
        let over_budget = html
            .select(&Selector::parse("[data-over-budget]").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(over_budget.len(), 1);
        assert!(over_budget[0].text().any(|text| text.contains("Food")));
    }
}
