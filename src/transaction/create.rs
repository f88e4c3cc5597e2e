//! The page and endpoint for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    achievement::award_achievements,
    auth::UserID,
    budget_goal::notify_if_over_budget,
    category::{Category, CategoryId, get_all_categories},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::{Transaction, TransactionType, create_transaction},
};

/// The state needed to show the form and create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The value of the transaction in dollars.
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Text detailing the transaction.
    pub description: String,
    /// The date when the transaction ocurred.
    pub date: Date,
    pub category_id: CategoryId,
}

/// Values to prefill the form with.
struct FormValues<'a> {
    amount: Option<f64>,
    transaction_type: TransactionType,
    description: &'a str,
    date: Date,
    category_id: Option<CategoryId>,
}

fn transaction_form_view(
    categories: &[Category],
    values: &FormValues,
    error_message: &str,
) -> Markup {
    let spinner = loading_spinner();
    let type_options = [
        (TransactionType::Expense, "Expense"),
        (TransactionType::Income, "Income"),
    ];

    html! {
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "New Transaction" }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    value=[values.amount]
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for (transaction_type, label) in type_options {
                        label class="flex items-center gap-3"
                        {
                            input
                                type="radio"
                                name="type"
                                value=(transaction_type)
                                checked[transaction_type == values.transaction_type]
                                required
                                class=(FORM_RADIO_INPUT_STYLE);
                            span class=(FORM_RADIO_LABEL_STYLE) { (label) }
                        }
                    }
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    name="description"
                    id="description"
                    type="text"
                    placeholder="Description"
                    maxlength="200"
                    value=(values.description)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    value=(values.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

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
                            selected[values.category_id == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (spinner) }
                " Create Transaction"
            }
        }
    }
}

/// Renders the page for creating a transaction.
pub async fn get_new_transaction_page(
    State(state): State<CreateTransactionState>,
) -> Result<Response, Error> {
    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(&connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for new transaction page: {error}")
        })?
    };

    let values = FormValues {
        amount: None,
        transaction_type: TransactionType::Expense,
        description: "",
        date: local_today(&state.local_timezone)?,
        category_id: None,
    };

    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (transaction_form_view(&categories, &values, "")) }
    };

    Ok(base("Create Transaction", &[], &content).into_response())
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
///
/// An expense that takes a budget goal over its target creates a budget
/// alert, and any achievements the new transaction unlocks are awarded.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
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

    let builder = Transaction::build(
        form.amount,
        form.transaction_type,
        form.date,
        form.category_id,
    )
    .description(&form.description);

    let transaction = match create_transaction(builder, user_id, &connection) {
        Ok(transaction) => transaction,
        Err(error @ (Error::InvalidAmount | Error::InvalidDescription)) => {
            let categories = match get_all_categories(&connection) {
                Ok(categories) => categories,
                Err(error) => return error.into_alert_response(),
            };
            let values = FormValues {
                amount: Some(form.amount),
                transaction_type: form.transaction_type,
                description: &form.description,
                date: form.date,
                category_id: Some(form.category_id),
            };

            return transaction_form_view(&categories, &values, &error.to_string())
                .into_response();
        }
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            return error.into_alert_response();
        }
    };

    if transaction.transaction_type == TransactionType::Expense
        && let Err(error) = notify_if_over_budget(&transaction, today, &connection)
    {
        tracing::error!("Could not check budget goals for transaction {}: {error}", transaction.id);
    }

    if let Err(error) = award_achievements(user_id, today, &connection) {
        tracing::error!("Could not award achievements to user {user_id}: {error}");
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}


#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Form;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        auth::User,
        budget_goal::{BudgetPeriod, create_budget_goal},
        category::get_category_by_name,
        endpoints,
        notification::get_notifications,
        test_utils::{
            assert_form_error_message, assert_hx_redirect, create_test_user, get_test_connection,
            must_get_form, parse_html_fragment,
        },
        transaction::{TransactionType, count_transactions},
    };

    use super::{CreateTransactionState, TransactionForm, create_transaction_endpoint};

    fn get_state() -> (CreateTransactionState, User) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        (
            CreateTransactionState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user,
        )
    }

    fn food_id(state: &CreateTransactionState) -> i64 {
        get_category_by_name("Food", &state.db_connection.lock().unwrap())
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user) = get_state();
        let form = TransactionForm {
            amount: 12.5,
            transaction_type: TransactionType::Expense,
            description: "Lunch".to_owned(),
            date: date!(2025 - 01 - 01),
            category_id: food_id(&state),
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user.id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(user.id, &connection), Ok(1));
        let notifications = get_notifications(user.id, &connection).unwrap();
        assert!(
            notifications
                .iter()
                .any(|notification| notification.title.contains("First Steps")),
            "want first transaction achievement notification, got {notifications:?}"
        );
    }

    #[tokio::test]
    async fn zero_amount_rerenders_form() {
        let (state, user) = get_state();
        let form = TransactionForm {
            amount: 0.0,
            transaction_type: TransactionType::Expense,
            description: "Lunch".to_owned(),
            date: date!(2025 - 01 - 01),
            category_id: food_id(&state),
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user.id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Amount must be at least 0.01");
        assert_eq!(
            count_transactions(user.id, &state.db_connection.lock().unwrap()),
            Ok(0)
        );
    }

    #[tokio::test]
    async fn invalid_category_returns_bad_request_alert() {
        let (state, user) = get_state();
        let form = TransactionForm {
            amount: 5.0,
            transaction_type: TransactionType::Income,
            description: "Gift".to_owned(),
            date: date!(2025 - 01 - 01),
            category_id: 999,
        };

        let response = create_transaction_endpoint(State(state), Extension(user.id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn expense_over_budget_creates_alert() {
        let (state, user) = get_state();
        let category_id = food_id(&state);
        let today = OffsetDateTime::now_utc().date();
        create_budget_goal(
            user.id,
            category_id,
            50.0,
            BudgetPeriod::Monthly,
            today,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        for amount in [40.0, 20.0, 5.0] {
            let form = TransactionForm {
                amount,
                transaction_type: TransactionType::Expense,
                description: "Groceries".to_owned(),
                date: today,
                category_id,
            };
            create_transaction_endpoint(State(state.clone()), Extension(user.id), Form(form))
                .await
                .into_response();
        }

        let notifications = get_notifications(user.id, &state.db_connection.lock().unwrap())
            .unwrap()
            .into_iter()
            .filter(|notification| notification.notification_type.as_str() == "budget_alert")
            .collect::<Vec<_>>();
        assert_eq!(notifications.len(), 1, "want exactly one budget alert");
        assert_eq!(notifications[0].title, "Budget exceeded: Food");
    }
}
