//! The transactions page with filters and an export link.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, get_all_categories},
    endpoints,
    html::{
        BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        category_badge, edit_delete_action_links, format_currency, page_header,
    },
    navigation::NavBar,
    transaction::{
        TransactionType,
        query::{
            SortOrder, TransactionFilter, TransactionFilterQuery, TransactionRow,
            get_transaction_rows,
        },
    },
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the user's transactions, newest first, narrowed by the query filters.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionFilterQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let filter = TransactionFilter::from(&query);
    let rows = get_transaction_rows(user_id, &filter, SortOrder::Descending, None, &connection)
        .inspect_err(|error| tracing::error!("Could not get transactions: {error}"))?;
    let categories = get_all_categories(&connection)?;

    let export_url = match serde_urlencoded::to_string(&query) {
        Ok(query_string) if !query_string.is_empty() => {
            format!("{}?{query_string}", endpoints::EXPORT_TRANSACTIONS)
        }
        _ => endpoints::EXPORT_TRANSACTIONS.to_owned(),
    };

    Ok(transactions_view(&rows, &categories, &filter, &export_url).into_response())
}

fn filter_form(categories: &[Category], filter: &TransactionFilter) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="grid grid-cols-2 lg:grid-cols-5 gap-4 items-end"
        {
            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    id="start_date"
                    name="start_date"
                    value=[filter.start_date]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    id="end_date"
                    name="end_date"
                    value=[filter.end_date]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                select id="type" name="type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }
                    @for (transaction_type, label) in [
                        (TransactionType::Income, "Income"),
                        (TransactionType::Expense, "Expense"),
                    ] {
                        option
                            value=(transaction_type)
                            selected[filter.transaction_type == Some(transaction_type)]
                        { (label) }
                    }
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category" name="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }
                    @for category in categories {
                        option
                            value=(category.id)
                            selected[filter.category_id == Some(category.id)]
                        { (category.name) }
                    }
                }
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }
        }
    }
}

fn amount_cell(row: &TransactionRow) -> Markup {
    let (sign, style) = match row.transaction_type {
        TransactionType::Income => ("+", "text-green-600 dark:text-green-400"),
        TransactionType::Expense => ("-", "text-red-600 dark:text-red-400"),
    };

    html!(
        span class={"tabular-nums " (style)} { (sign) (format_currency(row.amount)) }
    )
}

fn transactions_view(
    rows: &[TransactionRow],
    categories: &[Category],
    filter: &TransactionFilter,
    export_url: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let table_row = |row: &TransactionRow| {
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, row.id);

        html!(
            tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
            {
                td class=(TABLE_CELL_STYLE) { (row.date) }
                td class=(TABLE_CELL_STYLE) { (row.description) }
                td class=(TABLE_CELL_STYLE)
                {
                    (category_badge(&row.category_name, &row.category_color))
                }
                td class={(TABLE_CELL_STYLE) " text-right"} { (amount_cell(row)) }
                td class=(TABLE_CELL_STYLE)
                {
                    (edit_delete_action_links(
                        None,
                        &delete_url,
                        "Are you sure you want to delete this transaction?",
                        "closest tr",
                    ))
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl lg:mx-auto"
            {
                (page_header("Transactions", Some((endpoints::NEW_TRANSACTION_VIEW, "Add Transaction"))))

                (filter_form(categories, filter))

                div class="flex justify-end"
                {
                    a href=(export_url) class=(LINK_STYLE) download { "Export CSV" }
                }

                div class="overflow-x-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions found. "
                                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                                        {
                                            "Record a transaction"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Transactions", &[], &content)
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        category::get_category_by_name,
        endpoints,
        test_utils::{
            assert_valid_html, create_named_test_user, create_test_user, get_test_connection,
            parse_html_document,
        },
        transaction::{
            Transaction, TransactionType, create_transaction, query::TransactionFilterQuery,
        },
    };

    use super::{TransactionsPageState, get_transactions_page};

    fn rows(html: &Html) -> usize {
        html.select(&Selector::parse("tr[data-transaction-row]").unwrap())
            .count()
    }

    #[tokio::test]
    async fn page_shows_only_own_filtered_transactions() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other_user = create_named_test_user("other", &connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        let salary = get_category_by_name("Salary", &connection).unwrap();
        for (owner, amount, transaction_type, category_id) in [
            (user.id, 10.0, TransactionType::Expense, food.id),
            (user.id, 1000.0, TransactionType::Income, salary.id),
            (other_user.id, 5.0, TransactionType::Expense, food.id),
        ] {
            create_transaction(
                Transaction::build(amount, transaction_type, date!(2025 - 05 - 01), category_id)
                    .description("x"),
                owner,
                &connection,
            )
            .unwrap();
        }
        let state = TransactionsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_transactions_page(
            State(state.clone()),
            Extension(user.id),
            Query(TransactionFilterQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(rows(&html), 2);

        let response = get_transactions_page(
            State(state),
            Extension(user.id),
            Query(TransactionFilterQuery {
                transaction_type: Some("expense".to_owned()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        let html = parse_html_document(response).await;
        assert_eq!(rows(&html), 1);
        let export_link = html
            .select(&Selector::parse("a[download]").unwrap())
            .next()
            .expect("export link missing");
        assert_eq!(
            export_link.value().attr("href"),
            Some(format!("{}?type=expense", endpoints::EXPORT_TRANSACTIONS).as_str())
        );
    }
}
