//! Categories listing page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, CategoryId, get_all_categories},
    endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, category_badge, edit_delete_action_links, page_header,
    },
    navigation::NavBar,
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A category with the URLs and counts needed to render a row.
#[derive(Debug, Clone)]
struct CategoryRow {
    category: Category,
    edit_url: String,
    delete_url: String,
    transaction_count: u32,
}

/// Render the categories listing page with transaction counts.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let transactions_per_category = count_transactions_per_category(&connection).inspect_err(
        |error| tracing::error!("Could not count transactions per category: {error}"),
    )?;

    let rows = categories
        .into_iter()
        .map(|category| CategoryRow {
            edit_url: endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id),
            delete_url: endpoints::format_endpoint(endpoints::DELETE_CATEGORY, category.id),
            transaction_count: transactions_per_category
                .get(&category.id)
                .copied()
                .unwrap_or(0),
            category,
        })
        .collect::<Vec<_>>();

    Ok(categories_view(&rows).into_response())
}

fn count_transactions_per_category(
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    connection
        .prepare("SELECT category_id, COUNT(1) FROM \"transaction\" GROUP BY category_id")?
        .query_map((), |row| Ok((row.get(0)?, row.get(1)?)))?
        .map(|maybe_count| maybe_count.map_err(Error::from))
        .collect()
}

fn confirm_message(row: &CategoryRow) -> String {
    format!("Are you sure you want to delete '{}'?", row.category.name)
}

fn categories_view(rows: &[CategoryRow]) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |row: &CategoryRow| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    (category_badge(row.category.name.as_ref(), &row.category.color))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.category.description.as_deref().unwrap_or("-"))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.transaction_count)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            Some(&row.edit_url),
                            &row.delete_url,
                            &confirm_message(row),
                            "closest tr",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                (page_header("Categories", Some((new_category_route, "Create Category"))))

                ul class="lg:hidden space-y-4"
                {
                    @for row in rows {
                        li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                            data-category-card="true"
                        {
                            div class="flex items-start justify-between gap-3"
                            {
                                (category_badge(row.category.name.as_ref(), &row.category.color))
                                span class="text-sm tabular-nums text-gray-900 dark:text-white"
                                { (row.transaction_count) }
                            }

                            div class="mt-2 flex items-center gap-4 text-sm"
                            {
                                (edit_delete_action_links(
                                    Some(&row.edit_url),
                                    &row.delete_url,
                                    &confirm_message(row),
                                    "closest [data-category-card='true']",
                                ))
                            }
                        }
                    }
                }

                section class="hidden lg:block dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
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
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories yet. "
                                        a href=(new_category_route) class=(LINK_STYLE)
                                        {
                                            "Create your first category"
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

    base("Categories", &[], &content)
}
