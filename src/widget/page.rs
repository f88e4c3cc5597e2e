//! The custom dashboard page built from the user's widgets.

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
    endpoints::{self, format_endpoint},
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency, page_header},
    navigation::NavBar,
    timezone::local_today,
    widget::{DashboardWidget, WidgetData, get_or_create_widgets, load_widget_data},
};

/// The state needed for the custom dashboard page.
#[derive(Debug, Clone)]
pub struct CustomDashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CustomDashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn get_custom_dashboard_page(
    State(state): State<CustomDashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let widgets = get_or_create_widgets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get dashboard widgets: {error}"))?;

    let widgets = widgets
        .into_iter()
        .map(|widget| {
            load_widget_data(widget.widget_type, user_id, today, &connection)
                .map(|data| (widget, data))
        })
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|error| tracing::error!("Could not load widget data: {error}"))?;

    Ok(custom_dashboard_view(&widgets).into_response())
}

fn widget_body(data: &WidgetData) -> Markup {
    match data {
        WidgetData::Balance { balance, .. } => html!(
            p class="text-3xl font-bold" { (format_currency(*balance)) }
        ),
        WidgetData::SpendingChart(spending) => html!(
            @if spending.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No spending in the last 30 days." }
            }

            ul class="space-y-1"
            {
                @for (category, category_spending) in spending {
                    li class="flex justify-between items-center"
                    {
                        span class="flex items-center gap-2"
                        {
                            span
                                class="inline-block w-3 h-3 rounded-full"
                                style=(format!("background-color: {}", category_spending.color))
                            {}
                            (category)
                        }
                        span { (format_currency(category_spending.amount)) }
                    }
                }
            }
        ),
        WidgetData::Goals(goals) => html!(
            @if goals.is_empty() {
                p class="text-gray-500 dark:text-gray-400"
                {
                    "No budget goals yet. "
                    a href=(endpoints::NEW_BUDGET_GOAL_VIEW) class=(LINK_STYLE) { "Set one" }
                }
            }

            @for goal in goals {
                @let bar_color = if goal.over_budget { "bg-red-600" } else { "bg-blue-600" };

                div class="mb-2"
                {
                    div class="flex justify-between text-sm"
                    {
                        span { (goal.category) }
                        span { (format_currency(goal.current)) " / " (format_currency(goal.target)) }
                    }
                    div class="w-full h-2 bg-gray-200 rounded-full dark:bg-gray-700"
                    {
                        div
                            class={ "h-2 rounded-full " (bar_color) }
                            style=(format!("width: {:.0}%", goal.progress))
                        {}
                    }
                }
            }
        ),
        WidgetData::Recommendations(recommendations) => html!(
            @if recommendations.is_empty() {
                p class="text-gray-500 dark:text-gray-400"
                {
                    "Visit " a href=(endpoints::INSIGHTS_VIEW) class=(LINK_STYLE) { "Smart Insights" }
                    " for tips."
                }
            }

            ul class="space-y-2"
            {
                @for recommendation in recommendations {
                    li
                    {
                        p class="font-medium" { (recommendation.title) }
                        p class="text-sm text-gray-500 dark:text-gray-400" { (recommendation.description) }
                    }
                }
            }
        ),
    }
}

fn widget_card(widget: &DashboardWidget, data: &WidgetData) -> Markup {
    // Tailwind only ships classes that appear verbatim in the source.
    let column_span = match widget.width {
        1..=3 => "lg:col-span-3",
        4 => "lg:col-span-4",
        5..=6 => "lg:col-span-6",
        7..=8 => "lg:col-span-8",
        _ => "lg:col-span-12",
    };
    let data_url = format_endpoint(endpoints::WIDGET_DATA_API, widget.widget_type);

    html!(
        section
            class={ (CARD_STYLE) " col-span-12 " (column_span) }
            data-widget=(widget.widget_type)
            data-widget-endpoint=(data_url)
            style=(format!("min-height: {}rem", u16::from(widget.height) * 5))
        {
            h2 class="text-lg font-semibold mb-2" { (widget.title) }
            (widget_body(data))
        }
    )
}

fn custom_dashboard_view(widgets: &[(DashboardWidget, WidgetData)]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CUSTOM_DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            (page_header("My Dashboard", Some((endpoints::DASHBOARD_VIEW, "Standard dashboard"))))

            div class="grid grid-cols-12 gap-4 w-full"
            {
                @for (widget, data) in widgets {
                    (widget_card(widget, data))
                }
            }
        }
    );

    base("My Dashboard", &[], &content)
}
