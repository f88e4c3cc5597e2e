//! The smart insights page: spending patterns, predictions and recommendations.

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
    analytics::{Predictions, Priority, Trend, analyze_spending_patterns, get_ledger, predict_spending},
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency, page_header,
    },
    insights::{StoredRecommendation, regenerate_recommendations},
    navigation::NavBar,
};

/// The state needed for the insights page.
#[derive(Debug, Clone)]
pub struct InsightsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for InsightsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Recompute the user's recommendations from their transactions and show
/// them next to the spending patterns they were derived from.
pub async fn get_insights_page(
    State(state): State<InsightsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let ledger = get_ledger(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get transactions: {error}"))?;

    let recommendations = regenerate_recommendations(user_id, &ledger, &connection)
        .inspect_err(|error| {
            tracing::error!("Could not regenerate recommendations for user {user_id}: {error}")
        })?;
    let predictions = predict_spending(analyze_spending_patterns(&ledger));

    Ok(insights_view(&predictions, &recommendations).into_response())
}

fn trend_style(trend: Trend) -> &'static str {
    match trend {
        Trend::Increasing => "text-red-600 dark:text-red-400",
        Trend::Decreasing => "text-green-600 dark:text-green-400",
        Trend::Stable => "text-gray-600 dark:text-gray-400",
    }
}

fn priority_style(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "bg-red-100 text-red-800 dark:bg-red-900 dark:text-red-300",
        Priority::Medium => "bg-yellow-100 text-yellow-800 dark:bg-yellow-900 dark:text-yellow-300",
        Priority::Low => "bg-blue-100 text-blue-800 dark:bg-blue-900 dark:text-blue-300",
    }
}

/// A recommendation with buttons to mark it as read or applied.
///
/// The buttons replace the card with the updated one returned by the server.
pub(super) fn recommendation_card(recommendation: &StoredRecommendation) -> Markup {
    let card_id = format!("recommendation-{}", recommendation.id);
    let read_url = format_endpoint(endpoints::READ_RECOMMENDATION, recommendation.id);
    let apply_url = format_endpoint(endpoints::APPLY_RECOMMENDATION, recommendation.id);
    let target = format!("#{card_id}");
    let card_style = if recommendation.is_read {
        "opacity-75"
    } else {
        ""
    };

    html!(
        div
            id=(card_id)
            class={ (CARD_STYLE) " " (card_style) }
            data-recommendation=(recommendation.id)
            data-read[recommendation.is_read]
            data-applied[recommendation.is_applied]
        {
            div class="flex justify-between items-start gap-2"
            {
                h3 class="font-semibold" { (recommendation.title) }
                span class={ "text-xs font-medium px-2.5 py-0.5 rounded " (priority_style(recommendation.priority)) }
                {
                    (recommendation.priority.as_str())
                }
            }

            p class="text-sm text-gray-600 dark:text-gray-300 my-2" { (recommendation.description) }

            div class="flex justify-between items-center text-sm"
            {
                span class="text-gray-500 dark:text-gray-400"
                {
                    "Impact " (format!("{:.0}", recommendation.impact_score))
                }

                div class="flex gap-4"
                {
                    @if recommendation.is_applied {
                        span class="text-green-600 dark:text-green-400" { "Applied" }
                    } @else {
                        @if !recommendation.is_read {
                            button
                                type="button"
                                hx-post=(read_url)
                                hx-target=(target)
                                hx-target-error="#alert-container"
                                hx-swap="outerHTML"
                                class=(LINK_STYLE)
                            {
                                "Mark as read"
                            }
                        }

                        button
                            type="button"
                            hx-post=(apply_url)
                            hx-target=(target)
                            hx-target-error="#alert-container"
                            hx-swap="outerHTML"
                            class=(LINK_STYLE)
                        {
                            "Apply"
                        }
                    }
                }
            }
        }
    )
}

fn predictions_view(predictions: &Predictions) -> Markup {
    html!(
        section class="w-full"
        {
            h2 class="text-lg font-semibold mb-2" { "Spending Patterns" }

            p class="mb-4 text-gray-600 dark:text-gray-300"
            {
                "Predicted spending across your regular categories: "
                span data-predicted-total class="font-semibold"
                {
                    (format_currency(predictions.predicted_total))
                }
                " ("
                (format!("{:.0}%", predictions.average_confidence * 100.0))
                " confidence)"
            }

            @for insight in &predictions.insights {
                p class={ "text-sm mb-1 " (trend_style(insight.trend)) } data-insight
                {
                    (insight.message)
                }
            }

            div class="overflow-x-auto"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class="px-6 py-4 text-right" { "Average" }
                            th scope="col" class="px-6 py-4 text-right" { "Next" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Trend" }
                            th scope="col" class="px-6 py-4 text-right" { "Confidence" }
                        }
                    }

                    tbody
                    {
                        @for pattern in &predictions.patterns {
                            tr class=(TABLE_ROW_STYLE) data-pattern
                            {
                                td class=(TABLE_CELL_STYLE) { (pattern.category_name) }
                                td class="px-6 py-4 text-right" { (format_currency(pattern.average_amount)) }
                                td class="px-6 py-4 text-right" { (format_currency(pattern.predicted_next)) }
                                td class={ (TABLE_CELL_STYLE) " " (trend_style(pattern.trend)) }
                                {
                                    (pattern.trend.as_str())
                                }
                                td class="px-6 py-4 text-right"
                                {
                                    (format!("{:.0}%", pattern.confidence_score * 100.0))
                                }
                            }
                        }

                        @if predictions.patterns.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="5" class="px-6 py-4 text-center"
                                {
                                    "Add at least three expenses in a category to see its pattern."
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

fn insights_view(predictions: &Predictions, recommendations: &[StoredRecommendation]) -> Markup {
    let nav_bar = NavBar::new(endpoints::INSIGHTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            (page_header("Smart Insights", Some((endpoints::ANALYTICS_VIEW, "View analytics"))))

            section class="w-full"
            {
                h2 class="text-lg font-semibold mb-2" { "Recommendations" }

                @if recommendations.is_empty() {
                    p class="text-gray-600 dark:text-gray-300"
                    {
                        "No recommendations right now. Keep tracking your spending!"
                    }
                } @else {
                    div class="grid grid-cols-1 md:grid-cols-2 gap-4"
                    {
                        @for recommendation in recommendations {
                            (recommendation_card(recommendation))
                        }
                    }
                }
            }

            (predictions_view(predictions))
        }
    );

    base("Smart Insights", &[], &content)
}
