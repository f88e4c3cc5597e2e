//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    achievement::get_achievements_page,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    budget_goal::{
        create_budget_goal_endpoint, delete_budget_goal_endpoint, get_budget_goals_page,
        get_new_budget_goal_page,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_edit_category_page, get_new_category_page, update_category_endpoint,
    },
    dashboard::get_dashboard_page,
    endpoints,
    insights::{
        apply_recommendation_endpoint, get_chart_data, get_insights_page, get_live_balance,
        get_predictions, get_spending_trends, mark_recommendation_read_endpoint,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    notification::get_notifications_page,
    receipt::{convert_receipt_endpoint, get_receipts_page, scan_receipt_endpoint},
    report::{get_analytics_page, get_reports_page},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, export_transactions,
        get_new_transaction_page, get_transactions_page,
    },
    widget::{get_custom_dashboard_page, get_widget_data},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page),
        )
        .route(endpoints::EXPORT_TRANSACTIONS, get(export_transactions))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(endpoints::BUDGET_GOALS_VIEW, get(get_budget_goals_page))
        .route(
            endpoints::NEW_BUDGET_GOAL_VIEW,
            get(get_new_budget_goal_page),
        )
        .route(endpoints::INSIGHTS_VIEW, get(get_insights_page))
        .route(endpoints::ANALYTICS_VIEW, get(get_analytics_page))
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .route(endpoints::NOTIFICATIONS_VIEW, get(get_notifications_page))
        .route(endpoints::RECEIPTS_VIEW, get(get_receipts_page))
        .route(
            endpoints::CUSTOM_DASHBOARD_VIEW,
            get(get_custom_dashboard_page),
        )
        .route(endpoints::ACHIEVEMENTS_VIEW, get(get_achievements_page))
        .route(endpoints::SPENDING_TRENDS_API, get(get_spending_trends))
        .route(endpoints::PREDICTIONS_API, get(get_predictions))
        .route(endpoints::LIVE_BALANCE_API, get(get_live_balance))
        .route(endpoints::CHART_DATA_API, get(get_chart_data))
        .route(endpoints::WIDGET_DATA_API, get(get_widget_data))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::DELETE_TRANSACTION,
                delete(delete_transaction_endpoint),
            )
            .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
            .route(
                endpoints::PUT_CATEGORY,
                put(update_category_endpoint).delete(delete_category_endpoint),
            )
            .route(
                endpoints::BUDGET_GOALS_API,
                post(create_budget_goal_endpoint),
            )
            .route(
                endpoints::DELETE_BUDGET_GOAL,
                delete(delete_budget_goal_endpoint),
            )
            .route(
                endpoints::READ_RECOMMENDATION,
                post(mark_recommendation_read_endpoint),
            )
            .route(
                endpoints::APPLY_RECOMMENDATION,
                post(apply_recommendation_endpoint),
            )
            .route(endpoints::SCAN_RECEIPT, post(scan_receipt_endpoint))
            .route(endpoints::CONVERT_RECEIPT, post(convert_receipt_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
