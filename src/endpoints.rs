//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/categories/{category_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The route for downloading transactions as a CSV file.
pub const EXPORT_TRANSACTIONS: &str = "/transactions/export";
/// The page for listing all categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page for editing an existing category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The page for listing budget goals and their progress.
pub const BUDGET_GOALS_VIEW: &str = "/budget_goals";
/// The page for creating a new budget goal.
pub const NEW_BUDGET_GOAL_VIEW: &str = "/budget_goals/new";
/// The page with spending patterns and smart recommendations.
pub const INSIGHTS_VIEW: &str = "/insights";
/// The page with summary statistics.
pub const ANALYTICS_VIEW: &str = "/analytics";
/// The page with income and expenses grouped by period.
pub const REPORTS_VIEW: &str = "/reports";
/// The notification centre.
pub const NOTIFICATIONS_VIEW: &str = "/notifications";
/// The receipt scanner page.
pub const RECEIPTS_VIEW: &str = "/receipts";
/// The widget based dashboard.
pub const CUSTOM_DASHBOARD_VIEW: &str = "/custom_dashboard";
/// The page listing earned and available achievements.
pub const ACHIEVEMENTS_VIEW: &str = "/achievements";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";
/// The route to update a category.
pub const PUT_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to delete a single transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create budget goals.
pub const BUDGET_GOALS_API: &str = "/api/budget_goals";
/// The route to delete a single budget goal.
pub const DELETE_BUDGET_GOAL: &str = "/api/budget_goals/{goal_id}";
/// The route to mark a recommendation as read.
pub const READ_RECOMMENDATION: &str = "/api/recommendations/{recommendation_id}/read";
/// The route to mark a recommendation as applied.
pub const APPLY_RECOMMENDATION: &str = "/api/recommendations/{recommendation_id}/apply";
/// The route to upload a receipt for scanning.
pub const SCAN_RECEIPT: &str = "/api/receipts";
/// The route to turn a receipt scan into a transaction.
pub const CONVERT_RECEIPT: &str = "/api/receipts/{scan_id}/convert";
/// The route for daily income and expense totals.
pub const SPENDING_TRENDS_API: &str = "/api/spending_trends";
/// The route for next period spending predictions.
pub const PREDICTIONS_API: &str = "/api/predictions";
/// The route for the current balance and this month's totals.
pub const LIVE_BALANCE_API: &str = "/api/live_balance";
/// The route for expenses per category with display colors.
pub const CHART_DATA_API: &str = "/api/chart_data";
/// The route for the data behind a custom dashboard widget.
pub const WIDGET_DATA_API: &str = "/api/widgets/{widget_type}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::EXPORT_TRANSACTIONS,
            endpoints::CATEGORIES_VIEW,
            endpoints::NEW_CATEGORY_VIEW,
            endpoints::EDIT_CATEGORY_VIEW,
            endpoints::BUDGET_GOALS_VIEW,
            endpoints::NEW_BUDGET_GOAL_VIEW,
            endpoints::INSIGHTS_VIEW,
            endpoints::ANALYTICS_VIEW,
            endpoints::REPORTS_VIEW,
            endpoints::NOTIFICATIONS_VIEW,
            endpoints::RECEIPTS_VIEW,
            endpoints::CUSTOM_DASHBOARD_VIEW,
            endpoints::ACHIEVEMENTS_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::POST_CATEGORY,
            endpoints::PUT_CATEGORY,
            endpoints::DELETE_CATEGORY,
            endpoints::TRANSACTIONS_API,
            endpoints::DELETE_TRANSACTION,
            endpoints::BUDGET_GOALS_API,
            endpoints::DELETE_BUDGET_GOAL,
            endpoints::READ_RECOMMENDATION,
            endpoints::APPLY_RECOMMENDATION,
            endpoints::SCAN_RECEIPT,
            endpoints::CONVERT_RECEIPT,
            endpoints::SPENDING_TRENDS_API,
            endpoints::PREDICTIONS_API,
            endpoints::LIVE_BALANCE_API,
            endpoints::CHART_DATA_API,
            endpoints::WIDGET_DATA_API,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn accepts_string_parameters() {
        let formatted_path = format_endpoint(endpoints::WIDGET_DATA_API, "balance");

        assert_eq!(formatted_path, "/api/widgets/balance");
    }
}
