//! A web app for tracking personal income, expenses and budgets.
//!
//! The server renders HTML pages directly (with HTMX for interactivity) and
//! exposes a handful of JSON endpoints for charts and dashboard widgets.
//! All data lives in a single SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod achievement;
mod alert;
mod analytics;
mod app_state;
mod auth;
mod budget_goal;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod html;
mod insights;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod notification;
mod receipt;
mod report;
mod routing;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;
mod widget;

pub use app_state::AppState;
pub use auth::{
    PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_id,
    get_user_by_username, update_password,
};
pub use budget_goal::{BudgetPeriod, create_budget_goal};
pub use category::{get_all_categories, get_category_by_name};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use receipt::scan_receipt;
pub use routing::build_router;
pub use transaction::{Transaction, TransactionBuilder, TransactionType, create_transaction};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
