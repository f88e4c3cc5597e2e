//! Category deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    category::{CategoryId, delete_category},
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category deletion. Returns a success alert or an error alert.
///
/// Categories that still have transactions are not deleted.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Category deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ (Error::DeleteMissingCategory | Error::CategoryInUse { .. })) => {
            tracing::debug!("Refused to delete category {category_id}: {error}");
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        category::{delete_category_endpoint, get_category, get_category_by_name},
        test_utils::{
            assert_valid_html, create_test_user, get_header, get_test_connection,
            parse_html_fragment,
        },
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::DeleteCategoryState;

    fn get_state() -> DeleteCategoryState {
        DeleteCategoryState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    #[track_caller]
    fn paragraphs(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn delete_unused_category_succeeds() {
        let state = get_state();
        let category_id = get_category_by_name("Clothing", &state.db_connection.lock().unwrap())
            .unwrap()
            .id;

        let response = delete_category_endpoint(Path(category_id), State(state.clone()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(get_category(category_id, &state.db_connection.lock().unwrap()).is_err());
    }

    #[tokio::test]
    async fn delete_missing_category_returns_error_html() {
        let response = delete_category_endpoint(Path(999), State(get_state()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_header(&response, "content-type"),
            "text/html; charset=utf-8"
        );
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(paragraphs(&html)[0], "Could not delete category");
    }

    #[tokio::test]
    async fn delete_category_in_use_is_rejected() {
        let state = get_state();
        let category_id = {
            let connection = state.db_connection.lock().unwrap();
            let user = create_test_user(&connection);
            let category_id = get_category_by_name("Food", &connection).unwrap().id;
            create_transaction(
                Transaction::build(
                    4.5,
                    TransactionType::Expense,
                    date!(2025 - 03 - 01),
                    category_id,
                )
                .description("Coffee"),
                user.id,
                &connection,
            )
            .unwrap();
            category_id
        };

        let response = delete_category_endpoint(Path(category_id), State(state.clone()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        assert_eq!(
            paragraphs(&html)[1],
            "Cannot delete category \"Food\" because it has 1 transactions."
        );
        assert!(get_category(category_id, &state.db_connection.lock().unwrap()).is_ok());
    }
}
