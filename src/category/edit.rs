//! Category editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        CategoryFormData, CategoryId,
        form::{FormMethod, category_form_view},
        get_category, update_category,
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for the edit category page and endpoint.
#[derive(Debug, Clone)]
pub struct EditCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category editing page.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    let (values, error_message) = match get_category(category_id, &connection) {
        Ok(category) => (
            CategoryFormData {
                name: category.name.to_string(),
                description: category.description.unwrap_or_default(),
                color: category.color,
            },
            "",
        ),
        Err(Error::NotFound) => (CategoryFormData::default(), "Category not found"),
        Err(error) => {
            tracing::error!("Failed to retrieve category {category_id}: {error}");
            (CategoryFormData::default(), "Failed to load category")
        }
    };

    Ok(edit_category_view(&edit_endpoint, &update_endpoint, &values, error_message).into_response())
}

/// Handle category update form submission.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    let category = match form_data.validate() {
        Ok(category) => category,
        Err(error) => {
            return edit_category_form_view(&update_endpoint, &form_data, &format!("Error: {error}"))
                .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_category(category_id, category, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::DuplicateCategoryName) => {
            edit_category_form_view(&update_endpoint, &form_data, &format!("Error: {error}"))
                .into_response()
        }
        Err(Error::UpdateMissingCategory) => Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_category_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    values: &CategoryFormData,
    error_message: &str,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint).into_html();
    let form = edit_category_form_view(update_endpoint, values, error_message);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Category", &[], &content)
}

fn edit_category_form_view(
    update_endpoint: &str,
    values: &CategoryFormData,
    error_message: &str,
) -> Markup {
    category_form_view(
        update_endpoint,
        FormMethod::Put,
        values,
        error_message,
        "Update Category",
    )
}

#[cfg(test)]
mod edit_category_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };

    use crate::{
        category::{
            CategoryFormData, edit::EditCategoryState, get_category, get_category_by_name,
            get_edit_category_page, update_category_endpoint,
        },
        endpoints,
        test_utils::{
            assert_form_error_message, assert_form_input_with_value, assert_hx_endpoint,
            assert_hx_redirect, assert_valid_html, get_test_connection, must_get_form,
            parse_html_document, parse_html_fragment,
        },
    };

    fn get_state() -> EditCategoryState {
        EditCategoryState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    fn food_id(state: &EditCategoryState) -> i64 {
        get_category_by_name("Food", &state.db_connection.lock().unwrap())
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn edit_page_is_prefilled() {
        let state = get_state();
        let category_id = food_id(&state);

        let response = get_edit_category_page(Path(category_id), State(state))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", "Food");
        assert_form_input_with_value(&form, "color", "color", "#28a745");
    }

    #[tokio::test]
    async fn edit_page_for_missing_category_shows_message() {
        let response = get_edit_category_page(Path(999), State(get_state()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Category not found");
    }

    #[tokio::test]
    async fn update_category_succeeds() {
        let state = get_state();
        let category_id = food_id(&state);
        let form = CategoryFormData {
            name: "Groceries".to_owned(),
            description: "Weekly shop".to_owned(),
            color: "#00ff00".to_owned(),
        };

        let response = update_category_endpoint(Path(category_id), State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let category = get_category(category_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(category.name.as_ref(), "Groceries");
        assert_eq!(category.color, "#00ff00");
    }

    #[tokio::test]
    async fn update_to_existing_name_rerenders_form() {
        let state = get_state();
        let category_id = food_id(&state);
        let form = CategoryFormData {
            name: "Housing".to_owned(),
            ..Default::default()
        };

        let response = update_category_endpoint(Path(category_id), State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: a category with this name already exists");
    }

    #[tokio::test]
    async fn update_missing_category_returns_not_found_alert() {
        let form = CategoryFormData {
            name: "Groceries".to_owned(),
            ..Default::default()
        };

        let response = update_category_endpoint(Path(999), State(get_state()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
