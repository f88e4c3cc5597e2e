//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        CategoryFormData, create_category,
        form::{FormMethod, category_form_view},
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    new_category_view().into_response()
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let new_category = match form_data.validate() {
        Ok(new_category) => new_category,
        Err(error) => {
            return new_category_form_view(&form_data, &format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(new_category, &connection) {
        Ok(category) => {
            tracing::info!("Created category {} ({})", category.name, category.id);

            (
                HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateCategoryName) => {
            new_category_form_view(&form_data, &format!("Error: {error}")).into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

fn new_category_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = new_category_form_view(&CategoryFormData::default(), "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Category", &[], &content)
}

fn new_category_form_view(values: &CategoryFormData, error_message: &str) -> Markup {
    category_form_view(
        endpoints::POST_CATEGORY,
        FormMethod::Post,
        values,
        error_message,
        "Create Category",
    )
}

#[cfg(test)]
mod new_category_page_tests {
    use axum::http::StatusCode;

    use crate::{
        category::get_new_category_page,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_input_with_value, assert_form_submit_button,
            assert_hx_endpoint, assert_optional_form_input, assert_valid_html, must_get_form,
            parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let response = get_new_category_page().await;

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_CATEGORY, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_optional_form_input(&form, "description", "text");
        assert_form_input_with_value(&form, "color", "color", "#007bff");
        assert_form_submit_button(&form);
    }
}
