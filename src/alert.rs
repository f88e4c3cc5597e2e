//! Alert system for displaying success and error messages to users.
//!
//! Alerts are HTML fragments that HTMX swaps into the `#alert-container`
//! element of the base page.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A message to display to the user after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with additional details.
    Success { message: String, details: String },
    /// An error message with additional details.
    Error { message: String, details: String },
    /// A success message without details.
    SuccessSimple { message: String },
    /// An error message without details.
    ErrorSimple { message: String },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }

    fn into_markup(self) -> Markup {
        let (is_error, message, details) = match self {
            Alert::Success { message, details } => (false, message, details),
            Alert::Error { message, details } => (true, message, details),
            Alert::SuccessSimple { message } => (false, message, String::new()),
            Alert::ErrorSimple { message } => (true, message, String::new()),
        };

        let style = if is_error {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400"
        } else {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 dark:bg-gray-800 dark:text-green-400"
        };

        html! {
            div
                role="alert"
                class=(style)
                hx-on:click="this.remove()"
            {
                p class="font-medium" { (message) }

                @if !details.is_empty() {
                    p { (details) }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
