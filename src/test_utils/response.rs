//! Helpers for reading and checking handler responses.

use axum::{body::Body, response::Response};
use scraper::Html;

/// The response body as text, replacing invalid UTF-8.
pub(crate) async fn response_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    String::from_utf8_lossy(&bytes).into_owned()
}

/// The response body parsed as JSON.
pub(crate) async fn response_json(response: Response<Body>) -> serde_json::Value {
    let text = response_text(response).await;

    serde_json::from_str(&text).unwrap_or_else(|error| panic!("Invalid JSON {text:?}: {error}"))
}

/// Parse a full page, i.e. the output of `html::base`.
pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&response_text(response).await)
}

/// Parse a partial page, e.g. a form or card swapped in by HTMX.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&response_text(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    response
        .headers()
        .get(header_name)
        .unwrap_or_else(|| panic!("Headers missing {header_name}"))
        .to_str()
        .expect("Header is not visible ASCII")
        .to_owned()
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    assert_eq!(get_header(response, "content-type"), content_type);
}

#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(get_header(response, "hx-redirect"), endpoint);
}
