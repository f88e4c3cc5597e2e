//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the response body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_bytes) = match extract_header_and_body_from_request(request).await {
        Ok(parts) => parts,
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let is_form = headers
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    let body_text = String::from_utf8_lossy(&body_bytes);

    if headers.method == axum::http::Method::POST && is_form {
        let display_text = redact_password(&body_text, "password");
        let display_text = redact_password(&display_text, "confirm_password");
        log_request(&headers, &display_text);
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, Body::from(body_bytes));
    let response = next.run(request).await;

    let (headers, body_bytes) = match extract_header_and_body_from_response(response).await {
        Ok(parts) => parts,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&headers, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(headers, Body::from(body_bytes))
}

fn redact_password(form_text: &str, field_name: &str) -> String {
    let password_start = form_text.find(&format!("{}=", field_name));

    let start = match password_start {
        Some(password_pos) => password_pos,
        None => return form_text.to_string(),
    };

    let password_end = form_text[start..].find('&');
    let end = match password_end {
        Some(end) => start + end,
        None => form_text.len(),
    };
    let password = &form_text[start..end];

    form_text.replace(password, &format!("{}=********", field_name))
}

async fn extract_header_and_body_from_request(
    request: Request,
) -> Result<(axum::http::request::Parts, axum::body::Bytes), axum::Error> {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok((headers, body_bytes))
}

async fn extract_header_and_body_from_response(
    response: Response,
) -> Result<(axum::http::response::Parts, axum::body::Bytes), axum::Error> {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok((headers, body_bytes))
}

/// The number of bytes of a body logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Cut `body` down to at most [LOG_BODY_LENGTH_LIMIT] bytes without splitting a character.
fn truncate_body(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            truncate_body(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            truncate_body(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod logging_tests {
    use super::{LOG_BODY_LENGTH_LIMIT, redact_password, truncate_body};

    #[test]
    fn redacts_password_field() {
        let form = "username=alice&password=hunter2&remember_me=on";

        let redacted = redact_password(form, "password");

        assert_eq!(redacted, "username=alice&password=********&remember_me=on");
    }

    #[test]
    fn redacts_trailing_password_field() {
        let form = "username=alice&password=hunter2";

        let redacted = redact_password(form, "password");

        assert_eq!(redacted, "username=alice&password=********");
    }

    #[test]
    fn leaves_forms_without_password_alone() {
        let form = "name=Food&color=%23ff0000";

        assert_eq!(redact_password(form, "password"), form);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate_body(&body);

        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
