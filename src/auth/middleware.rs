//! Middleware guarding the logged in pages and APIs.
//!
//! A valid auth cookie puts the [UserID](crate::auth::UserID) into the request
//! extensions and slides the cookie expiry forward. Anything else is sent to
//! the log-in page with a redirect back to where the user was.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How far each authenticated request pushes the cookie expiry out.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How an unauthenticated client is sent to the log-in page.
#[derive(Clone, Copy)]
enum LogInRedirect {
    /// A plain 303 redirect for full page loads.
    Browser,
    /// An `HX-Redirect` header, HTMX ignores 3xx responses to its requests.
    Htmx,
}

impl LogInRedirect {
    fn respond(self, log_in_url: &str) -> Response {
        match self {
            LogInRedirect::Browser => Redirect::to(log_in_url).into_response(),
            LogInRedirect::Htmx => {
                (HxRedirect(log_in_url.to_owned()), StatusCode::OK).into_response()
            }
        }
    }
}

/// The log-in URL for `request`, pointing back at the page the user was on.
fn log_in_url_for(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        tracing::warn!(
            "Could not build a redirect URL for {}, falling back to the dashboard.",
            request.uri().path()
        );

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

/// Copy the `Set-Cookie` headers of `jar` onto `headers`.
fn append_cookie_headers(jar: PrivateCookieJar, headers: &mut HeaderMap) {
    let jar_response = jar.into_response();

    for value in jar_response.headers().get_all(SET_COOKIE) {
        headers.append(SET_COOKIE, value.to_owned());
    }
}

async fn guard_request(
    state: AuthState,
    request: Request,
    next: Next,
    redirect: LogInRedirect,
) -> Response {
    let log_in_url = log_in_url_for(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "Invalid timezone {}, sending the user to the log in page.",
            state.local_timezone
        );
        return redirect.respond(&log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not read the cookie jar: {error:?}");
            return redirect.respond(&log_in_url);
        }
    };

    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("Rejected auth cookie: {error}");
            return redirect.respond(&log_in_url);
        }
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar =
        extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration, local_offset)
            .unwrap_or_else(|error| {
                tracing::error!("Could not extend the auth cookie for user {user_id}: {error}");
                jar
            });

    let (mut parts, body) = response.into_parts();
    append_cookie_headers(jar, &mut parts.headers);

    Response::from_parts(parts, body)
}

/// Let requests with a valid auth cookie through, redirect everything else to the log-in page.
///
/// Handlers behind this guard can take `Extension(user_id): Extension<UserID>`.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard_request(state, request, next, LogInRedirect::Browser).await
}

/// Same as [auth_guard], but redirects with `HX-Redirect` for routes called by HTMX.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard_request(state, request, next, LogInRedirect::Htmx).await
}
