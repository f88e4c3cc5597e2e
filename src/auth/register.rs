//! The registration page and the handler that creates new user accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        PasswordHash, ValidatedPassword, create_user, set_auth_cookie,
        user::{validate_email, validate_username},
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input, text_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 8;

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }

    }
}

/// Error messages to show next to each field of the registration form.
#[derive(Default)]
struct RegistrationErrors<'a> {
    username: Option<&'a str>,
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(username: &str, email: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", "text", username, errors.username))
            (text_input("email", "Email", "email", email, errors.email))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", "", RegistrationErrors::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create a user account, log the new user in and send them to the dashboard.
///
/// Invalid input re-renders the form with a message next to the offending field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let render_error = |errors: RegistrationErrors| {
        registration_form(&user_data.username, &user_data.email, errors).into_response()
    };

    let username = match validate_username(&user_data.username) {
        Ok(username) => username,
        Err(error) => {
            return render_error(RegistrationErrors {
                username: Some(&error.to_string()),
                ..Default::default()
            });
        }
    };

    let email = match validate_email(&user_data.email) {
        Ok(email) => email,
        Err(error) => {
            return render_error(RegistrationErrors {
                email: Some(&error.to_string()),
                ..Default::default()
            });
        }
    };

    let account_details = [username.as_str(), email.as_str()];
    let validated_password = match ValidatedPassword::new(&user_data.password, &account_details) {
        Ok(password) => password,
        Err(error) => {
            return render_error(RegistrationErrors {
                password: Some(&error.to_string()),
                ..Default::default()
            });
        }
    };

    if user_data.password != user_data.confirm_password {
        return render_error(RegistrationErrors {
            confirm_password: Some("Passwords do not match"),
            ..Default::default()
        });
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    let local_timezone = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => create_user(&username, &email, password_hash, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let user = match result {
        Ok(user) => user,
        Err(error @ Error::DuplicateUsername) => {
            return render_error(RegistrationErrors {
                username: Some(&error.to_string()),
                ..Default::default()
            });
        }
        Err(error @ Error::DuplicateEmail) => {
            return render_error(RegistrationErrors {
                email: Some(&error.to_string()),
                ..Default::default()
            });
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("Registered user {} ({})", user.username, user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_timezone) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("An error occurred while setting the auth cookie: {e}");

            get_internal_server_error_redirect()
        }
    }
}


#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;

    use crate::{
        app_state::create_cookie_key,
        auth::{DEFAULT_COOKIE_DURATION, cookie::COOKIE_TOKEN, count_users},
        endpoints,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{RegistrationState, register_user};

    const STRONG_PASSWORD: &str = "correct horse battery staple";

    fn get_test_server() -> (TestServer, RegistrationState) {
        let connection = get_test_connection();
        create_test_user(&connection);

        let state = RegistrationState {
            cookie_key: create_cookie_key("42"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(state.clone());

        (
            TestServer::new(app).expect("Could not create test server."),
            state,
        )
    }

    fn form<'a>(username: &'a str, email: &'a str, confirm: &'a str) -> [(&'a str, &'a str); 4] {
        [
            ("username", username),
            ("email", email),
            ("password", STRONG_PASSWORD),
            ("confirm_password", confirm),
        ]
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&form("alice", "alice@example.com", STRONG_PASSWORD))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);
        let _ = response.cookie(COOKIE_TOKEN);
        let count = count_users(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn mismatched_passwords_rerender_form() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&form("alice", "alice@example.com", "something else entirely"))
            .await;

        response.assert_status_ok();
        response.assert_text_contains("Passwords do not match");
    }

    #[tokio::test]
    async fn duplicate_username_rerenders_form() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&form("test", "new@example.com", STRONG_PASSWORD))
            .await;

        response.assert_status_ok();
        response.assert_text_contains("Username already exists");
        let count = count_users(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn short_username_rerenders_form() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&form("al", "al@example.com", STRONG_PASSWORD))
            .await;

        response.assert_status_ok();
        response.assert_text_contains("Username must be");
    }

    #[tokio::test]
    async fn weak_password_rerenders_form() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("username", "alice"),
                ("email", "alice@example.com"),
                ("password", "password"),
                ("confirm_password", "password"),
            ])
            .await;

        response.assert_status_ok();
        response.assert_text_contains("password is too weak");
    }
}
