//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username is too short or too long.
    #[error("Username must be between 3 and 80 characters")]
    InvalidUsername,

    /// The email address is not of the form `local@domain`.
    #[error("Please enter a valid email address")]
    InvalidEmail,

    /// Another user has already registered the username.
    #[error("Username already exists. Please choose a different one.")]
    DuplicateUsername,

    /// Another user has already registered the email address.
    #[error("Email already registered. Please choose a different one.")]
    DuplicateEmail,

    /// The category name is too short or too long.
    #[error("Category name must be between 2 and 100 characters")]
    InvalidCategoryName,

    /// The category description is longer than allowed.
    #[error("Category description must be at most 200 characters")]
    CategoryDescriptionTooLong,

    /// The category color is not a hex color of the form `#RRGGBB`.
    #[error("\"{0}\" is not a valid color, use the form #RRGGBB")]
    InvalidColor(String),

    /// A category with the same name already exists.
    #[error("a category with this name already exists")]
    DuplicateCategoryName,

    /// Tried to delete a category that still has transactions.
    #[error("Cannot delete category \"{name}\" because it has {transaction_count} transactions.")]
    CategoryInUse {
        /// The name of the category.
        name: String,
        /// How many transactions reference the category.
        transaction_count: u32,
    },

    /// The category ID used to create a record did not match a valid category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(i64),

    /// A transaction amount that is not strictly positive.
    #[error("Amount must be at least 0.01")]
    InvalidAmount,

    /// A transaction description that is empty or too long.
    #[error("Description must be between 1 and 200 characters")]
    InvalidDescription,

    /// A string that is neither `income` nor `expense`.
    #[error("\"{0}\" is not a valid transaction type")]
    InvalidTransactionType(String),

    /// A string that is not a supported budget period.
    #[error("\"{0}\" is not a valid budget period")]
    InvalidBudgetPeriod(String),

    /// A stored or submitted value that is not one of the allowed names, e.g.
    /// a recommendation priority of "extreme".
    #[error("\"{value}\" is not a valid {kind}")]
    InvalidEnumValue {
        /// What the value was supposed to be.
        kind: &'static str,
        /// The value that was given.
        value: String,
    },

    /// A budget goal target below zero.
    #[error("Target amount cannot be negative")]
    NegativeTargetAmount,

    /// The receipt scan has already been turned into a transaction.
    #[error("the receipt has already been converted to a transaction")]
    ReceiptAlreadyConverted,

    /// The multipart form did not contain a file.
    #[error("no receipt file was uploaded")]
    EmptyReceipt,

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The CSV export could not be written.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist or belongs to another user
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to delete a budget goal that does not exist or belongs to another user
    #[error("tried to delete a budget goal that is not in the database")]
    DeleteMissingBudgetGoal,

    /// Tried to update a recommendation that does not exist or belongs to another user
    #[error("tried to update a recommendation that is not in the database")]
    UpdateMissingRecommendation,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("category.name") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: format!("Could not find a category with the ID {category_id}"),
                },
            ),
            Error::CategoryInUse { .. } => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: self.to_string(),
                },
            ),
            Error::DuplicateCategoryName => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Category Name".to_owned(),
                    details: "A category with this name already exists. \
                        Choose a different name, or edit the existing category."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: "The category could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingBudgetGoal => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete budget goal".to_owned(),
                    details: "The budget goal could not be found. \
                    Try refreshing the page to see if the goal has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingRecommendation => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update recommendation".to_owned(),
                    details: "The recommendation could not be found. \
                    Recommendations are regenerated each time you open the insights page."
                        .to_owned(),
                },
            ),
            Error::ReceiptAlreadyConverted => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Receipt already converted".to_owned(),
                    details: "This receipt has already been added as a transaction.".to_owned(),
                },
            ),
            Error::EmptyReceipt => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Choose a receipt image to scan.".to_owned(),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The requested item could not be found.".to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
