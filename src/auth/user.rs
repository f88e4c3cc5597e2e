//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The shortest allowed username, in characters, after trimming.
pub const USERNAME_MIN_LENGTH: usize = 3;
/// The longest allowed username, in characters, after trimming.
pub const USERNAME_MAX_LENGTH: usize = 80;

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's unique email address.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// Trim `raw_username` and check that it has an acceptable length.
///
/// # Errors
///
/// Returns [Error::InvalidUsername] if the trimmed username is too short or too long.
pub fn validate_username(raw_username: &str) -> Result<String, Error> {
    let username = raw_username.trim();
    let length = username.chars().count();

    if (USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        Ok(username.to_owned())
    } else {
        Err(Error::InvalidUsername)
    }
}

/// Trim `raw_email` and check that it looks like an email address, i.e.
/// `local@domain` with a single `@` and both parts non-empty.
///
/// # Errors
///
/// Returns [Error::InvalidEmail] if the address is malformed.
pub fn validate_email(raw_email: &str) -> Result<String, Error> {
    let email = raw_email.trim();

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email.to_owned())
        }
        _ => Err(Error::InvalidEmail),
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// `username` and `email` are expected to have been validated with
/// [validate_username] and [validate_email].
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateUsername] or [Error::DuplicateEmail] if another user already has them,
/// - [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    username: &str,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (username, email, password, created_at) VALUES (?1, ?2, ?3, ?4)",
        (username, email, password_hash.to_string(), created_at),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: username.to_owned(),
        email: email.to_owned(),
        password_hash,
        created_at,
    })
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(4)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user with the exact (trimmed) `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such user.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, email, password, created_at FROM user WHERE username = :username",
        )?
        .query_row(&[(":username", username.trim())], map_row)
        .map_err(|error| error.into())
}

/// Replace the password hash of the user with `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such user.
pub fn update_password(
    username: &str,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE username = ?2",
        (password_hash.to_string(), username),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}
