use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, User, ValidatedPassword, create_user},
    db::initialize,
};

/// An in-memory database with every table created and the defaults seeded.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Create the user "test" with the password "test".
pub(crate) fn create_test_user(connection: &Connection) -> User {
    create_named_test_user("test", connection)
}

/// Create a user with the password "test".
pub(crate) fn create_named_test_user(username: &str, connection: &Connection) -> User {
    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked("test"), 4)
        .expect("Could not hash test password");

    create_user(
        username,
        &format!("{username}@example.com"),
        password_hash,
        connection,
    )
    .expect("Could not create test user")
}
