//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, auth::UserID, category::CategoryId};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// The smallest amount a transaction may have.
pub const MIN_AMOUNT: f64 = 0.01;
/// The longest allowed description, in characters, after trimming.
pub const DESCRIPTION_MAX_LENGTH: usize = 200;

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// The lowercase name stored in the database and used in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// Whether the amount was earned or spent.
    pub transaction_type: TransactionType,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        transaction_type: TransactionType,
        date: Date,
        category_id: CategoryId,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            transaction_type,
            date,
            category_id,
            description: String::new(),
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// let builder = Transaction::build(45.99, TransactionType::Expense, date!(2025 - 01 - 15), 1)
///     .description("Coffee shop purchase");
/// let transaction = create_transaction(builder, user_id, &connection)?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The amount of money, at least [MIN_AMOUNT].
    pub amount: f64,
    pub transaction_type: TransactionType,
    /// The date when the money moved, not when it was recorded.
    pub date: Date,
    pub category_id: CategoryId,
    /// Between 1 and [DESCRIPTION_MAX_LENGTH] characters once trimmed.
    pub description: String,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Check the amount and trim the description.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] or [Error::InvalidDescription].
    pub fn validate(self) -> Result<Self, Error> {
        if !self.amount.is_finite() || self.amount < MIN_AMOUNT {
            return Err(Error::InvalidAmount);
        }

        let description = self.description.trim();
        let length = description.chars().count();
        if length == 0 || length > DESCRIPTION_MAX_LENGTH {
            return Err(Error::InvalidDescription);
        }

        Ok(Self {
            description: description.to_owned(),
            ..self
        })
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction owned by `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] or [Error::InvalidDescription] if the builder fails validation,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = builder.validate()?;

    connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, amount, type, description, date, category_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, amount, type, description, date, category_id, created_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                builder.amount,
                builder.transaction_type,
                &builder.description,
                builder.date,
                builder.category_id,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(builder.category_id),
            error => error.into(),
        })
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, amount, type, description, date, category_id, created_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Delete the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if there is no such transaction
/// or it belongs to another user.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the number of transactions belonging to `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Sum the expenses of `user_id` in `category_id` dated between `start` and
/// `end` inclusive.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_expenses_in_category(
    user_id: UserID,
    category_id: CategoryId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\"
             WHERE user_id = ?1 AND category_id = ?2 AND type = 'expense'
             AND date BETWEEN ?3 AND ?4",
            (user_id.as_i64(), category_id, start, end),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    // Used by the dashboard, reports and budget goal queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        transaction_type: row.get(3)?,
        description: row.get(4)?,
        date: row.get(5)?,
        category_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
