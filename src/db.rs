//! Creates the application's tables and seeds the default data.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    achievement::{create_achievement_tables, seed_default_achievements},
    auth::create_user_table,
    budget_goal::create_budget_goal_table,
    category::{create_category_table, seed_default_categories},
    insights::create_recommendation_table,
    notification::create_notification_table,
    receipt::create_receipt_scan_table,
    transaction::create_transaction_table,
    widget::create_widget_table,
};

/// Implement `Display`, `ToSql` and `FromSql` for an enum stored as text.
///
/// The type must have an `as_str` method and implement `FromStr` with
/// [Error] as the error type.
macro_rules! impl_text_column {
    ($type:ty) => {
        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl rusqlite::ToSql for $type {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $type {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|error: $crate::Error| {
                        rusqlite::types::FromSqlError::Other(Box::new(error))
                    })
            }
        }
    };
}

pub(crate) use impl_text_column;

/// Create the tables for all domain models if they do not exist yet and
/// insert the default categories and achievements.
///
/// Safe to call on every start up, existing rows are left untouched.
///
/// # Errors
/// Returns an error if a table could not be created or the seed data could
/// not be inserted.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must be set outside of a transaction, SQLite ignores it otherwise.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_goal_table(&transaction)?;
    create_recommendation_table(&transaction)?;
    create_notification_table(&transaction)?;
    create_receipt_scan_table(&transaction)?;
    create_widget_table(&transaction)?;
    create_achievement_tables(&transaction)?;

    seed_default_categories(&transaction)?;
    seed_default_achievements(&transaction)?;

    transaction.commit()?;

    Ok(())
}
