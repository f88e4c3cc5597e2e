//! Database query helpers for the transactions page and the CSV export.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{
    Error,
    auth::UserID,
    category::CategoryId,
    transaction::{TransactionId, TransactionType},
};

/// The order to sort transactions in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

/// A transaction joined with its category for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub description: String,
    pub date: Date,
    pub category_id: CategoryId,
    pub category_name: String,
    pub category_color: String,
}

/// The raw query string for filtering transactions.
///
/// Values that cannot be parsed are ignored rather than rejected.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TransactionFilterQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Criteria for selecting a user's transactions, all optional.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Earliest date, inclusive.
    pub start_date: Option<Date>,
    /// Latest date, inclusive.
    pub end_date: Option<Date>,
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<CategoryId>,
}

fn parse_date(raw: Option<&str>) -> Option<Date> {
    let raw = raw?.trim();
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .inspect_err(|error| tracing::debug!("Ignoring invalid date filter {raw:?}: {error}"))
        .ok()
}

impl From<&TransactionFilterQuery> for TransactionFilter {
    fn from(query: &TransactionFilterQuery) -> Self {
        Self {
            start_date: parse_date(query.start_date.as_deref()),
            end_date: parse_date(query.end_date.as_deref()),
            transaction_type: query
                .transaction_type
                .as_deref()
                .and_then(|raw| raw.parse().ok()),
            category_id: query
                .category
                .as_deref()
                .and_then(|raw| raw.trim().parse().ok()),
        }
    }
}

/// Get the transactions of `user_id` matching `filter` sorted by date, then ID.
///
/// At most `limit` rows are returned when a limit is given.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_transaction_rows(
    user_id: UserID,
    filter: &TransactionFilter,
    sort_order: SortOrder,
    limit: Option<u32>,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    let order_clause = match sort_order {
        SortOrder::Ascending => "ORDER BY t.date ASC, t.id ASC",
        SortOrder::Descending => "ORDER BY t.date DESC, t.id DESC",
    };

    let query = format!(
        "SELECT t.id, t.amount, t.type, t.description, t.date, c.id, c.name, c.color
        FROM \"transaction\" t
        INNER JOIN category c ON t.category_id = c.id
        WHERE t.user_id = ?1
            AND (?2 IS NULL OR t.date >= ?2)
            AND (?3 IS NULL OR t.date <= ?3)
            AND (?4 IS NULL OR t.type = ?4)
            AND (?5 IS NULL OR t.category_id = ?5)
        {order_clause}
        LIMIT ?6"
    );

    // SQLite treats a negative limit as no limit.
    let limit = limit.map(i64::from).unwrap_or(-1);

    connection
        .prepare(&query)?
        .query_map(
            (
                user_id.as_i64(),
                filter.start_date,
                filter.end_date,
                filter.transaction_type,
                filter.category_id,
                limit,
            ),
            |row| {
                Ok(TransactionRow {
                    id: row.get(0)?,
                    amount: row.get(1)?,
                    transaction_type: row.get(2)?,
                    description: row.get(3)?,
                    date: row.get(4)?,
                    category_id: row.get(5)?,
                    category_name: row.get(6)?,
                    category_color: row.get(7)?,
                })
            },
        )?
        .map(|row_result| row_result.map_err(Error::from))
        .collect()
}
