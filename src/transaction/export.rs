//! Downloading transactions as a CSV file.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::{OffsetDateTime, macros::format_description};

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id},
    timezone::get_local_offset,
    transaction::{
        TransactionType,
        query::{
            SortOrder, TransactionFilter, TransactionFilterQuery, TransactionRow,
            get_transaction_rows,
        },
    },
};

/// The state needed to export transactions.
#[derive(Debug, Clone)]
pub struct ExportTransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExportTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

const CSV_HEADER: [&str; 6] = [
    "Date",
    "Type",
    "Category",
    "Description",
    "Amount",
    "Balance After",
];

/// Write `rows` as CSV with a running balance, `rows` should be oldest first.
///
/// # Errors
/// Returns [Error::CsvError] if a record could not be written.
pub fn write_transactions_csv(rows: &[TransactionRow]) -> Result<Vec<u8>, Error> {
    let csv_error = |error: csv::Error| Error::CsvError(error.to_string());
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    let mut balance = 0.0;
    for row in rows {
        balance += match row.transaction_type {
            TransactionType::Income => row.amount,
            TransactionType::Expense => -row.amount,
        };

        writer
            .write_record([
                row.date.to_string(),
                row.transaction_type.to_string(),
                row.category_name.clone(),
                row.description.clone(),
                format!("{:.2}", row.amount),
                format!("{balance:.2}"),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}

/// Build the attachment name `transactions_{username}_{YYYYMMDD_HHMMSS}.csv`.
///
/// Characters other than ASCII letters, digits, `-` and `_` in `username`
/// become `_` so the name is safe inside a quoted header value.
fn export_filename(username: &str, now: OffsetDateTime) -> String {
    let timestamp = now
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .unwrap_or_else(|error| {
            tracing::warn!("Could not format export timestamp: {error}");
            now.unix_timestamp().to_string()
        });

    let username: String = username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("transactions_{username}_{timestamp}.csv")
}

/// Respond with the user's transactions matching the query as a CSV attachment.
pub async fn export_transactions(
    State(state): State<ExportTransactionsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionFilterQuery>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let (user, rows) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let user = get_user_by_id(user_id, &connection)?;
        let rows = get_transaction_rows(
            user_id,
            &TransactionFilter::from(&query),
            SortOrder::Ascending,
            None,
            &connection,
        )?;

        (user, rows)
    };

    let body = write_transactions_csv(&rows)
        .inspect_err(|error| tracing::error!("Could not export transactions: {error}"))?;
    let filename = export_filename(
        &user.username,
        OffsetDateTime::now_utc().to_offset(local_offset),
    );

    tracing::info!("Exported {} transactions for user {user_id}", rows.len());

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod export_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use time::macros::{date, datetime};

    use crate::{
        category::get_category_by_name,
        test_utils::{
            assert_content_type, create_named_test_user, create_test_user, get_header,
            get_test_connection, response_text,
        },
        transaction::{
            Transaction, TransactionType, create_transaction, query::TransactionFilterQuery,
        },
    };

    use super::{ExportTransactionsState, export_filename, export_transactions};

    #[test]
    fn filename_has_username_and_timestamp() {
        let filename = export_filename("alice", datetime!(2025-03-04 05:06:07 UTC));

        assert_eq!(filename, "transactions_alice_20250304_050607.csv");
    }

    #[test]
    fn filename_replaces_unsafe_username_characters() {
        let filename = export_filename("bad\"name o'neil", datetime!(2025-03-04 05:06:07 UTC));

        assert_eq!(filename, "transactions_bad_name_o_neil_20250304_050607.csv");
    }

    #[tokio::test]
    async fn export_succeeds_for_username_with_newline() {
        let connection = get_test_connection();
        let user = create_named_test_user("line\nbreak", &connection);
        let state = ExportTransactionsState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = export_transactions(
            State(state),
            Extension(user.id),
            Query(TransactionFilterQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = get_header(&response, "content-disposition");
        assert!(
            disposition.starts_with("attachment; filename=\"transactions_line_break_"),
            "got {disposition}"
        );
    }

    #[tokio::test]
    async fn export_writes_running_balance() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        let salary = get_category_by_name("Salary", &connection).unwrap();
        for (amount, transaction_type, date, category_id, description) in [
            (
                100.0,
                TransactionType::Income,
                date!(2025 - 01 - 01),
                salary.id,
                "Pay",
            ),
            (
                30.5,
                TransactionType::Expense,
                date!(2025 - 01 - 02),
                food.id,
                "Lunch, with friends",
            ),
            (
                5.0,
                TransactionType::Expense,
                date!(2025 - 03 - 01),
                food.id,
                "Snack",
            ),
        ] {
            create_transaction(
                Transaction::build(amount, transaction_type, date, category_id)
                    .description(description),
                user.id,
                &connection,
            )
            .unwrap();
        }
        let state = ExportTransactionsState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = export_transactions(
            State(state),
            Extension(user.id),
            Query(TransactionFilterQuery {
                end_date: Some("2025-01-31".to_owned()),
                start_date: Some("not a date".to_owned()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/csv; charset=utf-8");
        let disposition = get_header(&response, "content-disposition");
        assert!(
            disposition.starts_with("attachment; filename=\"transactions_test_"),
            "got {disposition}"
        );
        let text = response_text(response).await;
        assert_eq!(
            text,
            "Date,Type,Category,Description,Amount,Balance After\n\
             2025-01-01,income,Salary,Pay,100.00,100.00\n\
             2025-01-02,expense,Food,\"Lunch, with friends\",30.50,69.50\n"
        );
    }
}
