//! Endpoints for uploading a receipt and turning a scan into an expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Multipart, Path, State, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    achievement::award_achievements,
    auth::UserID,
    budget_goal::notify_if_over_budget,
    endpoints,
    receipt::{ReceiptScanId, convert_receipt_scan, scan_receipt},
    timezone::local_today,
};

/// The state needed to scan and convert receipts.
#[derive(Debug, Clone)]
pub struct ReceiptState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReceiptState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

async fn read_upload(field: Field<'_>) -> Result<UploadedFile, Error> {
    let filename = match field.file_name() {
        Some(filename) if !filename.is_empty() => filename.to_owned(),
        _ => format!(
            "receipt_{}.jpg",
            OffsetDateTime::now_utc().unix_timestamp()
        ),
    };

    let data = field.bytes().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError("Could not read data from multipart form field.".to_owned())
    })?;

    tracing::debug!("Received receipt '{filename}' that is {} bytes", data.len());

    Ok(UploadedFile {
        filename,
        data: data.to_vec(),
    })
}

async fn first_upload(multipart: &mut Multipart) -> Result<UploadedFile, Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        if field.name() != Some("receipt") {
            continue;
        }

        let upload = read_upload(field).await?;

        if upload.data.is_empty() {
            return Err(Error::EmptyReceipt);
        }

        return Ok(upload);
    }

    Err(Error::EmptyReceipt)
}

/// Scan an uploaded receipt image and show the result on the receipts page.
pub async fn scan_receipt_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
    mut multipart: Multipart,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let upload = match first_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(error) => {
            tracing::debug!("Rejected receipt upload: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match scan_receipt(user_id, &upload.filename, &upload.data, &connection) {
        Ok(scan) => {
            tracing::info!(
                "Scanned receipt {} for user {user_id}: {} ${:.2}",
                scan.id,
                scan.detected_merchant,
                scan.detected_amount
            );
        }
        Err(error) => {
            tracing::error!("Could not store receipt scan: {error}");
            return error.into_alert_response();
        }
    }

    if let Err(error) = award_achievements(user_id, today, &connection) {
        tracing::error!("Could not award achievements to user {user_id}: {error}");
    }

    (
        HxRedirect(endpoints::RECEIPTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Record a scanned receipt as an expense dated today.
pub async fn convert_receipt_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
    Path(scan_id): Path<ReceiptScanId>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let transaction = match convert_receipt_scan(scan_id, user_id, today, &connection) {
        Ok(transaction) => transaction,
        Err(error @ (Error::NotFound | Error::ReceiptAlreadyConverted)) => {
            return error.into_alert_response();
        }
        Err(error) => {
            tracing::error!("Could not convert receipt scan {scan_id}: {error}");
            return error.into_alert_response();
        }
    };

    tracing::info!(
        "Converted receipt scan {scan_id} into transaction {}",
        transaction.id
    );

    if let Err(error) = notify_if_over_budget(&transaction, today, &connection) {
        tracing::error!(
            "Could not check budget goals for transaction {}: {error}",
            transaction.id
        );
    }

    if let Err(error) = award_achievements(user_id, today, &connection) {
        tracing::error!("Could not award achievements to user {user_id}: {error}");
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
