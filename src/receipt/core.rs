use rusqlite::{Connection, OptionalExtension, Row};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, get_category_by_name},
    transaction::{Transaction, TransactionId, TransactionType, create_transaction},
};

const MOCK_MERCHANTS: [&str; 6] = [
    "Target",
    "Walmart",
    "Starbucks",
    "McDonald's",
    "Gas Station",
    "Grocery Store",
];
const MOCK_AMOUNTS: [f64; 6] = [15.99, 32.45, 8.75, 125.00, 67.20, 23.15];
const MIN_CONFIDENCE: f64 = 0.75;
const MAX_CONFIDENCE: f64 = 0.95;
/// How many scans the receipts page lists.
pub const RECENT_SCAN_LIMIT: u32 = 10;

pub type ReceiptScanId = i64;

/// What the scanner read from a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDetection {
    pub merchant: &'static str,
    pub amount: f64,
    /// Between 0.75 and 0.95.
    pub confidence: f64,
}

/// Read the merchant and total from the bytes of a receipt image.
///
/// The result is derived from the MD5 digest of `image`, so the same file
/// always gives the same answer.
pub fn detect_receipt(image: &[u8]) -> ReceiptDetection {
    let digest = md5::compute(image);

    let merchant = MOCK_MERCHANTS[usize::from(digest[0]) % MOCK_MERCHANTS.len()];
    let amount = MOCK_AMOUNTS[usize::from(digest[1]) % MOCK_AMOUNTS.len()];
    let fraction = f64::from(u16::from_be_bytes([digest[2], digest[3]])) / f64::from(u16::MAX);
    let confidence = MIN_CONFIDENCE + fraction * (MAX_CONFIDENCE - MIN_CONFIDENCE);

    ReceiptDetection {
        merchant,
        amount,
        confidence,
    }
}

/// The name of the category a merchant's receipts usually belong in.
pub fn suggested_category_name(merchant: &str) -> &'static str {
    match merchant {
        "Starbucks" | "McDonald's" | "Grocery Store" => "Food",
        "Gas Station" => "Transportation",
        _ => "Other",
    }
}

/// A scanned receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptScan {
    pub id: ReceiptScanId,
    pub user_id: UserID,
    pub filename: String,
    pub detected_amount: f64,
    pub detected_merchant: String,
    pub suggested_category_id: Option<CategoryId>,
    /// Joined from the category table, `None` if there is no suggestion.
    pub suggested_category_name: Option<String>,
    pub confidence_score: f64,
    pub raw_text: String,
    /// Whether the scan has been turned into a transaction.
    pub is_processed: bool,
    pub transaction_id: Option<TransactionId>,
    pub created_at: OffsetDateTime,
}

pub fn create_receipt_scan_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS receipt_scan (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            filename TEXT NOT NULL,
            detected_amount REAL NOT NULL,
            detected_merchant TEXT NOT NULL,
            suggested_category_id INTEGER,
            confidence_score REAL NOT NULL,
            raw_text TEXT NOT NULL,
            is_processed INTEGER NOT NULL DEFAULT 0,
            transaction_id INTEGER,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(suggested_category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    Ok(())
}

const SELECT_SCAN: &str = "SELECT receipt_scan.id, receipt_scan.user_id, filename, detected_amount, \
    detected_merchant, suggested_category_id, category.name, confidence_score, raw_text, \
    is_processed, transaction_id, receipt_scan.created_at \
    FROM receipt_scan LEFT JOIN category ON category.id = receipt_scan.suggested_category_id";

fn map_row(row: &Row) -> Result<ReceiptScan, rusqlite::Error> {
    Ok(ReceiptScan {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        filename: row.get(2)?,
        detected_amount: row.get(3)?,
        detected_merchant: row.get(4)?,
        suggested_category_id: row.get(5)?,
        suggested_category_name: row.get(6)?,
        confidence_score: row.get(7)?,
        raw_text: row.get(8)?,
        is_processed: row.get(9)?,
        transaction_id: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Scan `image` and store the result for `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if the scan could not be stored.
pub fn scan_receipt(
    user_id: UserID,
    filename: &str,
    image: &[u8],
    connection: &Connection,
) -> Result<ReceiptScan, Error> {
    let detection = detect_receipt(image);
    let category_name = suggested_category_name(detection.merchant);
    let suggested_category_id = match get_category_by_name(category_name, connection) {
        Ok(category) => Some(category.id),
        Err(Error::NotFound) => None,
        Err(error) => return Err(error),
    };
    let raw_text = format!(
        "Receipt from {}\nTotal: ${:.2}",
        detection.merchant, detection.amount
    );

    connection.execute(
        "INSERT INTO receipt_scan (user_id, filename, detected_amount, detected_merchant,
            suggested_category_id, confidence_score, raw_text, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            user_id.as_i64(),
            filename,
            detection.amount,
            detection.merchant,
            suggested_category_id,
            detection.confidence,
            raw_text,
            OffsetDateTime::now_utc(),
        ),
    )?;

    get_receipt_scan(connection.last_insert_rowid(), user_id, connection)
}

/// Get one of `user_id`'s scans.
///
/// # Errors
/// Returns [Error::NotFound] if the scan does not exist or belongs to another user.
pub fn get_receipt_scan(
    scan_id: ReceiptScanId,
    user_id: UserID,
    connection: &Connection,
) -> Result<ReceiptScan, Error> {
    connection
        .prepare(&format!(
            "{SELECT_SCAN} WHERE receipt_scan.id = ?1 AND receipt_scan.user_id = ?2"
        ))?
        .query_row((scan_id, user_id.as_i64()), map_row)
        .map_err(Error::from)
}

/// The user's most recent scans, newest first.
pub fn get_recent_receipt_scans(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<ReceiptScan>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_SCAN} WHERE receipt_scan.user_id = ?1
            ORDER BY receipt_scan.created_at DESC, receipt_scan.id DESC
            LIMIT ?2"
        ))?
        .query_map((user_id.as_i64(), limit), map_row)?
        .map(|result| result.map_err(Error::from))
        .collect()
}

pub fn count_receipt_scans(user_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM receipt_scan WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

fn first_category_id(connection: &Connection) -> Result<CategoryId, Error> {
    connection
        .query_row("SELECT id FROM category ORDER BY id LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?
        .ok_or(Error::NotFound)
}

/// Record one of `user_id`'s scans as an expense dated `today` and mark the
/// scan as processed.
///
/// Scans without a suggested category are filed under the first category.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if the scan does not exist or belongs to another user,
/// - [Error::ReceiptAlreadyConverted] if the scan was already converted.
pub fn convert_receipt_scan(
    scan_id: ReceiptScanId,
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let scan = get_receipt_scan(scan_id, user_id, connection)?;

    if scan.is_processed {
        return Err(Error::ReceiptAlreadyConverted);
    }

    let category_id = match scan.suggested_category_id {
        Some(category_id) => category_id,
        None => first_category_id(connection)?,
    };

    let db_transaction = connection.unchecked_transaction()?;
    let transaction = create_transaction(
        Transaction::build(
            scan.detected_amount,
            TransactionType::Expense,
            today,
            category_id,
        )
        .description(&format!("Receipt: {}", scan.detected_merchant)),
        user_id,
        &db_transaction,
    )?;
    db_transaction.execute(
        "UPDATE receipt_scan SET is_processed = 1, transaction_id = ?1 WHERE id = ?2",
        (transaction.id, scan.id),
    )?;
    db_transaction.commit()?;

    Ok(transaction)
}
