//! Receipt scanning: uploaded receipts are read into a merchant and total
//! that can be turned into an expense.

mod core;
mod page;
mod scan;

pub use core::{
    RECENT_SCAN_LIMIT, ReceiptDetection, ReceiptScan, ReceiptScanId, convert_receipt_scan,
    count_receipt_scans, create_receipt_scan_table, detect_receipt, get_receipt_scan,
    get_recent_receipt_scans, scan_receipt, suggested_category_name,
};
pub use page::{ReceiptsPageState, get_receipts_page};
pub use scan::{ReceiptState, convert_receipt_endpoint, scan_receipt_endpoint};
