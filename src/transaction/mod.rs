//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - View handlers for the transaction pages and the CSV export

mod core;
mod create;
mod delete;
mod export;
mod list;
pub(crate) mod query;

pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionType, count_transactions,
    create_transaction, create_transaction_table, delete_transaction, get_expenses_in_category,
    get_transaction, map_transaction_row,
};
pub use create::{create_transaction_endpoint, get_new_transaction_page};
pub use delete::delete_transaction_endpoint;
pub use export::export_transactions;
pub use list::get_transactions_page;
