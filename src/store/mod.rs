//! The relational-store seam.
//!
//! The persistence core talks to storage exclusively through [`Database`] and
//! [`ReceiptTx`]: one transactional scope at a time, typed create/read/delete
//! over the four entities (by primary key and by unique name), plus the
//! read-side queries. Two implementations ship: [`MemoryStore`] (staged copy,
//! swap on commit — deterministic, used by tests and demos) and [`PgStore`]
//! (sea-query SQL over `may_postgres`).
//!
//! Uniqueness of `Category.name` and `Store.name` is enforced here and
//! surfaces as [`StorageError::UniqueViolation`] — the only defense against
//! duplicate-name races between separate sessions.

use std::fmt;

use chrono::NaiveDate;

use crate::model::{
    Category, Item, NewCategory, NewItem, NewReceipt, NewStore, Receipt, Store,
};
use crate::query::{
    CategorySpend, DateRange, MonthlySpend, PricePoint, ReceiptFilter, ReceiptSummary,
    StoreComparisonFilter, StorePriceStats, TrendFilter,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage error type
#[derive(Debug)]
pub enum StorageError {
    /// `PostgreSQL` error from `may_postgres`
    Postgres(may_postgres::Error),
    /// Unique constraint on a name column rejected the write
    UniqueViolation { entity: &'static str, name: String },
    /// Referenced row does not exist
    ForeignKeyViolation { entity: &'static str, id: i64 },
    /// Row parsing/conversion error
    Parse(String),
    /// Transaction already committed or rolled back
    TransactionClosed,
    /// Other storage errors
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Postgres(e) => write!(f, "PostgreSQL error: {}", e),
            StorageError::UniqueViolation { entity, name } => {
                write!(f, "Duplicate {} name '{}'", entity, name)
            }
            StorageError::ForeignKeyViolation { entity, id } => {
                write!(f, "Referenced {} {} does not exist", entity, id)
            }
            StorageError::Parse(msg) => write!(f, "Parse error: {}", msg),
            StorageError::TransactionClosed => {
                write!(f, "Transaction has already been committed or rolled back")
            }
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<may_postgres::Error> for StorageError {
    fn from(err: may_postgres::Error) -> Self {
        StorageError::Postgres(err)
    }
}

/// A relational store that can hand out transactional scopes.
pub trait Database {
    /// Start a transaction. On SQL backends this opens a serializable
    /// transaction; every write and read below goes through one scope.
    fn begin(&self) -> Result<Box<dyn ReceiptTx + '_>, StorageError>;
}

/// One transactional scope over the four tables.
///
/// All operations stage changes that become visible to other scopes only at
/// [`commit`](ReceiptTx::commit); [`rollback`](ReceiptTx::rollback) discards
/// everything. Both consume the scope, so a closed transaction cannot be
/// reused.
pub trait ReceiptTx {
    // --- categories ---

    /// Look up a category by its globally unique name
    fn category_by_name(&mut self, name: &str) -> Result<Option<Category>, StorageError>;

    fn category_by_id(&mut self, id: i64) -> Result<Option<Category>, StorageError>;

    /// Insert a category; fails with [`StorageError::UniqueViolation`] on a
    /// duplicate name and [`StorageError::ForeignKeyViolation`] on a missing
    /// parent
    fn insert_category(&mut self, row: &NewCategory) -> Result<Category, StorageError>;

    /// Categories ordered by name; optionally only those without a parent
    fn categories(&mut self, top_level_only: bool) -> Result<Vec<Category>, StorageError>;

    // --- stores ---

    /// Look up a store by its globally unique name
    fn store_by_name(&mut self, name: &str) -> Result<Option<Store>, StorageError>;

    /// Insert a store; fails with [`StorageError::UniqueViolation`] on a
    /// duplicate name
    fn insert_store(&mut self, row: &NewStore) -> Result<Store, StorageError>;

    /// Stores ordered by name
    fn stores(&mut self) -> Result<Vec<Store>, StorageError>;

    // --- receipts ---

    fn receipt_by_id(&mut self, id: i64) -> Result<Option<Receipt>, StorageError>;

    fn insert_receipt(&mut self, row: &NewReceipt) -> Result<Receipt, StorageError>;

    /// Overwrite the header columns (date, store, currency, total_amount,
    /// notes) of an existing receipt, refreshing `updated_at`
    fn update_receipt(&mut self, id: i64, row: &NewReceipt) -> Result<Receipt, StorageError>;

    /// Delete a receipt and, by cascade, its items. Returns whether a row
    /// existed. Categories and stores are never touched.
    fn delete_receipt(&mut self, id: i64) -> Result<bool, StorageError>;

    /// Count of receipt rows (test and consistency checks)
    fn receipt_count(&mut self) -> Result<i64, StorageError>;

    // --- items ---

    /// Insert an item; fails with [`StorageError::ForeignKeyViolation`] when
    /// the receipt or the category does not exist
    fn insert_item(&mut self, row: &NewItem) -> Result<Item, StorageError>;

    /// Delete every item belonging to a receipt, returning how many went away
    fn delete_items_for_receipt(&mut self, receipt_id: i64) -> Result<u64, StorageError>;

    /// Items of one receipt in insertion order
    fn items_for_receipt(&mut self, receipt_id: i64) -> Result<Vec<Item>, StorageError>;

    // --- read side ---

    fn receipt_summaries(
        &mut self,
        filter: &ReceiptFilter,
    ) -> Result<Vec<ReceiptSummary>, StorageError>;

    fn price_trends(&mut self, filter: &TrendFilter) -> Result<Vec<PricePoint>, StorageError>;

    fn store_comparison(
        &mut self,
        filter: &StoreComparisonFilter,
    ) -> Result<Vec<StorePriceStats>, StorageError>;

    fn category_spending(&mut self, range: DateRange) -> Result<Vec<CategorySpend>, StorageError>;

    fn monthly_spending(&mut self, range: DateRange) -> Result<Vec<MonthlySpend>, StorageError>;

    /// Distinct item names across all receipts, ordered
    fn distinct_item_names(&mut self) -> Result<Vec<String>, StorageError>;

    /// Distinct store names that appear on receipts (not the registry), ordered
    fn distinct_receipt_stores(&mut self) -> Result<Vec<String>, StorageError>;

    // --- lifecycle ---

    /// Make all staged changes durable and close the scope
    fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Discard all staged changes and close the scope
    fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

/// Shared helper: does `date` fall outside an optional inclusive range?
pub(crate) fn outside_range(
    date: NaiveDate,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> bool {
    !DateRange { from, to }.contains(date)
}
