//! Read-side filter and result types for receipt history and analytics.
//!
//! These are plain data carriers shared by every store backend; the
//! aggregation semantics (exact decimal sums, 2 dp half-up averages,
//! uncategorized bucketing, `YYYY-MM` month keys) are part of the store
//! contract and covered by the integration tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::Currency;
use crate::normalize::BaseUnit;

/// Label used when aggregating items that have no category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Sort key for receipt summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptSort {
    Date,
    Total,
    Store,
}

/// Filters for the receipt history listing
#[derive(Debug, Clone)]
pub struct ReceiptFilter {
    /// Inclusive start date
    pub date_from: Option<NaiveDate>,
    /// Inclusive end date
    pub date_to: Option<NaiveDate>,
    /// Restrict to these store names; empty means all
    pub stores: Vec<String>,
    /// Case-insensitive substring match on item names
    pub item_search: Option<String>,
    pub sort_by: ReceiptSort,
    pub sort_desc: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Default for ReceiptFilter {
    fn default() -> Self {
        ReceiptFilter {
            date_from: None,
            date_to: None,
            stores: Vec::new(),
            item_search: None,
            sort_by: ReceiptSort::Date,
            sort_desc: true,
            limit: None,
            offset: None,
        }
    }
}

/// One row of the receipt history listing
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReceiptSummary {
    pub receipt_id: i64,
    pub date: NaiveDate,
    pub store: String,
    pub currency: Currency,
    pub total_amount: Decimal,
    pub item_count: i64,
    pub notes: Option<String>,
}

/// Filters for price-over-time data
#[derive(Debug, Clone, Default)]
pub struct TrendFilter {
    /// Case-insensitive item names; empty means all items
    pub item_names: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// One purchase observation on the price timeline
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub item_name: String,
    pub store: String,
    pub normalized_price: Decimal,
    pub normalized_unit: BaseUnit,
}

/// Filters for the per-store price comparison
#[derive(Debug, Clone, Default)]
pub struct StoreComparisonFilter {
    /// Case-insensitive item names; empty means all items
    pub item_names: Vec<String>,
    pub category_id: Option<i64>,
}

/// Normalized-price statistics for one store
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StorePriceStats {
    pub store: String,
    /// Rounded to 2 dp, half-up
    pub avg_normalized_price: Decimal,
    pub min_normalized_price: Decimal,
    pub max_normalized_price: Decimal,
    pub purchase_count: i64,
}

/// Inclusive date range, either bound optional
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        true
    }
}

/// Spending total for one category bucket
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CategorySpend {
    /// Category name, or [`UNCATEGORIZED`]
    pub category: String,
    pub total_spent: Decimal,
    pub item_count: i64,
}

/// Spending total for one `YYYY-MM` month and category bucket
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MonthlySpend {
    pub month: String,
    pub category: String,
    pub total_spent: Decimal,
}
