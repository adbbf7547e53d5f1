//! The receipt persistence transaction.
//!
//! [`ReceiptService`] orchestrates every logical write as one atomic unit:
//! resolve or lazily create the referenced categories and store, compute the
//! derived price fields through the normalizer, stage all rows, and commit —
//! or roll everything back and propagate the error unchanged. Lazy
//! category/store creation is part of the contract: saving a receipt that
//! names a new store leaves that store behind even though the caller only
//! asked to save a receipt.
//!
//! The category name→id cache lives strictly inside one call; nothing is
//! memoized across invocations, so names created by another session are
//! picked up by the next call's fresh lookups.

use std::collections::HashMap;

use crate::draft::{ReceiptDraft, ValidationError};
use crate::error::Error;
use crate::model::{Category, Item, NewCategory, NewItem, NewReceipt, NewStore, Receipt, Store};
use crate::normalize;
use crate::query::{
    CategorySpend, DateRange, MonthlySpend, PricePoint, ReceiptFilter, ReceiptSummary,
    StoreComparisonFilter, StorePriceStats, TrendFilter,
};
use crate::store::{Database, ReceiptTx, StorageError};

/// Receipt persistence service over any [`Database`] backend
pub struct ReceiptService<D> {
    db: D,
}

impl<D: Database> ReceiptService<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    /// The underlying store handle
    pub fn database(&self) -> &D {
        &self.db
    }

    /// Run `f` inside one transactional scope: commit on `Ok`, roll back on
    /// `Err` and propagate the error unchanged.
    fn with_tx<T>(
        &self,
        f: impl FnOnce(&mut dyn ReceiptTx) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut tx = self.db.begin()?;
        match f(tx.as_mut()) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    log::warn!("rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    /// Atomically save a validated receipt with all its items.
    ///
    /// Resolves new categories (deduplicated by name within this call),
    /// auto-creates the store if needed, computes `price_per_unit` and the
    /// normalized price fields, and commits everything as one unit.
    ///
    /// # Errors
    ///
    /// Any failure rolls the whole transaction back — no partial receipt,
    /// no orphan items, no partially created category or store — and the
    /// error propagates unchanged.
    pub fn save(&self, draft: &ReceiptDraft) -> Result<Receipt, Error> {
        let receipt = self.with_tx(|tx| {
            let category_ids = resolve_categories(tx, draft)?;
            resolve_store(tx, draft.store())?;
            let receipt = tx.insert_receipt(&receipt_row(draft))?;
            create_items(tx, receipt.id, draft, &category_ids)?;
            Ok(receipt)
        })?;
        log::info!(
            "saved receipt {} for {} ({} {})",
            receipt.id,
            receipt.store,
            receipt.total_amount,
            receipt.currency
        );
        Ok(receipt)
    }

    /// Atomically update an existing receipt and replace all its items.
    ///
    /// The item set is fully replaced, not merged: every existing item is
    /// deleted and the payload's items are recreated, with `total_amount`
    /// recomputed from the new set.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no receipt has `receipt_id` (nothing is
    /// mutated). Any later failure rolls back, leaving the receipt and its
    /// prior items exactly as they were.
    pub fn update(&self, receipt_id: i64, draft: &ReceiptDraft) -> Result<Receipt, Error> {
        let receipt = self.with_tx(|tx| {
            if tx.receipt_by_id(receipt_id)?.is_none() {
                return Err(Error::NotFound { receipt_id });
            }
            let category_ids = resolve_categories(tx, draft)?;
            resolve_store(tx, draft.store())?;
            let receipt = tx.update_receipt(receipt_id, &receipt_row(draft))?;
            tx.delete_items_for_receipt(receipt_id)?;
            create_items(tx, receipt_id, draft, &category_ids)?;
            Ok(receipt)
        })?;
        log::info!("updated receipt {} for {}", receipt.id, receipt.store);
        Ok(receipt)
    }

    /// Delete a receipt; its items go with it by cascade. Categories and
    /// stores are never deleted.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no receipt has `receipt_id`.
    pub fn delete(&self, receipt_id: i64) -> Result<(), Error> {
        self.with_tx(|tx| {
            if tx.delete_receipt(receipt_id)? {
                Ok(())
            } else {
                Err(Error::NotFound { receipt_id })
            }
        })
    }

    /// A receipt with its items, or `None`
    pub fn receipt(&self, receipt_id: i64) -> Result<Option<(Receipt, Vec<Item>)>, Error> {
        self.with_tx(|tx| {
            let Some(receipt) = tx.receipt_by_id(receipt_id)? else {
                return Ok(None);
            };
            let items = tx.items_for_receipt(receipt_id)?;
            Ok(Some((receipt, items)))
        })
    }

    /// Receipt history: filtered, sorted, paginated summaries
    pub fn receipts(&self, filter: &ReceiptFilter) -> Result<Vec<ReceiptSummary>, Error> {
        self.with_tx(|tx| Ok(tx.receipt_summaries(filter)?))
    }

    /// Create a category directly (outside any receipt save).
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty name or malformed color;
    /// [`Error::Storage`] for a duplicate name or missing parent.
    pub fn create_category(
        &self,
        name: &str,
        parent_id: Option<i64>,
        icon: Option<&str>,
        color: Option<&str>,
    ) -> Result<Category, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyCategoryName.into());
        }
        let color = Category::normalize_color(color)?;
        let row = NewCategory {
            name: name.to_string(),
            parent_id,
            icon: icon.map(|i| i.trim().to_string()).filter(|i| !i.is_empty()),
            color,
        };
        self.with_tx(|tx| {
            if let Some(parent_id) = parent_id {
                if tx.category_by_id(parent_id)?.is_none() {
                    return Err(StorageError::ForeignKeyViolation {
                        entity: "category",
                        id: parent_id,
                    }
                    .into());
                }
            }
            Ok(tx.insert_category(&row)?)
        })
    }

    /// Categories ordered by name
    pub fn categories(&self, top_level_only: bool) -> Result<Vec<Category>, Error> {
        self.with_tx(|tx| Ok(tx.categories(top_level_only)?))
    }

    /// Stores ordered by name
    pub fn stores(&self) -> Result<Vec<Store>, Error> {
        self.with_tx(|tx| Ok(tx.stores()?))
    }

    /// Normalized price observations over time
    pub fn price_trends(&self, filter: &TrendFilter) -> Result<Vec<PricePoint>, Error> {
        self.with_tx(|tx| Ok(tx.price_trends(filter)?))
    }

    /// Normalized price statistics per store
    pub fn store_comparison(
        &self,
        filter: &StoreComparisonFilter,
    ) -> Result<Vec<StorePriceStats>, Error> {
        self.with_tx(|tx| Ok(tx.store_comparison(filter)?))
    }

    /// Spending per category bucket
    pub fn category_spending(&self, range: DateRange) -> Result<Vec<CategorySpend>, Error> {
        self.with_tx(|tx| Ok(tx.category_spending(range)?))
    }

    /// Spending per `YYYY-MM` month and category bucket
    pub fn monthly_spending(&self, range: DateRange) -> Result<Vec<MonthlySpend>, Error> {
        self.with_tx(|tx| Ok(tx.monthly_spending(range)?))
    }

    /// Distinct item names across all receipts
    pub fn distinct_item_names(&self) -> Result<Vec<String>, Error> {
        self.with_tx(|tx| Ok(tx.distinct_item_names()?))
    }

    /// Distinct store names appearing on receipts
    pub fn distinct_receipt_stores(&self) -> Result<Vec<String>, Error> {
        self.with_tx(|tx| Ok(tx.distinct_receipt_stores()?))
    }
}

fn receipt_row(draft: &ReceiptDraft) -> NewReceipt {
    NewReceipt {
        date: draft.date(),
        store: draft.store().to_string(),
        currency: draft.currency(),
        total_amount: draft.total_amount(),
        notes: draft.notes().map(str::to_string),
    }
}

/// Resolve each item's category: an explicit id passes through; a
/// `new_category_name` is looked up and created if absent. The name→id cache
/// guarantees two items naming the same new category produce exactly one row.
fn resolve_categories(
    tx: &mut dyn ReceiptTx,
    draft: &ReceiptDraft,
) -> Result<Vec<Option<i64>>, Error> {
    let mut cache: HashMap<String, i64> = HashMap::new();
    let mut resolved = Vec::with_capacity(draft.items().len());

    for item in draft.items() {
        let category_id = match item.new_category_name() {
            Some(name) => {
                let id = match cache.get(name) {
                    Some(id) => *id,
                    None => {
                        let id = match tx.category_by_name(name)? {
                            Some(existing) => existing.id,
                            None => {
                                log::debug!("creating category '{}'", name);
                                tx.insert_category(&NewCategory::named(name))?.id
                            }
                        };
                        cache.insert(name.to_string(), id);
                        id
                    }
                };
                Some(id)
            }
            None => item.category_id(),
        };
        resolved.push(category_id);
    }

    Ok(resolved)
}

/// Auto-create the store row on first reference
fn resolve_store(tx: &mut dyn ReceiptTx, store_name: &str) -> Result<(), Error> {
    if tx.store_by_name(store_name)?.is_none() {
        log::debug!("creating store '{}'", store_name);
        tx.insert_store(&NewStore::named(store_name))?;
    }
    Ok(())
}

fn create_items(
    tx: &mut dyn ReceiptTx,
    receipt_id: i64,
    draft: &ReceiptDraft,
    category_ids: &[Option<i64>],
) -> Result<(), Error> {
    for (item, category_id) in draft.items().iter().zip(category_ids) {
        let price_per_unit = normalize::price_per_unit(item.quantity(), item.total_price())?;
        let (normalized_price, normalized_unit) =
            normalize::normalize_unit(item.quantity(), item.unit(), item.total_price())?;

        tx.insert_item(&NewItem {
            receipt_id,
            name: item.name().to_string(),
            brand: item.brand().map(str::to_string),
            category_id: *category_id,
            quantity: item.quantity(),
            unit: item.unit(),
            price_per_unit,
            total_price: item.total_price(),
            original_price: item.original_price(),
            normalized_price,
            normalized_unit,
            notes: item.notes().map(str::to_string),
        })?;
    }
    Ok(())
}
