//! In-memory relational store.
//!
//! Keeps the four tables in `BTreeMap`s behind a mutex. A transaction clones
//! the tables, stages every write on the clone, and swaps it back in on
//! commit — rollback simply drops the clone, so a failed scope can never
//! leave partial writes behind. Enforces the same unique-name, foreign-key
//! and cascade rules as the SQL schema.
//!
//! Deterministic and dependency-free, this backend drives the test suites
//! and the no-database demo.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::{
    Category, Item, NewCategory, NewItem, NewReceipt, NewStore, Receipt, Store,
};
use crate::query::{
    CategorySpend, DateRange, MonthlySpend, PricePoint, ReceiptFilter, ReceiptSort,
    ReceiptSummary, StoreComparisonFilter, StorePriceStats, TrendFilter, UNCATEGORIZED,
};
use crate::store::{outside_range, Database, ReceiptTx, StorageError};

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: BTreeMap<i64, Category>,
    stores: BTreeMap<i64, Store>,
    receipts: BTreeMap<i64, Receipt>,
    items: BTreeMap<i64, Item>,
    next_category_id: i64,
    next_store_id: i64,
    next_receipt_id: i64,
    next_item_id: i64,
}

impl Tables {
    fn next_category_id(&mut self) -> i64 {
        self.next_category_id += 1;
        self.next_category_id
    }

    fn next_store_id(&mut self) -> i64 {
        self.next_store_id += 1;
        self.next_store_id
    }

    fn next_receipt_id(&mut self) -> i64 {
        self.next_receipt_id += 1;
        self.next_receipt_id
    }

    fn next_item_id(&mut self) -> i64 {
        self.next_item_id += 1;
        self.next_item_id
    }
}

/// Shared in-memory store handle; clones refer to the same tables
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Other("memory store lock poisoned".to_string()))
    }

    /// Committed receipt rows, without opening a transaction
    pub fn receipt_count(&self) -> usize {
        self.lock().map(|t| t.receipts.len()).unwrap_or(0)
    }

    /// Committed item rows, without opening a transaction
    pub fn item_count(&self) -> usize {
        self.lock().map(|t| t.items.len()).unwrap_or(0)
    }

    /// Committed category rows, without opening a transaction
    pub fn category_count(&self) -> usize {
        self.lock().map(|t| t.categories.len()).unwrap_or(0)
    }

    /// Committed store rows, without opening a transaction
    pub fn store_count(&self) -> usize {
        self.lock().map(|t| t.stores.len()).unwrap_or(0)
    }
}

impl Database for MemoryStore {
    fn begin(&self) -> Result<Box<dyn ReceiptTx + '_>, StorageError> {
        let staged = self.lock()?.clone();
        Ok(Box::new(MemoryTx {
            store: self,
            staged,
        }))
    }
}

struct MemoryTx<'a> {
    store: &'a MemoryStore,
    staged: Tables,
}

fn now() -> chrono::NaiveDateTime {
    Local::now().naive_local()
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl ReceiptTx for MemoryTx<'_> {
    fn category_by_name(&mut self, name: &str) -> Result<Option<Category>, StorageError> {
        Ok(self
            .staged
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    fn category_by_id(&mut self, id: i64) -> Result<Option<Category>, StorageError> {
        Ok(self.staged.categories.get(&id).cloned())
    }

    fn insert_category(&mut self, row: &NewCategory) -> Result<Category, StorageError> {
        if self.staged.categories.values().any(|c| c.name == row.name) {
            return Err(StorageError::UniqueViolation {
                entity: "category",
                name: row.name.clone(),
            });
        }
        if let Some(parent_id) = row.parent_id {
            if !self.staged.categories.contains_key(&parent_id) {
                return Err(StorageError::ForeignKeyViolation {
                    entity: "category",
                    id: parent_id,
                });
            }
        }
        let id = self.staged.next_category_id();
        let category = Category {
            id,
            name: row.name.clone(),
            parent_id: row.parent_id,
            icon: row.icon.clone(),
            color: row.color.clone(),
            created_at: now(),
        };
        self.staged.categories.insert(id, category.clone());
        Ok(category)
    }

    fn categories(&mut self, top_level_only: bool) -> Result<Vec<Category>, StorageError> {
        let mut rows: Vec<Category> = self
            .staged
            .categories
            .values()
            .filter(|c| !top_level_only || c.parent_id.is_none())
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn store_by_name(&mut self, name: &str) -> Result<Option<Store>, StorageError> {
        Ok(self
            .staged
            .stores
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    fn insert_store(&mut self, row: &NewStore) -> Result<Store, StorageError> {
        if self.staged.stores.values().any(|s| s.name == row.name) {
            return Err(StorageError::UniqueViolation {
                entity: "store",
                name: row.name.clone(),
            });
        }
        let id = self.staged.next_store_id();
        let store = Store {
            id,
            name: row.name.clone(),
            location: row.location.clone(),
            created_at: now(),
        };
        self.staged.stores.insert(id, store.clone());
        Ok(store)
    }

    fn stores(&mut self) -> Result<Vec<Store>, StorageError> {
        let mut rows: Vec<Store> = self.staged.stores.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn receipt_by_id(&mut self, id: i64) -> Result<Option<Receipt>, StorageError> {
        Ok(self.staged.receipts.get(&id).cloned())
    }

    fn insert_receipt(&mut self, row: &NewReceipt) -> Result<Receipt, StorageError> {
        let id = self.staged.next_receipt_id();
        let stamp = now();
        let receipt = Receipt {
            id,
            date: row.date,
            store: row.store.clone(),
            currency: row.currency,
            total_amount: row.total_amount,
            notes: row.notes.clone(),
            created_at: stamp,
            updated_at: stamp,
        };
        self.staged.receipts.insert(id, receipt.clone());
        Ok(receipt)
    }

    fn update_receipt(&mut self, id: i64, row: &NewReceipt) -> Result<Receipt, StorageError> {
        let receipt = self
            .staged
            .receipts
            .get_mut(&id)
            .ok_or_else(|| StorageError::Other(format!("receipt {} not found", id)))?;
        receipt.date = row.date;
        receipt.store = row.store.clone();
        receipt.currency = row.currency;
        receipt.total_amount = row.total_amount;
        receipt.notes = row.notes.clone();
        receipt.updated_at = now();
        Ok(receipt.clone())
    }

    fn delete_receipt(&mut self, id: i64) -> Result<bool, StorageError> {
        let existed = self.staged.receipts.remove(&id).is_some();
        if existed {
            // FK cascade
            self.staged.items.retain(|_, item| item.receipt_id != id);
        }
        Ok(existed)
    }

    fn receipt_count(&mut self) -> Result<i64, StorageError> {
        Ok(self.staged.receipts.len() as i64)
    }

    fn insert_item(&mut self, row: &NewItem) -> Result<Item, StorageError> {
        if !self.staged.receipts.contains_key(&row.receipt_id) {
            return Err(StorageError::ForeignKeyViolation {
                entity: "receipt",
                id: row.receipt_id,
            });
        }
        if let Some(category_id) = row.category_id {
            if !self.staged.categories.contains_key(&category_id) {
                return Err(StorageError::ForeignKeyViolation {
                    entity: "category",
                    id: category_id,
                });
            }
        }
        let id = self.staged.next_item_id();
        let item = Item {
            id,
            receipt_id: row.receipt_id,
            name: row.name.clone(),
            brand: row.brand.clone(),
            category_id: row.category_id,
            quantity: row.quantity,
            unit: row.unit,
            price_per_unit: row.price_per_unit,
            total_price: row.total_price,
            original_price: row.original_price,
            normalized_price: row.normalized_price,
            normalized_unit: row.normalized_unit,
            notes: row.notes.clone(),
            created_at: now(),
        };
        self.staged.items.insert(id, item.clone());
        Ok(item)
    }

    fn delete_items_for_receipt(&mut self, receipt_id: i64) -> Result<u64, StorageError> {
        let before = self.staged.items.len();
        self.staged
            .items
            .retain(|_, item| item.receipt_id != receipt_id);
        Ok((before - self.staged.items.len()) as u64)
    }

    fn items_for_receipt(&mut self, receipt_id: i64) -> Result<Vec<Item>, StorageError> {
        Ok(self
            .staged
            .items
            .values()
            .filter(|item| item.receipt_id == receipt_id)
            .cloned()
            .collect())
    }

    fn receipt_summaries(
        &mut self,
        filter: &ReceiptFilter,
    ) -> Result<Vec<ReceiptSummary>, StorageError> {
        let search = filter.item_search.as_ref().map(|s| s.to_lowercase());
        let mut rows: Vec<ReceiptSummary> = self
            .staged
            .receipts
            .values()
            .filter(|r| !outside_range(r.date, filter.date_from, filter.date_to))
            .filter(|r| filter.stores.is_empty() || filter.stores.contains(&r.store))
            .filter(|r| match &search {
                None => true,
                Some(needle) => self
                    .staged
                    .items
                    .values()
                    .any(|i| i.receipt_id == r.id && i.name.to_lowercase().contains(needle)),
            })
            .map(|r| ReceiptSummary {
                receipt_id: r.id,
                date: r.date,
                store: r.store.clone(),
                currency: r.currency,
                total_amount: r.total_amount,
                item_count: self
                    .staged
                    .items
                    .values()
                    .filter(|i| i.receipt_id == r.id)
                    .count() as i64,
                notes: r.notes.clone(),
            })
            .collect();

        rows.sort_by(|a, b| {
            let ord = match filter.sort_by {
                ReceiptSort::Date => a.date.cmp(&b.date),
                ReceiptSort::Total => a.total_amount.cmp(&b.total_amount),
                ReceiptSort::Store => a.store.cmp(&b.store),
            };
            if filter.sort_desc {
                ord.reverse()
            } else {
                ord
            }
        });

        let offset = filter.offset.unwrap_or(0) as usize;
        let rows: Vec<ReceiptSummary> = rows.into_iter().skip(offset).collect();
        Ok(match filter.limit {
            Some(limit) => rows.into_iter().take(limit as usize).collect(),
            None => rows,
        })
    }

    fn price_trends(&mut self, filter: &TrendFilter) -> Result<Vec<PricePoint>, StorageError> {
        let names: Vec<String> = filter.item_names.iter().map(|n| n.to_lowercase()).collect();
        let mut rows: Vec<PricePoint> = self
            .staged
            .items
            .values()
            .filter(|item| names.is_empty() || names.contains(&item.name.to_lowercase()))
            .filter_map(|item| {
                let receipt = self.staged.receipts.get(&item.receipt_id)?;
                if outside_range(receipt.date, filter.date_from, filter.date_to) {
                    return None;
                }
                Some(PricePoint {
                    date: receipt.date,
                    item_name: item.name.clone(),
                    store: receipt.store.clone(),
                    normalized_price: item.normalized_price,
                    normalized_unit: item.normalized_unit,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(rows)
    }

    fn store_comparison(
        &mut self,
        filter: &StoreComparisonFilter,
    ) -> Result<Vec<StorePriceStats>, StorageError> {
        let names: Vec<String> = filter.item_names.iter().map(|n| n.to_lowercase()).collect();
        // store -> (sum, min, max, count)
        let mut groups: BTreeMap<String, (Decimal, Decimal, Decimal, i64)> = BTreeMap::new();

        for item in self.staged.items.values() {
            if !names.is_empty() && !names.contains(&item.name.to_lowercase()) {
                continue;
            }
            if let Some(category_id) = filter.category_id {
                if item.category_id != Some(category_id) {
                    continue;
                }
            }
            let Some(receipt) = self.staged.receipts.get(&item.receipt_id) else {
                continue;
            };
            let price = item.normalized_price;
            groups
                .entry(receipt.store.clone())
                .and_modify(|(sum, min, max, count)| {
                    *sum += price;
                    if price < *min {
                        *min = price;
                    }
                    if price > *max {
                        *max = price;
                    }
                    *count += 1;
                })
                .or_insert((price, price, price, 1));
        }

        Ok(groups
            .into_iter()
            .map(|(store, (sum, min, max, count))| StorePriceStats {
                store,
                avg_normalized_price: round2(sum / Decimal::from(count)),
                min_normalized_price: min,
                max_normalized_price: max,
                purchase_count: count,
            })
            .collect())
    }

    fn category_spending(&mut self, range: DateRange) -> Result<Vec<CategorySpend>, StorageError> {
        // category label -> (sum, count)
        let mut groups: BTreeMap<String, (Decimal, i64)> = BTreeMap::new();

        for item in self.staged.items.values() {
            let Some(receipt) = self.staged.receipts.get(&item.receipt_id) else {
                continue;
            };
            if !range.contains(receipt.date) {
                continue;
            }
            let label = item
                .category_id
                .and_then(|id| self.staged.categories.get(&id))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            let entry = groups.entry(label).or_insert((Decimal::ZERO, 0));
            entry.0 += item.total_price;
            entry.1 += 1;
        }

        Ok(groups
            .into_iter()
            .map(|(category, (total_spent, item_count))| CategorySpend {
                category,
                total_spent: round2(total_spent),
                item_count,
            })
            .collect())
    }

    fn monthly_spending(&mut self, range: DateRange) -> Result<Vec<MonthlySpend>, StorageError> {
        // (month, category label) -> sum
        let mut groups: BTreeMap<(String, String), Decimal> = BTreeMap::new();

        for item in self.staged.items.values() {
            let Some(receipt) = self.staged.receipts.get(&item.receipt_id) else {
                continue;
            };
            if !range.contains(receipt.date) {
                continue;
            }
            let month = receipt.date.format("%Y-%m").to_string();
            let label = item
                .category_id
                .and_then(|id| self.staged.categories.get(&id))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            *groups.entry((month, label)).or_insert(Decimal::ZERO) += item.total_price;
        }

        Ok(groups
            .into_iter()
            .map(|((month, category), total_spent)| MonthlySpend {
                month,
                category,
                total_spent: round2(total_spent),
            })
            .collect())
    }

    fn distinct_item_names(&mut self) -> Result<Vec<String>, StorageError> {
        let names: BTreeSet<String> = self
            .staged
            .items
            .values()
            .map(|i| i.name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    fn distinct_receipt_stores(&mut self) -> Result<Vec<String>, StorageError> {
        let names: BTreeSet<String> = self
            .staged
            .receipts
            .values()
            .map(|r| r.store.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let mut guard = self.store.lock()?;
        *guard = self.staged;
        log::debug!("memory store transaction committed");
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        // Staged tables are simply dropped
        log::debug!("memory store transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    use crate::model::Currency;
    use crate::normalize::{BaseUnit, Unit};

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn new_receipt(store: &str) -> NewReceipt {
        NewReceipt {
            date: date(2025, 2, 14),
            store: store.to_string(),
            currency: Currency::Eur,
            total_amount: d("2.50"),
            notes: None,
        }
    }

    fn new_item(receipt_id: i64, name: &str, total: &str) -> NewItem {
        NewItem {
            receipt_id,
            name: name.to_string(),
            brand: None,
            category_id: None,
            quantity: d("1"),
            unit: Unit::Units,
            price_per_unit: d(total),
            total_price: d(total),
            original_price: None,
            normalized_price: d(total),
            normalized_unit: BaseUnit::Units,
            notes: None,
        }
    }

    #[test]
    fn test_commit_makes_rows_visible() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert_store(&NewStore::named("NewMart")).unwrap();
        tx.commit().unwrap();

        assert_eq!(store.store_count(), 1);
        let mut tx = store.begin().unwrap();
        assert!(tx.store_by_name("NewMart").unwrap().is_some());
        tx.rollback().unwrap();
    }

    #[test]
    fn test_rollback_discards_everything() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert_store(&NewStore::named("NewMart")).unwrap();
        tx.insert_category(&NewCategory::named("Dairy")).unwrap();
        tx.insert_receipt(&new_receipt("NewMart")).unwrap();
        tx.rollback().unwrap();

        assert_eq!(store.store_count(), 0);
        assert_eq!(store.category_count(), 0);
        assert_eq!(store.receipt_count(), 0);
    }

    #[test]
    fn test_unique_category_name_enforced() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert_category(&NewCategory::named("Dairy")).unwrap();
        let err = tx.insert_category(&NewCategory::named("Dairy")).unwrap_err();
        assert!(matches!(
            err,
            StorageError::UniqueViolation {
                entity: "category",
                ..
            }
        ));
    }

    #[test]
    fn test_unique_store_name_enforced_across_transactions() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert_store(&NewStore::named("NewMart")).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        let err = tx.insert_store(&NewStore::named("NewMart")).unwrap_err();
        assert!(matches!(
            err,
            StorageError::UniqueViolation { entity: "store", .. }
        ));
    }

    #[test]
    fn test_category_parent_must_exist() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        let mut row = NewCategory::named("Milk");
        row.parent_id = Some(99);
        assert!(matches!(
            tx.insert_category(&row),
            Err(StorageError::ForeignKeyViolation { .. })
        ));
    }

    #[test]
    fn test_item_requires_existing_receipt_and_category() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();

        let err = tx.insert_item(&new_item(1, "Milk", "2.50")).unwrap_err();
        assert!(matches!(
            err,
            StorageError::ForeignKeyViolation {
                entity: "receipt",
                ..
            }
        ));

        let receipt = tx.insert_receipt(&new_receipt("NewMart")).unwrap();
        let mut item = new_item(receipt.id, "Milk", "2.50");
        item.category_id = Some(42);
        let err = tx.insert_item(&item).unwrap_err();
        assert!(matches!(
            err,
            StorageError::ForeignKeyViolation {
                entity: "category",
                ..
            }
        ));
    }

    #[test]
    fn test_delete_receipt_cascades_to_items() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        let receipt = tx.insert_receipt(&new_receipt("NewMart")).unwrap();
        tx.insert_item(&new_item(receipt.id, "Milk", "2.50")).unwrap();
        tx.insert_item(&new_item(receipt.id, "Bread", "1.10")).unwrap();
        tx.commit().unwrap();
        assert_eq!(store.item_count(), 2);

        let mut tx = store.begin().unwrap();
        assert!(tx.delete_receipt(receipt.id).unwrap());
        tx.commit().unwrap();

        assert_eq!(store.receipt_count(), 0);
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn test_delete_missing_receipt_reports_absent() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        assert!(!tx.delete_receipt(999).unwrap());
    }

    #[test]
    fn test_ids_are_not_reused_after_commit() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        let first = tx.insert_receipt(&new_receipt("A")).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        let second = tx.insert_receipt(&new_receipt("B")).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_update_receipt_refreshes_header() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        let receipt = tx.insert_receipt(&new_receipt("NewMart")).unwrap();

        let mut row = new_receipt("CornerShop");
        row.currency = Currency::Chf;
        row.total_amount = d("9.99");
        let updated = tx.update_receipt(receipt.id, &row).unwrap();

        assert_eq!(updated.store, "CornerShop");
        assert_eq!(updated.currency, Currency::Chf);
        assert_eq!(updated.total_amount, d("9.99"));
        assert_eq!(updated.created_at, receipt.created_at);
    }
}
