//! # Pricebook
//!
//! Grocery receipt tracking core: converts heterogeneous purchase units
//! (weight, volume, count) into comparable per-base-unit prices, and saves a
//! receipt with its items as one all-or-nothing transaction that also
//! deduplicates/creates referenced categories and stores.
//!
//! The two load-bearing pieces:
//!
//! - [`normalize`] — the pure Unit Normalizer (fixed-point decimal, 2 dp
//!   round-half-up).
//! - [`ReceiptService`] — the atomic save/update orchestration over a
//!   relational store ([`MemoryStore`] for tests and demos, [`PgStore`] for
//!   PostgreSQL via `may_postgres`).
//!
//! ```no_run
//! use pricebook::{MemoryStore, ReceiptDraft, ReceiptService};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ReceiptService::new(MemoryStore::new());
//! let draft = ReceiptDraft::from_json(r#"{
//!     "date": "2025-02-14",
//!     "store": "NewMart",
//!     "items": [
//!         {"name": "Milk", "new_category_name": "Dairy",
//!          "quantity": "1", "unit": "L", "total_price": "2.50"}
//!     ]
//! }"#)?;
//! let receipt = service.save(&draft)?;
//! assert_eq!(receipt.total_amount.to_string(), "2.50");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod draft;
pub mod error;
pub mod executor;
pub mod migration;
pub mod model;
pub mod normalize;
pub mod params;
pub mod query;
pub mod service;
pub mod store;
pub mod transaction;

pub use config::DatabaseConfig;
pub use draft::{ItemDraft, ItemInput, ReceiptDraft, ReceiptInput, ValidationError};
pub use error::Error;
pub use model::{Category, Currency, Item, Receipt, Store};
pub use normalize::{normalize, price_per_unit, BaseUnit, NormalizeError, Unit};
pub use query::{ReceiptFilter, ReceiptSort, ReceiptSummary};
pub use service::ReceiptService;
pub use store::{Database, MemoryStore, PgStore, ReceiptTx, StorageError};
