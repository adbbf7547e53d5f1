//! Validated receipt payloads.
//!
//! Raw, serde-deserializable inputs ([`ReceiptInput`], [`ItemInput`]) are
//! converted into [`ReceiptDraft`]/[`ItemDraft`] through a single validation
//! boundary. A draft can only exist in validated form, so the persistence
//! layer never re-checks schema rules: every draft it receives already has
//! trimmed non-empty names, a non-future date, positive quantities,
//! non-negative prices and parsed enums.
//!
//! Validation failures surface before any write; no transaction is opened
//! for an invalid payload.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::model::Currency;
use crate::normalize::Unit;

/// Validation error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Payload was not parseable at all (malformed JSON, wrong types)
    Malformed(String),
    /// Store name empty or whitespace-only
    EmptyStore,
    /// Receipt has no items
    NoItems,
    /// Receipt date lies in the future
    FutureDate(NaiveDate),
    /// Currency outside EUR/CHF
    UnknownCurrency(String),
    /// Item name empty or whitespace-only
    EmptyItemName { index: usize },
    /// Unit outside kg/g/L/ml/units
    UnknownUnit { index: usize, unit: String },
    /// Quantity zero or negative
    NonPositiveQuantity { index: usize, quantity: Decimal },
    /// Total price negative
    NegativePrice { index: usize, price: Decimal },
    /// original_price present but below total_price
    OriginalPriceBelowTotal {
        index: usize,
        original: Decimal,
        total: Decimal,
    },
    /// Category name empty or whitespace-only (direct category creation)
    EmptyCategoryName,
    /// Color not in `#RRGGBB` form
    InvalidColor(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Malformed(msg) => write!(f, "Malformed payload: {}", msg),
            ValidationError::EmptyStore => {
                write!(f, "Store name cannot be empty or whitespace-only")
            }
            ValidationError::NoItems => write!(f, "Receipt must have at least one item"),
            ValidationError::FutureDate(date) => {
                write!(f, "Receipt date cannot be in the future, got {}", date)
            }
            ValidationError::UnknownCurrency(c) => {
                write!(f, "Currency must be one of EUR, CHF, got '{}'", c)
            }
            ValidationError::EmptyItemName { index } => {
                write!(f, "Item {}: name cannot be empty or whitespace-only", index)
            }
            ValidationError::UnknownUnit { index, unit } => {
                write!(
                    f,
                    "Item {}: unit must be one of kg, g, L, ml, units, got '{}'",
                    index, unit
                )
            }
            ValidationError::NonPositiveQuantity { index, quantity } => {
                write!(f, "Item {}: quantity must be positive, got {}", index, quantity)
            }
            ValidationError::NegativePrice { index, price } => {
                write!(f, "Item {}: total price cannot be negative, got {}", index, price)
            }
            ValidationError::OriginalPriceBelowTotal {
                index,
                original,
                total,
            } => {
                write!(
                    f,
                    "Item {}: original price {} is below total price {}",
                    index, original, total
                )
            }
            ValidationError::EmptyCategoryName => {
                write!(f, "Category name cannot be empty or whitespace-only")
            }
            ValidationError::InvalidColor(c) => {
                write!(f, "Color must be a hex color code like '#FF5733', got '{}'", c)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Raw item payload as submitted by a caller
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ItemInput {
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Non-empty value triggers lazy category creation during save
    #[serde(default)]
    pub new_category_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub total_price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
}

impl Default for ItemInput {
    fn default() -> Self {
        ItemInput {
            name: String::new(),
            brand: String::new(),
            category_id: None,
            new_category_name: String::new(),
            quantity: Decimal::ONE,
            unit: "units".to_string(),
            total_price: Decimal::ZERO,
            original_price: None,
            notes: String::new(),
        }
    }
}

/// Raw receipt payload as submitted by a caller
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ReceiptInput {
    pub date: NaiveDate,
    pub store: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub notes: String,
    pub items: Vec<ItemInput>,
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// A validated item payload
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    name: String,
    brand: Option<String>,
    category_id: Option<i64>,
    new_category_name: Option<String>,
    quantity: Decimal,
    unit: Unit,
    total_price: Decimal,
    original_price: Option<Decimal>,
    notes: Option<String>,
}

impl ItemDraft {
    fn validate(index: usize, input: ItemInput) -> Result<Self, ValidationError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyItemName { index });
        }
        if input.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity {
                index,
                quantity: input.quantity,
            });
        }
        let unit = Unit::from_str(&input.unit).map_err(|_| ValidationError::UnknownUnit {
            index,
            unit: input.unit.clone(),
        })?;
        if input.total_price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice {
                index,
                price: input.total_price,
            });
        }
        if let Some(original) = input.original_price {
            if original < input.total_price {
                return Err(ValidationError::OriginalPriceBelowTotal {
                    index,
                    original,
                    total: input.total_price,
                });
            }
        }

        Ok(ItemDraft {
            name,
            brand: non_empty(&input.brand),
            category_id: input.category_id,
            new_category_name: non_empty(&input.new_category_name),
            quantity: input.quantity,
            unit,
            total_price: input.total_price,
            original_price: input.original_price,
            notes: non_empty(&input.notes),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    /// The existing category this item points at, if any
    pub fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    /// A category to resolve-or-create by name during save
    pub fn new_category_name(&self) -> Option<&str> {
        self.new_category_name.as_deref()
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    pub fn original_price(&self) -> Option<Decimal> {
        self.original_price
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// A validated receipt payload, ready for the persistence transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDraft {
    date: NaiveDate,
    store: String,
    currency: Currency,
    notes: Option<String>,
    items: Vec<ItemDraft>,
}

impl ReceiptDraft {
    /// Validate a raw payload against today's date.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered; nothing is written.
    pub fn new(input: ReceiptInput) -> Result<Self, ValidationError> {
        Self::validate_as_of(input, Local::now().date_naive())
    }

    /// Validate with an explicit "today", for deterministic tests.
    pub fn validate_as_of(input: ReceiptInput, today: NaiveDate) -> Result<Self, ValidationError> {
        let store = input.store.trim().to_string();
        if store.is_empty() {
            return Err(ValidationError::EmptyStore);
        }
        if input.date > today {
            return Err(ValidationError::FutureDate(input.date));
        }
        let currency = Currency::from_str(input.currency.trim())?;
        if input.items.is_empty() {
            return Err(ValidationError::NoItems);
        }

        let mut items = Vec::with_capacity(input.items.len());
        for (index, item) in input.items.into_iter().enumerate() {
            items.push(ItemDraft::validate(index, item)?);
        }

        Ok(ReceiptDraft {
            date: input.date,
            store,
            currency,
            notes: non_empty(&input.notes),
            items,
        })
    }

    /// Deserialize and validate a JSON payload in one step.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Malformed`] when the JSON does not parse into the
    /// payload shape, otherwise the usual validation errors.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let input: ReceiptInput =
            serde_json::from_str(json).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::new(input)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn items(&self) -> &[ItemDraft] {
        &self.items
    }

    /// Exact decimal sum of the items' total prices
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(|i| i.total_price).sum()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
