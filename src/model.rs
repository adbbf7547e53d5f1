//! Persisted entities: Receipt, Item, Category, Store.
//!
//! Each entity is a plain data struct mirroring one table; `New*` companions
//! carry the caller-supplied columns for inserts (ids and timestamps are
//! assigned by the store). Validation of user input happens at the draft
//! boundary (`draft`), not here — the one exception is
//! [`Category::normalize_color`], which guards the direct category-creation
//! path.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_query::Iden;
use std::fmt;
use std::str::FromStr;

use crate::draft::ValidationError;
use crate::normalize::{BaseUnit, Unit};

/// Currencies a receipt can be denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Currency {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "CHF")]
    Chf,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Chf => "CHF",
        }
    }

    /// Display symbol for presentation layers
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "\u{20ac}",
            Currency::Chf => "CHF",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Eur
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EUR" => Ok(Currency::Eur),
            "CHF" => Ok(Currency::Chf),
            other => Err(ValidationError::UnknownCurrency(other.to_string())),
        }
    }
}

/// High-level receipt information
///
/// `store` is the denormalized store name; the [`Store`] table is the
/// unique-name registry behind auto-creation. `total_amount` is always the
/// sum of the receipt's item totals, recomputed on every write.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Receipt {
    pub id: i64,
    pub date: NaiveDate,
    pub store: String,
    pub currency: Currency,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Caller-supplied receipt columns for insert/overwrite
#[derive(Debug, Clone, PartialEq)]
pub struct NewReceipt {
    pub date: NaiveDate,
    pub store: String,
    pub currency: Currency,
    pub total_amount: Decimal,
    pub notes: Option<String>,
}

/// An individual line item on a receipt
///
/// `price_per_unit`, `normalized_price` and `normalized_unit` are derived by
/// the normalizer on every write and never accepted from callers.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Item {
    pub id: i64,
    pub receipt_id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub category_id: Option<i64>,
    pub quantity: Decimal,
    pub unit: Unit,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
    /// Pre-discount reference price; validated >= total_price, otherwise unused
    pub original_price: Option<Decimal>,
    pub normalized_price: Decimal,
    pub normalized_unit: BaseUnit,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Caller-supplied item columns for insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub receipt_id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub category_id: Option<i64>,
    pub quantity: Decimal,
    pub unit: Unit,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
    pub original_price: Option<Decimal>,
    pub normalized_price: Decimal,
    pub normalized_unit: BaseUnit,
    pub notes: Option<String>,
}

/// A product category with optional parent for hierarchy (e.g. Dairy > Milk)
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
}

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color pattern"));

impl Category {
    /// Normalize an optional color input: empty becomes `None`, anything else
    /// must match `#RRGGBB`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidColor`] for a non-empty value that is
    /// not a hex color code.
    pub fn normalize_color(color: Option<&str>) -> Result<Option<String>, ValidationError> {
        match color {
            None => Ok(None),
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                if !HEX_COLOR.is_match(trimmed) {
                    return Err(ValidationError::InvalidColor(trimmed.to_string()));
                }
                Ok(Some(trimmed.to_string()))
            }
        }
    }
}

/// Caller-supplied category columns for insert
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<i64>,
    pub icon: Option<String>,
    /// Already normalized via [`Category::normalize_color`]
    pub color: Option<String>,
}

impl NewCategory {
    /// A bare category with just a name, as created lazily during a save
    pub fn named(name: &str) -> Self {
        NewCategory {
            name: name.to_string(),
            ..NewCategory::default()
        }
    }
}

/// A store where groceries are purchased
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Caller-supplied store columns for insert
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewStore {
    pub name: String,
    pub location: Option<String>,
}

impl NewStore {
    pub fn named(name: &str) -> Self {
        NewStore {
            name: name.to_string(),
            location: None,
        }
    }
}

// SQL identifiers for the four tables. Variant `Table` renders as the enum
// name, the rest as snake_case column names.

#[derive(Iden)]
pub enum Receipts {
    Table,
    Id,
    Date,
    Store,
    Currency,
    TotalAmount,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Items {
    Table,
    Id,
    ReceiptId,
    Name,
    Brand,
    CategoryId,
    Quantity,
    Unit,
    PricePerUnit,
    TotalPrice,
    OriginalPrice,
    NormalizedPrice,
    NormalizedUnit,
    Notes,
    CreatedAt,
}

#[derive(Iden)]
pub enum Categories {
    Table,
    Id,
    Name,
    ParentId,
    Icon,
    Color,
    CreatedAt,
}

#[derive(Iden)]
pub enum Stores {
    Table,
    Id,
    Name,
    Location,
    CreatedAt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_round_trip() {
        assert_eq!(Currency::from_str("EUR").unwrap(), Currency::Eur);
        assert_eq!(Currency::from_str("CHF").unwrap(), Currency::Chf);
        assert_eq!(Currency::Eur.to_string(), "EUR");
        assert_eq!(Currency::default(), Currency::Eur);
    }

    #[test]
    fn test_currency_rejects_unknown() {
        assert!(matches!(
            Currency::from_str("USD"),
            Err(ValidationError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(Currency::Eur.symbol(), "\u{20ac}");
        assert_eq!(Currency::Chf.symbol(), "CHF");
    }

    #[test]
    fn test_normalize_color_accepts_hex() {
        assert_eq!(
            Category::normalize_color(Some("#FF5733")).unwrap(),
            Some("#FF5733".to_string())
        );
        assert_eq!(
            Category::normalize_color(Some("  #a1b2c3 ")).unwrap(),
            Some("#a1b2c3".to_string())
        );
    }

    #[test]
    fn test_normalize_color_empty_becomes_none() {
        assert_eq!(Category::normalize_color(None).unwrap(), None);
        assert_eq!(Category::normalize_color(Some("")).unwrap(), None);
        assert_eq!(Category::normalize_color(Some("   ")).unwrap(), None);
    }

    #[test]
    fn test_normalize_color_rejects_malformed() {
        for bad in ["FF5733", "#FF573", "#FF57333", "#GG0000", "red"] {
            assert!(matches!(
                Category::normalize_color(Some(bad)),
                Err(ValidationError::InvalidColor(_))
            ));
        }
    }
}
