//! Unit Normalizer
//!
//! Converts a purchased (quantity, unit, total price) into a plain
//! price-per-unit and a price normalized to a comparison base unit, so that
//! prices across package sizes and measurement units are comparable.
//!
//! All arithmetic is exact fixed-point decimal (`rust_decimal::Decimal`);
//! divisions are rounded to 2 decimal places, round-half-up. Everything here
//! is pure and stateless, safe to call from any number of coroutines.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// Purchase units accepted on receipt items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Unit {
    /// Kilograms
    #[serde(rename = "kg")]
    Kg,
    /// Grams
    #[serde(rename = "g")]
    G,
    /// Liters
    #[serde(rename = "L")]
    L,
    /// Milliliters
    #[serde(rename = "ml")]
    Ml,
    /// Piece count
    #[serde(rename = "units")]
    Units,
}

impl Unit {
    /// All valid unit labels, in display order
    pub const ALL: [Unit; 5] = [Unit::Kg, Unit::G, Unit::L, Unit::Ml, Unit::Units];

    /// The label as it appears on the wire and in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "L",
            Unit::Ml => "ml",
            Unit::Units => "units",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(Unit::Kg),
            "g" => Ok(Unit::G),
            "L" => Ok(Unit::L),
            "ml" => Ok(Unit::Ml),
            "units" => Ok(Unit::Units),
            other => Err(NormalizeError::UnrecognizedUnit(other.to_string())),
        }
    }
}

/// Comparison base units produced by [`normalize`]
///
/// Weight units normalize to `kg`, volume units to `L`, counted goods stay
/// `units`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BaseUnit {
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "units")]
    Units,
}

impl BaseUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseUnit::Kg => "kg",
            BaseUnit::L => "L",
            BaseUnit::Units => "units",
        }
    }
}

impl fmt::Display for BaseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseUnit {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(BaseUnit::Kg),
            "L" => Ok(BaseUnit::L),
            "units" => Ok(BaseUnit::Units),
            other => Err(NormalizeError::UnrecognizedUnit(other.to_string())),
        }
    }
}

/// Normalizer error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Quantity was zero or negative
    InvalidQuantity(Decimal),
    /// Unit string outside the fixed enum
    UnrecognizedUnit(String),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::InvalidQuantity(q) => {
                write!(f, "Quantity must be positive, got {}", q)
            }
            NormalizeError::UnrecognizedUnit(u) => {
                write!(f, "Unrecognized unit '{}', expected one of kg, g, L, ml, units", u)
            }
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Divide and round to 2 decimal places, half-up.
fn rounded_div(total_price: Decimal, quantity: Decimal) -> Decimal {
    (total_price / quantity).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Calculate price per unit from quantity and total price.
///
/// No unit awareness; `10.00 / 6` is `1.67` regardless of what was bought.
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidQuantity`] if `quantity <= 0`.
pub fn price_per_unit(quantity: Decimal, total_price: Decimal) -> Result<Decimal, NormalizeError> {
    if quantity <= Decimal::ZERO {
        return Err(NormalizeError::InvalidQuantity(quantity));
    }
    Ok(rounded_div(total_price, quantity))
}

/// Normalize a price to its comparison base unit, dispatching on a unit label.
///
/// `g` converts to `kg` and `ml` to `L` (factor 0.001); `kg` and `L` divide
/// directly; `units` behaves exactly like [`price_per_unit`].
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidQuantity`] if `quantity <= 0`, or
/// [`NormalizeError::UnrecognizedUnit`] if `unit` is not one of
/// `kg`, `g`, `L`, `ml`, `units`.
///
/// # Examples
///
/// ```
/// use pricebook::normalize::{normalize, BaseUnit};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let (price, base) = normalize(
///     Decimal::from_str("500").unwrap(),
///     "g",
///     Decimal::from_str("3.00").unwrap(),
/// ).unwrap();
/// assert_eq!(price, Decimal::from_str("6.00").unwrap());
/// assert_eq!(base, BaseUnit::Kg);
/// ```
pub fn normalize(
    quantity: Decimal,
    unit: &str,
    total_price: Decimal,
) -> Result<(Decimal, BaseUnit), NormalizeError> {
    if quantity <= Decimal::ZERO {
        return Err(NormalizeError::InvalidQuantity(quantity));
    }
    let unit = Unit::from_str(unit)?;
    normalize_unit(quantity, unit, total_price)
}

/// [`normalize`] for an already-parsed [`Unit`].
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidQuantity`] if `quantity <= 0`.
pub fn normalize_unit(
    quantity: Decimal,
    unit: Unit,
    total_price: Decimal,
) -> Result<(Decimal, BaseUnit), NormalizeError> {
    if quantity <= Decimal::ZERO {
        return Err(NormalizeError::InvalidQuantity(quantity));
    }

    // Conversion factor to the base unit, mirroring the unit table
    let (factor, base) = match unit {
        Unit::Kg => (Decimal::ONE, BaseUnit::Kg),
        Unit::G => (Decimal::new(1, 3), BaseUnit::Kg),
        Unit::L => (Decimal::ONE, BaseUnit::L),
        Unit::Ml => (Decimal::new(1, 3), BaseUnit::L),
        Unit::Units => return Ok((rounded_div(total_price, quantity), BaseUnit::Units)),
    };

    let base_quantity = quantity * factor;
    Ok((rounded_div(total_price, base_quantity), base))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_price_per_unit_plain_division() {
        assert_eq!(price_per_unit(d("2"), d("5.00")).unwrap(), d("2.50"));
        assert_eq!(price_per_unit(d("1"), d("4.99")).unwrap(), d("4.99"));
    }

    #[test]
    fn test_price_per_unit_rounds_half_up() {
        // 10.00 / 6 = 1.6666... -> 1.67
        assert_eq!(price_per_unit(d("6"), d("10.00")).unwrap(), d("1.67"));
        // 4.69 / 2 = 2.345, the midpoint rounds up
        assert_eq!(price_per_unit(d("2"), d("4.69")).unwrap(), d("2.35"));
        // 10 / 3 = 3.333... -> 3.33
        assert_eq!(price_per_unit(d("3"), d("10.00")).unwrap(), d("3.33"));
    }

    #[test]
    fn test_price_per_unit_zero_price() {
        assert_eq!(price_per_unit(d("3"), d("0")).unwrap(), d("0.00"));
    }

    #[test]
    fn test_price_per_unit_rejects_non_positive_quantity() {
        assert_eq!(
            price_per_unit(d("0"), d("1.00")),
            Err(NormalizeError::InvalidQuantity(d("0")))
        );
        assert_eq!(
            price_per_unit(d("-1"), d("1.00")),
            Err(NormalizeError::InvalidQuantity(d("-1")))
        );
    }

    #[test]
    fn test_normalize_grams_to_kg() {
        // 500 g for 3.00 -> 6.00 per kg
        assert_eq!(normalize(d("500"), "g", d("3.00")).unwrap(), (d("6.00"), BaseUnit::Kg));
    }

    #[test]
    fn test_normalize_ml_to_l() {
        // 330 ml for 0.99 -> 3.00 per L
        assert_eq!(normalize(d("330"), "ml", d("0.99")).unwrap(), (d("3.00"), BaseUnit::L));
    }

    #[test]
    fn test_normalize_kg_and_l_direct() {
        assert_eq!(normalize(d("2"), "kg", d("7.00")).unwrap(), (d("3.50"), BaseUnit::Kg));
        assert_eq!(normalize(d("1.5"), "L", d("3.00")).unwrap(), (d("2.00"), BaseUnit::L));
    }

    #[test]
    fn test_normalize_units_matches_price_per_unit() {
        let (price, base) = normalize(d("1"), "units", d("4.99")).unwrap();
        assert_eq!(price, d("4.99"));
        assert_eq!(base, BaseUnit::Units);

        let (price, base) = normalize(d("6"), "units", d("10.00")).unwrap();
        assert_eq!(price, price_per_unit(d("6"), d("10.00")).unwrap());
        assert_eq!(base, BaseUnit::Units);
    }

    #[test]
    fn test_normalize_gram_kg_equivalence() {
        // normalize(q, "g", p) == normalize(q * 0.001, "kg", p)
        for (q, p) in [("500", "3.00"), ("125", "1.10"), ("1000", "2.49")] {
            let via_g = normalize(d(q), "g", d(p)).unwrap();
            let via_kg = normalize(d(q) * d("0.001"), "kg", d(p)).unwrap();
            assert_eq!(via_g, via_kg);
        }
    }

    #[test]
    fn test_normalize_rejects_non_positive_quantity_for_every_unit() {
        for unit in ["kg", "g", "L", "ml", "units"] {
            assert_eq!(
                normalize(d("0"), unit, d("1.00")),
                Err(NormalizeError::InvalidQuantity(d("0")))
            );
            assert_eq!(
                normalize(d("-0.5"), unit, d("1.00")),
                Err(NormalizeError::InvalidQuantity(d("-0.5")))
            );
        }
    }

    #[test]
    fn test_normalize_rejects_unknown_unit() {
        for unit in ["oz", "lb", "KG", "Units", ""] {
            assert_eq!(
                normalize(d("1"), unit, d("1.00")),
                Err(NormalizeError::UnrecognizedUnit(unit.to_string()))
            );
        }
    }

    #[test]
    fn test_unit_round_trip() {
        for unit in Unit::ALL {
            assert_eq!(Unit::from_str(unit.as_str()).unwrap(), unit);
        }
    }

    #[test]
    fn test_error_display() {
        let err = NormalizeError::InvalidQuantity(d("0"));
        assert!(err.to_string().contains("must be positive"));

        let err = NormalizeError::UnrecognizedUnit("oz".to_string());
        assert!(err.to_string().contains("Unrecognized unit"));
    }
}
