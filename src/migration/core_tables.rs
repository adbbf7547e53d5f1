//! m20250301000000: create the four core tables.
//!
//! Constraints carry the schema-level invariants: unique category/store
//! names, positive quantities, non-negative prices, the currency enum, and
//! the receipt-to-item cascade.

use super::Migration;

/// Creates `categories`, `stores`, `receipts` and `items`
pub struct CreateCoreTables;

impl Migration for CreateCoreTables {
    fn name(&self) -> &str {
        "create_core_tables"
    }

    fn version(&self) -> i64 {
        20250301000000
    }

    fn up_statements(&self) -> Vec<&'static str> {
        vec![
            r#"CREATE TABLE IF NOT EXISTS categories (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                parent_id BIGINT REFERENCES categories(id),
                icon VARCHAR(50),
                color VARCHAR(7),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"#,
            r#"CREATE TABLE IF NOT EXISTS stores (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                location VARCHAR(255),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"#,
            r#"CREATE TABLE IF NOT EXISTS receipts (
                id BIGSERIAL PRIMARY KEY,
                date DATE NOT NULL,
                store VARCHAR(255) NOT NULL,
                currency VARCHAR(3) NOT NULL DEFAULT 'EUR',
                total_amount NUMERIC(10, 2) NOT NULL,
                notes TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                CONSTRAINT ck_receipts_total_amount_non_negative CHECK (total_amount >= 0),
                CONSTRAINT ck_receipts_currency_valid CHECK (currency IN ('EUR', 'CHF'))
            )"#,
            r#"CREATE TABLE IF NOT EXISTS items (
                id BIGSERIAL PRIMARY KEY,
                receipt_id BIGINT NOT NULL REFERENCES receipts(id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                brand VARCHAR(255),
                category_id BIGINT REFERENCES categories(id),
                quantity NUMERIC(10, 3) NOT NULL,
                unit VARCHAR(20) NOT NULL,
                price_per_unit NUMERIC(10, 2) NOT NULL,
                total_price NUMERIC(10, 2) NOT NULL,
                original_price NUMERIC(10, 2),
                normalized_price NUMERIC(10, 2) NOT NULL,
                normalized_unit VARCHAR(10) NOT NULL,
                notes TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                CONSTRAINT ck_items_quantity_positive CHECK (quantity > 0),
                CONSTRAINT ck_items_total_price_non_negative CHECK (total_price >= 0),
                CONSTRAINT ck_items_unit_valid CHECK (unit IN ('kg', 'g', 'L', 'ml', 'units'))
            )"#,
            "CREATE INDEX IF NOT EXISTS idx_receipts_date ON receipts (date)",
            "CREATE INDEX IF NOT EXISTS idx_receipts_store ON receipts (store)",
            "CREATE INDEX IF NOT EXISTS idx_items_receipt_id ON items (receipt_id)",
            "CREATE INDEX IF NOT EXISTS idx_items_category_id ON items (category_id)",
            "CREATE INDEX IF NOT EXISTS idx_items_name ON items (name)",
        ]
    }

    fn down_statements(&self) -> Vec<&'static str> {
        vec![
            "DROP TABLE IF EXISTS items",
            "DROP TABLE IF EXISTS receipts",
            "DROP TABLE IF EXISTS stores",
            "DROP TABLE IF EXISTS categories",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_cover_all_four_tables() {
        let up = CreateCoreTables.up_statements().join("\n");
        for table in ["categories", "stores", "receipts", "items"] {
            assert!(up.contains(table), "missing table {}", table);
        }
        assert!(up.contains("ON DELETE CASCADE"));
        assert!(up.contains("UNIQUE"));
    }

    #[test]
    fn test_down_reverses_in_dependency_order() {
        let down = CreateCoreTables.down_statements();
        assert!(down[0].contains("items"));
        assert!(down.last().unwrap().contains("categories"));
    }
}
