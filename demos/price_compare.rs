//! Price comparison walkthrough on the in-memory store — runs without a
//! database.
//!
//! Saves a few receipts, then shows the normalized-price comparisons that
//! make different package sizes comparable.

use pricebook::draft::ReceiptDraft;
use pricebook::query::{DateRange, StoreComparisonFilter, TrendFilter};
use pricebook::{Error, MemoryStore, ReceiptService};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = ReceiptService::new(MemoryStore::new());

    println!("Saving receipts...");
    for payload in [
        r#"{"date": "2025-01-10", "store": "NewMart", "items": [
            {"name": "Milk", "new_category_name": "Dairy", "quantity": "1", "unit": "L", "total_price": "2.40"},
            {"name": "Flour", "new_category_name": "Baking", "quantity": "500", "unit": "g", "total_price": "1.20"}
        ]}"#,
        r#"{"date": "2025-01-20", "store": "CornerShop", "items": [
            {"name": "Milk", "new_category_name": "Dairy", "quantity": "500", "unit": "ml", "total_price": "1.45"},
            {"name": "Flour", "new_category_name": "Baking", "quantity": "1", "unit": "kg", "total_price": "2.10"}
        ]}"#,
    ] {
        let draft = ReceiptDraft::from_json(payload)?;
        let receipt = service.save(&draft)?;
        println!(
            "  #{} {} at {} — total {} {}",
            receipt.id, receipt.date, receipt.store, receipt.total_amount, receipt.currency
        );
    }

    println!("\nPer-store comparison (normalized prices):");
    for stats in service.store_comparison(&StoreComparisonFilter {
        item_names: vec!["Milk".to_string()],
        category_id: None,
    })? {
        println!(
            "  {}: avg {} (min {}, max {}) over {} purchases",
            stats.store,
            stats.avg_normalized_price,
            stats.min_normalized_price,
            stats.max_normalized_price,
            stats.purchase_count
        );
    }

    println!("\nMilk price timeline:");
    for point in service.price_trends(&TrendFilter {
        item_names: vec!["Milk".to_string()],
        ..TrendFilter::default()
    })? {
        println!(
            "  {} {} — {} per {}",
            point.date, point.store, point.normalized_price, point.normalized_unit
        );
    }

    println!("\nSpending by category:");
    for row in service.category_spending(DateRange::default())? {
        println!("  {}: {} ({} items)", row.category, row.total_spent, row.item_count);
    }

    // Updating a receipt replaces its whole item set
    let draft = ReceiptDraft::from_json(
        r#"{"date": "2025-01-10", "store": "NewMart", "items": [
            {"name": "Milk", "new_category_name": "Dairy", "quantity": "1", "unit": "L", "total_price": "2.20"}
        ]}"#,
    )?;
    let updated = service.update(1, &draft)?;
    println!("\nAfter update, receipt #1 total: {}", updated.total_amount);

    match service.update(999, &draft) {
        Err(Error::NotFound { receipt_id }) => {
            println!("Updating receipt {} correctly failed: not found", receipt_id)
        }
        other => println!("Unexpected result: {:?}", other.map(|r| r.id)),
    }

    Ok(())
}
