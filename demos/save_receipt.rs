//! End-to-end save against PostgreSQL.
//!
//! Connects using `PRICEBOOK__DATABASE__URL` (or `DATABASE_URL`, or the
//! config file), migrates the schema, and saves one receipt atomically.

use pricebook::draft::ReceiptDraft;
use pricebook::query::ReceiptFilter;
use pricebook::{DatabaseConfig, PgStore, ReceiptService};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Drive the whole flow from a coroutine; may_postgres parks coroutines,
    // not OS threads, while queries are in flight.
    may::go!(|| {
        if let Err(e) = run() {
            eprintln!("save_receipt failed: {}", e);
        }
    })
    .join()
    .map_err(|_| "demo coroutine panicked")?;
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = DatabaseConfig::load()?;
    let url = std::env::var("DATABASE_URL").unwrap_or(config.url);

    println!("Connecting to {}...", url);
    let store = PgStore::connect(&url)?;

    if config.auto_migrate {
        let ran = store.migrate()?;
        println!("Applied {} pending migration(s)", ran);
    }

    let service = ReceiptService::new(store);

    let draft = ReceiptDraft::from_json(
        r#"{"date": "2025-02-14", "store": "NewMart", "currency": "EUR", "items": [
            {"name": "Milk", "new_category_name": "Dairy", "quantity": "1", "unit": "L", "total_price": "2.50"},
            {"name": "Eggs", "quantity": "6", "unit": "units", "total_price": "3.20"}
        ]}"#,
    )?;

    let receipt = service.save(&draft)?;
    println!(
        "Saved receipt #{} — total {} {}",
        receipt.id, receipt.total_amount, receipt.currency
    );

    let (_, items) = service
        .receipt(receipt.id)?
        .ok_or("receipt vanished after save")?;
    for item in items {
        println!(
            "  {} — {} {} for {} ({} per {})",
            item.name,
            item.quantity,
            item.unit,
            item.total_price,
            item.normalized_price,
            item.normalized_unit
        );
    }

    println!("\nRecent receipts:");
    for row in service.receipts(&ReceiptFilter {
        limit: Some(5),
        ..ReceiptFilter::default()
    })? {
        println!(
            "  #{} {} {} — {} {} ({} items)",
            row.receipt_id, row.date, row.store, row.total_amount, row.currency, row.item_count
        );
    }

    Ok(())
}
