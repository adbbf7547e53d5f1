//! Read-side tests: history filters/sort/pagination and the spending and
//! price-comparison aggregates, all against the in-memory store.

use rust_decimal::Decimal;
use std::str::FromStr;

use pricebook::draft::{ItemInput, ReceiptDraft, ReceiptInput};
use pricebook::query::{
    DateRange, ReceiptFilter, ReceiptSort, StoreComparisonFilter, TrendFilter, UNCATEGORIZED,
};
use pricebook::{MemoryStore, ReceiptService};

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, day: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn item(name: &str, category: &str, quantity: &str, unit: &str, total: &str) -> ItemInput {
    ItemInput {
        name: name.to_string(),
        new_category_name: category.to_string(),
        quantity: d(quantity),
        unit: unit.to_string(),
        total_price: d(total),
        ..ItemInput::default()
    }
}

fn save(
    service: &ReceiptService<MemoryStore>,
    date_: chrono::NaiveDate,
    store: &str,
    items: Vec<ItemInput>,
) -> i64 {
    let draft = ReceiptDraft::new(ReceiptInput {
        date: date_,
        store: store.to_string(),
        currency: "EUR".to_string(),
        notes: String::new(),
        items,
    })
    .unwrap();
    service.save(&draft).unwrap().id
}

/// Three receipts across two stores and two months:
///
/// - Jan 10, NewMart: Milk 1 L 2.40 (Dairy), Bread 1 units 1.10 (no category)
/// - Jan 20, CornerShop: Milk 1 L 2.60 (Dairy)
/// - Feb 05, NewMart: Cheese 0.2 kg 4.35 (Dairy)
fn seeded() -> ReceiptService<MemoryStore> {
    let service = ReceiptService::new(MemoryStore::new());
    save(
        &service,
        date(2025, 1, 10),
        "NewMart",
        vec![
            item("Milk", "Dairy", "1", "L", "2.40"),
            item("Bread", "", "1", "units", "1.10"),
        ],
    );
    save(
        &service,
        date(2025, 1, 20),
        "CornerShop",
        vec![item("Milk", "Dairy", "1", "L", "2.60")],
    );
    save(
        &service,
        date(2025, 2, 5),
        "NewMart",
        vec![item("Cheese", "Dairy", "0.2", "kg", "4.35")],
    );
    service
}

#[test]
fn summaries_default_to_newest_first_with_item_counts() {
    let service = seeded();
    let rows = service.receipts(&ReceiptFilter::default()).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].date, date(2025, 2, 5));
    assert_eq!(rows[2].date, date(2025, 1, 10));
    assert_eq!(rows[2].item_count, 2);
    assert_eq!(rows[2].total_amount, d("3.50"));
}

#[test]
fn summaries_filter_by_date_range_inclusive() {
    let service = seeded();
    let rows = service
        .receipts(&ReceiptFilter {
            date_from: Some(date(2025, 1, 20)),
            date_to: Some(date(2025, 2, 5)),
            ..ReceiptFilter::default()
        })
        .unwrap();

    let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![date(2025, 2, 5), date(2025, 1, 20)]);
}

#[test]
fn summaries_filter_by_store_set() {
    let service = seeded();
    let rows = service
        .receipts(&ReceiptFilter {
            stores: vec!["CornerShop".to_string()],
            ..ReceiptFilter::default()
        })
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].store, "CornerShop");
}

#[test]
fn summaries_item_search_is_case_insensitive_substring() {
    let service = seeded();
    let rows = service
        .receipts(&ReceiptFilter {
            item_search: Some("mIl".to_string()),
            ..ReceiptFilter::default()
        })
        .unwrap();

    // Both milk receipts match; the cheese-only receipt does not
    assert_eq!(rows.len(), 2);
    // item_count still counts all items on the matching receipt
    assert_eq!(
        rows.iter().find(|r| r.item_count == 2).map(|r| r.date),
        Some(date(2025, 1, 10))
    );
}

#[test]
fn summaries_sort_by_total_and_store() {
    let service = seeded();

    let rows = service
        .receipts(&ReceiptFilter {
            sort_by: ReceiptSort::Total,
            sort_desc: false,
            ..ReceiptFilter::default()
        })
        .unwrap();
    let totals: Vec<_> = rows.iter().map(|r| r.total_amount).collect();
    assert_eq!(totals, vec![d("2.60"), d("3.50"), d("4.35")]);

    let rows = service
        .receipts(&ReceiptFilter {
            sort_by: ReceiptSort::Store,
            sort_desc: false,
            ..ReceiptFilter::default()
        })
        .unwrap();
    assert_eq!(rows[0].store, "CornerShop");
}

#[test]
fn summaries_paginate_with_limit_and_offset() {
    let service = seeded();
    let rows = service
        .receipts(&ReceiptFilter {
            limit: Some(1),
            offset: Some(1),
            ..ReceiptFilter::default()
        })
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, date(2025, 1, 20));
}

#[test]
fn price_trends_follow_one_item_over_time() {
    let service = seeded();
    let points = service
        .price_trends(&TrendFilter {
            item_names: vec!["milk".to_string()],
            ..TrendFilter::default()
        })
        .unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, date(2025, 1, 10));
    assert_eq!(points[0].normalized_price, d("2.40"));
    assert_eq!(points[1].store, "CornerShop");
    assert_eq!(points[1].normalized_price, d("2.60"));
}

#[test]
fn price_trends_respect_date_bounds() {
    let service = seeded();
    let points = service
        .price_trends(&TrendFilter {
            item_names: vec!["Milk".to_string()],
            date_from: Some(date(2025, 1, 15)),
            date_to: None,
        })
        .unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].date, date(2025, 1, 20));
}

#[test]
fn store_comparison_aggregates_normalized_prices() {
    let service = seeded();
    let stats = service
        .store_comparison(&StoreComparisonFilter {
            item_names: vec!["Milk".to_string()],
            category_id: None,
        })
        .unwrap();

    assert_eq!(stats.len(), 2);
    // Ordered by store name
    assert_eq!(stats[0].store, "CornerShop");
    assert_eq!(stats[0].purchase_count, 1);
    assert_eq!(stats[0].avg_normalized_price, d("2.60"));

    assert_eq!(stats[1].store, "NewMart");
    assert_eq!(stats[1].min_normalized_price, d("2.40"));
    assert_eq!(stats[1].max_normalized_price, d("2.40"));
}

#[test]
fn store_comparison_average_rounds_half_up() {
    let service = ReceiptService::new(MemoryStore::new());
    // Two purchases at 1.00 and 1.01 per unit: avg 1.005 rounds to 1.01
    save(
        &service,
        date(2025, 1, 1),
        "NewMart",
        vec![
            item("Soap", "", "1", "units", "1.00"),
            item("Soap", "", "1", "units", "1.01"),
        ],
    );

    let stats = service
        .store_comparison(&StoreComparisonFilter::default())
        .unwrap();
    assert_eq!(stats[0].avg_normalized_price, d("1.01"));
}

#[test]
fn category_spending_buckets_uncategorized_separately() {
    let service = seeded();
    let rows = service.category_spending(DateRange::default()).unwrap();

    assert_eq!(rows.len(), 2);
    let dairy = rows.iter().find(|r| r.category == "Dairy").unwrap();
    assert_eq!(dairy.total_spent, d("9.35"));
    assert_eq!(dairy.item_count, 3);

    let uncategorized = rows.iter().find(|r| r.category == UNCATEGORIZED).unwrap();
    assert_eq!(uncategorized.total_spent, d("1.10"));
    assert_eq!(uncategorized.item_count, 1);
}

#[test]
fn category_spending_respects_date_range() {
    let service = seeded();
    let rows = service
        .category_spending(DateRange {
            from: Some(date(2025, 2, 1)),
            to: None,
        })
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, "Dairy");
    assert_eq!(rows[0].total_spent, d("4.35"));
}

#[test]
fn monthly_spending_groups_by_month_and_category() {
    let service = seeded();
    let rows = service.monthly_spending(DateRange::default()).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].month, "2025-01");
    assert_eq!(rows[0].category, "Dairy");
    assert_eq!(rows[0].total_spent, d("5.00"));

    assert_eq!(rows[1].month, "2025-01");
    assert_eq!(rows[1].category, UNCATEGORIZED);
    assert_eq!(rows[1].total_spent, d("1.10"));

    assert_eq!(rows[2].month, "2025-02");
    assert_eq!(rows[2].total_spent, d("4.35"));
}

#[test]
fn distinct_names_are_sorted_and_unique() {
    let service = seeded();

    assert_eq!(
        service.distinct_item_names().unwrap(),
        vec!["Bread".to_string(), "Cheese".to_string(), "Milk".to_string()]
    );
    assert_eq!(
        service.distinct_receipt_stores().unwrap(),
        vec!["CornerShop".to_string(), "NewMart".to_string()]
    );
}

#[test]
fn top_level_category_listing_excludes_children() {
    let service = ReceiptService::new(MemoryStore::new());
    let dairy = service.create_category("Dairy", None, None, None).unwrap();
    service
        .create_category("Milk", Some(dairy.id), None, None)
        .unwrap();

    let all = service.categories(false).unwrap();
    assert_eq!(all.len(), 2);

    let top = service.categories(true).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "Dairy");
}
