//! PostgreSQL-backed store.
//!
//! Implements the store seam with sea-query-built SQL executed through
//! [`PgTransaction`]. Every scope handed out by [`PgStore::begin`] is a
//! serializable transaction; inserts use `RETURNING` so the staged row
//! (id, timestamps) comes back without a second round trip.
//!
//! Unique-name and foreign-key rules live in the schema
//! (`migration::core_tables`); violations surface as
//! [`StorageError::Postgres`] and roll the transaction back.

use may_postgres::{Client, Row};
use rust_decimal::Decimal;
use sea_query::{
    Alias, Expr, ExprTrait, Func, Order, PostgresQueryBuilder, Query, SelectStatement,
};
use std::str::FromStr;

use crate::connection::{connect, ConnectionError};
use crate::executor::{PgExecutor, SqlExecutor};
use crate::migration::{MigrationError, Migrator};
use crate::model::{
    Categories, Category, Item, Items, NewCategory, NewItem, NewReceipt, NewStore, Receipt,
    Receipts, Store, Stores,
};
use crate::model::Currency;
use crate::normalize::{BaseUnit, Unit};
use crate::params::with_converted_params;
use crate::query::{
    CategorySpend, DateRange, MonthlySpend, PricePoint, ReceiptFilter, ReceiptSort,
    ReceiptSummary, StoreComparisonFilter, StorePriceStats, TrendFilter, UNCATEGORIZED,
};
use crate::store::{Database, ReceiptTx, StorageError};
use crate::transaction::{IsolationLevel, PgTransaction};

/// PostgreSQL store handle
pub struct PgStore {
    client: Client,
}

impl PgStore {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using a PostgreSQL connection string
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] if the string is malformed or the
    /// connection cannot be established.
    pub fn connect(connection_string: &str) -> Result<Self, ConnectionError> {
        Ok(Self::new(connect(connection_string)?))
    }

    /// Apply pending schema migrations, returning how many ran
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] on checksum mismatch or SQL failure.
    pub fn migrate(&self) -> Result<u32, MigrationError> {
        Migrator::new().run(&PgExecutor::new(self.client.clone()))
    }
}

impl Database for PgStore {
    fn begin(&self) -> Result<Box<dyn ReceiptTx + '_>, StorageError> {
        let tx = PgTransaction::new_with_isolation(
            self.client.clone(),
            IsolationLevel::Serializable,
        )?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: PgTransaction,
}

/// Parse one driver row into an entity or summary
trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, StorageError>;
}

fn parse<T: FromStr>(raw: &str, what: &str) -> Result<T, StorageError>
where
    T::Err: std::fmt::Display,
{
    T::from_str(raw).map_err(|e| StorageError::Parse(format!("{} '{}': {}", what, raw, e)))
}

impl FromRow for Category {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        Ok(Category {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            parent_id: row.try_get("parent_id")?,
            icon: row.try_get("icon")?,
            color: row.try_get("color")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl FromRow for Store {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        Ok(Store {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            location: row.try_get("location")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl FromRow for Receipt {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        let currency: String = row.try_get("currency")?;
        Ok(Receipt {
            id: row.try_get("id")?,
            date: row.try_get("date")?,
            store: row.try_get("store")?,
            currency: parse::<Currency>(&currency, "currency")?,
            total_amount: row.try_get("total_amount")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow for Item {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        let unit: String = row.try_get("unit")?;
        let normalized_unit: String = row.try_get("normalized_unit")?;
        Ok(Item {
            id: row.try_get("id")?,
            receipt_id: row.try_get("receipt_id")?,
            name: row.try_get("name")?,
            brand: row.try_get("brand")?,
            category_id: row.try_get("category_id")?,
            quantity: row.try_get("quantity")?,
            unit: parse::<Unit>(&unit, "unit")?,
            price_per_unit: row.try_get("price_per_unit")?,
            total_price: row.try_get("total_price")?,
            original_price: row.try_get("original_price")?,
            normalized_price: row.try_get("normalized_price")?,
            normalized_unit: parse::<BaseUnit>(&normalized_unit, "normalized unit")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl FromRow for ReceiptSummary {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        let currency: String = row.try_get("currency")?;
        Ok(ReceiptSummary {
            receipt_id: row.try_get("id")?,
            date: row.try_get("date")?,
            store: row.try_get("store")?,
            currency: parse::<Currency>(&currency, "currency")?,
            total_amount: row.try_get("total_amount")?,
            item_count: row.try_get("item_count")?,
            notes: row.try_get("notes")?,
        })
    }
}

impl FromRow for PricePoint {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        let normalized_unit: String = row.try_get("normalized_unit")?;
        Ok(PricePoint {
            date: row.try_get("date")?,
            item_name: row.try_get("item_name")?,
            store: row.try_get("store")?,
            normalized_price: row.try_get("normalized_price")?,
            normalized_unit: parse::<BaseUnit>(&normalized_unit, "normalized unit")?,
        })
    }
}

impl FromRow for StorePriceStats {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        let avg: Decimal = row.try_get("avg_normalized_price")?;
        Ok(StorePriceStats {
            store: row.try_get("store")?,
            avg_normalized_price: round2(avg),
            min_normalized_price: row.try_get("min_normalized_price")?,
            max_normalized_price: row.try_get("max_normalized_price")?,
            purchase_count: row.try_get("purchase_count")?,
        })
    }
}

impl FromRow for CategorySpend {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        let total: Decimal = row.try_get("total_spent")?;
        Ok(CategorySpend {
            category: row.try_get("category")?,
            total_spent: round2(total),
            item_count: row.try_get("item_count")?,
        })
    }
}

impl FromRow for MonthlySpend {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        let total: Decimal = row.try_get("total_spent")?;
        Ok(MonthlySpend {
            month: row.try_get("month")?,
            category: row.try_get("category")?,
            total_spent: round2(total),
        })
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

impl PgTx {
    fn select_all<T: FromRow>(&self, stmt: &SelectStatement) -> Result<Vec<T>, StorageError> {
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        let rows = with_converted_params(&values, |params| self.tx.query_all(&sql, params))?;
        rows.iter().map(T::from_row).collect()
    }

    fn select_first<T: FromRow>(&self, stmt: &SelectStatement) -> Result<Option<T>, StorageError> {
        Ok(self.select_all(stmt)?.into_iter().next())
    }

    fn insert_returning<T: FromRow>(
        &self,
        sql: String,
        values: sea_query::Values,
    ) -> Result<T, StorageError> {
        let row = with_converted_params(&values, |params| self.tx.query_one(&sql, params))?;
        T::from_row(&row)
    }

    fn execute(&self, sql: String, values: sea_query::Values) -> Result<u64, StorageError> {
        with_converted_params(&values, |params| self.tx.execute(&sql, params))
    }
}

fn category_columns() -> [Categories; 6] {
    [
        Categories::Id,
        Categories::Name,
        Categories::ParentId,
        Categories::Icon,
        Categories::Color,
        Categories::CreatedAt,
    ]
}

fn store_columns() -> [Stores; 4] {
    [Stores::Id, Stores::Name, Stores::Location, Stores::CreatedAt]
}

fn receipt_columns() -> [Receipts; 8] {
    [
        Receipts::Id,
        Receipts::Date,
        Receipts::Store,
        Receipts::Currency,
        Receipts::TotalAmount,
        Receipts::Notes,
        Receipts::CreatedAt,
        Receipts::UpdatedAt,
    ]
}

fn item_columns() -> [Items; 14] {
    [
        Items::Id,
        Items::ReceiptId,
        Items::Name,
        Items::Brand,
        Items::CategoryId,
        Items::Quantity,
        Items::Unit,
        Items::PricePerUnit,
        Items::TotalPrice,
        Items::OriginalPrice,
        Items::NormalizedPrice,
        Items::NormalizedUnit,
        Items::Notes,
        Items::CreatedAt,
    ]
}

/// COALESCE(categories.name, 'Uncategorized')
fn category_label() -> sea_query::SimpleExpr {
    let args: [Expr; 2] = [
        Expr::col((Categories::Table, Categories::Name)).into(),
        Expr::val(UNCATEGORIZED).into(),
    ];
    Func::coalesce(args).into()
}

impl ReceiptTx for PgTx {
    fn category_by_name(&mut self, name: &str) -> Result<Option<Category>, StorageError> {
        let mut stmt = Query::select();
        stmt.columns(category_columns())
            .from(Categories::Table)
            .and_where(Expr::col(Categories::Name).eq(name))
            .limit(1);
        self.select_first(&stmt)
    }

    fn category_by_id(&mut self, id: i64) -> Result<Option<Category>, StorageError> {
        let mut stmt = Query::select();
        stmt.columns(category_columns())
            .from(Categories::Table)
            .and_where(Expr::col(Categories::Id).eq(id))
            .limit(1);
        self.select_first(&stmt)
    }

    fn insert_category(&mut self, row: &NewCategory) -> Result<Category, StorageError> {
        let mut stmt = Query::insert();
        stmt.into_table(Categories::Table).columns([
            Categories::Name,
            Categories::ParentId,
            Categories::Icon,
            Categories::Color,
        ]);
        stmt.values([
            row.name.clone().into(),
            row.parent_id.into(),
            row.icon.clone().into(),
            row.color.clone().into(),
        ])
        .map_err(|e| StorageError::Other(e.to_string()))?;
        stmt.returning_all();
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        self.insert_returning(sql, values)
    }

    fn categories(&mut self, top_level_only: bool) -> Result<Vec<Category>, StorageError> {
        let mut stmt = Query::select();
        stmt.columns(category_columns())
            .from(Categories::Table)
            .order_by(Categories::Name, Order::Asc);
        if top_level_only {
            stmt.and_where(Expr::col(Categories::ParentId).is_null());
        }
        self.select_all(&stmt)
    }

    fn store_by_name(&mut self, name: &str) -> Result<Option<Store>, StorageError> {
        let mut stmt = Query::select();
        stmt.columns(store_columns())
            .from(Stores::Table)
            .and_where(Expr::col(Stores::Name).eq(name))
            .limit(1);
        self.select_first(&stmt)
    }

    fn insert_store(&mut self, row: &NewStore) -> Result<Store, StorageError> {
        let mut stmt = Query::insert();
        stmt.into_table(Stores::Table)
            .columns([Stores::Name, Stores::Location]);
        stmt.values([row.name.clone().into(), row.location.clone().into()])
            .map_err(|e| StorageError::Other(e.to_string()))?;
        stmt.returning_all();
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        self.insert_returning(sql, values)
    }

    fn stores(&mut self) -> Result<Vec<Store>, StorageError> {
        let mut stmt = Query::select();
        stmt.columns(store_columns())
            .from(Stores::Table)
            .order_by(Stores::Name, Order::Asc);
        self.select_all(&stmt)
    }

    fn receipt_by_id(&mut self, id: i64) -> Result<Option<Receipt>, StorageError> {
        let mut stmt = Query::select();
        stmt.columns(receipt_columns())
            .from(Receipts::Table)
            .and_where(Expr::col(Receipts::Id).eq(id))
            .limit(1);
        self.select_first(&stmt)
    }

    fn insert_receipt(&mut self, row: &NewReceipt) -> Result<Receipt, StorageError> {
        let mut stmt = Query::insert();
        stmt.into_table(Receipts::Table).columns([
            Receipts::Date,
            Receipts::Store,
            Receipts::Currency,
            Receipts::TotalAmount,
            Receipts::Notes,
        ]);
        stmt.values([
            row.date.into(),
            row.store.clone().into(),
            row.currency.as_str().into(),
            row.total_amount.into(),
            row.notes.clone().into(),
        ])
        .map_err(|e| StorageError::Other(e.to_string()))?;
        stmt.returning_all();
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        self.insert_returning(sql, values)
    }

    fn update_receipt(&mut self, id: i64, row: &NewReceipt) -> Result<Receipt, StorageError> {
        let mut stmt = Query::update();
        stmt.table(Receipts::Table)
            .values([
                (Receipts::Date, row.date.into()),
                (Receipts::Store, row.store.clone().into()),
                (Receipts::Currency, row.currency.as_str().into()),
                (Receipts::TotalAmount, row.total_amount.into()),
                (Receipts::Notes, row.notes.clone().into()),
            ])
            .value(Receipts::UpdatedAt, Expr::cust("CURRENT_TIMESTAMP"))
            .and_where(Expr::col(Receipts::Id).eq(id));
        stmt.returning_all();
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        self.insert_returning(sql, values)
    }

    fn delete_receipt(&mut self, id: i64) -> Result<bool, StorageError> {
        let mut stmt = Query::delete();
        stmt.from_table(Receipts::Table)
            .and_where(Expr::col(Receipts::Id).eq(id));
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        Ok(self.execute(sql, values)? > 0)
    }

    fn receipt_count(&mut self) -> Result<i64, StorageError> {
        let row = self.tx.query_one("SELECT COUNT(*) FROM receipts", &[])?;
        row.try_get(0).map_err(StorageError::Postgres)
    }

    fn insert_item(&mut self, row: &NewItem) -> Result<Item, StorageError> {
        let mut stmt = Query::insert();
        stmt.into_table(Items::Table).columns([
            Items::ReceiptId,
            Items::Name,
            Items::Brand,
            Items::CategoryId,
            Items::Quantity,
            Items::Unit,
            Items::PricePerUnit,
            Items::TotalPrice,
            Items::OriginalPrice,
            Items::NormalizedPrice,
            Items::NormalizedUnit,
            Items::Notes,
        ]);
        stmt.values([
            row.receipt_id.into(),
            row.name.clone().into(),
            row.brand.clone().into(),
            row.category_id.into(),
            row.quantity.into(),
            row.unit.as_str().into(),
            row.price_per_unit.into(),
            row.total_price.into(),
            row.original_price.into(),
            row.normalized_price.into(),
            row.normalized_unit.as_str().into(),
            row.notes.clone().into(),
        ])
        .map_err(|e| StorageError::Other(e.to_string()))?;
        stmt.returning_all();
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        self.insert_returning(sql, values)
    }

    fn delete_items_for_receipt(&mut self, receipt_id: i64) -> Result<u64, StorageError> {
        let mut stmt = Query::delete();
        stmt.from_table(Items::Table)
            .and_where(Expr::col(Items::ReceiptId).eq(receipt_id));
        let (sql, values) = stmt.build(PostgresQueryBuilder);
        self.execute(sql, values)
    }

    fn items_for_receipt(&mut self, receipt_id: i64) -> Result<Vec<Item>, StorageError> {
        let mut stmt = Query::select();
        stmt.columns(item_columns())
            .from(Items::Table)
            .and_where(Expr::col(Items::ReceiptId).eq(receipt_id))
            .order_by(Items::Id, Order::Asc);
        self.select_all(&stmt)
    }

    fn receipt_summaries(
        &mut self,
        filter: &ReceiptFilter,
    ) -> Result<Vec<ReceiptSummary>, StorageError> {
        let mut stmt = Query::select();
        stmt.columns([
            (Receipts::Table, Receipts::Id),
            (Receipts::Table, Receipts::Date),
            (Receipts::Table, Receipts::Store),
            (Receipts::Table, Receipts::Currency),
            (Receipts::Table, Receipts::TotalAmount),
        ])
        .expr_as(
            Func::count(Expr::col((Items::Table, Items::Id))),
            Alias::new("item_count"),
        )
        .column((Receipts::Table, Receipts::Notes))
        .from(Receipts::Table)
        .left_join(
            Items::Table,
            Expr::col((Items::Table, Items::ReceiptId))
                .equals((Receipts::Table, Receipts::Id)),
        )
        .group_by_col((Receipts::Table, Receipts::Id));

        if let Some(from) = filter.date_from {
            stmt.and_where(Expr::col((Receipts::Table, Receipts::Date)).gte(from));
        }
        if let Some(to) = filter.date_to {
            stmt.and_where(Expr::col((Receipts::Table, Receipts::Date)).lte(to));
        }
        if !filter.stores.is_empty() {
            stmt.and_where(
                Expr::col((Receipts::Table, Receipts::Store)).is_in(filter.stores.clone()),
            );
        }
        if let Some(search) = &filter.item_search {
            // EXISTS subquery so the match does not skew the item_count
            let matched = Alias::new("matched_items");
            let mut sub = Query::select();
            sub.column((matched.clone(), Items::Id))
                .from_as(Items::Table, matched.clone())
                .and_where(
                    Expr::col((matched.clone(), Items::ReceiptId))
                        .equals((Receipts::Table, Receipts::Id)),
                )
                .and_where(
                    Expr::expr(Func::lower(Expr::col((matched, Items::Name))))
                        .like(format!("%{}%", search.to_lowercase())),
                );
            stmt.and_where(Expr::exists(sub));
        }

        let sort_col = match filter.sort_by {
            ReceiptSort::Date => Receipts::Date,
            ReceiptSort::Total => Receipts::TotalAmount,
            ReceiptSort::Store => Receipts::Store,
        };
        let order = if filter.sort_desc { Order::Desc } else { Order::Asc };
        stmt.order_by((Receipts::Table, sort_col), order);

        if let Some(limit) = filter.limit {
            stmt.limit(limit);
        }
        if let Some(offset) = filter.offset {
            stmt.offset(offset);
        }

        self.select_all(&stmt)
    }

    fn price_trends(&mut self, filter: &TrendFilter) -> Result<Vec<PricePoint>, StorageError> {
        let mut stmt = Query::select();
        stmt.column((Receipts::Table, Receipts::Date))
            .expr_as(Expr::col((Items::Table, Items::Name)), Alias::new("item_name"))
            .column((Receipts::Table, Receipts::Store))
            .columns([
                (Items::Table, Items::NormalizedPrice),
                (Items::Table, Items::NormalizedUnit),
            ])
            .from(Items::Table)
            .inner_join(
                Receipts::Table,
                Expr::col((Items::Table, Items::ReceiptId))
                    .equals((Receipts::Table, Receipts::Id)),
            )
            .order_by((Receipts::Table, Receipts::Date), Order::Asc);

        if !filter.item_names.is_empty() {
            let lower_names: Vec<String> =
                filter.item_names.iter().map(|n| n.to_lowercase()).collect();
            stmt.and_where(
                Expr::expr(Func::lower(Expr::col((Items::Table, Items::Name))))
                    .is_in(lower_names),
            );
        }
        if let Some(from) = filter.date_from {
            stmt.and_where(Expr::col((Receipts::Table, Receipts::Date)).gte(from));
        }
        if let Some(to) = filter.date_to {
            stmt.and_where(Expr::col((Receipts::Table, Receipts::Date)).lte(to));
        }

        self.select_all(&stmt)
    }

    fn store_comparison(
        &mut self,
        filter: &StoreComparisonFilter,
    ) -> Result<Vec<StorePriceStats>, StorageError> {
        let price = || Expr::col((Items::Table, Items::NormalizedPrice));
        let mut stmt = Query::select();
        stmt.column((Receipts::Table, Receipts::Store))
            .expr_as(Func::avg(price()), Alias::new("avg_normalized_price"))
            .expr_as(Func::min(price()), Alias::new("min_normalized_price"))
            .expr_as(Func::max(price()), Alias::new("max_normalized_price"))
            .expr_as(
                Func::count(Expr::col((Items::Table, Items::Id))),
                Alias::new("purchase_count"),
            )
            .from(Items::Table)
            .inner_join(
                Receipts::Table,
                Expr::col((Items::Table, Items::ReceiptId))
                    .equals((Receipts::Table, Receipts::Id)),
            )
            .group_by_col((Receipts::Table, Receipts::Store))
            .order_by((Receipts::Table, Receipts::Store), Order::Asc);

        if !filter.item_names.is_empty() {
            let lower_names: Vec<String> =
                filter.item_names.iter().map(|n| n.to_lowercase()).collect();
            stmt.and_where(
                Expr::expr(Func::lower(Expr::col((Items::Table, Items::Name))))
                    .is_in(lower_names),
            );
        }
        if let Some(category_id) = filter.category_id {
            stmt.and_where(Expr::col((Items::Table, Items::CategoryId)).eq(category_id));
        }

        self.select_all(&stmt)
    }

    fn category_spending(&mut self, range: DateRange) -> Result<Vec<CategorySpend>, StorageError> {
        let mut stmt = Query::select();
        stmt.expr_as(category_label(), Alias::new("category"))
            .expr_as(
                Func::sum(Expr::col((Items::Table, Items::TotalPrice))),
                Alias::new("total_spent"),
            )
            .expr_as(
                Func::count(Expr::col((Items::Table, Items::Id))),
                Alias::new("item_count"),
            )
            .from(Receipts::Table)
            .inner_join(
                Items::Table,
                Expr::col((Items::Table, Items::ReceiptId))
                    .equals((Receipts::Table, Receipts::Id)),
            )
            .left_join(
                Categories::Table,
                Expr::col((Items::Table, Items::CategoryId))
                    .equals((Categories::Table, Categories::Id)),
            )
            .add_group_by([category_label()])
            .order_by_expr(category_label(), Order::Asc);

        if let Some(from) = range.from {
            stmt.and_where(Expr::col((Receipts::Table, Receipts::Date)).gte(from));
        }
        if let Some(to) = range.to {
            stmt.and_where(Expr::col((Receipts::Table, Receipts::Date)).lte(to));
        }

        self.select_all(&stmt)
    }

    fn monthly_spending(&mut self, range: DateRange) -> Result<Vec<MonthlySpend>, StorageError> {
        let month = || Expr::cust(r#"to_char("receipts"."date", 'YYYY-MM')"#);
        let mut stmt = Query::select();
        stmt.expr_as(month(), Alias::new("month"))
            .expr_as(category_label(), Alias::new("category"))
            .expr_as(
                Func::sum(Expr::col((Items::Table, Items::TotalPrice))),
                Alias::new("total_spent"),
            )
            .from(Receipts::Table)
            .inner_join(
                Items::Table,
                Expr::col((Items::Table, Items::ReceiptId))
                    .equals((Receipts::Table, Receipts::Id)),
            )
            .left_join(
                Categories::Table,
                Expr::col((Items::Table, Items::CategoryId))
                    .equals((Categories::Table, Categories::Id)),
            )
            .add_group_by([month().into(), category_label()])
            .order_by_expr(month().into(), Order::Asc)
            .order_by_expr(category_label(), Order::Asc);

        if let Some(from) = range.from {
            stmt.and_where(Expr::col((Receipts::Table, Receipts::Date)).gte(from));
        }
        if let Some(to) = range.to {
            stmt.and_where(Expr::col((Receipts::Table, Receipts::Date)).lte(to));
        }

        self.select_all(&stmt)
    }

    fn distinct_item_names(&mut self) -> Result<Vec<String>, StorageError> {
        let rows = self
            .tx
            .query_all("SELECT DISTINCT name FROM items ORDER BY name", &[])?;
        rows.iter()
            .map(|row| row.try_get(0).map_err(StorageError::Postgres))
            .collect()
    }

    fn distinct_receipt_stores(&mut self) -> Result<Vec<String>, StorageError> {
        let rows = self
            .tx
            .query_all("SELECT DISTINCT store FROM receipts ORDER BY store", &[])?;
        rows.iter()
            .map(|row| row.try_get(0).map_err(StorageError::Postgres))
            .collect()
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.commit()
    }

    fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.rollback()
    }
}
