//! # Entity Mapping
//!
//! Describes how an entity type maps onto one SQLite table.
//!
//! ## What A Mapping Provides
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  impl Entity for Product                                                │
//! │                                                                         │
//! │  TABLE      "products"                                                  │
//! │  COLUMNS    sku, name, price_cents, created_at, updated_at              │
//! │  VERSIONED  true  → "version" column checked and bumped on update       │
//! │                                                                         │
//! │  id() / set_id()             ← identifier, assigned on first insert     │
//! │  bind_attributes(query)      ← binds COLUMNS values, in order           │
//! │  FromRow                     ← decodes SELECT id, COLUMNS, [version]    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The identifier column is always `id`; the version column, when present,
//! is always `version`. Everything else is listed in `COLUMNS`.

use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite};

use padre_core::{Order, OrderId, Product, ProductId};

/// A query with SQLite arguments, as built by `sqlx::query`.
pub type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A record type persisted as one row of one table.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Debug + Clone + Send + Sync + Unpin + 'static {
    /// Semantic identifier type, stored as an `INTEGER` primary key.
    type Id: Copy + Debug + Display + From<i64> + Into<i64> + Send + Sync + 'static;

    /// Table name.
    const TABLE: &'static str;

    /// Human-readable entity name used in errors and logs.
    const NAME: &'static str;

    /// Attribute columns, excluding `id` and `version`.
    const COLUMNS: &'static [&'static str];

    /// Whether updates are guarded by the `version` column.
    const VERSIONED: bool = false;

    /// The identifier, or `None` if the entity was never saved.
    fn id(&self) -> Option<Self::Id>;

    /// Stores the identifier assigned on insert.
    fn set_id(&mut self, id: Self::Id);

    /// Current version. Only read when `VERSIONED` is true.
    fn version(&self) -> i64 {
        0
    }

    /// Records the version written by the store.
    fn set_version(&mut self, _version: i64) {}

    /// Refreshes write timestamps before an update.
    fn touch(&mut self, _now: DateTime<Utc>) {}

    /// Binds each attribute in `COLUMNS` order.
    fn bind_attributes<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}

impl Entity for Product {
    type Id = ProductId;

    const TABLE: &'static str = "products";
    const NAME: &'static str = "Product";
    const COLUMNS: &'static [&'static str] =
        &["sku", "name", "price_cents", "created_at", "updated_at"];
    const VERSIONED: bool = true;

    fn id(&self) -> Option<ProductId> {
        self.id
    }

    fn set_id(&mut self, id: ProductId) {
        self.id = Some(id);
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn bind_attributes<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.sku.clone())
            .bind(self.name.clone())
            .bind(self.price_cents)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Entity for Order {
    type Id = OrderId;

    const TABLE: &'static str = "orders";
    const NAME: &'static str = "Order";
    const COLUMNS: &'static [&'static str] =
        &["reference", "customer_email", "status", "total_cents", "placed_at"];

    fn id(&self) -> Option<OrderId> {
        self.id
    }

    fn set_id(&mut self, id: OrderId) {
        self.id = Some(id);
    }

    fn bind_attributes<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.reference.clone())
            .bind(self.customer_email.clone())
            .bind(self.status)
            .bind(self.total_cents)
            .bind(self.placed_at)
    }
}
