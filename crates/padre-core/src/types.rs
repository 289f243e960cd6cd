//! # Domain Types
//!
//! Entity types persisted by padre-db.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐          ┌─────────────────────┐              │
//! │  │       Order         │          │      Product        │              │
//! │  │  ─────────────────  │          │  ─────────────────  │              │
//! │  │  id (OrderId)       │          │  id (ProductId)     │              │
//! │  │  reference (UUID)   │          │  sku (business)     │              │
//! │  │  customer_email     │          │  name               │              │
//! │  │  status             │          │  price_cents        │              │
//! │  │  total_cents        │          │  version            │              │
//! │  └─────────────────────┘          └─────────────────────┘              │
//! │                                                                         │
//! │  No relation between the two: each is its own flat table.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: integer assigned by the store on first insert, immutable afterwards.
//!   `None` means the entity has never been saved.
//! - Business key: (`sku`, `reference`) - human-readable, unique per table

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database identifier.
            #[inline]
            pub const fn new(raw: i64) -> Self {
                $name(raw)
            }

            /// Returns the raw database identifier.
            #[inline]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                $name(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a row in the `orders` table.
    OrderId
);

entity_id!(
    /// Identifier of a row in the `products` table.
    ProductId
);

// =============================================================================
// Product
// =============================================================================

/// A product offered by the products service.
///
/// Products carry a `version` column: concurrent updates of the same row are
/// detected instead of silently overwriting each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Store-assigned identifier. `None` until first saved.
    pub id: Option<ProductId>,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last written.
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency marker, bumped on every update.
    pub version: i64,
}

impl Product {
    /// Creates an unsaved product.
    pub fn new(sku: impl Into<String>, name: impl Into<String>, price_cents: i64) -> Self {
        let now = Utc::now();
        Product {
            id: None,
            sku: sku.into(),
            name: name.into(),
            price_cents,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Returns true if the product has never been saved.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, not yet paid.
    #[default]
    Pending,
    /// Payment captured.
    Paid,
    /// Handed to the carrier.
    Shipped,
    /// Cancelled before shipping.
    Cancelled,
}

// =============================================================================
// Order
// =============================================================================

/// An order recorded by the orders service.
///
/// Orders are unversioned: two concurrent saves of the same row resolve to
/// whichever write lands last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    /// Store-assigned identifier. `None` until first saved.
    pub id: Option<OrderId>,

    /// Business reference shown to customers (UUID v4).
    pub reference: String,

    /// Customer contact address.
    pub customer_email: String,

    /// Lifecycle status.
    pub status: OrderStatus,

    /// Order total in cents.
    pub total_cents: i64,

    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

impl Order {
    /// Creates an unsaved, pending order with a fresh reference.
    pub fn new(customer_email: impl Into<String>, total_cents: i64) -> Self {
        Order {
            id: None,
            reference: Uuid::new_v4().to_string(),
            customer_email: customer_email.into(),
            status: OrderStatus::Pending,
            total_cents,
            placed_at: Utc::now(),
        }
    }

    /// Returns true if the order has never been saved.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_is_unsaved() {
        let product = Product::new("WIDGET-1", "Widget", 499);
        assert!(product.is_new());
        assert_eq!(product.version, 0);
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn test_new_orders_get_distinct_references() {
        let a = Order::new("a@example.com", 1000);
        let b = Order::new("a@example.com", 1000);
        assert!(a.is_new());
        assert_eq!(a.status, OrderStatus::Pending);
        assert_ne!(a.reference, b.reference);
    }

    #[test]
    fn test_id_conversions() {
        let id = OrderId::from(42);
        assert_eq!(id.get(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_ids_serialize_as_plain_integers() {
        let mut product = Product::new("SKU", "Thing", 1);
        product.id = Some(ProductId::new(7));

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["id"], 7);

        let unsaved = serde_json::to_value(Product::new("SKU", "Thing", 1)).unwrap();
        assert!(unsaved["id"].is_null());
    }

    #[test]
    fn test_order_status_serde() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }
}
