//! # padre-core: Entity Types
//!
//! The records the orders and products services persist, with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Padre Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Service layer (orders-service, products-service)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ padre-core (THIS CRATE) ★                       │   │
//! │  │        Order, Product, OrderId, ProductId, OrderStatus          │   │
//! │  │                  NO I/O • NO DATABASE                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    padre-db (Database Layer)                    │   │
//! │  │          EntityStore<T>, SqliteStore<T>, migrations             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use padre_core::{Product, ProductId};
//!
//! let mut product = Product::new("WIDGET-1", "Widget", 499);
//! assert!(product.is_new());
//!
//! product.id = Some(ProductId::new(1));
//! assert!(!product.is_new());
//! ```

pub mod types;

pub use types::*;
