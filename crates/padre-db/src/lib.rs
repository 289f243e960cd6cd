//! # padre-db: Generic Entity Store
//!
//! Identifier-keyed CRUD over SQLite for any mapped entity type, with the
//! orders and products tables wired in.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Padre Data Flow                                  │
//! │                                                                         │
//! │  Service layer (orders-service, products-service)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     padre-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │                │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ EntityStore<T> │    │ products     │  │   │
//! │  │   │ Session (tx)  │    │ SqliteStore<T> │    │ orders       │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, store accessors, transactions
//! - [`repository`] - `EntityStore` contract, `SqliteStore` adapter, mappings
//! - [`session`] - Explicit transaction handle
//! - [`guard`] - Deadlines and cancellation
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error taxonomy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use padre_core::Product;
//! use padre_db::{Database, DbConfig, EntityStore};
//!
//! let db = Database::new(DbConfig::new("path/to/padre.db")).await?;
//!
//! let saved = db.products().save(Product::new("WIDGET", "Widget", 250)).await?;
//! let found = db.products().find_by_id(saved.id.unwrap()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod guard;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConstraintKind, StoreError, StoreResult};
pub use guard::CallGuard;
pub use pool::{Database, DbConfig};
pub use repository::{Direction, Entity, EntityStore, Page, PageRequest, SqliteStore};
pub use session::Session;
