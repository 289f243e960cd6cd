//! # Repository Module
//!
//! The generic entity store and its SQLite adapter.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Service layer                                                         │
//! │       │                                                                 │
//! │       │  db.orders().find_by_id(OrderId::new(1))                       │
//! │       ▼                                                                 │
//! │  EntityStore<T>            (trait: the contract callers code against)  │
//! │  ├── save(entity)                                                      │
//! │  ├── find_by_id(id) / exists_by_id(id)                                 │
//! │  ├── find_all() / count()                                              │
//! │  └── delete_by_id(id)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqliteStore<T>            (generic adapter, one per entity type)      │
//! │       │                                                                 │
//! │       │  SQL generated from the Entity mapping                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contents
//!
//! - [`EntityStore`] - CRUD contract over one entity type
//! - [`SqliteStore`] - the adapter backed by a connection pool
//! - [`Entity`] - table mapping implemented for `Order` and `Product`

pub mod entity;
pub(crate) mod ops;
pub(crate) mod statements;
pub mod store;

use async_trait::async_trait;

use crate::error::StoreResult;

pub use entity::{Entity, SqliteQuery};
pub use store::SqliteStore;

// =============================================================================
// Sorting & Paging
// =============================================================================

/// Sort direction for identifier-ordered listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// A caller-requested page: zero-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Creates a page request. A size of zero is raised to one.
    pub fn new(page: u32, size: u32) -> Self {
        PageRequest {
            page,
            size: size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of rows plus the table's total row count at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub request: PageRequest,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Page {
            items,
            request,
            total,
        }
    }

    /// Number of pages needed to cover `total` rows.
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.request.size()))
    }

    /// Whether a page follows this one.
    pub fn has_next(&self) -> bool {
        u64::from(self.request.page()) + 1 < self.total_pages()
    }
}

// =============================================================================
// Entity Store
// =============================================================================

/// Identifier-keyed CRUD access to the table behind entity type `T`.
///
/// Every call is a fresh round trip; nothing is cached between calls.
/// Failures surface unaltered, with no retries.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Inserts `entity` if it has no id, otherwise updates the row with
    /// its id. Returns the persisted entity with its id populated.
    ///
    /// ## Errors
    /// * `ConstraintViolation` - unique, foreign-key, not-null or check
    /// * `SerializationConflict` - versioned entity changed underneath
    /// * `StaleEntity` - the id has no row behind it
    /// * `Connection` - store unreachable
    async fn save(&self, entity: T) -> StoreResult<T>;

    /// Saves every entity in one transaction; all or nothing.
    async fn save_all(&self, entities: Vec<T>) -> StoreResult<Vec<T>>;

    /// Returns the entity with `id`, or `None` if there is no such row.
    async fn find_by_id(&self, id: T::Id) -> StoreResult<Option<T>>;

    /// Returns the rows whose ids are listed; missing ids are skipped.
    async fn find_all_by_id(&self, ids: &[T::Id]) -> StoreResult<Vec<T>>;

    /// Returns every row, in unspecified order.
    async fn find_all(&self) -> StoreResult<Vec<T>>;

    /// Returns every row ordered by id.
    async fn find_all_sorted(&self, direction: Direction) -> StoreResult<Vec<T>>;

    /// Returns one page of rows ordered by id ascending.
    async fn find_page(&self, request: PageRequest) -> StoreResult<Page<T>>;

    /// Whether a row with `id` exists.
    async fn exists_by_id(&self, id: T::Id) -> StoreResult<bool>;

    /// Number of rows in the table.
    async fn count(&self) -> StoreResult<u64>;

    /// Removes the row with `id`. Missing ids are not an error.
    async fn delete_by_id(&self, id: T::Id) -> StoreResult<()>;

    /// Removes the row behind `entity`. Unsaved entities are a no-op.
    async fn delete(&self, entity: &T) -> StoreResult<()> {
        match entity.id() {
            Some(id) => self.delete_by_id(id).await,
            None => Ok(()),
        }
    }

    /// Removes the rows with the listed ids. Returns rows removed.
    async fn delete_all_by_id(&self, ids: &[T::Id]) -> StoreResult<u64>;

    /// Removes every row. Returns rows removed.
    async fn delete_all(&self) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 30);
        assert_eq!(PageRequest::new(2, 0).size(), 1);
    }

    #[test]
    fn test_page_math() {
        let page: Page<()> = Page::new(vec![], PageRequest::new(0, 10), 25);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());

        let last: Page<()> = Page::new(vec![], PageRequest::new(2, 10), 25);
        assert!(!last.has_next());

        let empty: Page<()> = Page::new(vec![], PageRequest::new(0, 10), 0);
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
    }
}
