//! # SQLite Entity Store
//!
//! [`EntityStore`] implementation for any [`Entity`], backed by the pool.
//!
//! ## Connection Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  store.find_by_id(id)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  guard.run ── deadline / cancellation ──────────────┐                   │
//! │       │                                              │                  │
//! │       ▼                                              ▼                  │
//! │  pool.acquire() ──► SELECT ... WHERE id = ?1    Timeout / Cancelled     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  connection dropped → back to pool (every exit path)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A connection is held for exactly one call and never across calls.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::entity::Entity;
use super::ops;
use super::{Direction, EntityStore, Page, PageRequest};
use crate::error::StoreResult;
use crate::guard::CallGuard;

/// Generic SQLite adapter for entity type `T`.
///
/// ## Usage
/// ```rust,ignore
/// let products = db.products();
///
/// let saved = products.save(Product::new("WIDGET-1", "Widget", 499)).await?;
/// let found = products.find_by_id(saved.id.unwrap()).await?;
///
/// // Same store, but every call gives up after 200ms
/// let hasty = products.with_timeout(Duration::from_millis(200));
/// ```
pub struct SqliteStore<T> {
    pool: SqlitePool,
    guard: CallGuard,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for SqliteStore<T> {
    fn clone(&self) -> Self {
        SqliteStore {
            pool: self.pool.clone(),
            guard: self.guard.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Debug for SqliteStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("table", &T::TABLE)
            .field("guard", &self.guard)
            .finish()
    }
}

impl<T: Entity> SqliteStore<T> {
    /// Creates a store with the given default guard.
    pub fn new(pool: SqlitePool, guard: CallGuard) -> Self {
        SqliteStore {
            pool,
            guard,
            _entity: PhantomData,
        }
    }

    /// Returns a copy of this store whose calls all end by `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        self.rescoped(self.guard.clone().deadline(deadline))
    }

    /// Returns a copy of this store whose calls each end after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.rescoped(self.guard.clone().timeout(timeout))
    }

    /// Returns a copy of this store whose calls abort when `token` fires.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        self.rescoped(self.guard.clone().cancellation(token))
    }

    fn rescoped(&self, guard: CallGuard) -> Self {
        SqliteStore {
            pool: self.pool.clone(),
            guard,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for SqliteStore<T> {
    async fn save(&self, entity: T) -> StoreResult<T> {
        self.guard
            .run("save", async {
                let mut conn = self.pool.acquire().await?;
                ops::save(&mut conn, entity).await
            })
            .await
    }

    async fn save_all(&self, entities: Vec<T>) -> StoreResult<Vec<T>> {
        self.guard
            .run("save_all", async {
                debug!(entity = T::NAME, count = entities.len(), "Saving batch");

                let mut tx = self.pool.begin().await?;
                let mut saved = Vec::with_capacity(entities.len());
                for entity in entities {
                    saved.push(ops::save(&mut *tx, entity).await?);
                }
                tx.commit().await?;

                Ok(saved)
            })
            .await
    }

    async fn find_by_id(&self, id: T::Id) -> StoreResult<Option<T>> {
        self.guard
            .run("find_by_id", async {
                let mut conn = self.pool.acquire().await?;
                ops::find_by_id::<T>(&mut conn, id).await
            })
            .await
    }

    async fn find_all_by_id(&self, ids: &[T::Id]) -> StoreResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.guard
            .run("find_all_by_id", async {
                let mut conn = self.pool.acquire().await?;
                ops::find_all_by_id::<T>(&mut conn, ids).await
            })
            .await
    }

    async fn find_all(&self) -> StoreResult<Vec<T>> {
        self.guard
            .run("find_all", async {
                let mut conn = self.pool.acquire().await?;
                ops::find_all::<T>(&mut conn).await
            })
            .await
    }

    async fn find_all_sorted(&self, direction: Direction) -> StoreResult<Vec<T>> {
        self.guard
            .run("find_all_sorted", async {
                let mut conn = self.pool.acquire().await?;
                ops::find_all_sorted::<T>(&mut conn, direction).await
            })
            .await
    }

    async fn find_page(&self, request: PageRequest) -> StoreResult<Page<T>> {
        self.guard
            .run("find_page", async {
                // Count and page come from one connection
                let mut conn = self.pool.acquire().await?;
                ops::find_page::<T>(&mut conn, request).await
            })
            .await
    }

    async fn exists_by_id(&self, id: T::Id) -> StoreResult<bool> {
        self.guard
            .run("exists_by_id", async {
                let mut conn = self.pool.acquire().await?;
                ops::exists_by_id::<T>(&mut conn, id).await
            })
            .await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.guard
            .run("count", async {
                let mut conn = self.pool.acquire().await?;
                ops::count::<T>(&mut conn).await
            })
            .await
    }

    async fn delete_by_id(&self, id: T::Id) -> StoreResult<()> {
        self.guard
            .run("delete_by_id", async {
                let mut conn = self.pool.acquire().await?;
                ops::delete_by_id::<T>(&mut conn, id).await?;
                Ok(())
            })
            .await
    }

    async fn delete_all_by_id(&self, ids: &[T::Id]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.guard
            .run("delete_all_by_id", async {
                let mut tx = self.pool.begin().await?;
                let removed = ops::delete_all_by_id::<T>(&mut *tx, ids).await?;
                tx.commit().await?;
                Ok(removed)
            })
            .await
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        self.guard
            .run("delete_all", async {
                let mut conn = self.pool.acquire().await?;
                ops::delete_all::<T>(&mut conn).await
            })
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConstraintKind, StoreError};
    use crate::pool::tests::{remove_database_files, temp_database_path};
    use crate::pool::{Database, DbConfig};
    use padre_core::{Order, OrderId, OrderStatus, Product, ProductId};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_widget_lifecycle() {
        let db = test_db().await;
        let products = db.products();

        let saved = products
            .save(Product::new("WIDGET", "Widget", 250))
            .await
            .unwrap();
        let id = saved.id.unwrap();
        assert_eq!(id, ProductId::new(1));

        let found = products.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name, "Widget");
        assert_eq!(found.id, Some(id));

        products.delete_by_id(id).await.unwrap();
        assert!(products.find_by_id(id).await.unwrap().is_none());
        assert_eq!(products.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_then_find_preserves_attributes() {
        let db = test_db().await;
        let orders = db.orders();

        let order = Order::new("buyer@example.com", 4_200);
        let saved = orders.save(order.clone()).await.unwrap();
        let found = orders.find_by_id(saved.id.unwrap()).await.unwrap().unwrap();

        assert_eq!(Order { id: None, ..found }, order);
    }

    #[tokio::test]
    async fn test_missing_id_is_absent_not_error() {
        let db = test_db().await;
        let orders = db.orders();

        assert!(orders.find_by_id(OrderId::new(999)).await.unwrap().is_none());
        assert!(!orders.exists_by_id(OrderId::new(999)).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let db = test_db().await;
        let orders = db.orders();

        let saved = orders.save(Order::new("a@example.com", 100)).await.unwrap();
        let id = saved.id.unwrap();

        orders.delete_by_id(id).await.unwrap();
        orders.delete_by_id(id).await.unwrap();
        orders.delete_by_id(OrderId::new(12345)).await.unwrap();

        assert!(orders.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_tracks_inserts() {
        let db = test_db().await;
        let orders = db.orders();

        orders.save(Order::new("first@example.com", 1)).await.unwrap();
        let before = orders.count().await.unwrap();

        for i in 0..5 {
            orders
                .save(Order::new(format!("{i}@example.com"), 10))
                .await
                .unwrap();
        }

        assert_eq!(orders.count().await.unwrap(), before + 5);
        assert_eq!(orders.find_all().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_resave_updates_same_row() {
        let db = test_db().await;
        let orders = db.orders();

        let saved = orders.save(Order::new("a@example.com", 100)).await.unwrap();
        let mut again = orders.save(saved.clone()).await.unwrap();
        assert_eq!(again.id, saved.id);
        assert_eq!(orders.count().await.unwrap(), 1);

        again.status = OrderStatus::Paid;
        orders.save(again.clone()).await.unwrap();

        let found = orders.find_by_id(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.status, OrderStatus::Paid);
        assert_eq!(orders.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let db = test_db().await;
        let products = db.products();

        let first = products.save(Product::new("A", "A", 1)).await.unwrap();
        products.delete_by_id(first.id.unwrap()).await.unwrap();
        let second = products.save(Product::new("B", "B", 1)).await.unwrap();

        assert!(second.id.unwrap() > first.id.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_constraint_violation() {
        let db = test_db().await;
        let products = db.products();

        products.save(Product::new("DUP", "One", 1)).await.unwrap();
        let err = products
            .save(Product::new("DUP", "Two", 2))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::ConstraintViolation {
                kind: ConstraintKind::Unique,
                ..
            }
        ));
        assert_eq!(products.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_check_constraint_violation() {
        let db = test_db().await;
        let err = db
            .products()
            .save(Product::new("NEG", "Negative", -5))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::ConstraintViolation {
                kind: ConstraintKind::Check,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_versioned_update_bumps_version() {
        let db = test_db().await;
        let products = db.products();

        let saved = products.save(Product::new("V", "Versioned", 10)).await.unwrap();
        assert_eq!(saved.version, 0);

        let mut edited = saved.clone();
        edited.price_cents = 20;
        let updated = products.save(edited).await.unwrap();
        assert_eq!(updated.version, 1);

        let found = products.find_by_id(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.version, 1);
        assert_eq!(found.price_cents, 20);
    }

    #[tokio::test]
    async fn test_stale_version_is_serialization_conflict() {
        let db = test_db().await;
        let products = db.products();

        let saved = products.save(Product::new("V", "Versioned", 10)).await.unwrap();

        let mut first = saved.clone();
        first.name = "First".into();
        products.save(first).await.unwrap();

        let mut second = saved.clone();
        second.name = "Second".into();
        let err = products.save(second).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::SerializationConflict {
                expected_version: 0,
                ..
            }
        ));
        let found = products.find_by_id(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.name, "First");
    }

    #[tokio::test]
    async fn test_update_of_deleted_row_is_stale() {
        let db = test_db().await;
        let orders = db.orders();

        let saved = orders.save(Order::new("a@example.com", 100)).await.unwrap();
        orders.delete_by_id(saved.id.unwrap()).await.unwrap();

        let err = orders.save(saved).await.unwrap_err();
        assert!(matches!(err, StoreError::StaleEntity { entity: "Order", .. }));
        assert_eq!(orders.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_last_writer_wins() {
        let path = temp_database_path("concurrent");
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        let orders = db.orders();

        let saved = orders.save(Order::new("a@example.com", 100)).await.unwrap();
        let id = saved.id.unwrap();

        for round in 0..10 {
            let mut left = saved.clone();
            left.customer_email = format!("left{round}@example.com");
            left.total_cents = 111 + round;
            let mut right = saved.clone();
            right.customer_email = format!("right{round}@example.com");
            right.total_cents = 222 + round;

            let left_task = tokio::spawn({
                let orders = orders.clone();
                let left = left.clone();
                async move { orders.save(left).await }
            });
            let right_task = tokio::spawn({
                let orders = orders.clone();
                let right = right.clone();
                async move { orders.save(right).await }
            });
            left_task.await.unwrap().unwrap();
            right_task.await.unwrap().unwrap();

            let found = orders.find_by_id(id).await.unwrap().unwrap();
            assert!(found == left || found == right, "mixed write: {found:?}");
        }
        assert_eq!(orders.count().await.unwrap(), 1);

        db.close().await;
        remove_database_files(&path);
    }

    #[tokio::test]
    async fn test_save_all_is_atomic() {
        let db = test_db().await;
        let products = db.products();

        let batch = vec![
            Product::new("A", "A", 1),
            Product::new("B", "B", 1),
            Product::new("A", "dup", 1),
        ];
        assert!(products.save_all(batch).await.is_err());
        assert_eq!(products.count().await.unwrap(), 0);

        let saved = products
            .save_all(vec![Product::new("A", "A", 1), Product::new("B", "B", 1)])
            .await
            .unwrap();
        assert!(saved.iter().all(|p| p.id.is_some()));
        assert_eq!(products.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_all_by_id_skips_missing() {
        let db = test_db().await;
        let orders = db.orders();

        let a = orders.save(Order::new("a@example.com", 1)).await.unwrap();
        let b = orders.save(Order::new("b@example.com", 2)).await.unwrap();

        let found = orders
            .find_all_by_id(&[a.id.unwrap(), OrderId::new(404), b.id.unwrap()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(orders.find_all_by_id(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sorted_and_paged_listing() {
        let db = test_db().await;
        let orders = db.orders();

        for i in 0..7 {
            orders
                .save(Order::new(format!("{i}@example.com"), i))
                .await
                .unwrap();
        }

        let desc = orders.find_all_sorted(Direction::Descending).await.unwrap();
        let ids: Vec<i64> = desc.iter().map(|o| o.id.unwrap().get()).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3, 2, 1]);

        let page = orders.find_page(PageRequest::new(1, 3)).await.unwrap();
        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages(), 3);
        let ids: Vec<i64> = page.items.iter().map(|o| o.id.unwrap().get()).collect();
        assert_eq!(ids, vec![4, 5, 6]);
        assert!(page.has_next());
    }

    #[tokio::test]
    async fn test_page_far_past_end_is_empty() {
        let db = test_db().await;
        let orders = db.orders();

        for i in 0..3 {
            orders
                .save(Order::new(format!("{i}@example.com"), 1))
                .await
                .unwrap();
        }

        // Offset overflows i64
        let page = orders
            .find_page(PageRequest::new(u32::MAX, u32::MAX))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert!(!page.has_next());

        let page = orders.find_page(PageRequest::new(5, 3)).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_deletes() {
        let db = test_db().await;
        let orders = db.orders();

        let mut ids = Vec::new();
        for i in 0..4 {
            let saved = orders
                .save(Order::new(format!("{i}@example.com"), 1))
                .await
                .unwrap();
            ids.push(saved.id.unwrap());
        }

        let unsaved = Order::new("nobody@example.com", 1);
        orders.delete(&unsaved).await.unwrap();

        let first = orders.find_by_id(ids[0]).await.unwrap().unwrap();
        orders.delete(&first).await.unwrap();
        assert_eq!(orders.count().await.unwrap(), 3);

        let removed = orders
            .delete_all_by_id(&[ids[0], ids[1], OrderId::new(99)])
            .await
            .unwrap();
        assert_eq!(removed, 1);

        assert_eq!(orders.delete_all().await.unwrap(), 2);
        assert_eq!(orders.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_store_surfaces_cancelled() {
        let db = test_db().await;
        let token = CancellationToken::new();
        let orders = db.orders().with_cancellation(token.clone());

        token.cancel();
        let err = orders.count().await.unwrap_err();
        assert!(matches!(err, StoreError::Cancelled { operation: "count" }));

        // The unguarded store is unaffected
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_deadline_surfaces_timeout() {
        let db = test_db().await;
        let orders = db.orders().with_deadline(Instant::now());

        let err = orders
            .save(Order::new("late@example.com", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout { operation: "save" }));
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_pool_is_connection_error() {
        let db = test_db().await;
        db.close().await;

        let err = db.orders().count().await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
