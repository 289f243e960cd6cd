//! # Sessions
//!
//! An explicit transaction handle. Several store operations, across any
//! entity types, commit or roll back together.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let mut session = db.begin().await?;                                   │
//! │                                                                         │
//! │  session.save(order).await?;        ─┐                                  │
//! │  session.save(product).await?;       ├─ one SQLite transaction          │
//! │  session.delete_by_id::<Order>(id)  ─┘                                  │
//! │                                                                         │
//! │  session.commit().await?;   ← or rollback(), or drop (rolls back)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::error::StoreResult;
use crate::repository::{ops, Entity};

/// An open transaction holding one pooled connection.
pub struct Session {
    tx: Transaction<'static, Sqlite>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Session { tx }
    }

    /// Inserts or updates `entity` inside the transaction.
    pub async fn save<T: Entity>(&mut self, entity: T) -> StoreResult<T> {
        ops::save(&mut *self.tx, entity).await
    }

    pub async fn find_by_id<T: Entity>(&mut self, id: T::Id) -> StoreResult<Option<T>> {
        ops::find_by_id::<T>(&mut *self.tx, id).await
    }

    pub async fn find_all<T: Entity>(&mut self) -> StoreResult<Vec<T>> {
        ops::find_all::<T>(&mut *self.tx).await
    }

    pub async fn exists_by_id<T: Entity>(&mut self, id: T::Id) -> StoreResult<bool> {
        ops::exists_by_id::<T>(&mut *self.tx, id).await
    }

    pub async fn count<T: Entity>(&mut self) -> StoreResult<u64> {
        ops::count::<T>(&mut *self.tx).await
    }

    /// Removes the row with `id`, if present.
    pub async fn delete_by_id<T: Entity>(&mut self, id: T::Id) -> StoreResult<()> {
        ops::delete_by_id::<T>(&mut *self.tx, id).await?;
        Ok(())
    }

    /// Makes every write in the session durable.
    pub async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        debug!("Session committed");
        Ok(())
    }

    /// Discards every write in the session.
    pub async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        debug!("Session rolled back");
        Ok(())
    }
}
