//! Connection-level entity operations.
//!
//! Every function here runs against a borrowed `SqliteConnection`, so the
//! same code serves a pooled connection ([`SqliteStore`](super::SqliteStore))
//! and an open transaction ([`Session`](crate::session::Session)).

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use super::entity::Entity;
use super::statements;
use super::{Direction, Page, PageRequest};
use crate::error::{StoreError, StoreResult};

/// SQLite caps bound parameters per statement; IN lists are split below it.
const IN_LIST_CHUNK: usize = 500;

/// Inserts when the entity has no id, updates by id otherwise.
pub(crate) async fn save<T: Entity>(conn: &mut SqliteConnection, entity: T) -> StoreResult<T> {
    match entity.id() {
        None => insert(conn, entity).await,
        Some(id) => update(conn, entity, id).await,
    }
}

async fn insert<T: Entity>(conn: &mut SqliteConnection, mut entity: T) -> StoreResult<T> {
    let sql = statements::insert::<T>();
    let mut query = entity.bind_attributes(sqlx::query(&sql));
    if T::VERSIONED {
        query = query.bind(entity.version());
    }

    let result = query.execute(&mut *conn).await?;
    let id = <T::Id as From<i64>>::from(result.last_insert_rowid());
    entity.set_id(id);

    debug!(entity = T::NAME, id = %id, "Inserted");
    Ok(entity)
}

async fn update<T: Entity>(conn: &mut SqliteConnection, mut entity: T, id: T::Id) -> StoreResult<T> {
    entity.touch(Utc::now());
    let raw: i64 = id.into();
    let expected_version = entity.version();

    let sql = statements::update::<T>();
    let mut query = entity.bind_attributes(sqlx::query(&sql)).bind(raw);
    if T::VERSIONED {
        query = query.bind(expected_version);
    }

    let result = query.execute(&mut *conn).await?;

    if result.rows_affected() == 0 {
        // Versioned: a surviving row means someone else bumped the version.
        if T::VERSIONED && exists_by_id::<T>(conn, id).await? {
            debug!(entity = T::NAME, id = %id, expected_version, "Version conflict");
            return Err(StoreError::SerializationConflict {
                entity: T::NAME,
                id: raw,
                expected_version,
            });
        }
        return Err(StoreError::StaleEntity {
            entity: T::NAME,
            id: raw,
        });
    }

    if T::VERSIONED {
        entity.set_version(expected_version + 1);
    }

    debug!(entity = T::NAME, id = %id, "Updated");
    Ok(entity)
}

pub(crate) async fn find_by_id<T: Entity>(
    conn: &mut SqliteConnection,
    id: T::Id,
) -> StoreResult<Option<T>> {
    let sql = statements::select_by_id::<T>();
    let found = sqlx::query_as::<_, T>(&sql)
        .bind(Into::<i64>::into(id))
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found)
}

/// Rows for the given ids, in no particular order. Missing ids are skipped.
pub(crate) async fn find_all_by_id<T: Entity>(
    conn: &mut SqliteConnection,
    ids: &[T::Id],
) -> StoreResult<Vec<T>> {
    let mut found = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(IN_LIST_CHUNK) {
        let sql = statements::select_by_ids::<T>(chunk.len());
        let mut query = sqlx::query_as::<_, T>(&sql);
        for id in chunk {
            query = query.bind(Into::<i64>::into(*id));
        }
        found.extend(query.fetch_all(&mut *conn).await?);
    }

    Ok(found)
}

pub(crate) async fn find_all<T: Entity>(conn: &mut SqliteConnection) -> StoreResult<Vec<T>> {
    let sql = statements::select_all::<T>();
    let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&mut *conn).await?;

    debug!(entity = T::NAME, count = rows.len(), "Listed all");
    Ok(rows)
}

pub(crate) async fn find_all_sorted<T: Entity>(
    conn: &mut SqliteConnection,
    direction: Direction,
) -> StoreResult<Vec<T>> {
    let sql = statements::select_all_sorted::<T>(direction);
    let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&mut *conn).await?;
    Ok(rows)
}

pub(crate) async fn find_page<T: Entity>(
    conn: &mut SqliteConnection,
    request: PageRequest,
) -> StoreResult<Page<T>> {
    let total = count::<T>(conn).await?;

    // SQLite reads a negative OFFSET as 0; an offset past i64 is past every row.
    let offset = match i64::try_from(request.offset()) {
        Ok(offset) => offset,
        Err(_) => return Ok(Page::new(Vec::new(), request, total)),
    };

    let sql = statements::select_page::<T>();
    let items = sqlx::query_as::<_, T>(&sql)
        .bind(i64::from(request.size()))
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

    Ok(Page::new(items, request, total))
}

pub(crate) async fn exists_by_id<T: Entity>(
    conn: &mut SqliteConnection,
    id: T::Id,
) -> StoreResult<bool> {
    let sql = statements::exists_by_id::<T>();
    let exists: i64 = sqlx::query_scalar(&sql)
        .bind(Into::<i64>::into(id))
        .fetch_one(&mut *conn)
        .await?;

    Ok(exists != 0)
}

pub(crate) async fn count<T: Entity>(conn: &mut SqliteConnection) -> StoreResult<u64> {
    let sql = statements::count::<T>();
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;

    Ok(count as u64)
}

/// Removes the row if present. Returns the number of rows removed (0 or 1).
pub(crate) async fn delete_by_id<T: Entity>(
    conn: &mut SqliteConnection,
    id: T::Id,
) -> StoreResult<u64> {
    let sql = statements::delete_by_id::<T>();
    let result = sqlx::query(&sql)
        .bind(Into::<i64>::into(id))
        .execute(&mut *conn)
        .await?;

    debug!(entity = T::NAME, id = %id, removed = result.rows_affected(), "Deleted");
    Ok(result.rows_affected())
}

pub(crate) async fn delete_all_by_id<T: Entity>(
    conn: &mut SqliteConnection,
    ids: &[T::Id],
) -> StoreResult<u64> {
    let mut removed = 0;

    for chunk in ids.chunks(IN_LIST_CHUNK) {
        let sql = statements::delete_by_ids::<T>(chunk.len());
        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(Into::<i64>::into(*id));
        }
        removed += query.execute(&mut *conn).await?.rows_affected();
    }

    Ok(removed)
}

pub(crate) async fn delete_all<T: Entity>(conn: &mut SqliteConnection) -> StoreResult<u64> {
    let sql = statements::delete_all::<T>();
    let result = sqlx::query(&sql).execute(&mut *conn).await?;

    debug!(entity = T::NAME, removed = result.rows_affected(), "Deleted all");
    Ok(result.rows_affected())
}
