//! SQL text generated from an [`Entity`] mapping.
//!
//! Table and column names come from `'static` constants on the mapping,
//! never from caller input, so formatting them into SQL is safe. Values are
//! always bound as parameters.

use super::entity::Entity;
use super::Direction;

/// Column list for SELECT: `id, <COLUMNS>[, version]`.
fn select_columns<T: Entity>() -> String {
    let mut columns = Vec::with_capacity(T::COLUMNS.len() + 2);
    columns.push("id");
    columns.extend_from_slice(T::COLUMNS);
    if T::VERSIONED {
        columns.push("version");
    }
    columns.join(", ")
}

/// `?1, ?2, ... ?n`
fn placeholders(from: usize, count: usize) -> String {
    (from..from + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// INSERT of a new row. Binds: attributes, then version if versioned.
pub(crate) fn insert<T: Entity>() -> String {
    let mut columns = T::COLUMNS.to_vec();
    if T::VERSIONED {
        columns.push("version");
    }
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        columns.join(", "),
        placeholders(1, columns.len())
    )
}

/// UPDATE by id. Binds: attributes, id, then expected version if versioned.
pub(crate) fn update<T: Entity>() -> String {
    let assignments = T::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let id_param = T::COLUMNS.len() + 1;

    if T::VERSIONED {
        format!(
            "UPDATE {} SET {assignments}, version = version + 1 WHERE id = ?{id_param} AND version = ?{}",
            T::TABLE,
            id_param + 1
        )
    } else {
        format!("UPDATE {} SET {assignments} WHERE id = ?{id_param}", T::TABLE)
    }
}

pub(crate) fn select_by_id<T: Entity>() -> String {
    format!("SELECT {} FROM {} WHERE id = ?1", select_columns::<T>(), T::TABLE)
}

pub(crate) fn select_by_ids<T: Entity>(count: usize) -> String {
    format!(
        "SELECT {} FROM {} WHERE id IN ({})",
        select_columns::<T>(),
        T::TABLE,
        placeholders(1, count)
    )
}

pub(crate) fn select_all<T: Entity>() -> String {
    format!("SELECT {} FROM {}", select_columns::<T>(), T::TABLE)
}

pub(crate) fn select_all_sorted<T: Entity>(direction: Direction) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY id {}",
        select_columns::<T>(),
        T::TABLE,
        direction.as_sql()
    )
}

/// Binds: limit, offset.
pub(crate) fn select_page<T: Entity>() -> String {
    format!(
        "SELECT {} FROM {} ORDER BY id ASC LIMIT ?1 OFFSET ?2",
        select_columns::<T>(),
        T::TABLE
    )
}

pub(crate) fn exists_by_id<T: Entity>() -> String {
    format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", T::TABLE)
}

pub(crate) fn count<T: Entity>() -> String {
    format!("SELECT COUNT(*) FROM {}", T::TABLE)
}

pub(crate) fn delete_by_id<T: Entity>() -> String {
    format!("DELETE FROM {} WHERE id = ?1", T::TABLE)
}

pub(crate) fn delete_by_ids<T: Entity>(count: usize) -> String {
    format!("DELETE FROM {} WHERE id IN ({})", T::TABLE, placeholders(1, count))
}

pub(crate) fn delete_all<T: Entity>() -> String {
    format!("DELETE FROM {}", T::TABLE)
}
