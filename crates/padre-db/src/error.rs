//! # Store Error Types
//!
//! Error taxonomy for entity store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Categorized, no retries, no recovery       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Service layer ← Decides what the user sees                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missing row is never an error: point lookups return `Ok(None)` and
//! deletes of missing ids succeed.

use std::fmt;

use thiserror::Error;

/// Which constraint a write tripped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::NotNull => "not-null",
            ConstraintKind::Check => "check",
        };
        f.write_str(name)
    }
}

/// Entity store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write violated a table constraint.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate SKU or order reference
    /// - Writing NULL into a NOT NULL column
    /// - A CHECK clause rejects the row (negative price)
    #[error("{kind} constraint violated: {detail}")]
    ConstraintViolation { kind: ConstraintKind, detail: String },

    /// The backing store is unreachable.
    ///
    /// ## When This Occurs
    /// - Database file can't be opened or created
    /// - Pool closed, or no connection freed up within the acquire timeout
    /// - I/O failure talking to the database
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The call's deadline passed before the operation finished.
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// The caller's cancellation token fired before the operation finished.
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    /// Optimistic-concurrency check failed on update.
    ///
    /// The row exists, but its version no longer matches the one the caller
    /// read. Only raised for versioned entities.
    #[error("{entity} {id} was modified concurrently (expected version {expected_version})")]
    SerializationConflict {
        entity: &'static str,
        id: i64,
        expected_version: i64,
    },

    /// An update targeted an identifier with no row behind it.
    ///
    /// ## When This Occurs
    /// - The row was deleted after the caller loaded it
    /// - The caller fabricated an identifier
    #[error("{entity} {id} no longer exists")]
    StaleEntity { entity: &'static str, id: i64 },

    /// Migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Any other database-reported failure.
    #[error("Query failed: {0}")]
    Query(String),

    /// Internal error (row decoding, driver bugs).
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a ConstraintViolation error.
    pub fn constraint(kind: ConstraintKind, detail: impl Into<String>) -> Self {
        StoreError::ConstraintViolation {
            kind,
            detail: detail.into(),
        }
    }

    /// Returns true for deadline and cancellation aborts.
    pub fn is_aborted(&self) -> bool {
        matches!(self, StoreError::Timeout { .. } | StoreError::Cancelled { .. })
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → ConstraintViolation by kind(), else Query
/// sqlx::Error::PoolTimedOut   → Connection (pool exhausted)
/// sqlx::Error::PoolClosed     → Connection
/// sqlx::Error::Io / Tls       → Connection
/// Other                       → Internal
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let detail = db_err.message().to_string();
                match db_err.kind() {
                    sqlx::error::ErrorKind::UniqueViolation => {
                        StoreError::constraint(ConstraintKind::Unique, detail)
                    }
                    sqlx::error::ErrorKind::ForeignKeyViolation => {
                        StoreError::constraint(ConstraintKind::ForeignKey, detail)
                    }
                    sqlx::error::ErrorKind::NotNullViolation => {
                        StoreError::constraint(ConstraintKind::NotNull, detail)
                    }
                    sqlx::error::ErrorKind::CheckViolation => {
                        StoreError::constraint(ConstraintKind::Check, detail)
                    }
                    _ => StoreError::Query(detail),
                }
            }

            sqlx::Error::PoolTimedOut => {
                StoreError::Connection("Connection pool exhausted".to_string())
            }

            sqlx::Error::PoolClosed => StoreError::Connection("Pool is closed".to_string()),

            sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),

            sqlx::Error::Tls(e) => StoreError::Connection(e.to_string()),

            sqlx::Error::Configuration(e) => StoreError::Connection(e.to_string()),

            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
