//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Service startup                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ One connection per store call, released when the call ends     │
//! │       ▼                                                                 │
//! │  db.orders().save(..)    ──► uses Conn1                                │
//! │  db.products().count()   ──► uses Conn2                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases run in WAL (Write-Ahead Logging) mode:
//! - Readers don't block writers
//! - Writers don't block readers

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use padre_core::{Order, Product};

use crate::error::{StoreError, StoreResult};
use crate::guard::CallGuard;
use crate::migrations;
use crate::repository::{Entity, SqliteStore};
use crate::session::Session;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/padre.db")
///     .max_connections(5)
///     .operation_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long a call waits for a free connection before failing with
    /// `StoreError::Connection`.
    /// Default: 30 seconds
    pub acquire_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps them open.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Default per-call timeout for every store handed out by the database.
    /// Default: none
    pub operation_timeout: Option<Duration>,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            operation_timeout: None,
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets how long to wait for a pooled connection.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Sets the default per-call timeout.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: None, // Closing the last connection drops the data
            operation_timeout: None,
            run_migrations: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(IN_MEMORY)
    }

    fn connect_options(&self) -> StoreResult<SqliteConnectOptions> {
        if self.is_in_memory() {
            return SqliteConnectOptions::from_str("sqlite::memory:")
                .map(|options| options.foreign_keys(true))
                .map_err(|e| StoreError::Connection(e.to_string()));
        }

        let connect_url = format!("sqlite://{}?mode=rwc", self.database_path.display());

        let options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: safe from corruption, may lose last commit on crash
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default
            .foreign_keys(true)
            .create_if_missing(true);

        Ok(options)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing store access.
///
/// Cheap to clone; clones share the pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./padre.db")).await?;
///
/// let order = db.orders().save(Order::new("a@example.com", 1999)).await?;
/// let total = db.products().count().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    /// Default guard copied into every store.
    guard: CallGuard,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite (WAL, NORMAL synchronous, foreign keys on)
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout);
        if config.is_in_memory() {
            pool_options = pool_options.max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let guard = match config.operation_timeout {
            Some(timeout) => CallGuard::none().timeout(timeout),
            None => CallGuard::none(),
        };
        let db = Database { pool, guard };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// Idempotent: safe to run multiple times.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns (total, applied) migration counts.
    pub async fn migration_status(&self) -> StoreResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    ///
    /// For queries outside the entity stores.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the store for any mapped entity type.
    pub fn store<T: Entity>(&self) -> SqliteStore<T> {
        SqliteStore::new(self.pool.clone(), self.guard.clone())
    }

    /// Returns the order store.
    pub fn orders(&self) -> SqliteStore<Order> {
        self.store()
    }

    /// Returns the product store.
    pub fn products(&self) -> SqliteStore<Product> {
        self.store()
    }

    /// Opens a transaction. Dropping the session without committing rolls
    /// it back.
    pub async fn begin(&self) -> StoreResult<Session> {
        let tx = self.pool.begin().await?;
        debug!("Session opened");
        Ok(Session::new(tx))
    }

    /// Runs `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`.
    /// The error from `f` is returned unaltered.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let order = db
    ///     .execute_in_transaction(|session| {
    ///         Box::pin(async move {
    ///             let order = session.save(Order::new("a@example.com", 500)).await?;
    ///             session.save(Product::new("GIFT", "Gift wrap", 0)).await?;
    ///             Ok(order)
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn execute_in_transaction<R, F>(&self, f: F) -> StoreResult<R>
    where
        R: Send,
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, StoreResult<R>> + Send,
    {
        self.guard
            .run("execute_in_transaction", async {
                let mut session = self.begin().await?;

                match f(&mut session).await {
                    Ok(value) => {
                        session.commit().await?;
                        Ok(value)
                    }
                    Err(err) => {
                        if let Err(rollback_err) = session.rollback().await {
                            warn!(error = %rollback_err, "Rollback failed");
                        }
                        Err(err)
                    }
                }
            })
            .await
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all store operations fail with
    /// `StoreError::Connection`.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
