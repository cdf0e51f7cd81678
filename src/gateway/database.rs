use std::fmt::Display;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::{info, instrument, warn};

use super::StoreError;
use crate::config::DatabaseConfig;

const SCHEMA: &str = include_str!("schema.sql");

/// Owner of the bounded connection pool.
///
/// Constructed once by the composition root and handed to every client by clone;
/// all clones share the same pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool, creates missing tables and probes the connection.
    #[instrument(name = "database_open", skip(config), fields(url = %config.url))]
    pub async fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout);

        let pool_options = if config.is_in_memory() {
            // Each in-memory connection is its own database: keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            // Readers keep going while a writer holds the lock.
            options = options.journal_mode(SqliteJournalMode::Wal);
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        let database = Self { pool };
        database.init_schema().await?;
        database.ping().await?;
        Ok(database)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Liveness probe: `SELECT 1 + 1`.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let result: i64 = sqlx::query_scalar("SELECT 1 + 1").fetch_one(&self.pool).await?;
        info!(result, "Database connection established");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Acquires a dedicated connection and opens a write transaction on it.
    ///
    /// The write lock is taken up front (`BEGIN IMMEDIATE`), so concurrent
    /// writers queue on the busy timeout instead of failing when a deferred
    /// read lock would have to be upgraded.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}

/// Commits `tx` when `outcome` is `Ok`, rolls it back otherwise.
///
/// The connection goes back to the pool when `tx` is dropped at the end of this
/// call, whichever branch ran.
pub async fn settle<T, E>(tx: Transaction<'static, Sqlite>, outcome: Result<T, E>) -> Result<T, E>
where
    E: From<sqlx::Error> + Display,
{
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "Rolling back transaction");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
