//! Durable store access layer
//!
//! SQLite connection pool (WAL mode) plus a uniform retry wrapper for
//! transient write contention. The store is the sole point of coordination
//! between concurrent handlers; contention is absorbed here by bounded
//! retry, never by application-level locks.

pub mod migrate;
#[cfg(feature = "demo-seed")]
pub mod seed;

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::error::CoreError;

pub use migrate::migrate;

/// SQLite database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) a file-backed database with WAL journaling
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        tracing::info!("SQLite connection pool established");
        Ok(Self { pool })
    }

    /// Open an in-memory database (single connection, used by tests)
    pub async fn connect_in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // One connection only: each in-memory connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Bounded retry with linear backoff for transient store contention
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: step × attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// Errors that may be retried after backoff
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for sqlx::Error {
    fn is_transient(&self) -> bool {
        match self {
            // SQLite primary codes 5 (BUSY) and 6 (LOCKED), plus extended BUSY codes
            sqlx::Error::Database(db) => matches!(
                db.code().as_deref(),
                Some("5") | Some("6") | Some("261") | Some("517") | Some("774")
            ),
            _ => false,
        }
    }
}

impl Transient for CoreError {
    fn is_transient(&self) -> bool {
        matches!(self, CoreError::Store(e) if e.is_transient())
    }
}

/// Run `op` under the retry policy.
///
/// Only transient contention errors are retried; anything else propagates
/// immediately. Exhausting the attempts surfaces the last error unchanged.
/// `op` must be safe to re-run from scratch (a rolled-back transaction
/// re-validates against current persisted state on the next attempt).
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    E: Transient,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                tracing::warn!(attempt, "Store contention, retrying after backoff");
                tokio::time::sleep(policy.backoff(attempt)).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(400));
    }

    #[test]
    fn test_non_database_errors_are_not_transient() {
        assert!(!sqlx::Error::RowNotFound.is_transient());
        assert!(!sqlx::Error::PoolTimedOut.is_transient());
        assert!(!CoreError::TokenNotFound.is_transient());
    }

    #[tokio::test]
    async fn test_with_retry_propagates_non_transient_immediately() {
        let policy = RetryPolicy::default();
        let mut calls = 0u32;
        let result: Result<(), sqlx::Error> = with_retry(&policy, || {
            calls += 1;
            async { Err(sqlx::Error::RowNotFound) }
        })
        .await;

        assert!(matches!(result, Err(sqlx::Error::RowNotFound)));
        assert_eq!(calls, 1, "Non-transient errors must not be retried");
    }

    #[tokio::test]
    async fn test_with_retry_passes_through_success() {
        let policy = RetryPolicy::default();
        let result: Result<u32, sqlx::Error> = with_retry(&policy, || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_connect_in_memory_and_health_check() {
        let db = Database::connect_in_memory().await.unwrap();
        assert!(db.health_check().await.is_ok());
    }
}
