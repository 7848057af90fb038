//! Pooled database access: single-statement queries and all-or-nothing
//! transactions over a bounded PostgreSQL connection pool.
//!
//! The pool is owned by a constructed [`Store`] handle rather than ambient
//! global state. A connection is leased to exactly one logical operation at a
//! time and is returned to the pool on every exit path; `sqlx::Transaction`
//! rolls back on drop, so an abandoned call cannot leak a lease.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::config::AppConfig;

/// Errors surfaced by the store. Statement failures always carry the
/// original driver error; nothing is swallowed.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The pool stayed exhausted past the configured acquisition timeout.
    /// Recoverable: callers may retry with backoff.
    #[error("timed out waiting for a database connection")]
    AcquisitionTimeout(#[source] sqlx::Error),

    /// A statement failed to execute (constraint violation, connectivity
    /// loss, syntax).
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Rollback itself failed after a business failure. The connection is
    /// in an unknown state and is closed instead of returning to the pool.
    #[error("rollback failed, connection discarded: {0}")]
    Transaction(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::PoolTimedOut) {
            Self::AcquisitionTimeout(err)
        } else {
            Self::Query(err)
        }
    }
}

impl DbError {
    /// True when the underlying statement hit a unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Query(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

/// Typed bind value for a parameterized statement. Values are always bound,
/// never interpolated into statement text.
#[derive(Debug, Clone)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
    Date(NaiveDate),
    Null,
}

/// Future returned by a transaction body.
pub type TxFuture<'t, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 't>>;

/// Handle to the connection pool. Cheap to clone; all clones share the
/// same pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
    log_queries: bool,
}

impl Store {
    /// Build the pool from configuration. Connection count, idle eviction,
    /// and acquisition wait are all bounded at construction.
    pub async fn connect(config: &AppConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .idle_timeout(Duration::from_secs(config.database_idle_timeout_secs))
            .acquire_timeout(Duration::from_millis(config.database_acquire_timeout_ms))
            .connect(&config.database_url)
            .await?;

        Ok(Self {
            pool,
            log_queries: config.environment.is_development(),
        })
    }

    /// Execute one parameterized statement and return all rows. Blocks only
    /// while acquiring a connection, bounded by the acquire timeout; the
    /// connection goes back to the pool whether the statement succeeds or
    /// fails.
    pub async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<PgRow>, DbError> {
        let started = Instant::now();

        let mut stmt = sqlx::query(sql);
        for param in params {
            stmt = match param {
                SqlParam::Text(v) => stmt.bind(v.clone()),
                SqlParam::Int(v) => stmt.bind(*v),
                SqlParam::Bool(v) => stmt.bind(*v),
                SqlParam::Uuid(v) => stmt.bind(*v),
                SqlParam::Date(v) => stmt.bind(*v),
                SqlParam::Null => stmt.bind(None::<String>),
            };
        }

        let result = stmt.fetch_all(&self.pool).await.map_err(DbError::from);

        if self.log_queries {
            tracing::debug!(
                sql,
                elapsed_ms = started.elapsed().as_millis() as u64,
                rows = result.as_ref().map(Vec::len).unwrap_or(0),
                ok = result.is_ok(),
                "query executed"
            );
        }

        result
    }

    /// Run `work` inside a single transaction: all statements it issues on
    /// the supplied handle commit together or not at all.
    ///
    /// On `Ok` the transaction commits; on `Err` it rolls back and the
    /// original error is re-raised. A failed rollback surfaces as
    /// [`DbError::Transaction`] and the connection is discarded. In every
    /// case the lease is released exactly once.
    pub async fn run_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> TxFuture<'t, T, E>,
    {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        match work(&mut tx).await {
            Ok(value) => {
                // A failed commit cannot be rolled back explicitly; sqlx
                // closes the connection rather than returning it dirty.
                tx.commit().await.map_err(DbError::Query)?;
                Ok(value)
            }
            Err(err) => {
                tx.rollback().await.map_err(DbError::Transaction)?;
                Err(err)
            }
        }
    }

    /// Round-trip to the server, returning its clock. Used at startup and
    /// by the readiness probe.
    pub async fn ping(&self) -> Result<DateTime<Utc>, DbError> {
        let now = sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()")
            .fetch_one(&self.pool)
            .await?;
        Ok(now)
    }

    /// Close the pool, waiting for leased connections to drain.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// The underlying pool, exposed for integration tests and probes.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_maps_to_acquisition_timeout() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::AcquisitionTimeout(_)));
    }

    #[test]
    fn other_sqlx_errors_map_to_query() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Query(_)));
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn error_messages_name_the_failure() {
        let timeout = DbError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(
            timeout.to_string(),
            "timed out waiting for a database connection"
        );

        let query = DbError::Query(sqlx::Error::RowNotFound);
        assert!(query.to_string().starts_with("query failed"));
    }

    #[test]
    fn sql_param_is_cloneable_for_retry() {
        let params = vec![
            SqlParam::Text("abc".into()),
            SqlParam::Int(7),
            SqlParam::Null,
        ];
        let again = params.clone();
        assert_eq!(params.len(), again.len());
    }
}
