use sqlx::error::ErrorKind;
use thiserror::Error;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Failures surfaced by the relational store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => Self::ConstraintViolation(db_err.message().to_string()),
                _ if db_err.code().is_some_and(|code| is_lock_contention(&code)) => {
                    Self::Unavailable(err.to_string())
                }
                _ => Self::Query(err.to_string()),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            _ => Self::Query(err.to_string()),
        }
    }
}

/// `SQLITE_BUSY*` and `SQLITE_LOCKED*`; extended codes keep the primary code in the low byte.
fn is_lock_contention(code: &str) -> bool {
    code.parse::<i32>()
        .map(|extended| matches!(extended & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::gateway::Database;
    use std::time::Duration;

    #[test]
    fn test_lock_codes_are_contention() {
        assert!(is_lock_contention("5"));
        assert!(is_lock_contention("6"));
        // SQLITE_BUSY_SNAPSHOT, SQLITE_LOCKED_SHAREDCACHE
        assert!(is_lock_contention("517"));
        assert!(is_lock_contention("262"));

        assert!(!is_lock_contention("1"));
        assert!(!is_lock_contention("2067"));
        assert!(!is_lock_contention("busy"));
    }

    #[tokio::test]
    async fn test_locked_database_is_unavailable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = format!("sqlite://{}", dir.path().join("locked.db").display());
        let config = DatabaseConfig {
            busy_timeout: Duration::ZERO,
            ..DatabaseConfig::new(url)
        };
        let db = Database::open(&config).await.unwrap();

        let holder = db.begin().await.unwrap();
        let err = db.begin().await.err().expect("second writer should be refused");
        assert!(matches!(err, StoreError::Unavailable(_)), "{err:?}");

        holder.rollback().await.unwrap();
        db.close().await;
    }
}
