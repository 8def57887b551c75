pub mod classify;
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod retry;
pub mod store;

use thiserror::Error;

pub use classify::{classify, StoreErrorKind};
pub use memory::MemoryStore;
pub use pool::{create_pool, probe_connection};
pub use postgres::PgStore;
pub use retry::{with_retry, QueryExecutor, RetryPolicy};
pub use store::{QuestionStore, Store, SubjectStore, UserStore};

/// Data layer error, already classified
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transient failure that survived every retry
    #[error("Database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// Unique constraint rejected the write (constraint name)
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Query(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match classify(&err) {
            StoreErrorKind::Transient => StoreError::Unavailable(err),
            StoreErrorKind::UniqueViolation => {
                let constraint = err
                    .as_database_error()
                    .and_then(|e| e.constraint())
                    .unwrap_or("unique")
                    .to_string();
                StoreError::UniqueViolation(constraint)
            }
            StoreErrorKind::Permanent => StoreError::Query(err),
        }
    }
}

/// Result type alias for data layer operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sqlx_error() {
        assert!(StoreError::from(sqlx::Error::PoolTimedOut).is_transient());
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Query(_)
        ));
    }
}
