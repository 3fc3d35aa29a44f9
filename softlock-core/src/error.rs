use crate::types::LeaseId;

/// Failures raised by a lease store backend.
///
/// The engine never retries these; they are handed back to the caller, who
/// decides whether to retry the whole operation later.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store cannot be reached or used
    #[error("lease store unavailable: {0}")]
    Unavailable(String),

    /// A row would break a lease table constraint
    #[error("lease constraint violated: {0}")]
    ConstraintViolation(String),

    /// The row to update vanished concurrently
    #[error("lease {0} not found")]
    NotFound(LeaseId),

    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("lease duration must be a positive number of minutes, got {0}")]
    InvalidLeaseDuration(u64),
}
