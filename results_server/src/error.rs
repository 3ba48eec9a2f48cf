//! Error taxonomy for result ingestion.
//!
//! `StoreError` is what a store backend reports; `IngestError` is the
//! closed set the ingestion pipeline surfaces to the HTTP boundary.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// The uploaded document is not a usable JUnit XML document.
///
/// Carries no detail on purpose: the parser logs the cause and the client
/// only ever sees the generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid JUnit XML format")]
pub struct InvalidInputError;

/// Low-level failure reported by a [`crate::store::ResultStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    UniqueViolation(String),
    #[error("{0}")]
    ForeignKeyViolation(String),
    #[error("{0}")]
    CheckViolation(String),
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Database(String),
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => {
                    Self::UniqueViolation(info.message().to_string())
                }
                DatabaseErrorKind::ForeignKeyViolation => {
                    Self::ForeignKeyViolation(info.message().to_string())
                }
                DatabaseErrorKind::CheckViolation | DatabaseErrorKind::NotNullViolation => {
                    Self::CheckViolation(info.message().to_string())
                }
                DatabaseErrorKind::ClosedConnection => {
                    Self::Unavailable(info.message().to_string())
                }
                _ => Self::Database(info.message().to_string()),
            },
            DieselError::BrokenTransactionManager => {
                Self::Unavailable("broken transaction manager".to_string())
            }
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for StoreError {
    fn from(err: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Storage failure as seen by the ingestion pipeline.
///
/// The display text is what the boundary returns in the response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The run row could not be written; no failure rows were attempted.
    #[error("Failed to insert test run: {0}")]
    CreateFailed(String),
    /// The failure batch was rejected and rolled back; the run row remains.
    #[error("Failed to store test results: {0}")]
    Conflict(String),
    /// The store could not be reached.
    #[error("Database not reachable: {0}")]
    Unreachable(String),
}

impl StorageError {
    /// Classify a store error raised while creating the run row.
    pub fn on_create(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::Unreachable(msg),
            other => Self::CreateFailed(other.to_string()),
        }
    }

    /// Classify a store error raised while inserting the failure batch.
    pub fn on_batch(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::Unreachable(msg),
            other => Self::Conflict(other.to_string()),
        }
    }
}

/// Every way an upload can fail once it reaches the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
