pub mod money;
pub mod repository;

pub use money::Money;
pub use repository::{PickupStore, TransitionSink, WorkItemStore};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Sink unavailable: {0}")]
    SinkUnavailable(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    /// Storage and sink failures can be retried with the same idempotent key
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StorageError(_) | CoreError::SinkUnavailable(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
