pub mod app_config;
pub mod memory_repo;
pub mod redis_repo;
pub mod sync;

pub use app_config::Config;
pub use memory_repo::MemoryStore;
pub use redis_repo::RedisClient;
pub use sync::{DeadLetters, PersistenceWorker, RetryPolicy, SyncCommand, SyncHandle};

use galley_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Redis(e) => CoreError::StorageError(e.to_string()),
            other => CoreError::InternalError(other.to_string()),
        }
    }
}
