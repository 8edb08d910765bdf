//! Key-value persistence for the ledger and the monitor heartbeat.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The backing document could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String values keyed by string. Implementations must be safe to share
/// across tasks; calls are synchronous and short.
pub trait KeyValueStore: Send + Sync {
    /// Reads `key`.
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns error if the write cannot be committed.
    fn put(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Deletes `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    /// Returns error if the delete cannot be committed.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}
