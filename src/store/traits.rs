//! `KeyValueStore`: the storage port every tour persistence goes through.
//!
//! Values are opaque text; callers serialize at the boundary.

use crate::error::StorageError;

/// Backend-agnostic key-value store.
///
/// Implementations must be cheap to call from synchronous transition code.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;
}
