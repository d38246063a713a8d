pub mod filesystem;

use std::fmt;

use crate::error::StorageError;
use crate::sanitize::safe_file_name;

pub use filesystem::LocalByteStore;

/// Opaque handle to bytes held by a [`ByteStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredRef(String);

impl StoredRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoredRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where uploaded bytes live between submission and processing.
pub trait ByteStore: Send + Sync {
    fn save(&self, bytes: &[u8], name: &str) -> Result<StoredRef, StorageError>;
    fn read(&self, stored: &StoredRef) -> Result<Vec<u8>, StorageError>;
}

/// `<job id>-<original name>` with whitespace runs replaced by `_` and path
/// separators removed.
pub fn stored_file_name(job_id: &str, original_name: &str) -> String {
    format!("{}-{}", job_id, safe_file_name(original_name))
}
