// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File Store Trait - Anti-Corruption Layer for the backing medium
//!
//! The transfer service only sees this trait. Concrete stores live in
//! `crate::infrastructure::storage` (local filesystem, in-memory).

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::domain::file::{FileMetadata, FileName};
use crate::domain::path_sanitizer::PathSanitizerError;

/// Append-positioned writer for one stored file.
pub type WriteHandle = Box<dyn AsyncWrite + Send + Unpin>;

/// Sequential reader for one stored file.
pub type ReadHandle = Box<dyn AsyncRead + Send + Unpin>;

/// File store abstracting the persistent medium.
///
/// Implementations must keep every name a direct child of their root; names
/// arrive pre-validated as [`FileName`].
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Enumerate direct entries of the root, excluding directories.
    ///
    /// Order is whatever the medium enumerates; callers must not rely on it.
    async fn list(&self) -> Result<Vec<FileMetadata>, StorageError>;

    /// Open `name` for appending, creating it if absent.
    ///
    /// Calling this repeatedly for the same name never truncates.
    async fn open_for_append(&self, name: &FileName) -> Result<WriteHandle, StorageError>;

    /// Open `name` for sequential reading.
    ///
    /// # Returns
    /// * `Err(StorageError::NotFound)` if the name does not exist
    async fn open_for_read(&self, name: &FileName) -> Result<ReadHandle, StorageError>;

    /// Check that the medium is reachable and writable.
    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(#[from] PathSanitizerError),

    #[error("IO error: {0}")]
    IoError(String),
}

impl StorageError {
    /// Map an I/O error on `name`, keeping `NotFound` distinct.
    pub fn from_io(name: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::IoError(format!("{}: {}", name, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_keeps_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(StorageError::from_io("a", err), StorageError::NotFound(n) if n == "a"));

        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(StorageError::from_io("a", err), StorageError::IoError(_)));
    }
}
