// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Infrastructure Module
//!
//! Concrete implementations of the `FileStore` trait.

pub mod local;
pub mod memory;

pub use local::LocalFileStore;
pub use memory::InMemoryFileStore;

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::storage::{FileStore, StorageError};

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Flat directory on the local filesystem
    Local { root: PathBuf },

    /// Process memory; contents vanish on shutdown
    Memory,
}

/// Factory function to create a file store from configuration
pub fn create_file_store(backend: StorageBackend) -> Result<Arc<dyn FileStore>, StorageError> {
    match backend {
        StorageBackend::Local { root } => Ok(Arc::new(LocalFileStore::new(root)?)),
        StorageBackend::Memory => Ok(Arc::new(InMemoryFileStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_local() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let store = create_file_store(StorageBackend::Local {
            root: temp_dir.path().join("files"),
        })
        .unwrap();

        store.health_check().await.unwrap();
        assert!(temp_dir.path().join("files").is_dir());
    }

    #[tokio::test]
    async fn test_factory_memory() {
        let store = create_file_store(StorageBackend::Memory).unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
