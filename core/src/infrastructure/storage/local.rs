// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem File Store
//!
//! One flat directory, one file per name, no sidecar metadata. Listing
//! timestamps come from filesystem attributes at query time.
//!
//! **Limitations:**
//! - No portable creation time: `created` mirrors the modification time
//! - Concurrent appends to one name are only ordered if the caller serializes
//!   them (see `crate::domain::name_lock`)

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;

use crate::domain::file::{FileMetadata, FileName};
use crate::domain::storage::{FileStore, ReadHandle, StorageError, WriteHandle};

/// Local filesystem file store rooted at one directory.
pub struct LocalFileStore {
    /// Storage root (e.g., "./uploaded_files")
    root: PathBuf,
}

impl LocalFileStore {
    /// Create the store, creating `root` if it does not exist.
    ///
    /// Fails if the root cannot be created or is not writable.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(format!(
                "Failed to create storage root {}: {}",
                root.display(),
                e
            ))
        })?;

        let store = Self { root };
        store.probe_writable()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &FileName) -> PathBuf {
        self.root.join(name.as_str())
    }

    fn probe_writable(&self) -> Result<(), StorageError> {
        let test_file = self.root.join(".filevault-write-test");
        std::fs::write(&test_file, b"test").map_err(|e| {
            StorageError::IoError(format!(
                "Storage root {} is not writable: {}",
                self.root.display(),
                e
            ))
        })?;
        std::fs::remove_file(&test_file)
            .map_err(|e| StorageError::IoError(format!("Failed to cleanup test file: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn list(&self) -> Result<Vec<FileMetadata>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            StorageError::IoError(format!("Failed to list {}: {}", self.root.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::IoError(format!("Failed to read directory entry: {}", e)))?
        {
            // Follows symlinks so a linked file lists like a regular one.
            let metadata = tokio::fs::metadata(entry.path())
                .await
                .map_err(|e| StorageError::IoError(format!("Failed to get metadata: {}", e)))?;

            if metadata.is_dir() {
                continue;
            }

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(name = ?raw, "Skipping non UTF-8 file name");
                    continue;
                }
            };

            let modified: DateTime<Local> = metadata
                .modified()
                .map_err(|e| StorageError::IoError(format!("{}: {}", name, e)))?
                .into();

            files.push(FileMetadata::from_modified(name, modified));
        }

        Ok(files)
    }

    async fn open_for_append(&self, name: &FileName) -> Result<WriteHandle, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.resolve(name))
            .await
            .map_err(|e| {
                StorageError::IoError(format!("Failed to open {} for append: {}", name, e))
            })?;
        Ok(Box::new(file))
    }

    async fn open_for_read(&self, name: &FileName) -> Result<ReadHandle, StorageError> {
        let path = self.resolve(name);
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| StorageError::from_io(name.as_str(), e))?;

        let metadata = file
            .metadata()
            .await
            .map_err(|e| StorageError::from_io(name.as_str(), e))?;
        if metadata.is_dir() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        Ok(Box::new(file))
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        if !self.root.exists() {
            return Err(StorageError::IoError(format!(
                "Storage root {} does not exist",
                self.root.display()
            )));
        }
        self.probe_writable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn name(s: &str) -> FileName {
        FileName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_creates_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("files");
        let store = LocalFileStore::new(&root).unwrap();
        assert!(store.root().is_dir());
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_append_twice_keeps_prior_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path()).unwrap();

        let mut w = store.open_for_append(&name("log.txt")).await.unwrap();
        w.write_all(b"hello ").await.unwrap();
        w.flush().await.unwrap();
        drop(w);

        let mut w = store.open_for_append(&name("log.txt")).await.unwrap();
        w.write_all(b"world").await.unwrap();
        w.flush().await.unwrap();
        drop(w);

        let content = std::fs::read(temp_dir.path().join("log.txt")).unwrap();
        assert_eq!(content, b"hello world");
    }

    #[tokio::test]
    async fn test_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path()).unwrap();
        std::fs::write(temp_dir.path().join("data.bin"), [1u8, 2, 3]).unwrap();

        let mut r = store.open_for_read(&name("data.bin")).await.unwrap();
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path()).unwrap();

        let result = store.open_for_read(&name("missing")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_read_directory_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path()).unwrap();
        std::fs::create_dir(temp_dir.path().join("subdir")).unwrap();

        let result = store.open_for_read(&name("subdir")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path()).unwrap();

        std::fs::write(temp_dir.path().join("a"), b"1").unwrap();
        std::fs::write(temp_dir.path().join("b"), b"2").unwrap();
        std::fs::create_dir(temp_dir.path().join("dir")).unwrap();
        std::fs::write(temp_dir.path().join("dir").join("nested"), b"3").unwrap();

        let mut names: Vec<_> = store.list().await.unwrap().into_iter().map(|m| m.name).collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_list_timestamps_formatted() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path()).unwrap();
        std::fs::write(temp_dir.path().join("a"), b"1").unwrap();

        let files = store.list().await.unwrap();
        assert_eq!(files.len(), 1);
        let created = files[0].created_display();
        assert_eq!(created.len(), "YYYY-MM-DD HH:MM:SS".len());
        assert_eq!(created, files[0].updated_display());
    }
}
