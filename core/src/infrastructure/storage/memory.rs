// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory file store for tests and ephemeral servers.
//!
//! Optional byte budgets make writes past the limit fail, or make a read fail
//! once that many bytes of a file have been served. Tests use them to drive
//! the upload and download failure paths without a real disk.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

use crate::domain::file::{FileMetadata, FileName};
use crate::domain::storage::{FileStore, ReadHandle, StorageError, WriteHandle};

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    modified: DateTime<Local>,
}

#[derive(Default)]
struct State {
    files: HashMap<String, MemoryFile>,
    written: u64,
}

#[derive(Clone, Default)]
pub struct InMemoryFileStore {
    state: Arc<Mutex<State>>,
    write_limit: Option<u64>,
    read_limit: Option<u64>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that fails any write once `limit` bytes in total have been written.
    pub fn with_write_limit(limit: u64) -> Self {
        Self {
            write_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Store whose readers fail after serving `limit` bytes of any file.
    pub fn with_read_limit(limit: u64) -> Self {
        Self {
            read_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Snapshot of a stored file.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(name).map(|f| f.content.clone())
    }

    pub fn insert(&self, name: &str, content: impl Into<Vec<u8>>) {
        self.state.lock().files.insert(
            name.to_string(),
            MemoryFile {
                content: content.into(),
                modified: Local::now(),
            },
        );
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn list(&self) -> Result<Vec<FileMetadata>, StorageError> {
        let state = self.state.lock();
        Ok(state
            .files
            .iter()
            .map(|(name, file)| FileMetadata::from_modified(name.clone(), file.modified))
            .collect())
    }

    async fn open_for_append(&self, name: &FileName) -> Result<WriteHandle, StorageError> {
        self.state
            .lock()
            .files
            .entry(name.as_str().to_string())
            .or_insert_with(|| MemoryFile {
                content: Vec::new(),
                modified: Local::now(),
            });

        Ok(Box::new(MemoryWriter {
            name: name.as_str().to_string(),
            state: self.state.clone(),
            write_limit: self.write_limit,
        }))
    }

    async fn open_for_read(&self, name: &FileName) -> Result<ReadHandle, StorageError> {
        let content = self
            .contents(name.as_str())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;

        match self.read_limit {
            Some(limit) if (limit as usize) < content.len() => {
                let served = content[..limit as usize].to_vec();
                Ok(Box::new(io::Cursor::new(served).chain(FailingReader)))
            }
            _ => Ok(Box::new(io::Cursor::new(content))),
        }
    }
}

struct MemoryWriter {
    name: String,
    state: Arc<Mutex<State>>,
    write_limit: Option<u64>,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut state = self.state.lock();

        if let Some(limit) = self.write_limit {
            if state.written + buf.len() as u64 > limit {
                return Poll::Ready(Err(io::Error::other("storage full")));
            }
        }
        state.written += buf.len() as u64;

        let file = state.files.entry(self.name.clone()).or_insert_with(|| MemoryFile {
            content: Vec::new(),
            modified: Local::now(),
        });
        file.content.extend_from_slice(buf);
        file.modified = Local::now();

        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("read failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn name(s: &str) -> FileName {
        FileName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_append_and_read() {
        let store = InMemoryFileStore::new();
        let mut w = store.open_for_append(&name("x")).await.unwrap();
        w.write_all(b"abc").await.unwrap();
        let mut w = store.open_for_append(&name("x")).await.unwrap();
        w.write_all(b"def").await.unwrap();

        let mut r = store.open_for_read(&name("x")).await.unwrap();
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"abcdef");
    }

    #[tokio::test]
    async fn test_write_limit() {
        let store = InMemoryFileStore::with_write_limit(4);
        let mut w = store.open_for_append(&name("x")).await.unwrap();
        w.write_all(b"abcd").await.unwrap();
        assert!(w.write_all(b"e").await.is_err());
        assert_eq!(store.contents("x").unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn test_read_limit() {
        let store = InMemoryFileStore::with_read_limit(3);
        store.insert("x", b"abcdef".to_vec());

        let mut r = store.open_for_read(&name("x")).await.unwrap();
        let mut buf = Vec::new();
        assert!(r.read_to_end(&mut buf).await.is_err());
        assert_eq!(buf, b"abc");
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let store = InMemoryFileStore::new();
        assert!(matches!(
            store.open_for_read(&name("nope")).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
