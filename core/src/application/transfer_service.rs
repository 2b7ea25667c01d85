// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Transfer Application Service
//!
//! Orchestrates the three protocol operations, coordinating:
//! - Admission: one slot per call, from the list or transfer pool
//! - Name locks: same-name uploads run one at a time (when enabled)
//! - File store: enumerate, append, sequential read
//! - Upload ledger: success records keyed by resolved name
//!
//! Per-call state machines:
//!
//! | Operation | States |
//! |-----------|--------|
//! | List | Idle → Admitted → Enumerating → Completed \| Rejected |
//! | Upload | Idle → Admitted → Receiving → Finalizing → Completed \| Rejected \| Failed |
//! | Download | Idle → Admitted → Streaming → Completed \| Rejected \| Failed |
//!
//! Admission is always the first step, so a rejected call never touches the
//! store. Every slot is owned by the call (or, for Download, by the returned
//! stream) and returns to its pool when that owner is dropped.

use async_stream::stream;
use async_trait::async_trait;
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::application::upload_ledger::{UploadLedger, UploadRecord};
use crate::domain::admission::{AdmissionController, AdmissionError, Pool};
use crate::domain::chunk::{read_chunks, FileChunk, DEFAULT_CHUNK_SIZE};
use crate::domain::error::ErrorKind;
use crate::domain::file::{FileMetadata, FileName};
use crate::domain::name_lock::NameLocks;
use crate::domain::path_sanitizer::PathSanitizerError;
use crate::domain::storage::{FileStore, StorageError, WriteHandle};

/// Name an upload resolves to when the caller does not supply one.
pub const DEFAULT_UPLOAD_NAME: &str = "uploaded_file";

/// Ordered chunk stream flowing into or out of the service.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<FileChunk, TransferError>> + Send>>;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    ResourceExhausted(#[from] AdmissionError),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidName(#[from] PathSanitizerError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upload of '{name}' failed after {written} bytes: {reason}")]
    Failed {
        name: String,
        written: u64,
        reason: String,
    },
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            TransferError::NotFound(_) => ErrorKind::NotFound,
            TransferError::InvalidName(_) | TransferError::Storage(_) => ErrorKind::Storage,
            TransferError::Transport(_) => ErrorKind::Transport,
            TransferError::Failed { .. } => ErrorKind::Failed,
        }
    }
}

impl From<StorageError> for TransferError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => TransferError::NotFound(name),
            StorageError::InvalidName(e) => TransferError::InvalidName(e),
            StorageError::IoError(msg) => TransferError::Storage(msg),
        }
    }
}

/// Upload destination exactly as the caller sent it.
///
/// Decoding and validation happen inside [`TransferService::upload`], after
/// admission, so a rejected call never inspects the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedName {
    /// No name supplied; resolves to [`DEFAULT_UPLOAD_NAME`].
    Unspecified,
    Bytes(Vec<u8>),
    /// The carrier could not be decoded at all.
    Malformed(String),
}

impl From<&str> for RequestedName {
    fn from(name: &str) -> Self {
        RequestedName::Bytes(name.as_bytes().to_vec())
    }
}

impl From<String> for RequestedName {
    fn from(name: String) -> Self {
        RequestedName::Bytes(name.into_bytes())
    }
}

/// Outcome of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub name: String,
    pub bytes: u64,
    pub chunks: u64,
}

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait TransferService: Send + Sync {
    /// Enumerate every stored file. All-or-nothing: no partial listings.
    async fn list(&self) -> Result<Vec<FileMetadata>, TransferError>;

    /// Append `chunks` to `name` (or [`DEFAULT_UPLOAD_NAME`]) in arrival order.
    async fn upload(
        &self,
        name: RequestedName,
        chunks: ChunkStream,
    ) -> Result<UploadReceipt, TransferError>;

    /// Open `name` and stream it back in chunks.
    ///
    /// The returned stream holds the transfer slot until it is exhausted or
    /// dropped.
    async fn download(&self, name: &str) -> Result<ChunkStream, TransferError>;
}

// ============================================================================
// Standard Implementation
// ============================================================================

pub struct StandardTransferService {
    store: Arc<dyn FileStore>,
    admission: Arc<AdmissionController>,
    name_locks: Option<NameLocks>,
    ledger: Arc<UploadLedger>,
    chunk_size: usize,
}

impl StandardTransferService {
    pub fn new(store: Arc<dyn FileStore>, admission: Arc<AdmissionController>) -> Self {
        Self {
            store,
            admission,
            name_locks: Some(NameLocks::new()),
            ledger: Arc::new(UploadLedger::new()),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Serialize same-name uploads (`true`) or let their appends interleave.
    pub fn with_serialized_writes(mut self, enabled: bool) -> Self {
        self.name_locks = enabled.then(NameLocks::new);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<UploadLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn ledger(&self) -> &Arc<UploadLedger> {
        &self.ledger
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    fn resolve_name(name: RequestedName) -> Result<FileName, TransferError> {
        let raw = match name {
            RequestedName::Unspecified => DEFAULT_UPLOAD_NAME.to_string(),
            RequestedName::Bytes(bytes) if bytes.is_empty() => DEFAULT_UPLOAD_NAME.to_string(),
            RequestedName::Bytes(bytes) => String::from_utf8(bytes).map_err(|_| {
                PathSanitizerError::InvalidName("name is not valid UTF-8".to_string())
            })?,
            RequestedName::Malformed(reason) => {
                return Err(PathSanitizerError::InvalidName(reason).into());
            }
        };
        Ok(FileName::parse(&raw)?)
    }
}

#[async_trait]
impl TransferService for StandardTransferService {
    async fn list(&self) -> Result<Vec<FileMetadata>, TransferError> {
        let _slot = self.admission.try_acquire(Pool::List)?;

        let files = self.store.list().await.map_err(|e| {
            error!(error = %e, "Failed to list files");
            TransferError::from(e)
        })?;

        debug!(count = files.len(), "Listed files");
        Ok(files)
    }

    async fn upload(
        &self,
        name: RequestedName,
        mut chunks: ChunkStream,
    ) -> Result<UploadReceipt, TransferError> {
        let _slot = self.admission.try_acquire(Pool::Transfer)?;
        let name = Self::resolve_name(name)?;

        let _name_guard = match &self.name_locks {
            Some(locks) => Some(locks.lock(&name).await),
            None => None,
        };

        info!(file_name = %name, "Upload started");

        // The target is created by the first chunk, not by an empty stream.
        let mut writer: Option<WriteHandle> = None;
        let mut written = 0u64;
        let mut received = 0u64;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.inspect_err(|e| {
                error!(file_name = %name, chunks = received, error = %e, "Upload stream broke");
            })?;
            received += 1;

            if chunk.is_empty() {
                continue;
            }

            if writer.is_none() {
                let handle = self.store.open_for_append(&name).await.map_err(|e| {
                    error!(file_name = %name, error = %e, "Failed to open upload target");
                    TransferError::from(e)
                })?;
                writer = Some(handle);
            }

            if let Some(handle) = writer.as_mut() {
                if let Err(e) = handle.write_all(&chunk.content).await {
                    error!(file_name = %name, written, error = %e, "Upload write failed");
                    return Err(TransferError::Failed {
                        name: name.to_string(),
                        written,
                        reason: e.to_string(),
                    });
                }
                written += chunk.len() as u64;
            }
        }

        if let Some(mut handle) = writer {
            if let Err(e) = handle.shutdown().await {
                error!(file_name = %name, written, error = %e, "Upload flush failed");
                return Err(TransferError::Failed {
                    name: name.to_string(),
                    written,
                    reason: e.to_string(),
                });
            }
        }

        self.ledger.record(UploadRecord {
            name: name.to_string(),
            bytes: written,
            chunks: received,
            completed_at: Utc::now(),
        });

        info!(file_name = %name, chunks = received, bytes = written, "Upload completed");
        Ok(UploadReceipt {
            name: name.to_string(),
            bytes: written,
            chunks: received,
        })
    }

    async fn download(&self, name: &str) -> Result<ChunkStream, TransferError> {
        let slot = self.admission.try_acquire(Pool::Transfer)?;
        let name = FileName::parse(name)?;

        let reader = self.store.open_for_read(&name).await.map_err(|e| {
            debug!(file_name = %name, error = %e, "Download target unavailable");
            TransferError::from(e)
        })?;

        info!(file_name = %name, "Download started");
        let chunk_size = self.chunk_size;

        let stream = stream! {
            let _slot = slot;
            let chunks = read_chunks(reader, chunk_size);
            futures::pin_mut!(chunks);
            let mut sent = 0u64;
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(chunk) => {
                        sent += chunk.len() as u64;
                        yield Ok(chunk);
                    }
                    Err(e) => {
                        error!(file_name = %name, bytes = sent, error = %e, "Download read failed");
                        yield Err(TransferError::Storage(format!("{}: {}", name, e)));
                        return;
                    }
                }
            }
            info!(file_name = %name, bytes = sent, "Download completed");
        };

        Ok(Box::pin(stream))
    }
}
