// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Transfer Client
//!
//! Thin wrapper over the generated `FileServiceClient`. Uploads read the local
//! source lazily in fixed-size blocks; downloads write each chunk to the
//! destination as it arrives. No retries: the first transport error ends the
//! operation.

use async_stream::stream;
use futures::StreamExt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::sync::oneshot;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Status};
use tracing::{debug, info, warn};

use crate::domain::chunk::{read_chunks, split, write_chunks, FileChunk, DEFAULT_CHUNK_SIZE};
use crate::domain::error::ErrorKind;
use crate::presentation::grpc::proto;
use crate::presentation::grpc::proto::file_service_client::FileServiceClient;
use crate::presentation::grpc::{FILE_NAME_HEADER, MAX_MESSAGE_SIZE};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("{}", .0.message())]
    Rpc(#[from] Status),

    #[error("local I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid upload name: {0}")]
    InvalidName(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Connect { .. } => ErrorKind::Transport,
            ClientError::Rpc(status) => kind_from_code(status.code()),
            ClientError::Io { .. } | ClientError::InvalidName(_) => ErrorKind::Storage,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        ClientError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Map a gRPC status code back onto the error taxonomy.
pub fn kind_from_code(code: Code) -> ErrorKind {
    match code {
        Code::ResourceExhausted => ErrorKind::ResourceExhausted,
        Code::NotFound => ErrorKind::NotFound,
        Code::InvalidArgument | Code::Internal | Code::PermissionDenied => ErrorKind::Storage,
        Code::Aborted => ErrorKind::Failed,
        _ => ErrorKind::Transport,
    }
}

/// One listed file as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub created: String,
    pub updated: String,
}

/// Terminal reply of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub success: bool,
    pub message: String,
    pub bytes_sent: u64,
}

#[derive(Clone)]
pub struct TransferClient {
    inner: FileServiceClient<Channel>,
    chunk_size: usize,
}

impl TransferClient {
    /// Connect to `endpoint` (`host:port` or a full `http://` URI).
    pub async fn connect(endpoint: &str, connect_timeout: Duration) -> Result<Self, ClientError> {
        let uri = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        let connect_err = |reason: String| ClientError::Connect {
            endpoint: endpoint.to_string(),
            reason,
        };

        let channel = Endpoint::from_shared(uri)
            .map_err(|e| connect_err(e.to_string()))?
            .connect_timeout(connect_timeout)
            .connect()
            .await
            .map_err(|e| connect_err(e.to_string()))?;

        debug!(endpoint, "Connected to FileVault server");
        let inner = FileServiceClient::new(channel)
            .max_decoding_message_size(MAX_MESSAGE_SIZE)
            .max_encoding_message_size(MAX_MESSAGE_SIZE);
        Ok(Self {
            inner,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub async fn list(&self) -> Result<Vec<RemoteFile>, ClientError> {
        let response = self.inner.clone().list_files(proto::Empty {}).await?;
        Ok(response
            .into_inner()
            .files
            .into_iter()
            .map(|f| RemoteFile {
                name: f.name,
                created: f.created,
                updated: f.updated,
            })
            .collect())
    }

    /// Upload the file at `path` as `remote_name`.
    ///
    /// A local read error aborts the call instead of ending the stream, so the
    /// server sees a broken upload and records nothing.
    pub async fn upload(
        &self,
        path: &Path,
        remote_name: &str,
    ) -> Result<UploadOutcome, ClientError> {
        let file = File::open(path).await.map_err(|e| ClientError::io(path, e))?;

        let (failed_tx, failed_rx) = oneshot::channel::<std::io::Error>();
        let chunk_size = self.chunk_size;
        let outbound = stream! {
            let mut failed_tx = Some(failed_tx);
            let chunks = read_chunks(file, chunk_size);
            futures::pin_mut!(chunks);
            while let Some(item) = chunks.next().await {
                match item {
                    Ok(chunk) => {
                        yield chunk_to_proto(chunk);
                    }
                    Err(e) => {
                        if let Some(tx) = failed_tx.take() {
                            let _ = tx.send(e);
                        }
                        // Held open until the call below is dropped.
                        futures::future::pending::<()>().await;
                    }
                }
            }
        };

        info!(file_name = remote_name, path = %path.display(), "Uploading");
        tokio::select! {
            outcome = self.send_upload(remote_name, outbound) => outcome,
            Ok(e) = failed_rx => {
                warn!(file_name = remote_name, error = %e, "Local read failed, upload aborted");
                Err(ClientError::io(path, e))
            }
        }
    }

    /// Upload an in-memory buffer as `remote_name`.
    pub async fn upload_bytes(
        &self,
        remote_name: &str,
        bytes: &[u8],
    ) -> Result<UploadOutcome, ClientError> {
        let chunks: Vec<_> = split(bytes, self.chunk_size).map(chunk_to_proto).collect();
        self.send_upload(remote_name, futures::stream::iter(chunks)).await
    }

    async fn send_upload<S>(
        &self,
        remote_name: &str,
        outbound: S,
    ) -> Result<UploadOutcome, ClientError>
    where
        S: futures::Stream<Item = proto::FileChunk> + Send + 'static,
    {
        if remote_name.is_empty() {
            return Err(ClientError::InvalidName("empty name".to_string()));
        }

        let sent = Arc::new(AtomicU64::new(0));
        let counter = sent.clone();
        let outbound = outbound.inspect(move |chunk| {
            counter.fetch_add(chunk.content.len() as u64, Ordering::Relaxed);
        });

        let mut request = Request::new(outbound);
        request
            .metadata_mut()
            .insert_bin(FILE_NAME_HEADER, MetadataValue::from_bytes(remote_name.as_bytes()));

        let status = self.inner.clone().upload(request).await?.into_inner();
        Ok(UploadOutcome {
            success: status.success,
            message: status.message,
            bytes_sent: sent.load(Ordering::Relaxed),
        })
    }

    /// Download `name` into `out_path`, creating or truncating it.
    ///
    /// The destination is only created once the server has accepted the call,
    /// so a rejected or missing download leaves no local file behind.
    pub async fn download(&self, name: &str, out_path: &Path) -> Result<u64, ClientError> {
        let inbound = self
            .inner
            .clone()
            .download(proto::FileRequest {
                file_name: name.to_string(),
            })
            .await?
            .into_inner();

        let mut file = File::create(out_path)
            .await
            .map_err(|e| ClientError::io(out_path, e))?;

        // Stream errors ride through the sink as io::Error and are unwrapped again below.
        let chunks = inbound.map(|item| {
            item.map(|chunk| FileChunk::new(chunk.content))
                .map_err(std::io::Error::other)
        });
        let received = write_chunks(&mut file, chunks)
            .await
            .map_err(|e| match e.get_ref().and_then(|inner| inner.downcast_ref::<Status>()) {
                Some(status) => ClientError::Rpc(status.clone()),
                None => ClientError::io(out_path, e),
            })?;

        info!(file_name = name, bytes = received, path = %out_path.display(), "Downloaded");
        Ok(received)
    }

    /// Download `name` fully into memory.
    pub async fn download_bytes(&self, name: &str) -> Result<Vec<u8>, ClientError> {
        let mut inbound = self
            .inner
            .clone()
            .download(proto::FileRequest {
                file_name: name.to_string(),
            })
            .await?
            .into_inner();

        let mut out = Vec::new();
        while let Some(chunk) = inbound.message().await? {
            out.extend_from_slice(&chunk.content);
        }
        Ok(out)
    }
}

fn chunk_to_proto(chunk: FileChunk) -> proto::FileChunk {
    proto::FileChunk {
        content: chunk.content.to_vec(),
        chunk_size: chunk.size,
    }
}
