// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! gRPC Server Implementation for FileVault
//! Exposes ListFiles, Upload, Download

use futures::StreamExt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info};

use super::proto;
use super::proto::file_service_server::{FileService, FileServiceServer};
use super::{FILE_NAME_HEADER, MAX_MESSAGE_SIZE};
use crate::application::transfer_service::{
    ChunkStream, RequestedName, TransferError, TransferService,
};
use crate::domain::chunk::FileChunk;
use crate::domain::file::FileMetadata;

/// Buffered chunks between the store reader and the wire per download.
const DOWNLOAD_CHANNEL_CAPACITY: usize = 4;

/// Implementation of the FileService gRPC service
pub struct FileVaultGrpcService {
    transfer_service: Arc<dyn TransferService>,
}

impl FileVaultGrpcService {
    pub fn new(transfer_service: Arc<dyn TransferService>) -> Self {
        Self { transfer_service }
    }

    /// Create a gRPC server instance
    pub fn into_server(self) -> FileServiceServer<Self> {
        FileServiceServer::new(self)
            .max_decoding_message_size(MAX_MESSAGE_SIZE)
            .max_encoding_message_size(MAX_MESSAGE_SIZE)
    }
}

#[tonic::async_trait]
impl FileService for FileVaultGrpcService {
    type DownloadStream = ReceiverStream<Result<proto::FileChunk, Status>>;

    async fn list_files(
        &self,
        _request: Request<proto::Empty>,
    ) -> Result<Response<proto::FileList>, Status> {
        let files = self
            .transfer_service
            .list()
            .await
            .map_err(status_from_error)?;

        Ok(Response::new(proto::FileList {
            files: files.iter().map(metadata_to_proto).collect(),
        }))
    }

    async fn upload(
        &self,
        request: Request<Streaming<proto::FileChunk>>,
    ) -> Result<Response<proto::UploadStatus>, Status> {
        let name = requested_name(request.metadata());

        let inbound = request.into_inner().map(|item| {
            item.map(chunk_from_proto)
                .map_err(|status| TransferError::Transport(status.message().to_string()))
        });
        let chunks: ChunkStream = Box::pin(inbound);

        let receipt = self
            .transfer_service
            .upload(name, chunks)
            .await
            .map_err(status_from_error)?;

        debug!(file_name = %receipt.name, bytes = receipt.bytes, "Upload acknowledged");
        Ok(Response::new(proto::UploadStatus {
            success: true,
            message: "File uploaded successfully".to_string(),
        }))
    }

    async fn download(
        &self,
        request: Request<proto::FileRequest>,
    ) -> Result<Response<Self::DownloadStream>, Status> {
        let req = request.into_inner();

        let mut chunks = self
            .transfer_service
            .download(&req.file_name)
            .await
            .map_err(status_from_error)?;

        // Channel for streaming chunks
        let (tx, rx) = mpsc::channel(DOWNLOAD_CHANNEL_CAPACITY);

        // The spawned task owns the chunk stream (and with it the transfer
        // slot); it ends as soon as the receiver side is dropped.
        tokio::spawn(async move {
            while let Some(item) = chunks.next().await {
                let item = item.map(chunk_to_proto).map_err(status_from_error);
                let failed = item.is_err();
                if tx.send(item).await.is_err() {
                    debug!(file_name = %req.file_name, "Download cancelled by client");
                    break;
                }
                if failed {
                    break;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

// Decoding only; the service validates the name once the call is admitted.
fn requested_name(metadata: &MetadataMap) -> RequestedName {
    match metadata.get_bin(FILE_NAME_HEADER) {
        None => RequestedName::Unspecified,
        Some(value) => match value.to_bytes() {
            Ok(bytes) => RequestedName::Bytes(bytes.to_vec()),
            Err(e) => {
                RequestedName::Malformed(format!("invalid {} header: {}", FILE_NAME_HEADER, e))
            }
        },
    }
}

fn metadata_to_proto(meta: &FileMetadata) -> proto::FileMetadata {
    proto::FileMetadata {
        name: meta.name.clone(),
        created: meta.created_display(),
        updated: meta.updated_display(),
    }
}

fn chunk_to_proto(chunk: FileChunk) -> proto::FileChunk {
    proto::FileChunk {
        content: chunk.content.to_vec(),
        chunk_size: chunk.size,
    }
}

// `chunk_size` on the wire is advisory; the length is taken from `content`.
fn chunk_from_proto(chunk: proto::FileChunk) -> FileChunk {
    FileChunk::new(chunk.content)
}

/// Map a transfer failure onto the gRPC status taxonomy.
pub fn status_from_error(err: TransferError) -> Status {
    let message = err.to_string();
    match err {
        TransferError::ResourceExhausted(_) => Status::resource_exhausted(message),
        TransferError::NotFound(_) => Status::not_found(message),
        TransferError::InvalidName(_) => Status::invalid_argument(message),
        TransferError::Storage(_) => Status::internal(message),
        TransferError::Transport(_) => Status::unavailable(message),
        TransferError::Failed { .. } => Status::aborted(message),
    }
}

/// Start the gRPC server on `addr`, stopping gracefully once `shutdown` resolves.
pub async fn start_grpc_server<F>(
    addr: SocketAddr,
    transfer_service: Arc<dyn TransferService>,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind(addr).await?;
    serve_with_listener(listener, transfer_service, shutdown).await
}

/// Serve on an already-bound listener. Binding `127.0.0.1:0` first lets the
/// caller learn the ephemeral port before the server starts.
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    transfer_service: Arc<dyn TransferService>,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send,
{
    let local_addr = listener.local_addr()?;
    let server = FileVaultGrpcService::new(transfer_service).into_server();

    info!("Starting FileVault gRPC server on {}", local_addr);

    tonic::transport::Server::builder()
        .add_service(server)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    info!("FileVault gRPC server stopped");
    Ok(())
}
