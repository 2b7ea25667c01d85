// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! gRPC transport for the `filevault.v1.FileService` protocol.

use crate::domain::config::MAX_CHUNK_SIZE;

pub mod server;

// Generated protobuf code
pub mod proto {
    tonic::include_proto!("filevault.v1");
}

/// Binary metadata key carrying the upload target name as raw UTF-8.
pub const FILE_NAME_HEADER: &str = "x-file-name-bin";

/// Message size limit on both ends: one maximum-size chunk plus its framing.
pub const MAX_MESSAGE_SIZE: usize = MAX_CHUNK_SIZE + 1024;

pub use server::{serve_with_listener, start_grpc_server, FileVaultGrpcService};
