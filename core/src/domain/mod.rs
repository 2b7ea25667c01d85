// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Pure building blocks of the transfer protocol. Nothing in here knows about
//! gRPC; the presentation layer converts between these types and the wire.

pub mod admission;
pub mod chunk;
pub mod config;
pub mod error;
pub mod file;
pub mod name_lock;
pub mod path_sanitizer;
pub mod storage;

pub use admission::{AdmissionController, AdmissionError, AdmissionLimits, AdmissionSlot, Pool};
pub use chunk::{assemble, split, FileChunk, DEFAULT_CHUNK_SIZE};
pub use error::ErrorKind;
pub use file::{FileMetadata, FileName};
pub use storage::{FileStore, StorageError};
