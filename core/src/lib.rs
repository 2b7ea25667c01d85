// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # FileVault Core
//!
//! Chunked file transfer over gRPC with bounded, non-blocking admission.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | chunk codec, admission pools, file names, store trait, config |
//! | [`application`] | Application | `TransferService` (List / Upload / Download) |
//! | [`infrastructure`] | Infrastructure | local + in-memory stores, gRPC transfer client |
//! | [`presentation`] | Presentation | tonic `FileService` server |

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
