// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`filevault-core`)
//!
//! gRPC surface that translates wire requests into [`TransferService`] calls.
//! No transfer logic lives here.
//!
//! [`TransferService`]: crate::application::TransferService

pub mod grpc;
