// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure layer: concrete file stores and the outbound gRPC client.

pub mod storage;
pub mod transfer_client;
