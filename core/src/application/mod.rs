// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod transfer_service;
pub mod upload_ledger;

pub use transfer_service::{
    ChunkStream, RequestedName, StandardTransferService, TransferError, TransferService,
    UploadReceipt, DEFAULT_UPLOAD_NAME,
};
pub use upload_ledger::{UploadLedger, UploadRecord};
