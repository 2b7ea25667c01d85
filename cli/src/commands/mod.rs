// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the FileVault CLI

pub mod config;
pub mod serve;
pub mod transfer;

pub use self::config::ConfigCommand;
pub use self::transfer::ClientOptions;

use filevault_core::application::TransferError;
use filevault_core::infrastructure::transfer_client::ClientError;

/// Exit code for usage, configuration and otherwise unclassified errors.
pub const EXIT_GENERAL: i32 = 1;

/// Process exit code for a failed command.
///
/// The first [`ClientError`] or [`TransferError`] in the context chain decides;
/// anything else is a general failure.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ClientError>() {
            return e.kind().exit_code();
        }
        if let Some(e) = cause.downcast_ref::<TransferError>() {
            return e.kind().exit_code();
        }
    }
    EXIT_GENERAL
}
