// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Upload Ledger
//!
//! Terminal status of completed uploads, keyed by resolved name. Only
//! successful uploads are recorded; a failed upload leaves any earlier record
//! for that name untouched.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub name: String,
    /// Bytes appended by this upload (not the resulting file size).
    pub bytes: u64,
    pub chunks: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct UploadLedger {
    records: RwLock<HashMap<String, UploadRecord>>,
}

impl UploadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful upload, replacing any previous record for the name.
    pub fn record(&self, record: UploadRecord) {
        self.records.write().insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<UploadRecord> {
        self.records.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
