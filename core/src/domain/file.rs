// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Stored file value types.

use chrono::{DateTime, Local};
use std::fmt;

use crate::domain::path_sanitizer::{FileNameSanitizer, PathSanitizerError};

/// Timestamp layout used on the wire for `created` / `updated`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of a file directly under the storage root.
///
/// Only constructible through [`FileNameSanitizer`], so holding one means the
/// name cannot escape the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileName(String);

impl FileName {
    /// Validate with the default sanitizer.
    pub fn parse(name: &str) -> Result<Self, PathSanitizerError> {
        FileNameSanitizer::new().sanitize(name)
    }

    pub(crate) fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Listing entry derived from store state at query time. Never persisted.
///
/// The local store has no portable creation time, so `created` and `updated`
/// both carry the modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub created: DateTime<Local>,
    pub updated: DateTime<Local>,
}

impl FileMetadata {
    pub fn from_modified(name: impl Into<String>, modified: DateTime<Local>) -> Self {
        Self {
            name: name.into(),
            created: modified,
            updated: modified,
        }
    }

    pub fn created_display(&self) -> String {
        self.created.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn updated_display(&self) -> String {
        self.updated.format(TIMESTAMP_FORMAT).to_string()
    }
}
