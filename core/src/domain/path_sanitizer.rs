// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! File Name Sanitizer
//!
//! The store is one flat directory, so a valid name is exactly one normal path
//! component. Anything that could address a location outside the storage root
//! is rejected before a path is ever joined.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Traversal prevention for stored file names

use std::path::{Component, Path};
use thiserror::Error;

use crate::domain::file::FileName;

/// Longest name most filesystems accept for a single component.
pub const DEFAULT_MAX_NAME_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathSanitizerError {
    #[error("Path traversal attempt detected: {0}")]
    PathTraversal(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("File name too long: {0}")]
    NameTooLong(String),
}

/// Validates names so that `root.join(name)` always stays a direct child of `root`.
///
/// # Security Guarantees
/// - Rejects `..`, `.`, and empty names
/// - Rejects `/` and `\` separators and absolute paths
/// - Rejects NUL bytes
pub struct FileNameSanitizer {
    max_name_len: usize,
}

impl FileNameSanitizer {
    pub fn new() -> Self {
        Self {
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }

    pub fn with_max_length(max_name_len: usize) -> Self {
        Self { max_name_len }
    }

    /// Validate `name` and wrap it as a [`FileName`].
    ///
    /// ```
    /// use filevault_core::domain::path_sanitizer::FileNameSanitizer;
    ///
    /// let sanitizer = FileNameSanitizer::new();
    /// assert_eq!(sanitizer.sanitize("report.pdf").unwrap().as_str(), "report.pdf");
    /// assert!(sanitizer.sanitize("../etc/passwd").is_err());
    /// ```
    pub fn sanitize(&self, name: &str) -> Result<FileName, PathSanitizerError> {
        if name.is_empty() {
            return Err(PathSanitizerError::InvalidName("name is empty".to_string()));
        }

        if name.len() > self.max_name_len {
            return Err(PathSanitizerError::NameTooLong(name.to_string()));
        }

        if name.contains('\0') {
            tracing::warn!(name = %name, "File name contains null byte");
            return Err(PathSanitizerError::InvalidName(
                "name contains null byte".to_string(),
            ));
        }

        if name.contains('/') || name.contains('\\') {
            tracing::warn!(name = %name, "File name contains a path separator");
            return Err(PathSanitizerError::PathTraversal(name.to_string()));
        }

        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(FileName::new_unchecked(name)),
            (Some(Component::ParentDir), _) => {
                tracing::warn!(name = %name, "Path traversal attempt detected");
                Err(PathSanitizerError::PathTraversal(name.to_string()))
            }
            _ => Err(PathSanitizerError::InvalidName(name.to_string())),
        }
    }
}

impl Default for FileNameSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        let sanitizer = FileNameSanitizer::new();
        let name = sanitizer.sanitize("file.txt").unwrap();
        assert_eq!(name.as_str(), "file.txt");
    }

    #[test]
    fn test_reject_parent_dir() {
        let sanitizer = FileNameSanitizer::new();
        assert_eq!(
            sanitizer.sanitize(".."),
            Err(PathSanitizerError::PathTraversal("..".to_string()))
        );
    }

    #[test]
    fn test_reject_separators() {
        let sanitizer = FileNameSanitizer::new();
        assert!(matches!(
            sanitizer.sanitize("../../etc/passwd"),
            Err(PathSanitizerError::PathTraversal(_))
        ));
        assert!(matches!(
            sanitizer.sanitize("/etc/passwd"),
            Err(PathSanitizerError::PathTraversal(_))
        ));
        assert!(matches!(
            sanitizer.sanitize("sub\\file"),
            Err(PathSanitizerError::PathTraversal(_))
        ));
    }

    #[test]
    fn test_reject_empty_and_current_dir() {
        let sanitizer = FileNameSanitizer::new();
        assert!(matches!(sanitizer.sanitize(""), Err(PathSanitizerError::InvalidName(_))));
        assert!(matches!(sanitizer.sanitize("."), Err(PathSanitizerError::InvalidName(_))));
    }

    #[test]
    fn test_reject_null_byte() {
        let sanitizer = FileNameSanitizer::new();
        assert!(sanitizer.sanitize("bad\0name").is_err());
    }

    #[test]
    fn test_name_too_long() {
        let sanitizer = FileNameSanitizer::with_max_length(8);
        assert!(matches!(
            sanitizer.sanitize("much-too-long.bin"),
            Err(PathSanitizerError::NameTooLong(_))
        ));
    }

    #[test]
    fn test_dots_inside_name_are_fine() {
        let sanitizer = FileNameSanitizer::new();
        assert!(sanitizer.sanitize("archive..tar.gz").is_ok());
        assert!(sanitizer.sanitize(".hidden").is_ok());
    }
}
