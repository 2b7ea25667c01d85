// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Error taxonomy shared by server, client and CLI.

use std::fmt;

/// Coarse classification every transfer failure maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Admission rejected; the call had no side effects.
    ResourceExhausted,
    /// Download target absent.
    NotFound,
    /// Filesystem failure during read, write or enumerate (includes rejected names).
    Storage,
    /// Stream send/receive failure on either side.
    Transport,
    /// Terminal failure after partial progress; written bytes are not rolled back.
    Failed,
}

impl ErrorKind {
    /// Process exit code the CLI uses for this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::ResourceExhausted => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Storage => 4,
            ErrorKind::Transport => 5,
            ErrorKind::Failed => 6,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ResourceExhausted => "resource exhausted",
            ErrorKind::NotFound => "not found",
            ErrorKind::Storage => "storage error",
            ErrorKind::Transport => "transport error",
            ErrorKind::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let kinds = [
            ErrorKind::ResourceExhausted,
            ErrorKind::NotFound,
            ErrorKind::Storage,
            ErrorKind::Transport,
            ErrorKind::Failed,
        ];
        let codes: HashSet<i32> = kinds.iter().map(|k| k.exit_code()).collect();
        assert_eq!(codes.len(), kinds.len());
        assert!(!codes.contains(&0));
        assert!(!codes.contains(&1));
    }
}
