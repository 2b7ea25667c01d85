// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Per-name write serialization.
//!
//! Two uploads to the same name would otherwise interleave their appends.
//! [`NameLocks::lock`] hands out one guard per name at a time; other writers to
//! that name wait, writers to different names never contend. A map entry lives
//! only while someone holds or awaits it and is reaped when the last guard
//! drops.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::file::FileName;

type Entries = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Remove `name` unless a holder or waiter still references it.
/// Must run with the map lock held.
fn reap_if_idle(entries: &mut HashMap<String, Arc<AsyncMutex<()>>>, name: &str) {
    if let Some(entry) = entries.get(name) {
        if Arc::strong_count(entry) == 1 {
            entries.remove(name);
        }
    }
}

#[derive(Default, Clone)]
pub struct NameLocks {
    entries: Entries,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `name` is free and take it.
    ///
    /// Dropping the returned future while it waits leaves no entry behind.
    pub async fn lock(&self, name: &FileName) -> NameLockGuard {
        let name = name.as_str().to_string();
        let lock = {
            let mut entries = self.entries.lock();
            entries
                .entry(name.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        // Declared before `acquire` so the pending acquisition (and its Arc)
        // is dropped first on cancellation.
        let mut waiting = Waiting {
            name: &name,
            entries: &self.entries,
            armed: true,
        };
        let acquire = lock.lock_owned();
        tokio::pin!(acquire);
        let guard = acquire.await;
        waiting.armed = false;
        drop(waiting);

        NameLockGuard {
            name,
            entries: self.entries.clone(),
            guard: Some(guard),
        }
    }

    /// Number of names currently held or awaited.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Waiting<'a> {
    name: &'a str,
    entries: &'a Entries,
    armed: bool,
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        if self.armed {
            reap_if_idle(&mut self.entries.lock(), self.name);
        }
    }
}

/// Exclusive hold on one name. Releases on drop.
pub struct NameLockGuard {
    name: String,
    entries: Entries,
    guard: Option<OwnedMutexGuard<()>>,
}

impl NameLockGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NameLockGuard {
    fn drop(&mut self) {
        // The map lock is taken before the async mutex is released so no new
        // locker can clone the entry between the count check and the removal.
        let mut entries = self.entries.lock();
        drop(self.guard.take());
        reap_if_idle(&mut entries, &self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn name(s: &str) -> FileName {
        FileName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_entry_reaped_after_release() {
        let locks = NameLocks::new();
        {
            let guard = locks.lock(&name("a")).await;
            assert_eq!(guard.name(), "a");
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_names_do_not_block() {
        let locks = NameLocks::new();
        let _a = locks.lock(&name("a")).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.lock(&name("b"))).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_same_name_waits_for_holder() {
        let locks = NameLocks::new();
        let first = locks.lock(&name("shared")).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _second = locks.lock(&name("shared")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter should acquire after release")
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_leaves_no_entry() {
        let locks = NameLocks::new();
        let holder = locks.lock(&name("x")).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&name("x")).await;
                std::future::pending::<()>().await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(holder);
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_keeps_entry_for_holder() {
        let locks = NameLocks::new();
        let holder = locks.lock(&name("y")).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&name("y")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        assert_eq!(locks.len(), 1);
        drop(holder);
        assert!(locks.is_empty());
    }
}
