// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Admission Controller
//!
//! Two independent bounded pools gate every RPC call:
//!
//! | Pool | Default capacity | Used by |
//! |------|------------------|---------|
//! | [`Pool::List`] | 100 | `ListFiles` |
//! | [`Pool::Transfer`] | 10 | `Upload`, `Download` |
//!
//! Acquisition never waits. A full pool rejects the call immediately with
//! [`AdmissionError::Exhausted`]; there is no queue and no internal retry.
//!
//! An [`AdmissionSlot`] owns its permit. Dropping the slot returns it to the
//! pool, so every exit path (normal return, `?`, a dropped future on client
//! cancellation) releases exactly once.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

pub const DEFAULT_LIST_CAPACITY: usize = 100;
pub const DEFAULT_TRANSFER_CAPACITY: usize = 10;

/// Which pool a call draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    List,
    Transfer,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pool::List => f.write_str("list"),
            Pool::Transfer => f.write_str("transfer"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("too many concurrent {pool} requests (capacity {capacity})")]
    Exhausted { pool: Pool, capacity: usize },
}

/// Pool capacities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    pub list: usize,
    pub transfer: usize,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self {
            list: DEFAULT_LIST_CAPACITY,
            transfer: DEFAULT_TRANSFER_CAPACITY,
        }
    }
}

/// Capacity token borrowed for the lifetime of one call.
#[derive(Debug)]
pub struct AdmissionSlot {
    pool: Pool,
    _permit: OwnedSemaphorePermit,
}

impl AdmissionSlot {
    pub fn pool(&self) -> Pool {
        self.pool
    }
}

pub struct AdmissionController {
    limits: AdmissionLimits,
    list: Arc<Semaphore>,
    transfer: Arc<Semaphore>,
}

impl AdmissionController {
    pub fn new(limits: AdmissionLimits) -> Self {
        Self {
            limits,
            list: Arc::new(Semaphore::new(limits.list)),
            transfer: Arc::new(Semaphore::new(limits.transfer)),
        }
    }

    fn semaphore(&self, pool: Pool) -> &Arc<Semaphore> {
        match pool {
            Pool::List => &self.list,
            Pool::Transfer => &self.transfer,
        }
    }

    /// Take a slot from `pool` without waiting.
    pub fn try_acquire(&self, pool: Pool) -> Result<AdmissionSlot, AdmissionError> {
        match self.semaphore(pool).clone().try_acquire_owned() {
            Ok(permit) => Ok(AdmissionSlot {
                pool,
                _permit: permit,
            }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => {
                tracing::warn!(%pool, capacity = self.capacity(pool), "Admission rejected");
                Err(AdmissionError::Exhausted {
                    pool,
                    capacity: self.capacity(pool),
                })
            }
        }
    }

    /// Return a slot to its pool. Equivalent to dropping it.
    pub fn release(&self, slot: AdmissionSlot) {
        drop(slot);
    }

    pub fn available(&self, pool: Pool) -> usize {
        self.semaphore(pool).available_permits()
    }

    pub fn capacity(&self, pool: Pool) -> usize {
        match pool {
            Pool::List => self.limits.list,
            Pool::Transfer => self.limits.transfer,
        }
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(AdmissionLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacities() {
        let controller = AdmissionController::default();
        assert_eq!(controller.capacity(Pool::List), 100);
        assert_eq!(controller.capacity(Pool::Transfer), 10);
        assert_eq!(controller.available(Pool::Transfer), 10);
    }

    #[test]
    fn test_capacity_plus_one_is_rejected() {
        let controller = AdmissionController::new(AdmissionLimits { list: 3, transfer: 2 });

        let attempts: Vec<_> = (0..3).map(|_| controller.try_acquire(Pool::Transfer)).collect();
        let granted = attempts.iter().filter(|r| r.is_ok()).count();
        let rejected = attempts.iter().filter(|r| r.is_err()).count();

        assert_eq!(granted, 2);
        assert_eq!(rejected, 1);
        assert!(matches!(
            attempts[2],
            Err(AdmissionError::Exhausted { pool: Pool::Transfer, capacity: 2 })
        ));
    }

    #[test]
    fn test_release_makes_room_again() {
        let controller = AdmissionController::new(AdmissionLimits { list: 1, transfer: 1 });

        let slot = controller.try_acquire(Pool::Transfer).unwrap();
        assert!(controller.try_acquire(Pool::Transfer).is_err());

        controller.release(slot);
        assert_eq!(controller.available(Pool::Transfer), 1);
        assert!(controller.try_acquire(Pool::Transfer).is_ok());
    }

    #[test]
    fn test_pools_are_independent() {
        let controller = AdmissionController::new(AdmissionLimits { list: 1, transfer: 1 });

        let _transfer = controller.try_acquire(Pool::Transfer).unwrap();
        let list = controller.try_acquire(Pool::List).unwrap();
        assert_eq!(list.pool(), Pool::List);
        assert_eq!(controller.available(Pool::Transfer), 0);
    }

    #[test]
    fn test_cancelled_future_releases_slot() {
        let limits = AdmissionLimits {
            list: 1,
            transfer: 1,
        };
        let controller = std::sync::Arc::new(AdmissionController::new(limits));
        let (_tx, rx) = tokio::sync::oneshot::channel::<()>();

        let inner = controller.clone();
        let mut call = tokio_test::task::spawn(async move {
            let _slot = inner.try_acquire(Pool::Transfer)?;
            let _ = rx.await;
            Ok::<_, AdmissionError>(())
        });

        tokio_test::assert_pending!(call.poll());
        assert_eq!(controller.available(Pool::Transfer), 0);

        drop(call);
        assert_eq!(controller.available(Pool::Transfer), 1);
    }

    #[test]
    fn test_dropping_slot_releases() {
        let controller = AdmissionController::new(AdmissionLimits { list: 2, transfer: 2 });
        {
            let _a = controller.try_acquire(Pool::List).unwrap();
            let _b = controller.try_acquire(Pool::List).unwrap();
            assert_eq!(controller.available(Pool::List), 0);
        }
        assert_eq!(controller.available(Pool::List), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquire_never_exceeds_capacity() {
        let limits = AdmissionLimits {
            list: 5,
            transfer: 5,
        };
        let controller = Arc::new(AdmissionController::new(limits));
        let barrier = Arc::new(tokio::sync::Barrier::new(6));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let controller = controller.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                let result = controller.try_acquire(Pool::List);
                // Hold whatever we got until every task has tried.
                barrier.wait().await;
                result.is_ok()
            }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 5);
        assert_eq!(controller.available(Pool::List), 5);
    }
}
