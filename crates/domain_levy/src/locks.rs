//! Per-resident critical sections
//!
//! Recording a payment reads the credit balance, allocates and writes the new
//! balance. Two such sequences for the same resident must not interleave, but
//! payments for different residents may run in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::ResidentId;

/// One async mutex per resident
#[derive(Debug, Default)]
pub struct ResidentLocks {
    locks: Mutex<HashMap<ResidentId, Arc<Mutex<()>>>>,
}

impl ResidentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `resident_id`
    ///
    /// The section ends when the returned guard is dropped.
    pub async fn acquire(&self, resident_id: ResidentId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop entries nobody holds or waits on
            locks.retain(|id, l| *id == resident_id || Arc::strong_count(l) > 1);
            locks.entry(resident_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of residents currently tracked
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_resident_is_exclusive() {
        let locks = Arc::new(ResidentLocks::new());
        let resident = ResidentId::new();

        let guard = locks.acquire(resident).await;
        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(resident).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_residents_do_not_block() {
        let locks = ResidentLocks::new();
        let _a = locks.acquire(ResidentId::new()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(ResidentId::new())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = ResidentLocks::new();
        for _ in 0..5 {
            let _g = locks.acquire(ResidentId::new()).await;
        }
        assert_eq!(locks.tracked().await, 1);
    }
}
