//! Per-event generation locks.
//!
//! Concurrent generations for one event id inside this process run one at a
//! time, so a waiter can find the winner's report instead of repeating the
//! research.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct GenerationLocks {
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GenerationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive generation rights on an event id
    pub async fn acquire(&self, event_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            // Drop entries nobody else holds or waits on
            inflight.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                inflight
                    .entry(event_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = Arc::new(GenerationLocks::new());
        let guard = locks.acquire("evt-1").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("evt-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = GenerationLocks::new();
        let _a = locks.acquire("evt-1").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("evt-2"))
            .await
            .unwrap();
    }
}
