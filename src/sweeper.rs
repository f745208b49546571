//! Periodic expiry of old memories
//!
//! Runs `expire_default` on a fixed interval until shutdown is signalled.
//! A zero interval disables the sweeper.

use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

use crate::error::Result;
use crate::memory::MemoryStore;

/// Background task that deletes memories older than `memory.max_age`
pub struct ExpirySweeper {
    store: MemoryStore,
    interval: Duration,
}

impl ExpirySweeper {
    /// Sweep on the store's configured `sweep_interval`
    pub fn new(store: MemoryStore) -> Self {
        let interval = store.config().sweep_interval;
        ExpirySweeper { store, interval }
    }

    /// Override the sweep interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run one expiry pass
    pub async fn sweep_once(&self) -> Result<u64> {
        let deleted = self.store.expire_default().await?;
        if deleted > 0 {
            info!("Expired {} memories", deleted);
        }
        Ok(deleted)
    }

    /// Main loop. Returns once `shutdown` flips to true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.interval.is_zero() {
            info!("Expiry sweeper disabled");
            return;
        }

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!("Expiry sweeper started, interval: {:?}", self.interval);

        // Skip the first immediate tick
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        error!("Expiry sweep failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use crate::core::Metadata;
    use crate::memory::testing::{ManualClock, UnreachableIndex, WordHashEmbedder};
    use crate::memory::InMemoryIndex;
    use chrono::Utc;
    use std::sync::Arc;

    const DIMS: usize = 16;

    fn config() -> MemoryConfig {
        MemoryConfig {
            dimensions: DIMS,
            ..Default::default()
        }
    }

    async fn aged_store() -> MemoryStore {
        let clock = ManualClock::at(Utc::now());
        let store = MemoryStore::with_clock(
            config(),
            Arc::new(InMemoryIndex::new()),
            Arc::new(WordHashEmbedder::new(DIMS)),
            clock.clone(),
        )
        .unwrap();
        store.init().await.unwrap();
        store.store("old note", Metadata::new()).await.unwrap();
        clock.advance(chrono::Duration::days(31));
        store.store("fresh note", Metadata::new()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_sweep_once_uses_configured_max_age() {
        let store = aged_store().await;
        let sweeper = ExpirySweeper::new(store.clone());

        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_run_sweeps_until_shutdown() {
        let store = aged_store().await;
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(
            ExpirySweeper::new(store.clone())
                .with_interval(Duration::from_millis(20))
                .run(rx),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.count().await.unwrap(), 1);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_survives_failed_sweeps() {
        let store = MemoryStore::new(
            config(),
            Arc::new(UnreachableIndex),
            Arc::new(WordHashEmbedder::new(DIMS)),
        )
        .unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(
            ExpirySweeper::new(store)
                .with_interval(Duration::from_millis(10))
                .run(rx),
        );

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!handle.is_finished());

        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_zero_interval_disables() {
        let store = aged_store().await;
        let (_tx, rx) = watch::channel(false);

        tokio::time::timeout(
            Duration::from_secs(5),
            ExpirySweeper::new(store.clone())
                .with_interval(Duration::ZERO)
                .run(rx),
        )
        .await
        .expect("disabled sweeper should return immediately");

        assert_eq!(store.count().await.unwrap(), 2);
    }
}
