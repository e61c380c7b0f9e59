//! Background TTL Reaper
//!
//! Lazy expiry on the read path keeps stale values from escaping, but a key
//! that is never read again would sit in memory forever. The reaper closes
//! that gap: a background task that periodically sweeps every KV shard and
//! removes entries whose expiry has passed.
//!
//! The task runs on a fixed period and listens on a shutdown channel. A
//! stop is acknowledged: [`TtlReaper::stop`] resolves only after the task
//! has exited, so a closed database has no reaper activity behind it.

use crate::storage::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Configuration for the reaper.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// Time between sweeps.
    pub period: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(60),
        }
    }
}

/// Handle to the running reaper task.
///
/// Stop it explicitly with [`stop`](TtlReaper::stop) to wait for the task to
/// exit; dropping the handle signals the task to stop without waiting.
#[derive(Debug)]
pub struct TtlReaper {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TtlReaper {
    /// Spawns the reaper over `store`.
    ///
    /// Requires a tokio runtime.
    pub fn start(store: Arc<Store>, config: ReaperConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(reap_loop(store, config, shutdown_rx));

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Stops the reaper and waits for it to exit.
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TtlReaper {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// The sweep loop: tick, sweep, repeat until told to stop.
async fn reap_loop(store: Arc<Store>, config: ReaperConfig, mut shutdown_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(config.period);
    // The first tick of a tokio interval fires immediately; a fresh store
    // has nothing to sweep, so skip it.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.sweep_expired();
                if removed > 0 {
                    debug!(removed, remaining = store.len(), "expired entries reclaimed");
                }
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("reaper received shutdown signal");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SetCondition;
    use bytes::Bytes;

    #[tokio::test]
    async fn reaper_removes_expired_keys() {
        let store = Arc::new(Store::new());

        for i in 0..10 {
            store
                .set(
                    &format!("key{i}"),
                    Bytes::from("v"),
                    Some(Duration::from_millis(20)),
                    SetCondition::Always,
                )
                .unwrap();
        }
        store
            .set("keeper", Bytes::from("v"), None, SetCondition::Always)
            .unwrap();
        assert_eq!(store.len(), 11);

        let reaper = TtlReaper::start(
            Arc::clone(&store),
            ReaperConfig {
                period: Duration::from_millis(10),
            },
        );

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("keeper"), Some(Bytes::from("v")));

        reaper.stop().await;
    }

    #[tokio::test]
    async fn stop_waits_for_the_task() {
        let store = Arc::new(Store::new());
        let reaper = TtlReaper::start(
            Arc::clone(&store),
            ReaperConfig {
                period: Duration::from_millis(10),
            },
        );

        // After stop resolves the task has exited; keys expiring afterwards
        // are only removed lazily, on access.
        reaper.stop().await;

        store
            .set(
                "k",
                Bytes::from("v"),
                Some(Duration::from_millis(10)),
                SetCondition::Always,
            )
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.get("k"), None);
    }
}
