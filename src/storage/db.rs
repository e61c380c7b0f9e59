//! Database Root
//!
//! [`Db`] ties the sharded store and the background reaper into one handle
//! that the transport layer is given. Opening a database spawns the reaper;
//! closing it stops the reaper and returns only once the reaper has
//! acknowledged — after `close`, no background activity remains.
//!
//! In-flight user operations are untouched by `close`; only the reaper is
//! cancelled. The store itself is released when the last handle drops.

use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

use crate::storage::{ReaperConfig, SetCondition, Store, StoreError, TtlReaper};

/// The database: a TTL-bearing key-value map and a collection of named
/// blocking LIFO queues, with a background expiry reaper.
///
/// # Example
///
/// ```ignore
/// use flintkv::storage::{Db, SetCondition};
/// use bytes::Bytes;
///
/// #[tokio::main]
/// async fn main() {
///     let db = Db::open();
///
///     db.set("greeting", Bytes::from("hello"), None, SetCondition::Always).unwrap();
///     assert_eq!(db.get("greeting"), Some(Bytes::from("hello")));
///
///     db.close().await;
/// }
/// ```
#[derive(Debug)]
pub struct Db {
    store: Arc<Store>,
    reaper: Mutex<Option<TtlReaper>>,
}

impl Db {
    /// Opens a database with the default reaper period.
    ///
    /// Requires a tokio runtime (the reaper is spawned here).
    pub fn open() -> Self {
        Self::with_config(ReaperConfig::default())
    }

    /// Opens a database with a custom reaper configuration.
    pub fn with_config(config: ReaperConfig) -> Self {
        let store = Arc::new(Store::new());
        let reaper = TtlReaper::start(Arc::clone(&store), config);

        Self {
            store,
            reaper: Mutex::new(Some(reaper)),
        }
    }

    /// Writes a value under `key`; see [`Store::set`].
    pub fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
        condition: SetCondition,
    ) -> Result<(), StoreError> {
        self.store.set(key, value, ttl, condition)
    }

    /// Reads the value under `key`; see [`Store::get`].
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.store.get(key)
    }

    /// Pushes onto the queue named `key`, creating it if needed.
    pub fn queue_push(&self, key: &str, value: Bytes) {
        self.store.queue_push(key, value)
    }

    /// Non-blocking pop from the queue named `key`.
    pub fn queue_pop(&self, key: &str) -> Result<Bytes, StoreError> {
        self.store.queue_pop(key)
    }

    /// Blocking pop with timeout from the queue named `key`.
    pub async fn blocking_queue_pop(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<Bytes, StoreError> {
        self.store.blocking_queue_pop(key, timeout).await
    }

    /// The store behind this handle, for sharing with background tasks.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Stops the reaper and waits for it to exit. Idempotent; user
    /// operations already in flight are not affected.
    pub async fn close(&self) {
        let reaper = self.reaper.lock().unwrap().take();
        if let Some(reaper) = reaper {
            reaper.stop().await;
            info!("database closed, reaper stopped");
        }
    }
}
