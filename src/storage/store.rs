//! Sharded Storage
//!
//! The shared state behind every command: a TTL-bearing key→value map and a
//! registry of named blocking queues. Both are split into 256 shards, each
//! guarded by its own `RwLock`, so operations on different keys rarely
//! contend. Keys are routed to shards with FNV-1a.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │   KV shards:     [RwLock<HashMap<String, Entry>>;    256]   │
//! │   queue shards:  [RwLock<HashMap<String, Arc<Queue>>>;256]  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A shard lock is only ever held for the map lookup or mutation itself —
//! never across a queue operation and never across an await. Queue handles
//! are `Arc`s cloned out from under the lock; pushes, pops and waits all run
//! against the handle with the shard lock released.
//!
//! Expiry is checked lazily on every read, so a stale value can never escape
//! even while the background reaper is between sweeps.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::queue::{BlockingQueue, PopError};

/// Number of shards in each of the two shard arrays.
/// More shards mean less lock contention at a small fixed memory cost.
const NUM_SHARDS: usize = 256;

/// Errors surfaced by store operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The requested queue does not exist.
    #[error("queue does not exist")]
    NotFound,

    /// An `IfAbsent` write found the key present, or an `IfPresent` write
    /// found it absent.
    #[error("set condition not met")]
    ConditionUnmet,

    /// The queue exists but holds no values.
    #[error("queue is empty")]
    Empty,

    /// Another client is already waiting on this queue.
    #[error("another client is already waiting on this queue")]
    Blocked,
}

impl From<PopError> for StoreError {
    fn from(e: PopError) -> Self {
        match e {
            PopError::Empty => StoreError::Empty,
            PopError::Blocked => StoreError::Blocked,
        }
    }
}

/// Write condition for [`Store::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCondition {
    /// Unconditional write; an existing value is overwritten.
    Always,
    /// Write only if no live value exists (`NX`).
    IfAbsent,
    /// Update only an existing live value (`XX`), keeping its expiry.
    IfPresent,
}

/// A stored value with an optional expiry instant.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored payload.
    pub value: Bytes,
    /// When this entry stops being observable (`None` = never).
    pub expires_at: Option<Instant>,
}

impl Entry {
    pub fn new(value: Bytes, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    /// Checks whether this entry is past its expiry.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() >= exp)
            .unwrap_or(false)
    }
}

/// A single shard of the key-value map.
struct KvShard {
    data: RwLock<HashMap<String, Entry>>,
}

/// A single shard of the queue registry.
struct QueueShard {
    queues: RwLock<HashMap<String, Arc<BlockingQueue>>>,
}

/// The sharded store behind the database: key-value entries on one side,
/// named blocking queues on the other. Both sides use the same shard
/// routing but are otherwise independent.
///
/// Designed to be wrapped in an `Arc` and shared across connection tasks
/// and the background reaper; every operation takes `&self`.
pub struct Store {
    kv_shards: Vec<KvShard>,
    queue_shards: Vec<QueueShard>,

    /// Approximate number of live KV entries.
    key_count: AtomicU64,

    /// Entries removed because their expiry passed (lazy or swept).
    expired_count: AtomicU64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("shards", &NUM_SHARDS)
            .field("keys", &self.key_count.load(Ordering::Relaxed))
            .field("expired", &self.expired_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            kv_shards: (0..NUM_SHARDS)
                .map(|_| KvShard {
                    data: RwLock::new(HashMap::new()),
                })
                .collect(),
            queue_shards: (0..NUM_SHARDS)
                .map(|_| QueueShard {
                    queues: RwLock::new(HashMap::new()),
                })
                .collect(),
            key_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn kv_shard(&self, key: &str) -> &KvShard {
        &self.kv_shards[shard_index(key)]
    }

    #[inline]
    fn queue_shard(&self, key: &str) -> &QueueShard {
        &self.queue_shards[shard_index(key)]
    }

    // ========================================================================
    // Key-value operations
    // ========================================================================

    /// Writes a value under `key`, subject to `condition`.
    ///
    /// An entry past its expiry counts as absent for the condition check.
    /// `IfPresent` updates the value in place and keeps the existing expiry;
    /// the other conditions install `ttl` (or no expiry for `None`).
    pub fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
        condition: SetCondition,
    ) -> Result<(), StoreError> {
        let shard = self.kv_shard(key);
        let mut data = shard.data.write().unwrap();

        match condition {
            SetCondition::IfPresent => {
                return match data.get_mut(key) {
                    Some(entry) if !entry.is_expired() => {
                        // Update in place; expires_at stays what it was.
                        entry.value = value;
                        Ok(())
                    }
                    _ => Err(StoreError::ConditionUnmet),
                };
            }
            SetCondition::IfAbsent if data.get(key).is_some_and(|e| !e.is_expired()) => {
                return Err(StoreError::ConditionUnmet);
            }
            _ => {}
        }

        if data.insert(key.to_owned(), Entry::new(value, ttl)).is_none() {
            self.key_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Reads the value under `key`.
    ///
    /// Returns `None` if the key is unknown or its expiry has passed. An
    /// expired entry found on the read path is removed eagerly rather than
    /// left for the reaper.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let shard = self.kv_shard(key);

        // Fast path: read lock only, for the common live-entry case.
        {
            let data = shard.data.read().unwrap();
            match data.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // The entry was expired under the read lock; take the write lock to
        // remove it. Another writer may have replaced it in between.
        let mut data = shard.data.write().unwrap();
        if let Some(entry) = data.get(key) {
            if entry.is_expired() {
                data.remove(key);
                self.key_count.fetch_sub(1, Ordering::Relaxed);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            return Some(entry.value.clone());
        }
        None
    }

    /// Approximate number of live KV entries.
    pub fn len(&self) -> u64 {
        self.key_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every expired entry from every KV shard.
    ///
    /// Called by the background reaper. Shards are swept one at a time so no
    /// more than one shard lock is held at once.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self) -> u64 {
        let mut removed = 0u64;

        for shard in &self.kv_shards {
            let mut data = shard.data.write().unwrap();
            let before = data.len();
            data.retain(|_, entry| !entry.is_expired());
            removed += (before - data.len()) as u64;
        }

        if removed > 0 {
            self.key_count.fetch_sub(removed, Ordering::Relaxed);
            self.expired_count.fetch_add(removed, Ordering::Relaxed);
        }
        removed
    }

    // ========================================================================
    // Queue operations
    // ========================================================================

    /// Pushes `value` onto the queue named `key`, creating the queue if it
    /// does not exist yet.
    pub fn queue_push(&self, key: &str, value: Bytes) {
        let queue = {
            let shard = self.queue_shard(key);
            let mut queues = shard.queues.write().unwrap();
            Arc::clone(queues.entry(key.to_owned()).or_default())
        };
        // Push (and any waiter wakeup) happens with the shard lock released.
        queue.push(value);
    }

    /// Non-blocking pop from the queue named `key`.
    ///
    /// The queue must already exist. Fails with [`StoreError::Blocked`]
    /// while a blocking consumer is parked on the queue.
    pub fn queue_pop(&self, key: &str) -> Result<Bytes, StoreError> {
        let queue = {
            let shard = self.queue_shard(key);
            let queues = shard.queues.read().unwrap();
            queues.get(key).cloned()
        }
        .ok_or(StoreError::NotFound)?;

        Ok(queue.pop()?)
    }

    /// Pops from the queue named `key`, waiting up to `timeout` for a
    /// producer if the queue is empty.
    ///
    /// The queue is created if absent — a consumer may arrive before any
    /// producer. At most one consumer can wait per queue; any other gets
    /// [`StoreError::Blocked`] immediately.
    pub async fn blocking_queue_pop(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<Bytes, StoreError> {
        let queue = {
            let shard = self.queue_shard(key);
            let mut queues = shard.queues.write().unwrap();
            Arc::clone(queues.entry(key.to_owned()).or_default())
        };

        Ok(queue.blocking_pop(timeout).await?)
    }
}

/// Routes a key to its shard. FNV-1a over the key bytes, reduced mod the
/// shard count; stable for the lifetime of the process.
#[inline]
fn shard_index(key: &str) -> usize {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut hash = FNV_OFFSET;
    for &byte in key.as_bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash as usize % NUM_SHARDS
}
