//! Storage Module
//!
//! The database core: a sharded, TTL-bearing key-value map, a sharded
//! registry of blocking LIFO queues, and a background reaper that reclaims
//! expired entries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                            Db                               │
//! │  ┌───────────────────────────────┐   ┌──────────────────┐   │
//! │  │            Store              │   │    TtlReaper     │   │
//! │  │  KV shards    [RwLock; 256]   │<──│ (tokio task,     │   │
//! │  │  queue shards [RwLock; 256]   │   │  periodic sweep) │   │
//! │  └───────────────────────────────┘   └──────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Expired keys are removed in two ways: lazily when a read finds them
//! (no stale value ever escapes) and actively by the reaper (no dead key
//! lingers unobserved). Closing the database stops the reaper and waits for
//! its acknowledgement.

pub mod db;
pub mod reaper;
pub mod store;

pub use db::Db;
pub use reaper::{ReaperConfig, TtlReaper};
pub use store::{Entry, SetCondition, Store, StoreError};
