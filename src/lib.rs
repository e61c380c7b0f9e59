//! # flintkv - An In-Memory Key-Value and Queue Store
//!
//! flintkv is an in-memory data store written in Rust. It serves two
//! independent surfaces over one textual protocol: a TTL-bearing key-value
//! map with conditional writes, and named LIFO queues with blocking
//! consumers.
//!
//! ## Features
//!
//! - **Sharded Storage**: 256 independent `RwLock` shards per surface keep
//!   unrelated keys from contending
//! - **TTL Support**: keys expire lazily on read and are swept by a
//!   background reaper
//! - **Lock-Free Queues**: each queue is a Treiber stack with an
//!   elimination-array fast path that pairs pushes with pops under
//!   contention
//! - **Blocking Pop**: one consumer per queue may wait for a producer with
//!   a timeout; everyone else is turned away immediately
//! - **Async I/O**: built on Tokio; every connection is a cheap task
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              flintkv                                │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐              │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │              │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │              │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘              │
//! │                                               │                     │
//! │                                               ▼                     │
//! │  ┌─────────────┐    ┌───────────────────────────────────────────┐   │
//! │  │  Command    │    │                    Db                     │   │
//! │  │  Parser     │    │  ┌─────────────────┐ ┌─────────────────┐  │   │
//! │  │             │    │  │   KV shards     │ │  queue shards   │  │   │
//! │  └─────────────┘    │  │ [RwLock; 256]   │ │ [RwLock; 256]   │  │   │
//! │                     │  └─────────────────┘ └────────┬────────┘  │   │
//! │                     └───────────▲───────────────────┼───────────┘   │
//! │                                 │                   ▼               │
//! │                     ┌───────────┴────────┐  ┌────────────────────┐  │
//! │                     │     TtlReaper      │  │   BlockingQueue    │  │
//! │                     │ (background task)  │  │ LifoStack + waiter │  │
//! │                     └────────────────────┘  └────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use flintkv::commands::CommandHandler;
//! use flintkv::connection::{handle_connection, ConnectionStats};
//! use flintkv::storage::Db;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let db = Arc::new(Db::open());
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:7379").await.unwrap();
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(Arc::clone(&db));
//!         tokio::spawn(handle_connection(stream, addr, handler, Arc::clone(&stats)));
//!     }
//! }
//! ```
//!
//! ## Commands
//!
//! - `SET key value [EX seconds] [NX|XX]` — write a key; `NX` only if
//!   absent, `XX` only if present (keeping the existing expiry)
//! - `GET key` — read a key (null once expired)
//! - `QPUSH key value [value ...]` — push onto a queue, creating it
//! - `QPOP key` — pop the most recent value
//! - `BQPOP key timeout` — pop, waiting up to `timeout` seconds for a
//!   producer; a second waiter on the same queue is rejected
//!
//! ## Module Overview
//!
//! - [`protocol`]: command parsing and wire replies
//! - [`storage`]: sharded key-value store, queue registry, TTL reaper
//! - [`queue`]: the lock-free LIFO and its blocking wrapper
//! - [`commands`]: command dispatch onto the database
//! - [`connection`]: client connection management

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod queue;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use connection::{handle_connection, ConnectionError, ConnectionStats};
pub use protocol::{Command, ParseError, Reply};
pub use queue::{BlockingQueue, LifoStack, PopError};
pub use storage::{Db, ReaperConfig, SetCondition, Store, StoreError};

/// The default port flintkv listens on
pub const DEFAULT_PORT: u16 = 7379;

/// The default host flintkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of flintkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
