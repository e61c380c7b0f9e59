//! Command Handler Module
//!
//! The dispatch layer between the wire protocol and the database.
//!
//! ```text
//! Client line ──> Command::parse ──> CommandHandler ──> Db
//!                                          │
//!                 Reply <──────────────────┘
//! ```
//!
//! Supported commands:
//! - `SET <key> <value> [EX <seconds>] [NX|XX]`
//! - `GET <key>`
//! - `QPUSH <key> <value> [value ...]`
//! - `QPOP <key>`
//! - `BQPOP <key> <timeout>`

pub mod handler;

pub use handler::CommandHandler;
