//! Connection Handling Module
//!
//! Each accepted TCP connection gets its own async task running a
//! read-execute-respond loop over newline-framed command lines.
//!
//! ```text
//! ┌──────────────┐  accept   ┌───────────────────┐
//! │ TCP listener │──────────>│ ConnectionHandler │  (one task per client)
//! │  (main.rs)   │           │ read → execute →  │
//! └──────────────┘           │ respond           │
//!                            └───────────────────┘
//! ```
//!
//! Clients may pipeline: every complete line in the buffer is executed and
//! answered before the task goes back to the socket for more bytes.

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
