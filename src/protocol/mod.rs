//! Protocol Module
//!
//! The textual wire protocol: whitespace-tokenized command lines in, small
//! prefix-typed replies out. One command per line, one reply per command.
//!
//! ```text
//! > SET session tok123 EX 60 NX
//! < +OK
//! > GET session
//! < $6
//! < tok123
//! > BQPOP jobs 2.5
//! < -EMPTY queue is empty
//! ```

pub mod command;
pub mod reply;

pub use command::{Command, ParseError};
pub use reply::Reply;
