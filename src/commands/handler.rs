//! Command Execution
//!
//! Bridges the wire protocol and the database: a command line goes in, a
//! [`Reply`] comes out. Parsing failures become `-ERR` replies; store errors
//! are mapped to their reply codes. Nothing here touches locks or waits on
//! its own — the only suspension point is the blocking queue pop, which the
//! store bounds with the client-supplied timeout.

use std::sync::Arc;

use crate::protocol::{Command, Reply};
use crate::storage::{Db, StoreError};

/// Executes parsed commands against the database.
///
/// Cheap to clone; every connection task gets its own handle to the shared
/// database.
#[derive(Clone)]
pub struct CommandHandler {
    db: Arc<Db>,
}

impl CommandHandler {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Parses and executes one command line.
    pub async fn execute(&self, line: &str) -> Reply {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => return Reply::error("ERR", e),
        };
        self.dispatch(command).await
    }

    async fn dispatch(&self, command: Command) -> Reply {
        match command {
            Command::Set {
                key,
                value,
                expiry,
                condition,
            } => match self.db.set(&key, value, expiry, condition) {
                Ok(()) => Reply::ok(),
                Err(e) => store_error(e),
            },

            Command::Get { key } => match self.db.get(&key) {
                Some(value) => Reply::Value(value),
                None => Reply::null(),
            },

            Command::QueuePush { key, values } => {
                for value in values {
                    self.db.queue_push(&key, value);
                }
                Reply::ok()
            }

            Command::QueuePop { key } => match self.db.queue_pop(&key) {
                Ok(value) => Reply::Value(value),
                Err(e) => store_error(e),
            },

            Command::BlockingQueuePop { key, timeout } => {
                match self.db.blocking_queue_pop(&key, timeout).await {
                    Ok(value) => Reply::Value(value),
                    Err(e) => store_error(e),
                }
            }
        }
    }
}

/// Maps a store error to its wire reply.
fn store_error(e: StoreError) -> Reply {
    let code = match e {
        StoreError::NotFound => "NOTFOUND",
        StoreError::ConditionUnmet => "CONDITION",
        StoreError::Empty => "EMPTY",
        StoreError::Blocked => "BLOCKED",
    };
    Reply::error(code, e)
}
