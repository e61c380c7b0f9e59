//! Concurrent Queue Module
//!
//! The queue side of flintkv: a lock-free LIFO with contention shedding,
//! wrapped by a single-waiter blocking protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      BlockingQueue                          │
//! │   blocked flag · consumer mutex · wakeup signal             │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                     LifoStack                         │  │
//! │  │   top ──> node ──> node ──> node        (CAS loop)    │  │
//! │  │  ┌─────────────────────────────────────────────────┐  │  │
//! │  │  │             EliminationArray                    │  │  │
//! │  │  │   [slot0] [slot1] ... [slot7]   (rendezvous)    │  │  │
//! │  │  └─────────────────────────────────────────────────┘  │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pushes and pops first try to pair off in the elimination array; only the
//! ones that miss contend on the stack's top pointer. The blocking wrapper
//! lets a single consumer wait for a producer with a timeout, turning every
//! other consumer away with an immediate `Blocked`.

mod blocking;
mod elimination;
mod stack;

pub use blocking::{BlockingQueue, PopError};
pub use stack::LifoStack;
