//! Blocking Queue Wrapper
//!
//! Wraps a [`LifoStack`] with a single-consumer blocking pop. At most one
//! consumer may wait on a queue at a time; a second blocking attempt — and
//! any non-blocking pop while a waiter is parked — fails with
//! [`PopError::Blocked`] immediately rather than queueing up.
//!
//! Producers never block. After a push, a producer that observes a parked
//! waiter fires a best-effort wakeup: [`tokio::sync::Notify`] stores at most
//! one permit, so concurrent signals collapse and none of them wait. A
//! signal lost to the store/load race is recovered by the waiter re-polling
//! the stack after it raises its flag.

use bytes::Bytes;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};

use super::stack::LifoStack;

/// Why a pop did not yield a value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// The queue has no values (or was drained before the waiter woke).
    #[error("queue is empty")]
    Empty,

    /// Another client is already waiting on this queue.
    #[error("another client is already waiting on this queue")]
    Blocked,
}

/// A named LIFO queue with a single-waiter blocking pop.
pub struct BlockingQueue {
    stack: LifoStack<Bytes>,

    /// 1 while a consumer is parked in the wait of [`blocking_pop`];
    /// producers read it to decide whether to signal.
    ///
    /// [`blocking_pop`]: BlockingQueue::blocking_pop
    blocked: AtomicU32,

    /// Held for the whole of a blocking pop; `try_lock` turns a second
    /// blocking consumer away without waiting.
    consumer: Mutex<()>,

    /// Capacity-1 wakeup from producers to the parked consumer.
    signal: Notify,
}

impl BlockingQueue {
    pub fn new() -> Self {
        Self {
            stack: LifoStack::new(),
            blocked: AtomicU32::new(0),
            consumer: Mutex::new(()),
            signal: Notify::new(),
        }
    }

    /// Pushes a value, waking a parked consumer if there is one.
    pub fn push(&self, value: Bytes) {
        self.stack.push(value);
        if self.blocked.load(Ordering::SeqCst) == 1 {
            self.signal.notify_one();
        }
    }

    /// Non-blocking pop.
    ///
    /// Refused with [`PopError::Blocked`] while a blocking consumer is
    /// parked; the parked consumer has exclusive claim to the next value.
    pub fn pop(&self) -> Result<Bytes, PopError> {
        if self.blocked.load(Ordering::SeqCst) == 1 {
            return Err(PopError::Blocked);
        }
        self.stack.pop().ok_or(PopError::Empty)
    }

    /// Pops a value, waiting up to `timeout` for a producer if the queue is
    /// empty.
    ///
    /// A zero timeout polls once and fails with [`PopError::Empty`]. If
    /// another consumer already holds the queue, fails with
    /// [`PopError::Blocked`] immediately. A wakeup does not guarantee a
    /// value: a racing consumer may drain the queue first, in which case the
    /// resulting [`PopError::Empty`] is surfaced to the caller.
    pub async fn blocking_pop(&self, timeout: Duration) -> Result<Bytes, PopError> {
        let Ok(_consumer) = self.consumer.try_lock() else {
            return Err(PopError::Blocked);
        };

        if let Some(value) = self.stack.pop() {
            return Ok(value);
        }
        if timeout.is_zero() {
            return Err(PopError::Empty);
        }

        self.blocked.store(1, Ordering::SeqCst);
        // The flag must clear however the wait ends, including the caller
        // dropping this future mid-wait (client gone).
        let _parked = ClearOnDrop(&self.blocked);

        // A push that read the flag as 0 just before the store above will
        // not signal; one more poll closes that window.
        if let Some(value) = self.stack.pop() {
            return Ok(value);
        }

        match tokio::time::timeout(timeout, self.signal.notified()).await {
            Ok(()) => self.stack.pop().ok_or(PopError::Empty),
            Err(_) => Err(PopError::Empty),
        }
    }
}

/// Resets the parked-waiter flag when the wait ends, on any path.
struct ClearOnDrop<'a>(&'a AtomicU32);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(0, Ordering::SeqCst);
    }
}

impl Default for BlockingQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn pop_is_lifo() {
        let queue = BlockingQueue::new();

        queue.push(Bytes::from("a"));
        queue.push(Bytes::from("b"));

        assert_eq!(queue.pop(), Ok(Bytes::from("b")));
        assert_eq!(queue.pop(), Ok(Bytes::from("a")));
        assert_eq!(queue.pop(), Err(PopError::Empty));
    }

    #[tokio::test]
    async fn blocking_pop_returns_immediately_when_nonempty() {
        let queue = BlockingQueue::new();
        queue.push(Bytes::from("ready"));

        let value = queue.blocking_pop(Duration::from_secs(5)).await;
        assert_eq!(value, Ok(Bytes::from("ready")));
    }

    #[tokio::test]
    async fn zero_timeout_polls_once() {
        let queue = BlockingQueue::new();
        assert_eq!(
            queue.blocking_pop(Duration::ZERO).await,
            Err(PopError::Empty)
        );
    }

    #[tokio::test]
    async fn blocking_pop_times_out_empty() {
        let queue = BlockingQueue::new();

        let started = Instant::now();
        let result = queue.blocking_pop(Duration::from_millis(50)).await;

        assert_eq!(result, Err(PopError::Empty));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn push_wakes_parked_consumer() {
        let queue = Arc::new(BlockingQueue::new());

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                queue.push(Bytes::from("hello"));
            })
        };

        let started = Instant::now();
        let value = queue.blocking_pop(Duration::from_secs(5)).await;
        producer.await.unwrap();

        assert_eq!(value, Ok(Bytes::from("hello")));
        // Woken by the signal, not the timeout.
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn second_blocking_consumer_is_turned_away() {
        let queue = Arc::new(BlockingQueue::new());

        let first = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.blocking_pop(Duration::from_millis(300)).await })
        };

        // Let the first consumer park itself.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(
            queue.blocking_pop(Duration::from_secs(1)).await,
            Err(PopError::Blocked)
        );
        assert_eq!(queue.pop(), Err(PopError::Blocked));

        assert_eq!(first.await.unwrap(), Err(PopError::Empty));
    }

    #[tokio::test]
    async fn cancelled_waiter_releases_the_queue() {
        let queue = Arc::new(BlockingQueue::new());

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.blocking_pop(Duration::from_secs(30)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(queue.pop(), Err(PopError::Blocked));

        // The client goes away mid-wait; its future is dropped at the await.
        waiter.abort();
        let _ = waiter.await;

        queue.push(Bytes::from("v"));
        assert_eq!(queue.pop(), Ok(Bytes::from("v")));
    }

    #[tokio::test]
    async fn queue_usable_after_waiter_times_out() {
        let queue = BlockingQueue::new();

        assert_eq!(
            queue.blocking_pop(Duration::from_millis(20)).await,
            Err(PopError::Empty)
        );

        queue.push(Bytes::from("later"));
        assert_eq!(queue.pop(), Ok(Bytes::from("later")));
    }
}
