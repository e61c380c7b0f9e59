//! Elimination Array
//!
//! Under contention, every push and pop serializes on the stack's top
//! pointer. The elimination array gives opposing operations a side channel:
//! a pusher parks its node in a randomly chosen slot for a short window, and
//! a popper that sweeps the same slot takes the node directly. The pair
//! cancels out without either of them touching the top pointer.
//!
//! Rendezvous is strictly pusher↔popper. A pusher claims a slot only when it
//! is empty (CAS from null), so two pushers can never collide in a slot and
//! nothing ever needs to be rolled back. The retract CAS tells the pusher
//! whether its offer was consumed; a consumed offer must not also be pushed
//! onto the stack.

use crossbeam_epoch::{Atomic, Guard, Owned, Shared};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use super::stack::Node;

/// Number of rendezvous slots.
pub(crate) const NUM_SLOTS: usize = 8;

/// How long a pusher keeps its offer parked before retracting it.
const EXCHANGE_WINDOW: Duration = Duration::from_micros(10);

/// Outcome of parking a node in the array.
pub(crate) enum Offer<T> {
    /// A popper took the node; ownership has transferred to it.
    Consumed,
    /// No popper arrived in time; the node returns to the caller.
    Missed(Owned<Node<T>>),
}

/// Fixed array of single-node rendezvous slots.
///
/// A slot is either null (empty) or holds a node parked by a pusher. Null is
/// the only empty sentinel; any non-null pointer is a live offer.
pub(crate) struct EliminationArray<T> {
    slots: [Atomic<Node<T>>; NUM_SLOTS],
}

impl<T> EliminationArray<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    /// Parks `node` in a random slot and waits a fixed window for a popper.
    ///
    /// The slot is claimed with a CAS from null; an occupied slot belongs to
    /// another pusher and offers no rendezvous, so the node comes straight
    /// back. After the window the offer is retracted with a CAS back to
    /// null. If that CAS fails, a popper swapped the offer out while it was
    /// parked and now owns the node.
    pub(crate) fn offer(&self, node: Owned<Node<T>>, guard: &Guard) -> Offer<T> {
        let slot = &self.slots[fastrand::usize(..NUM_SLOTS)];

        let offered = match slot.compare_exchange(
            Shared::null(),
            node,
            Ordering::SeqCst,
            Ordering::SeqCst,
            guard,
        ) {
            Ok(offered) => offered,
            Err(e) => return Offer::Missed(e.new),
        };

        let deadline = Instant::now() + EXCHANGE_WINDOW;
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }

        match slot.compare_exchange(
            offered,
            Shared::null(),
            Ordering::SeqCst,
            Ordering::SeqCst,
            guard,
        ) {
            // Retracted in time; the caller still owns the node. The pin on
            // `guard` kept the node's address from being reused, so the CAS
            // cannot have matched a recycled pointer.
            Ok(_) => Offer::Missed(unsafe { offered.into_owned() }),
            Err(_) => Offer::Consumed,
        }
    }

    /// Sweeps one random slot, taking a parked offer if one is present.
    ///
    /// Returns null-free ownership of the node: the swap removes it from the
    /// slot, so at most one popper can ever obtain a given offer. An empty
    /// slot means no rendezvous on this attempt; the popper does not linger,
    /// since an offer parked after the swap can only be claimed back by its
    /// own pusher.
    pub(crate) fn take<'g>(&self, guard: &'g Guard) -> Option<Shared<'g, Node<T>>> {
        let slot = &self.slots[fastrand::usize(..NUM_SLOTS)];
        let previous = slot.swap(Shared::null(), Ordering::SeqCst, guard);
        if previous.is_null() {
            None
        } else {
            Some(previous)
        }
    }
}
