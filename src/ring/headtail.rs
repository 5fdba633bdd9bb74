//! Head/tail index pairs and the two-phase reserve/commit protocol
//!
//! Each side of a ring owns one [`HeadTail`]. A thread first moves its own
//! head forward to claim a range of slots (reserve), copies items into or out
//! of those slots, and then moves its own tail forward to hand the range over
//! to the opposite side (commit). Indices grow monotonically and wrap at
//! `usize::MAX`; slot positions are taken modulo the power-of-two slot count.

use std::{
    hint,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use super::config::SyncMode;

/// Busy-wait rounds before a waiter starts yielding its time slice
pub(crate) const WAIT_SPINS: u32 = 64;

/// One step of a wait on another thread: spin hints while the wait is
/// short, then yield so a preempted thread we depend on can run.
#[inline]
pub(crate) fn pause(rounds: &mut u32) {
    if *rounds < WAIT_SPINS {
        *rounds += 1;
        hint::spin_loop();
    } else {
        thread::yield_now();
    }
}

/// How many items a reservation has to cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    /// Exactly `n` items or none
    Fixed,
    /// As many items as fit, up to `n`
    Variable,
}

/// Which side of the ring is reserving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Producer,
    Consumer,
}

/// A claimed index range `[old_head, old_head + count)`
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reservation {
    pub old_head: usize,
    pub count: usize,
    /// Free slots (producer) or filled slots (consumer) left after the claim
    pub remaining: usize,
}

/// One side's head and tail, padded to its own cache line
#[repr(align(64))]
#[derive(Debug)]
pub(crate) struct HeadTail {
    head: AtomicUsize,
    tail: AtomicUsize,
    mode: SyncMode,
}

impl HeadTail {
    pub(crate) fn new(mode: SyncMode) -> Self {
        Self {
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            mode,
        }
    }

    pub(crate) fn mode(&self) -> SyncMode {
        self.mode
    }

    pub(crate) fn tail(&self) -> usize {
        self.tail.load(Ordering::Acquire)
    }

    /// Claim up to `n` slots on this side.
    ///
    /// `opposite` is the other side's pair; its tail bounds how far this head
    /// may advance. `capacity` is the usable capacity of the ring.
    pub(crate) fn reserve(
        &self,
        opposite: &HeadTail,
        side: Side,
        capacity: usize,
        n: usize,
        behavior: Behavior,
    ) -> Reservation {
        let offset = match side {
            Side::Producer => capacity,
            Side::Consumer => 0,
        };

        let mut rounds = 0;
        let mut old_head = self.head.load(Ordering::Relaxed);
        loop {
            // Pairs with the release store in `commit` on the opposite side:
            // slots below that tail are fully written (or fully read).
            let opposite_tail = opposite.tail.load(Ordering::Acquire);
            let entries = offset.wrapping_add(opposite_tail).wrapping_sub(old_head);

            if entries > capacity {
                // Our head snapshot predates the opposite tail
                pause(&mut rounds);
                old_head = self.head.load(Ordering::Relaxed);
                continue;
            }

            let count = match behavior {
                Behavior::Fixed if n > entries => 0,
                _ => n.min(entries),
            };

            if count == 0 {
                return Reservation {
                    old_head,
                    count: 0,
                    remaining: entries,
                };
            }

            let new_head = old_head.wrapping_add(count);

            if self.mode.is_single() {
                self.head.store(new_head, Ordering::Relaxed);
                return Reservation {
                    old_head,
                    count,
                    remaining: entries - count,
                };
            }

            match self.head.compare_exchange_weak(
                old_head,
                new_head,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return Reservation {
                        old_head,
                        count,
                        remaining: entries - count,
                    }
                }
                Err(current) => {
                    // Another thread moved the head, retry from its value
                    old_head = current;
                    pause(&mut rounds);
                }
            }
        }
    }

    /// Publish a reservation to the opposite side.
    ///
    /// In multi mode reservations commit in the order they were claimed, so a
    /// thread waits here until every earlier reservation has committed. The
    /// earlier holder may have been preempted, so the wait falls back to
    /// yielding after [`WAIT_SPINS`] rounds.
    pub(crate) fn commit(&self, old_head: usize, count: usize) {
        if !self.mode.is_single() {
            let mut rounds = 0;
            // Acquire so the earlier committer's slot accesses travel with
            // our release store below.
            while self.tail.load(Ordering::Acquire) != old_head {
                pause(&mut rounds);
            }
        }

        self.tail
            .store(old_head.wrapping_add(count), Ordering::Release);
    }

    /// Rewind both indices; requires exclusive access to the ring
    pub(crate) fn reset(&mut self) {
        *self.head.get_mut() = 0;
        *self.tail.get_mut() = 0;
    }
}
