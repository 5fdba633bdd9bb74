//! Bounded lock-free ring queue of pointer-sized items

use std::{cell::UnsafeCell, fmt, mem::MaybeUninit};

use log::debug;

use crate::error::{PktError, Result};

use super::{
    config::{RingConfig, SyncMode},
    headtail::{Behavior, HeadTail, Side},
};

/// Outcome of a burst operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BurstResult {
    /// Items actually moved
    pub count: usize,
    /// Free slots after an enqueue, or items left after a dequeue.
    /// A snapshot taken at reservation time; other threads may have changed
    /// it by the time the call returns.
    pub remaining: usize,
}

/// Lock-free multi/single producer, multi/single consumer ring queue
///
/// Items are copied in and out of the slot array and never dereferenced by
/// the ring, so `T` is expected to be a small handle such as an index or a
/// pointer newtype.
pub struct Ring<T> {
    /// Producer head/tail
    prod: HeadTail,
    /// Consumer head/tail
    cons: HeadTail,
    /// Slot storage, length is a power of two
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// Mask for fast modulo operation
    mask: usize,
    /// Usable capacity, at most `slots.len()`
    capacity: usize,
    name: String,
}

unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T: Copy> Ring<T> {
    /// Create a ring with a power-of-two capacity and the same mode on both sides
    pub fn new(capacity: usize, mode: SyncMode) -> Result<Self> {
        Self::with_config(
            RingConfig::default()
                .with_capacity(capacity)
                .with_mode(mode),
        )
    }

    /// Create a ring from a full configuration
    pub fn with_config(config: RingConfig) -> Result<Self> {
        config.validate()?;

        let slot_count = config.slot_count();
        let slots: Box<[UnsafeCell<MaybeUninit<T>>]> = (0..slot_count)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        debug!(
            "created ring `{}`: capacity {}, slots {}, producer {:?}, consumer {:?}",
            config.name, config.capacity, slot_count, config.producer, config.consumer
        );

        Ok(Self {
            prod: HeadTail::new(config.producer),
            cons: HeadTail::new(config.consumer),
            slots,
            mask: slot_count - 1,
            capacity: config.capacity,
            name: config.name,
        })
    }

    /// Name given at construction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of items the ring can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn producer_mode(&self) -> SyncMode {
        self.prod.mode()
    }

    pub fn consumer_mode(&self) -> SyncMode {
        self.cons.mode()
    }

    /// Number of committed items (advisory under concurrency)
    pub fn count(&self) -> usize {
        let cons_tail = self.cons.tail();
        let prod_tail = self.prod.tail();
        prod_tail.wrapping_sub(cons_tail).min(self.capacity)
    }

    /// Number of free slots (advisory under concurrency)
    pub fn free_count(&self) -> usize {
        self.capacity - self.count()
    }

    /// Check if the ring is empty (advisory under concurrency)
    pub fn is_empty(&self) -> bool {
        self.prod.tail() == self.cons.tail()
    }

    /// Check if the ring is full (advisory under concurrency)
    pub fn is_full(&self) -> bool {
        self.free_count() == 0
    }

    /// Enqueue one item, failing with `Full` when no slot is free
    pub fn enqueue(&self, item: T) -> Result<()> {
        let result = self.enqueue_with(1, Behavior::Fixed, |_| item);
        if result.count == 1 {
            Ok(())
        } else {
            Err(PktError::Full)
        }
    }

    /// Enqueue all of `items` or none; returns the free space left
    pub fn enqueue_bulk(&self, items: &[T]) -> Result<usize> {
        let result = self.enqueue_with(items.len(), Behavior::Fixed, |i| items[i]);
        if result.count == items.len() {
            Ok(result.remaining)
        } else {
            Err(PktError::Full)
        }
    }

    /// Enqueue the longest prefix of `items` that fits
    pub fn enqueue_burst(&self, items: &[T]) -> BurstResult {
        self.enqueue_with(items.len(), Behavior::Variable, |i| items[i])
    }

    /// Dequeue the oldest item, failing with `Empty` when there is none
    pub fn dequeue(&self) -> Result<T> {
        let mut item = None;
        self.dequeue_with(1, Behavior::Fixed, |_, value| item = Some(value));
        item.ok_or(PktError::Empty)
    }

    /// Fill all of `out` or nothing; returns the items left in the ring
    pub fn dequeue_bulk(&self, out: &mut [T]) -> Result<usize> {
        let wanted = out.len();
        let result = self.dequeue_with(wanted, Behavior::Fixed, |i, value| out[i] = value);
        if result.count == wanted {
            Ok(result.remaining)
        } else {
            Err(PktError::Empty)
        }
    }

    /// Dequeue up to `out.len()` items, oldest first, into the front of `out`
    pub fn dequeue_burst(&self, out: &mut [T]) -> BurstResult {
        self.dequeue_with(out.len(), Behavior::Variable, |i, value| out[i] = value)
    }

    /// Like [`Ring::dequeue_burst`] for a table that has not been initialised;
    /// the first `count` entries are initialised on return.
    pub fn dequeue_burst_uninit(&self, out: &mut [MaybeUninit<T>]) -> BurstResult {
        self.dequeue_with(out.len(), Behavior::Variable, |i, value| {
            out[i].write(value);
        })
    }

    /// Fixed-size dequeue into an uninitialised table
    pub fn dequeue_bulk_uninit(&self, out: &mut [MaybeUninit<T>]) -> Result<usize> {
        let wanted = out.len();
        let result = self.dequeue_with(wanted, Behavior::Fixed, |i, value| {
            out[i].write(value);
        });
        if result.count == wanted {
            Ok(result.remaining)
        } else {
            Err(PktError::Empty)
        }
    }

    /// Rewind the ring to empty; exclusive access makes this race-free
    pub fn reset(&mut self) {
        self.prod.reset();
        self.cons.reset();
    }

    /// Reserve, fill from `source` and commit.
    ///
    /// `source` runs between reserve and commit and must not panic.
    pub(crate) fn enqueue_with(
        &self,
        n: usize,
        behavior: Behavior,
        mut source: impl FnMut(usize) -> T,
    ) -> BurstResult {
        let reservation = self
            .prod
            .reserve(&self.cons, Side::Producer, self.capacity, n, behavior);

        if reservation.count == 0 {
            return BurstResult {
                count: 0,
                remaining: reservation.remaining,
            };
        }

        for i in 0..reservation.count {
            let slot = self.slot(reservation.old_head.wrapping_add(i));
            // SAFETY: the reservation gives this thread exclusive access to
            // the slot until the commit below.
            unsafe {
                (*slot.get()).write(source(i));
            }
        }

        self.prod.commit(reservation.old_head, reservation.count);

        BurstResult {
            count: reservation.count,
            remaining: reservation.remaining,
        }
    }

    /// Reserve, drain into `sink` and commit.
    ///
    /// `sink` runs between reserve and commit and must not panic.
    pub(crate) fn dequeue_with(
        &self,
        n: usize,
        behavior: Behavior,
        mut sink: impl FnMut(usize, T),
    ) -> BurstResult {
        let reservation = self
            .cons
            .reserve(&self.prod, Side::Consumer, self.capacity, n, behavior);

        if reservation.count == 0 {
            return BurstResult {
                count: 0,
                remaining: reservation.remaining,
            };
        }

        for i in 0..reservation.count {
            let slot = self.slot(reservation.old_head.wrapping_add(i));
            // SAFETY: slots below the producer tail observed in `reserve`
            // hold initialised items and belong to this thread until commit.
            let value = unsafe { (*slot.get()).assume_init_read() };
            sink(i, value);
        }

        self.cons.commit(reservation.old_head, reservation.count);

        BurstResult {
            count: reservation.count,
            remaining: reservation.remaining,
        }
    }

    #[inline]
    fn slot(&self, position: usize) -> &UnsafeCell<MaybeUninit<T>> {
        &self.slots[position & self.mask]
    }
}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("slots", &self.slots.len())
            .field("producer", &self.prod.mode())
            .field("consumer", &self.cons.mode())
            .finish()
    }
}
