//! Caller-side retry policies
//!
//! Ring, pool and mbuf operations report `Full`, `Empty` and `PoolExhausted`
//! immediately. Pipeline stages that would rather wait wrap those calls in a
//! [`SpinPolicy`].

use std::{hint, thread};

use crate::{
    error::{PktError, Result},
    mbuf::{Mbuf, MbufPool},
    pool::{BlockHandle, Pool},
    ring::Ring,
};

/// Bounded spin-then-yield retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinPolicy {
    /// Attempts that only issue a spin hint before the next try
    pub spins: u32,
    /// Total attempts before giving up; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for SpinPolicy {
    fn default() -> Self {
        Self {
            spins: 64,
            max_attempts: Some(1 << 20),
        }
    }
}

impl SpinPolicy {
    /// Try exactly once
    pub const fn once() -> Self {
        Self {
            spins: 0,
            max_attempts: Some(1),
        }
    }

    /// Retry until the operation stops reporting backpressure
    pub const fn forever() -> Self {
        Self {
            spins: 64,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Run `op` until it succeeds, fails with a non-backpressure error, or
    /// the attempt budget runs out; the last error is returned in the
    /// latter two cases.
    pub fn run<T>(&self, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            match op() {
                Err(err) if err.is_backpressure() => {
                    attempt = attempt.saturating_add(1);
                    if self.max_attempts.map_or(false, |max| attempt >= max) {
                        return Err(err);
                    }
                    self.pause(attempt);
                }
                other => return other,
            }
        }
    }

    fn pause(&self, attempt: u32) {
        if attempt <= self.spins {
            hint::spin_loop();
        } else {
            thread::yield_now();
        }
    }
}

/// Enqueue every item of `items` in order, bursting as space frees up.
///
/// Returns how many items went in together with the outcome. After
/// `Err(Full)` exactly that prefix of `items` has been enqueued.
pub fn enqueue_all<T: Copy>(
    ring: &Ring<T>,
    items: &[T],
    policy: &SpinPolicy,
) -> (usize, Result<()>) {
    let mut done = 0;
    let result = policy.run(|| {
        done += ring.enqueue_burst(&items[done..]).count;
        if done == items.len() {
            Ok(())
        } else {
            Err(PktError::Full)
        }
    });
    (done, result)
}

/// Fill `out` from the ring in order, bursting as items arrive
pub fn dequeue_exact<T: Copy>(
    ring: &Ring<T>,
    out: &mut [T],
    policy: &SpinPolicy,
) -> (usize, Result<()>) {
    let mut done = 0;
    let wanted = out.len();
    let result = policy.run(|| {
        done += ring.dequeue_burst(&mut out[done..]).count;
        if done == wanted {
            Ok(())
        } else {
            Err(PktError::Empty)
        }
    });
    (done, result)
}

/// Acquire a block, waiting for one to be released
pub fn acquire(pool: &Pool, policy: &SpinPolicy) -> Result<BlockHandle> {
    policy.run(|| pool.acquire())
}

/// Allocate an mbuf, waiting for one to be freed
pub fn allocate<'a>(pool: &'a MbufPool, policy: &SpinPolicy) -> Result<Mbuf<'a>> {
    policy.run(|| pool.allocate())
}
