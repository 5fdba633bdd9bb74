//! Fixed-block object pool backed by a ring of free block indices

use std::{alloc::Layout, fmt, ptr::NonNull};

#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use crate::{
    config::CACHE_LINE_SIZE,
    error::{PktError, Result},
    ring::{headtail::Behavior, Ring, RingConfig},
};

use super::{
    config::PoolConfig,
    stats::{AtomicPoolStats, PoolStats},
};

/// Handle to one block of a [`Pool`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(pub(crate) u32);

impl BlockHandle {
    /// Position of the block inside its pool's arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pool of same-sized blocks carved out of one contiguous arena
///
/// Every block is either free, with its index sitting in the free ring, or in
/// use by exactly one holder. Acquire and release are lock-free ring
/// operations.
pub struct Pool {
    name: String,
    /// Base of the zero-initialised arena
    arena: NonNull<u8>,
    layout: Layout,
    /// Distance between blocks
    stride: usize,
    /// Requested block size
    block_size: usize,
    capacity: usize,
    /// Indices of free blocks
    free: Ring<u32>,
    /// Per-block ownership flags for double-release detection
    #[cfg(debug_assertions)]
    held: Box<[AtomicBool]>,
    stats: AtomicPoolStats,
}

impl Pool {
    /// Create a new pool with every block free
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let stride = config.stride();
        let total_size = config
            .total_memory_required()
            .ok_or_else(|| PktError::memory("Pool arena size overflows"))?;

        let free: Ring<u32> = Ring::with_config(
            RingConfig::new(config.name.clone())
                .with_capacity(config.capacity)
                .with_exact_size(true)
                .with_producer(config.put_mode)
                .with_consumer(config.get_mode),
        )?;

        // Every block index starts out free, lowest first
        let seeded = free.enqueue_with(config.capacity, Behavior::Fixed, |i| i as u32);
        if seeded.count != config.capacity {
            return Err(PktError::memory("Failed to seed pool free ring"));
        }

        let layout = Layout::from_size_align(total_size, config.alignment.max(CACHE_LINE_SIZE))
            .map_err(|_| PktError::memory("Failed to create layout for pool arena"))?;

        let arena = unsafe {
            let ptr = std::alloc::alloc_zeroed(layout);
            NonNull::new(ptr).ok_or_else(|| PktError::memory("Failed to allocate pool arena"))?
        };


        debug!(
            "created pool `{}`: {} blocks of {} bytes (stride {}), {} bytes total",
            config.name, config.capacity, config.block_size, stride, total_size
        );

        Ok(Self {
            name: config.name,
            arena,
            layout,
            stride,
            block_size: config.block_size,
            capacity: config.capacity,
            free,
            #[cfg(debug_assertions)]
            held: (0..config.capacity).map(|_| AtomicBool::new(false)).collect(),
            stats: AtomicPoolStats::new(),
        })
    }

    /// Get pool name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get block size
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Distance in bytes between consecutive blocks
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Get total number of blocks
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free blocks (advisory under concurrency)
    pub fn available(&self) -> usize {
        self.free.count()
    }

    /// Number of blocks held by callers (advisory under concurrency)
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    /// True when no block is free (advisory under concurrency)
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// True when every block is free (advisory under concurrency)
    pub fn is_full(&self) -> bool {
        self.free.is_full()
    }

    /// Take one free block
    pub fn acquire(&self) -> Result<BlockHandle> {
        match self.free.dequeue() {
            Ok(index) => {
                self.mark_acquired(index);
                self.stats.record_acquisition(1);
                Ok(BlockHandle(index))
            }
            Err(_) => {
                self.stats.record_failure();
                Err(PktError::pool_exhausted(1, self.available()))
            }
        }
    }

    /// Fill `out` with free blocks, or take none at all
    pub fn acquire_bulk(&self, out: &mut [BlockHandle]) -> Result<()> {
        let wanted = out.len();
        self.acquire_bulk_with(wanted, |i, handle| out[i] = handle)
    }

    /// All-or-nothing acquire of `count` blocks, delivered through `sink`.
    ///
    /// `sink` runs inside the free ring's critical window and must not panic.
    pub(crate) fn acquire_bulk_with(
        &self,
        count: usize,
        mut sink: impl FnMut(usize, BlockHandle),
    ) -> Result<()> {
        let result = self.free.dequeue_with(count, Behavior::Fixed, |i, index| {
            self.mark_acquired(index);
            sink(i, BlockHandle(index));
        });

        if result.count != count {
            self.stats.record_failure();
            return Err(PktError::pool_exhausted(count, result.remaining));
        }

        self.stats.record_acquisition(count);
        Ok(())
    }

    /// Return one block.
    ///
    /// # Panics
    /// If the handle is out of range for this pool. In debug builds also if
    /// the block is not currently in use (double release).
    pub fn release(&self, handle: BlockHandle) {
        self.check_handle(handle);
        self.mark_released(handle.0);

        let pushed = self.free.enqueue(handle.0);
        debug_assert!(pushed.is_ok(), "free ring of pool `{}` overflowed", self.name);

        self.stats.record_release(1);
    }

    /// Return several blocks at once
    pub fn release_bulk(&self, handles: &[BlockHandle]) {
        for handle in handles {
            self.check_handle(*handle);
            self.mark_released(handle.0);
        }

        let pushed = self
            .free
            .enqueue_with(handles.len(), Behavior::Fixed, |i| handles[i].0);
        debug_assert_eq!(
            pushed.count,
            handles.len(),
            "free ring of pool `{}` overflowed",
            self.name
        );

        self.stats.record_release(handles.len());
    }

    /// Start address of a block
    pub fn block_ptr(&self, handle: BlockHandle) -> NonNull<u8> {
        self.check_handle(handle);
        // SAFETY: index < capacity keeps the offset inside the arena
        unsafe { NonNull::new_unchecked(self.arena.as_ptr().add(handle.index() * self.stride)) }
    }

    /// Mutable view of a block.
    ///
    /// # Safety
    /// The caller must hold `handle` (acquired and not yet released) and must
    /// not create overlapping views of the same block.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn block_mut(&self, handle: BlockHandle) -> &mut [u8] {
        std::slice::from_raw_parts_mut(self.block_ptr(handle).as_ptr(), self.block_size)
    }

    /// Map a block start address back to its handle
    pub fn handle_of(&self, ptr: *const u8) -> Option<BlockHandle> {
        let base = self.arena.as_ptr() as usize;
        let addr = ptr as usize;
        if addr < base {
            return None;
        }

        let offset = addr - base;
        if offset % self.stride != 0 || offset / self.stride >= self.capacity {
            return None;
        }

        Some(BlockHandle((offset / self.stride) as u32))
    }

    /// Check if `ptr` points anywhere inside the arena
    pub fn contains(&self, ptr: *const u8) -> bool {
        let base = self.arena.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= base && addr < base + self.stride * self.capacity
    }

    /// Get current statistics snapshot
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot(self.capacity)
    }

    fn check_handle(&self, handle: BlockHandle) {
        assert!(
            handle.index() < self.capacity,
            "block {} does not belong to pool `{}` ({} blocks)",
            handle.index(),
            self.name,
            self.capacity
        );
    }

    #[cfg(debug_assertions)]
    fn mark_acquired(&self, index: u32) {
        let was_held = self.held[index as usize].swap(true, Ordering::AcqRel);
        assert!(
            !was_held,
            "block {} of pool `{}` handed out twice",
            index, self.name
        );
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn mark_acquired(&self, _index: u32) {}

    #[cfg(debug_assertions)]
    fn mark_released(&self, index: u32) {
        let was_held = self.held[index as usize].swap(false, Ordering::AcqRel);
        assert!(
            was_held,
            "block {} of pool `{}` released while not in use",
            index, self.name
        );
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn mark_released(&self, _index: u32) {}
}

impl Drop for Pool {
    fn drop(&mut self) {
        let outstanding = self.in_use();
        if outstanding > 0 {
            warn!(
                "pool `{}` dropped with {} blocks still in use",
                self.name, outstanding
            );
        }

        unsafe {
            std::alloc::dealloc(self.arena.as_ptr(), self.layout);
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("block_size", &self.block_size)
            .field("stride", &self.stride)
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}

unsafe impl Send for Pool {}
unsafe impl Sync for Pool {}
