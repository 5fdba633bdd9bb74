//! Pool of packet buffers

use std::{
    fmt,
    mem::MaybeUninit,
    ptr::{self, NonNull},
    sync::atomic::{fence, AtomicU16, Ordering},
};

use log::debug;

use crate::{
    error::Result,
    pool::{BlockHandle, Pool, PoolConfig, PoolStats},
};

use super::{
    buffer::{Mbuf, RawMbuf},
    config::MbufPoolConfig,
    header::{MbufHeader, MBUF_HEADER_ROOM},
};

/// Pool of fixed-size packet buffers
///
/// Each block of the underlying [`Pool`] holds an [`MbufHeader`] followed by
/// `data_room` buffer bytes. Safe [`Mbuf`] handles borrow the pool, so it
/// cannot move or drop while they are alive. [`RawMbuf`] handles carry no
/// borrow: the pool must stay at the same address until every raw handle has
/// been converted back or freed.
pub struct MbufPool {
    pool: Pool,
    data_room: u16,
    headroom: u16,
}

impl MbufPool {
    /// Create a new packet buffer pool
    pub fn new(config: MbufPoolConfig) -> Result<Self> {
        config.validate()?;

        let pool = Pool::new(
            PoolConfig::new(config.name.clone())
                .with_block_size(MBUF_HEADER_ROOM + config.data_room)
                .with_capacity(config.capacity)
                .with_modes(config.put_mode, config.get_mode),
        )?;

        debug!(
            "created mbuf pool `{}`: {} buffers, data room {}, headroom {}",
            config.name, config.capacity, config.data_room, config.headroom
        );

        Ok(Self {
            pool,
            data_room: config.data_room as u16,
            headroom: config.headroom as u16,
        })
    }

    pub fn name(&self) -> &str {
        self.pool.name()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Buffer bytes per mbuf, head-room included
    pub fn data_room(&self) -> usize {
        self.data_room as usize
    }

    /// Head-room of a freshly allocated mbuf
    pub fn default_headroom(&self) -> usize {
        self.headroom as usize
    }

    /// Number of free buffers (advisory under concurrency)
    pub fn available(&self) -> usize {
        self.pool.available()
    }

    /// Number of buffers held by callers (advisory under concurrency)
    pub fn in_use(&self) -> usize {
        self.pool.in_use()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Underlying block pool
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Allocate one buffer with the default head-room and no data
    pub fn allocate(&self) -> Result<Mbuf<'_>> {
        let handle = self.pool.acquire()?;
        let header = self.init_block(handle);
        // SAFETY: the block was just acquired and its header written
        Ok(unsafe { Mbuf::from_header(self, header) })
    }

    /// Allocate `count` buffers, or none at all
    pub fn allocate_bulk(&self, count: usize) -> Result<Vec<Mbuf<'_>>> {
        let mut handles = vec![BlockHandle(0); count];
        self.pool.acquire_bulk(&mut handles)?;

        Ok(handles
            .into_iter()
            .map(|handle| {
                let header = self.init_block(handle);
                unsafe { Mbuf::from_header(self, header) }
            })
            .collect())
    }

    /// Fill `out` with raw buffers, or allocate none at all.
    ///
    /// On success every slot of `out` is initialised.
    pub fn allocate_bulk_raw(&self, out: &mut [MaybeUninit<RawMbuf>]) -> Result<()> {
        let count = out.len();
        self.pool.acquire_bulk_with(count, |i, handle| {
            out[i].write(RawMbuf::from_header(self.init_block(handle)));
        })
    }

    /// Take back ownership of a raw buffer.
    ///
    /// # Safety
    /// `raw` must have been issued by this pool and not freed or converted
    /// back already.
    pub unsafe fn from_raw(&self, raw: RawMbuf) -> Mbuf<'_> {
        debug_assert!(
            ptr::eq(raw.header().as_ref().pool, self),
            "mbuf returned to pool `{}` it was not allocated from",
            self.name()
        );
        Mbuf::from_header(self, raw.header())
    }

    /// Free a raw buffer.
    ///
    /// # Safety
    /// As for [`MbufPool::from_raw`].
    pub unsafe fn free_raw(&self, raw: RawMbuf) {
        drop(self.from_raw(raw));
    }

    /// Drop one reference, returning the block once none is left.
    ///
    /// # Safety
    /// `header` must belong to a live buffer of this pool and the caller must
    /// own the reference it gives up.
    pub(crate) unsafe fn put_ref(&self, header: NonNull<MbufHeader>) {
        let hdr = header.as_ref();
        debug_assert!(ptr::eq(hdr.pool, self), "mbuf freed to a foreign pool");

        let prev = hdr.refcnt.fetch_sub(1, Ordering::Release);
        debug_assert!(prev != 0, "mbuf of pool `{}` freed twice", self.name());

        if prev == 1 {
            // Synchronise with every earlier reference drop before reuse
            fence(Ordering::Acquire);
            self.pool.release(BlockHandle(hdr.block));
        }
    }

    fn init_block(&self, handle: BlockHandle) -> NonNull<MbufHeader> {
        let header = self.pool.block_ptr(handle).cast::<MbufHeader>();
        // SAFETY: the block is held by the caller and is at least
        // MBUF_HEADER_ROOM bytes, cache-line aligned
        unsafe {
            ptr::write(
                header.as_ptr(),
                MbufHeader {
                    pool: self,
                    ol_flags: 0,
                    block: handle.0,
                    refcnt: AtomicU16::new(1),
                    buf_len: self.data_room,
                    data_off: self.headroom,
                    data_len: 0,
                    port: 0,
                },
            );
        }
        header
    }
}

impl fmt::Debug for MbufPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MbufPool")
            .field("name", &self.name())
            .field("capacity", &self.capacity())
            .field("data_room", &self.data_room)
            .field("headroom", &self.headroom)
            .field("available", &self.available())
            .finish()
    }
}
