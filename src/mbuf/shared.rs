//! Reference-counted packet buffers

use std::{fmt, mem, process, ptr::NonNull, slice, sync::atomic::Ordering};

use super::{buffer::Mbuf, header::MbufHeader, pool::MbufPool};

/// Read-only packet buffer shared between several holders
///
/// Cloning bumps the reference count stored in the buffer header; the block
/// goes back to its pool when the last clone drops.
pub struct SharedMbuf<'a> {
    pool: &'a MbufPool,
    header: NonNull<MbufHeader>,
}

unsafe impl Send for SharedMbuf<'_> {}
unsafe impl Sync for SharedMbuf<'_> {}

impl<'a> SharedMbuf<'a> {
    /// # Safety
    /// The caller hands over one reference to a live buffer of `pool`.
    pub(crate) unsafe fn from_header(pool: &'a MbufPool, header: NonNull<MbufHeader>) -> Self {
        Self { pool, header }
    }

    fn header(&self) -> &MbufHeader {
        unsafe { self.header.as_ref() }
    }

    pub fn data_len(&self) -> usize {
        self.header().data_len as usize
    }

    pub fn data(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(MbufHeader::data_addr(self.header), self.data_len()) }
    }

    pub fn port(&self) -> u16 {
        self.header().port
    }

    /// Number of live handles to this buffer
    pub fn refcnt(&self) -> u16 {
        self.header().refcnt.load(Ordering::Acquire)
    }

    /// Recover unique ownership if this is the last handle
    pub fn try_unique(self) -> Result<Mbuf<'a>, Self> {
        if self.header().refcnt.load(Ordering::Acquire) != 1 {
            return Err(self);
        }

        let pool = self.pool;
        let header = self.header;
        mem::forget(self);
        // SAFETY: the count is 1 and we hold it, so no clone can appear
        Ok(unsafe { Mbuf::from_header(pool, header) })
    }
}

impl Clone for SharedMbuf<'_> {
    fn clone(&self) -> Self {
        if self.header().try_add_refs(1).is_none() {
            // A wrapped count would free the block under live handles
            process::abort();
        }

        Self {
            pool: self.pool,
            header: self.header,
        }
    }
}

impl Drop for SharedMbuf<'_> {
    fn drop(&mut self) {
        unsafe { self.pool.put_ref(self.header) }
    }
}

impl fmt::Debug for SharedMbuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMbuf")
            .field("pool", &self.pool.name())
            .field("data_len", &self.data_len())
            .field("refcnt", &self.refcnt())
            .finish()
    }
}
