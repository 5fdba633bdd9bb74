//! Owned packet buffer handles

use std::{
    fmt,
    mem::{self, ManuallyDrop},
    process,
    ptr::NonNull,
    slice,
    sync::atomic::Ordering,
};

use crate::error::{PktError, Result};

use super::{header::MbufHeader, pool::MbufPool, shared::SharedMbuf};

/// Uniquely owned packet buffer
///
/// Borrows the pool it came from and returns its block there when freed or
/// dropped. The buffer is laid out as
/// `[head-room | data | tail-room]`; `prepend` and `append` grow the data into
/// the head-room and tail-room without moving bytes.
pub struct Mbuf<'a> {
    pool: &'a MbufPool,
    header: NonNull<MbufHeader>,
}

unsafe impl Send for Mbuf<'_> {}
unsafe impl Sync for Mbuf<'_> {}

impl<'a> Mbuf<'a> {
    /// # Safety
    /// `header` must be an initialised header of a block issued by `pool` and
    /// not owned by any other handle.
    pub(crate) unsafe fn from_header(pool: &'a MbufPool, header: NonNull<MbufHeader>) -> Self {
        Self { pool, header }
    }

    fn header(&self) -> &MbufHeader {
        // SAFETY: the header lives in a block owned by this handle
        unsafe { self.header.as_ref() }
    }

    fn header_mut(&mut self) -> &mut MbufHeader {
        // SAFETY: as above, and `&mut self` makes the access unique
        unsafe { self.header.as_mut() }
    }

    /// Pool this buffer will be returned to
    pub fn pool(&self) -> &'a MbufPool {
        self.pool
    }

    /// Bytes of data currently held
    pub fn data_len(&self) -> usize {
        self.header().data_len as usize
    }

    /// Free bytes in front of the data
    pub fn headroom(&self) -> usize {
        self.header().data_off as usize
    }

    /// Free bytes after the data
    pub fn tailroom(&self) -> usize {
        self.header().tailroom()
    }

    /// Total buffer size, head-room and tail-room included
    pub fn buf_len(&self) -> usize {
        self.header().buf_len as usize
    }

    /// Check if the buffer holds no data
    pub fn is_empty(&self) -> bool {
        self.data_len() == 0
    }

    /// Current reference count
    pub fn refcnt(&self) -> u16 {
        self.header().refcnt.load(Ordering::Acquire)
    }

    pub fn port(&self) -> u16 {
        self.header().port
    }

    pub fn set_port(&mut self, port: u16) {
        self.header_mut().port = port;
    }

    pub fn ol_flags(&self) -> u64 {
        self.header().ol_flags
    }

    pub fn set_ol_flags(&mut self, flags: u64) {
        self.header_mut().ol_flags = flags;
    }

    /// Pointer to the first data byte
    pub fn data_ptr(&self) -> *const u8 {
        unsafe { MbufHeader::data_addr(self.header) }
    }

    /// Get the data as a byte slice
    pub fn data(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.data_ptr(), self.data_len()) }
    }

    /// Get the data as a mutable byte slice
    pub fn data_mut(&mut self) -> &mut [u8] {
        let len = self.data_len();
        unsafe { slice::from_raw_parts_mut(MbufHeader::data_addr(self.header), len) }
    }

    /// Grow the data by `len` bytes at the front and return the new region.
    ///
    /// The region holds whatever bytes were there before; callers overwrite
    /// it, typically with a protocol header. Fails without touching the buffer
    /// when the head-room is too small.
    pub fn prepend(&mut self, len: usize) -> Result<&mut [u8]> {
        let headroom = self.headroom();
        if len > headroom {
            return Err(PktError::insufficient_headroom(len, headroom));
        }

        let header = self.header_mut();
        header.data_off -= len as u16;
        header.data_len += len as u16;

        Ok(&mut self.data_mut()[..len])
    }

    /// Grow the data by `len` bytes at the back and return the new region
    pub fn append(&mut self, len: usize) -> Result<&mut [u8]> {
        let tailroom = self.tailroom();
        if len > tailroom {
            return Err(PktError::insufficient_tailroom(len, tailroom));
        }

        let old_len = self.data_len();
        self.header_mut().data_len += len as u16;

        Ok(&mut self.data_mut()[old_len..])
    }

    /// Drop `len` bytes from the front of the data, returning them to the head-room
    pub fn trim_front(&mut self, len: usize) -> Result<()> {
        let data_len = self.data_len();
        if len > data_len {
            return Err(PktError::insufficient_data(len, data_len));
        }

        let header = self.header_mut();
        header.data_off += len as u16;
        header.data_len -= len as u16;
        Ok(())
    }

    /// Drop `len` bytes from the back of the data, returning them to the tail-room
    pub fn trim_back(&mut self, len: usize) -> Result<()> {
        let data_len = self.data_len();
        if len > data_len {
            return Err(PktError::insufficient_data(len, data_len));
        }

        self.header_mut().data_len -= len as u16;
        Ok(())
    }

    /// Restore the state of a freshly allocated buffer
    pub fn reset(&mut self) {
        let headroom = self.pool.default_headroom() as u16;
        let header = self.header_mut();
        header.data_off = headroom;
        header.data_len = 0;
        header.port = 0;
        header.ol_flags = 0;
    }

    /// Give up ownership as a pointer-sized handle suitable for a ring.
    ///
    /// Turn it back into an `Mbuf` with [`MbufPool::from_raw`], or free it
    /// with [`MbufPool::free_raw`], otherwise the block leaks.
    pub fn into_raw(self) -> RawMbuf {
        let raw = RawMbuf(self.header);
        mem::forget(self);
        raw
    }

    /// Convert into a shareable, read-only handle
    pub fn into_shared(self) -> SharedMbuf<'a> {
        let pool = self.pool;
        let header = self.header;
        mem::forget(self);
        // SAFETY: ownership of the single reference moves to the shared handle
        unsafe { SharedMbuf::from_header(pool, header) }
    }

    /// Return the block to its pool
    pub fn free(self) {
        drop(self)
    }
}

impl Drop for Mbuf<'_> {
    fn drop(&mut self) {
        // SAFETY: this handle owns one reference to a block of `self.pool`
        unsafe { self.pool.put_ref(self.header) }
    }
}

impl fmt::Debug for Mbuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mbuf")
            .field("pool", &self.pool.name())
            .field("headroom", &self.headroom())
            .field("data_len", &self.data_len())
            .field("tailroom", &self.tailroom())
            .field("refcnt", &self.refcnt())
            .finish()
    }
}

/// Pointer-sized, copyable packet buffer handle
///
/// Carries no lifetime and does not free anything on drop; it is what moves
/// through a [`Ring`](crate::ring::Ring) and across the C ABI.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawMbuf(NonNull<MbufHeader>);

unsafe impl Send for RawMbuf {}
unsafe impl Sync for RawMbuf {}

impl RawMbuf {
    pub(crate) fn from_header(header: NonNull<MbufHeader>) -> Self {
        Self(header)
    }

    pub(crate) fn header(self) -> NonNull<MbufHeader> {
        self.0
    }

    /// Wrap a pointer obtained from [`RawMbuf::as_ptr`]
    pub fn from_ptr(ptr: *mut MbufHeader) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut MbufHeader {
        self.0.as_ptr()
    }

    /// Run `f` on the buffer without taking ownership of it.
    ///
    /// # Safety
    /// The handle must refer to a live buffer whose pool is still in place,
    /// and no other thread may access the buffer during the call.
    pub unsafe fn with_mbuf<R>(self, f: impl FnOnce(&mut Mbuf<'_>) -> R) -> R {
        let pool = &*self.0.as_ref().pool;
        let mut mbuf = ManuallyDrop::new(Mbuf::from_header(pool, self.0));
        f(&mut *mbuf)
    }

    /// Add `delta` to the reference count and return the new count.
    ///
    /// A negative `delta` must not take the count to zero; use
    /// [`RawMbuf::free`] to drop the last reference. The process aborts if a
    /// positive `delta` would push the count past `u16::MAX`, since a wrapped
    /// count frees the block under live holders.
    ///
    /// # Safety
    /// The handle must refer to a live buffer and the caller must own the
    /// references it gives up.
    pub unsafe fn refcnt_update(self, delta: i16) -> u16 {
        let header = self.0.as_ref();
        if delta >= 0 {
            match header.try_add_refs(delta as u16) {
                Some(count) => count,
                None => process::abort(),
            }
        } else {
            let refcnt = &header.refcnt;
            let dec = delta.unsigned_abs();
            let prev = refcnt.fetch_sub(dec, Ordering::Release);
            debug_assert!(prev > dec, "refcnt update would free a live mbuf");
            prev.wrapping_sub(dec)
        }
    }

    /// Drop one reference, returning the block to the pool that issued it
    /// once no reference is left.
    ///
    /// # Safety
    /// The handle must refer to a live buffer whose pool is still in place and
    /// must not be used afterwards.
    pub unsafe fn free(self) {
        let pool = &*self.0.as_ref().pool;
        pool.put_ref(self.0);
    }
}
