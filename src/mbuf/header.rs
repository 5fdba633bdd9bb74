//! In-block packet buffer header

use std::{
    ptr::NonNull,
    sync::atomic::{AtomicU16, Ordering},
};

use crate::config::CACHE_LINE_SIZE;

use super::pool::MbufPool;

/// Bytes reserved at the start of each block for the header; the buffer
/// proper starts right after.
pub const MBUF_HEADER_ROOM: usize = CACHE_LINE_SIZE;

/// Packet buffer metadata, stored at the start of its pool block
#[repr(C)]
#[derive(Debug)]
pub struct MbufHeader {
    /// Pool that issued the block; not an owning reference
    pub(crate) pool: *const MbufPool,
    /// Offload flags, opaque to this crate
    pub(crate) ol_flags: u64,
    /// Block index inside the pool
    pub(crate) block: u32,
    pub(crate) refcnt: AtomicU16,
    /// Buffer bytes following the header
    pub(crate) buf_len: u16,
    /// Start of data relative to the buffer, i.e. the head-room
    pub(crate) data_off: u16,
    pub(crate) data_len: u16,
    /// Input or output port
    pub(crate) port: u16,
}

const _: () = assert!(std::mem::size_of::<MbufHeader>() <= MBUF_HEADER_ROOM);

impl MbufHeader {
    /// First byte of the buffer that follows `header`
    ///
    /// # Safety
    /// `header` must point at a header written by an [`MbufPool`].
    pub(crate) unsafe fn buf_addr(header: NonNull<MbufHeader>) -> *mut u8 {
        header.as_ptr().cast::<u8>().add(MBUF_HEADER_ROOM)
    }

    /// First byte of the current data
    ///
    /// # Safety
    /// As for [`MbufHeader::buf_addr`].
    pub(crate) unsafe fn data_addr(header: NonNull<MbufHeader>) -> *mut u8 {
        Self::buf_addr(header).add(header.as_ref().data_off as usize)
    }

    /// Add `n` references and return the new count, or `None` without
    /// touching the count if it would pass `u16::MAX`
    pub(crate) fn try_add_refs(&self, n: u16) -> Option<u16> {
        self.refcnt
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
                count.checked_add(n)
            })
            .ok()
            .map(|prev| prev + n)
    }

    pub(crate) fn tailroom(&self) -> usize {
        self.buf_len as usize - self.data_off as usize - self.data_len as usize
    }
}
