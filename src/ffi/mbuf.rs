//! FFI functions for packet buffers and their pools

use std::{
    ffi::{c_char, c_uint, c_void},
    mem::MaybeUninit,
    slice,
};

use log::{debug, warn};

use crate::{
    mbuf::{Mbuf, MbufHeader, MbufPool, MbufPoolConfig, RawMbuf},
    ring::SyncMode,
};

use super::{
    types::*,
    utils::{c_str_to_string, handle_ref, registry},
};

fn mbuf_pool_ref<'a>(handle: PktMbufPoolHandle) -> Option<&'a MbufPool> {
    unsafe { handle_ref(handle, "mbuf pool") }
}

fn raw_mbuf(handle: PktMbufHandle) -> Option<RawMbuf> {
    let raw = RawMbuf::from_ptr(handle.cast::<MbufHeader>());
    if raw.is_none() {
        warn!("null mbuf handle passed to C API");
    }
    raw
}

/// Borrow the buffer behind `handle` for one call
fn with_mbuf<R>(handle: PktMbufHandle, default: R, f: impl FnOnce(&mut Mbuf<'_>) -> R) -> R {
    match raw_mbuf(handle) {
        // SAFETY: C callers hand in buffers they own and keep their pool alive
        Some(raw) => unsafe { raw.with_mbuf(f) },
        None => default,
    }
}

/// Create a named pool of `count` packet buffers
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_pool_create(
    name: *const c_char,
    count: c_uint,
    data_room_size: u16,
    headroom: u16,
    flags: u32,
    pool_handle: *mut PktMbufPoolHandle,
) -> PktErrorCode {
    if pool_handle.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    let name = match c_str_to_string(name) {
        Ok(name) => name,
        Err(e) => return e.into(),
    };

    let put_mode = if flags & PKTCORE_MEMPOOL_F_SP_PUT != 0 {
        SyncMode::Single
    } else {
        SyncMode::Multi
    };
    let get_mode = if flags & PKTCORE_MEMPOOL_F_SC_GET != 0 {
        SyncMode::Single
    } else {
        SyncMode::Multi
    };

    let config = MbufPoolConfig::new(name.clone())
        .with_capacity(count as usize)
        .with_data_room(data_room_size as usize)
        .with_headroom(headroom as usize)
        .with_modes(put_mode, get_mode);

    let pool = match MbufPool::new(config) {
        Ok(pool) => pool,
        Err(e) => return e.into(),
    };

    // The registry boxes the pool, so headers can point at it
    match registry().mbuf_pools.register(&name, pool) {
        Ok(ptr) => {
            unsafe { *pool_handle = ptr.cast() };
            PktErrorCode::Success
        }
        Err(e) => e.into(),
    }
}

/// Find an mbuf pool created earlier, or return null
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_pool_lookup(name: *const c_char) -> PktMbufPoolHandle {
    let Ok(name) = c_str_to_string(name) else {
        return std::ptr::null_mut();
    };

    registry()
        .mbuf_pools
        .lookup(&name)
        .map_or(std::ptr::null_mut(), |ptr| ptr.cast())
}

/// Destroy an mbuf pool; fails while buffers are still allocated
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_pool_free(pool: PktMbufPoolHandle) -> PktErrorCode {
    if pool.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    // Hold the registry across the check and the removal so a concurrent
    // free cannot drop the pool in between
    let mut registry = registry();
    let Some(mbuf_pool) = registry.mbuf_pools.get(pool.cast()) else {
        warn!("pktcore_pktmbuf_pool_free: unknown mbuf pool handle {:p}", pool);
        return PktErrorCode::NotFound;
    };

    let in_use = mbuf_pool.in_use();
    if in_use > 0 {
        warn!(
            "refusing to free mbuf pool `{}` with {} buffers in use",
            mbuf_pool.name(),
            in_use
        );
        return PktErrorCode::InvalidParameter;
    }

    match registry.mbuf_pools.unregister(pool.cast()) {
        Some(pool) => {
            debug!("freed mbuf pool `{}`", pool.name());
            PktErrorCode::Success
        }
        None => PktErrorCode::NotFound,
    }
}

/// Allocate one buffer, or return null when the pool is exhausted
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_alloc(pool: PktMbufPoolHandle) -> PktMbufHandle {
    let Some(pool) = mbuf_pool_ref(pool) else {
        return std::ptr::null_mut();
    };

    match pool.allocate() {
        Ok(mbuf) => mbuf.into_raw().as_ptr().cast(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Allocate `count` buffers into `mbufs`, or none at all
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_alloc_bulk(
    pool: PktMbufPoolHandle,
    mbufs: *mut PktMbufHandle,
    count: c_uint,
) -> PktErrorCode {
    let Some(pool) = mbuf_pool_ref(pool) else {
        return PktErrorCode::InvalidParameter;
    };
    if count == 0 {
        return PktErrorCode::Success;
    }
    if mbufs.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    // RawMbuf is a transparent non-null pointer, so the table layouts match
    let out = unsafe {
        slice::from_raw_parts_mut(mbufs.cast::<MaybeUninit<RawMbuf>>(), count as usize)
    };
    pool.allocate_bulk_raw(out).into()
}

/// Grow the data by `len` bytes at the front; returns the new data start,
/// or null if the head-room is too small
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_prepend(m: PktMbufHandle, len: u16) -> *mut c_char {
    with_mbuf(m, std::ptr::null_mut(), |mbuf| match mbuf.prepend(len as usize) {
        Ok(region) => region.as_mut_ptr().cast(),
        Err(_) => std::ptr::null_mut(),
    })
}

/// Grow the data by `len` bytes at the back; returns the start of the new
/// region, or null if the tail-room is too small
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_append(m: PktMbufHandle, len: u16) -> *mut c_char {
    with_mbuf(m, std::ptr::null_mut(), |mbuf| match mbuf.append(len as usize) {
        Ok(region) => region.as_mut_ptr().cast(),
        Err(_) => std::ptr::null_mut(),
    })
}

/// Drop `len` bytes from the front; returns the new data start, or null if
/// the buffer holds fewer bytes
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_adj(m: PktMbufHandle, len: u16) -> *mut c_char {
    with_mbuf(m, std::ptr::null_mut(), |mbuf| {
        match mbuf.trim_front(len as usize) {
            Ok(()) => mbuf.data_ptr().cast_mut().cast(),
            Err(_) => std::ptr::null_mut(),
        }
    })
}

/// Drop `len` bytes from the back
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_trim(m: PktMbufHandle, len: u16) -> PktErrorCode {
    with_mbuf(m, PktErrorCode::InvalidParameter, |mbuf| {
        mbuf.trim_back(len as usize).into()
    })
}

/// Drop one reference; the buffer returns to its pool with the last one
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_free(m: PktMbufHandle) {
    if let Some(raw) = RawMbuf::from_ptr(m.cast()) {
        // SAFETY: C callers give up the reference they own
        unsafe { raw.free() };
    }
}

/// Start of the data
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_mtod(m: PktMbufHandle) -> *mut c_void {
    with_mbuf(m, std::ptr::null_mut(), |mbuf| mbuf.data_ptr().cast_mut().cast())
}

#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_data_len(m: PktMbufHandle) -> u16 {
    with_mbuf(m, 0, |mbuf| mbuf.data_len() as u16)
}

#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_headroom(m: PktMbufHandle) -> u16 {
    with_mbuf(m, 0, |mbuf| mbuf.headroom() as u16)
}

#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_tailroom(m: PktMbufHandle) -> u16 {
    with_mbuf(m, 0, |mbuf| mbuf.tailroom() as u16)
}

/// Add `delta` to the reference count and return the new count
#[no_mangle]
pub extern "C" fn pktcore_pktmbuf_refcnt_update(m: PktMbufHandle, delta: i16) -> u16 {
    match raw_mbuf(m) {
        Some(raw) => unsafe { raw.refcnt_update(delta) },
        None => 0,
    }
}
