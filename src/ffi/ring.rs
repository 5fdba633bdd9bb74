//! FFI functions for ring queues

use std::{
    ffi::{c_char, c_uint, c_void},
    mem::MaybeUninit,
    slice,
};

use log::{debug, warn};

use crate::ring::{Ring, RingConfig, SyncMode};

use super::{
    types::*,
    utils::{c_str_to_string, handle_ref, registry},
};

fn ring_ref<'a>(handle: PktRingHandle) -> Option<&'a Ring<ObjPtr>> {
    unsafe { handle_ref(handle, "ring") }
}

fn mode_for(flags: u32, single_flag: u32) -> SyncMode {
    if flags & single_flag != 0 {
        SyncMode::Single
    } else {
        SyncMode::Multi
    }
}

fn write_out(out: *mut c_uint, value: usize) {
    if !out.is_null() {
        unsafe { *out = value as c_uint };
    }
}

/// Create a named ring of object pointers
#[no_mangle]
pub extern "C" fn pktcore_ring_create(
    name: *const c_char,
    count: c_uint,
    flags: u32,
    ring_handle: *mut PktRingHandle,
) -> PktErrorCode {
    if ring_handle.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    let name = match c_str_to_string(name) {
        Ok(name) => name,
        Err(e) => return e.into(),
    };

    let config = RingConfig::new(name.clone())
        .with_capacity(count as usize)
        .with_producer(mode_for(flags, PKTCORE_RING_F_SP_ENQ))
        .with_consumer(mode_for(flags, PKTCORE_RING_F_SC_DEQ))
        .with_exact_size(flags & PKTCORE_RING_F_EXACT_SZ != 0);

    let ring = match Ring::with_config(config) {
        Ok(ring) => ring,
        Err(e) => return e.into(),
    };

    match registry().rings.register(&name, ring) {
        Ok(ptr) => {
            unsafe { *ring_handle = ptr.cast() };
            PktErrorCode::Success
        }
        Err(e) => e.into(),
    }
}

/// Find a ring created earlier, or return null
#[no_mangle]
pub extern "C" fn pktcore_ring_lookup(name: *const c_char) -> PktRingHandle {
    let Ok(name) = c_str_to_string(name) else {
        return std::ptr::null_mut();
    };

    match registry().rings.lookup(&name) {
        Some(ptr) => ptr.cast(),
        None => std::ptr::null_mut(),
    }
}

/// Destroy a ring; objects still queued are not touched
#[no_mangle]
pub extern "C" fn pktcore_ring_free(ring: PktRingHandle) -> PktErrorCode {
    if ring.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    match registry().rings.unregister(ring.cast()) {
        Some(ring) => {
            debug!("freed ring `{}` with {} entries", ring.name(), ring.count());
            PktErrorCode::Success
        }
        None => {
            warn!("pktcore_ring_free: unknown ring handle {:p}", ring);
            PktErrorCode::NotFound
        }
    }
}

/// Enqueue one object
#[no_mangle]
pub extern "C" fn pktcore_ring_enqueue(ring: PktRingHandle, obj: *mut c_void) -> PktErrorCode {
    match ring_ref(ring) {
        Some(ring) => ring.enqueue(ObjPtr(obj)).into(),
        None => PktErrorCode::InvalidParameter,
    }
}

/// Dequeue one object into `obj`
#[no_mangle]
pub extern "C" fn pktcore_ring_dequeue(ring: PktRingHandle, obj: *mut *mut c_void) -> PktErrorCode {
    let Some(ring) = ring_ref(ring) else {
        return PktErrorCode::InvalidParameter;
    };
    if obj.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    match ring.dequeue() {
        Ok(item) => {
            unsafe { *obj = item.0 };
            PktErrorCode::Success
        }
        Err(e) => e.into(),
    }
}

/// Enqueue all `n` objects or none; returns the number enqueued
#[no_mangle]
pub extern "C" fn pktcore_ring_enqueue_bulk(
    ring: PktRingHandle,
    obj_table: *const *mut c_void,
    n: c_uint,
    free_space: *mut c_uint,
) -> c_uint {
    let Some(ring) = ring_ref(ring) else {
        return 0;
    };
    let Some(items) = (unsafe { obj_slice(obj_table, n) }) else {
        return 0;
    };

    match ring.enqueue_bulk(items) {
        Ok(free) => {
            write_out(free_space, free);
            n
        }
        Err(_) => {
            write_out(free_space, ring.free_count());
            0
        }
    }
}

/// Enqueue up to `n` objects; returns the number enqueued
#[no_mangle]
pub extern "C" fn pktcore_ring_enqueue_burst(
    ring: PktRingHandle,
    obj_table: *const *mut c_void,
    n: c_uint,
    free_space: *mut c_uint,
) -> c_uint {
    let Some(ring) = ring_ref(ring) else {
        return 0;
    };
    let Some(items) = (unsafe { obj_slice(obj_table, n) }) else {
        return 0;
    };

    let result = ring.enqueue_burst(items);
    write_out(free_space, result.remaining);
    result.count as c_uint
}

/// Dequeue exactly `n` objects or none; returns the number dequeued
#[no_mangle]
pub extern "C" fn pktcore_ring_dequeue_bulk(
    ring: PktRingHandle,
    obj_table: *mut *mut c_void,
    n: c_uint,
    available: *mut c_uint,
) -> c_uint {
    let Some(ring) = ring_ref(ring) else {
        return 0;
    };
    let Some(out) = (unsafe { obj_slice_mut(obj_table, n) }) else {
        return 0;
    };

    match ring.dequeue_bulk_uninit(out) {
        Ok(remaining) => {
            write_out(available, remaining);
            n
        }
        Err(_) => {
            write_out(available, ring.count());
            0
        }
    }
}

/// Dequeue up to `n` objects; returns the number dequeued
#[no_mangle]
pub extern "C" fn pktcore_ring_dequeue_burst(
    ring: PktRingHandle,
    obj_table: *mut *mut c_void,
    n: c_uint,
    available: *mut c_uint,
) -> c_uint {
    let Some(ring) = ring_ref(ring) else {
        return 0;
    };
    let Some(out) = (unsafe { obj_slice_mut(obj_table, n) }) else {
        return 0;
    };

    let result = ring.dequeue_burst_uninit(out);
    write_out(available, result.remaining);
    result.count as c_uint
}

/// Returns 1 if the ring is empty (or the handle is null), 0 otherwise
#[no_mangle]
pub extern "C" fn pktcore_ring_empty(ring: PktRingHandle) -> i32 {
    ring_ref(ring).map_or(1, |ring| ring.is_empty() as i32)
}

/// Number of queued objects
#[no_mangle]
pub extern "C" fn pktcore_ring_count(ring: PktRingHandle) -> c_uint {
    ring_ref(ring).map_or(0, |ring| ring.count() as c_uint)
}

/// Number of free slots
#[no_mangle]
pub extern "C" fn pktcore_ring_free_count(ring: PktRingHandle) -> c_uint {
    ring_ref(ring).map_or(0, |ring| ring.free_count() as c_uint)
}

/// Usable capacity
#[no_mangle]
pub extern "C" fn pktcore_ring_get_capacity(ring: PktRingHandle) -> c_uint {
    ring_ref(ring).map_or(0, |ring| ring.capacity() as c_uint)
}

/// # Safety
/// A non-null `table` must point at `n` readable pointers.
unsafe fn obj_slice<'a>(table: *const *mut c_void, n: c_uint) -> Option<&'a [ObjPtr]> {
    if n == 0 {
        return Some(&[]);
    }
    if table.is_null() {
        warn!("null object table passed with n = {}", n);
        return None;
    }
    // ObjPtr is a transparent wrapper around the pointer
    Some(slice::from_raw_parts(table.cast::<ObjPtr>(), n as usize))
}

/// # Safety
/// A non-null `table` must point at `n` writable pointers.
unsafe fn obj_slice_mut<'a>(
    table: *mut *mut c_void,
    n: c_uint,
) -> Option<&'a mut [MaybeUninit<ObjPtr>]> {
    if n == 0 {
        return Some(&mut []);
    }
    if table.is_null() {
        warn!("null object table passed with n = {}", n);
        return None;
    }
    Some(slice::from_raw_parts_mut(
        table.cast::<MaybeUninit<ObjPtr>>(),
        n as usize,
    ))
}
