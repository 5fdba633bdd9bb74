//! FFI functions for fixed-block pools

use std::{
    ffi::{c_char, c_uint, c_void},
    slice,
};

use log::{debug, warn};

use crate::{
    pool::{BlockHandle, Pool, PoolConfig},
    ring::SyncMode,
};

use super::{
    types::*,
    utils::{c_str_to_string, handle_ref, registry},
};

fn pool_ref<'a>(handle: PktMempoolHandle) -> Option<&'a Pool> {
    unsafe { handle_ref(handle, "mempool") }
}

/// Create a named pool of `count` blocks of `block_size` bytes
#[no_mangle]
pub extern "C" fn pktcore_mempool_create(
    name: *const c_char,
    count: c_uint,
    block_size: usize,
    flags: u32,
    pool_handle: *mut PktMempoolHandle,
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

    let config = PoolConfig::new(name.clone())
        .with_capacity(count as usize)
        .with_block_size(block_size)
        .with_modes(put_mode, get_mode);

    let pool = match Pool::new(config) {
        Ok(pool) => pool,
        Err(e) => return e.into(),
    };

    match registry().mempools.register(&name, pool) {
        Ok(ptr) => {
            unsafe { *pool_handle = ptr.cast() };
            PktErrorCode::Success
        }
        Err(e) => e.into(),
    }
}

/// Find a pool created earlier, or return null
#[no_mangle]
pub extern "C" fn pktcore_mempool_lookup(name: *const c_char) -> PktMempoolHandle {
    let Ok(name) = c_str_to_string(name) else {
        return std::ptr::null_mut();
    };

    registry()
        .mempools
        .lookup(&name)
        .map_or(std::ptr::null_mut(), |ptr| ptr.cast())
}

/// Destroy a pool; blocks still held become dangling
#[no_mangle]
pub extern "C" fn pktcore_mempool_free(pool: PktMempoolHandle) -> PktErrorCode {
    if pool.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    match registry().mempools.unregister(pool.cast()) {
        Some(pool) => {
            debug!("freed mempool `{}`", pool.name());
            PktErrorCode::Success
        }
        None => {
            warn!("pktcore_mempool_free: unknown pool handle {:p}", pool);
            PktErrorCode::NotFound
        }
    }
}

/// Take one block; its address is written to `obj`
#[no_mangle]
pub extern "C" fn pktcore_mempool_get(pool: PktMempoolHandle, obj: *mut *mut c_void) -> PktErrorCode {
    let Some(pool) = pool_ref(pool) else {
        return PktErrorCode::InvalidParameter;
    };
    if obj.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    match pool.acquire() {
        Ok(handle) => {
            unsafe { *obj = pool.block_ptr(handle).as_ptr().cast() };
            PktErrorCode::Success
        }
        Err(e) => e.into(),
    }
}

/// Take `n` blocks or none at all
#[no_mangle]
pub extern "C" fn pktcore_mempool_get_bulk(
    pool: PktMempoolHandle,
    obj_table: *mut *mut c_void,
    n: c_uint,
) -> PktErrorCode {
    let Some(pool) = pool_ref(pool) else {
        return PktErrorCode::InvalidParameter;
    };
    if n == 0 {
        return PktErrorCode::Success;
    }
    if obj_table.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    let out = unsafe { slice::from_raw_parts_mut(obj_table, n as usize) };
    pool.acquire_bulk_with(n as usize, |i, handle| {
        out[i] = pool.block_ptr(handle).as_ptr().cast();
    })
    .into()
}

/// Return one block by address
#[no_mangle]
pub extern "C" fn pktcore_mempool_put(pool: PktMempoolHandle, obj: *mut c_void) -> PktErrorCode {
    let Some(pool) = pool_ref(pool) else {
        return PktErrorCode::InvalidParameter;
    };

    match block_of(pool, obj) {
        Some(handle) => {
            pool.release(handle);
            PktErrorCode::Success
        }
        None => PktErrorCode::InvalidParameter,
    }
}

/// Return `n` blocks by address; nothing is returned if any address is foreign
#[no_mangle]
pub extern "C" fn pktcore_mempool_put_bulk(
    pool: PktMempoolHandle,
    obj_table: *const *mut c_void,
    n: c_uint,
) -> PktErrorCode {
    let Some(pool) = pool_ref(pool) else {
        return PktErrorCode::InvalidParameter;
    };
    if n == 0 {
        return PktErrorCode::Success;
    }
    if obj_table.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    let objs = unsafe { slice::from_raw_parts(obj_table, n as usize) };
    let handles: Option<Vec<BlockHandle>> = objs.iter().map(|obj| block_of(pool, *obj)).collect();

    match handles {
        Some(handles) => {
            pool.release_bulk(&handles);
            PktErrorCode::Success
        }
        None => PktErrorCode::InvalidParameter,
    }
}

/// Returns 1 if no block is free (or the handle is null), 0 otherwise
#[no_mangle]
pub extern "C" fn pktcore_mempool_empty(pool: PktMempoolHandle) -> i32 {
    pool_ref(pool).map_or(1, |pool| pool.is_empty() as i32)
}

/// Number of free blocks
#[no_mangle]
pub extern "C" fn pktcore_mempool_avail_count(pool: PktMempoolHandle) -> c_uint {
    pool_ref(pool).map_or(0, |pool| pool.available() as c_uint)
}

/// Number of blocks held by callers
#[no_mangle]
pub extern "C" fn pktcore_mempool_in_use_count(pool: PktMempoolHandle) -> c_uint {
    pool_ref(pool).map_or(0, |pool| pool.in_use() as c_uint)
}

/// Copy usage statistics into `stats`
#[no_mangle]
pub extern "C" fn pktcore_mempool_stats(
    pool: PktMempoolHandle,
    stats: *mut PktMempoolStats,
) -> PktErrorCode {
    let Some(pool) = pool_ref(pool) else {
        return PktErrorCode::InvalidParameter;
    };
    if stats.is_null() {
        return PktErrorCode::InvalidParameter;
    }

    unsafe { *stats = pool.stats().into() };
    PktErrorCode::Success
}

fn block_of(pool: &Pool, obj: *mut c_void) -> Option<BlockHandle> {
    let handle = pool.handle_of(obj.cast_const().cast());
    if handle.is_none() {
        warn!("{:p} is not a block of mempool `{}`", obj, pool.name());
    }
    handle
}
