//! FFI type definitions and handle types

use std::ffi::c_void;

use crate::error::PktError;

/// Opaque handle types for C API
pub type PktRingHandle = *mut c_void;
pub type PktMempoolHandle = *mut c_void;
pub type PktMbufPoolHandle = *mut c_void;
pub type PktMbufHandle = *mut c_void;

/// Producer side of the ring is single-threaded
pub const PKTCORE_RING_F_SP_ENQ: u32 = 0x0001;
/// Consumer side of the ring is single-threaded
pub const PKTCORE_RING_F_SC_DEQ: u32 = 0x0002;
/// Usable capacity is exactly the requested count
pub const PKTCORE_RING_F_EXACT_SZ: u32 = 0x0004;

/// Put side of the pool is single-threaded
pub const PKTCORE_MEMPOOL_F_SP_PUT: u32 = 0x0001;
/// Get side of the pool is single-threaded
pub const PKTCORE_MEMPOOL_F_SC_GET: u32 = 0x0002;

/// Error codes for C API
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PktErrorCode {
    Success = 0,
    InvalidParameter = 1,
    OutOfMemory = 2,
    RingFull = 3,
    RingEmpty = 4,
    PoolExhausted = 5,
    InsufficientHeadroom = 6,
    InsufficientTailroom = 7,
    InsufficientData = 8,
    NameExists = 9,
    NotFound = 10,
    UnknownError = 99,
}

impl From<PktError> for PktErrorCode {
    fn from(error: PktError) -> Self {
        match error {
            PktError::Full => PktErrorCode::RingFull,
            PktError::Empty => PktErrorCode::RingEmpty,
            PktError::PoolExhausted { .. } => PktErrorCode::PoolExhausted,
            PktError::InsufficientHeadroom { .. } => PktErrorCode::InsufficientHeadroom,
            PktError::InsufficientTailroom { .. } => PktErrorCode::InsufficientTailroom,
            PktError::InsufficientData { .. } => PktErrorCode::InsufficientData,
            PktError::InvalidParameter { .. } => PktErrorCode::InvalidParameter,
            PktError::Memory { .. } => PktErrorCode::OutOfMemory,
            PktError::NameExists { .. } => PktErrorCode::NameExists,
            PktError::NotFound { .. } => PktErrorCode::NotFound,
        }
    }
}

impl<T> From<crate::error::Result<T>> for PktErrorCode {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(_) => PktErrorCode::Success,
            Err(e) => e.into(),
        }
    }
}

/// Object pointer stored in C-facing rings
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjPtr(pub *mut c_void);

// Rings only move the pointer; the pointee is the caller's concern
unsafe impl Send for ObjPtr {}
unsafe impl Sync for ObjPtr {}

/// Pool statistics (C-compatible)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PktMempoolStats {
    pub capacity: usize,
    pub currently_in_use: usize,
    pub peak_usage: usize,
    pub total_acquisitions: u64,
    pub total_releases: u64,
    pub acquisition_failures: u64,
    pub success_rate: f64,
    pub utilization: f64,
}

impl From<crate::pool::PoolStats> for PktMempoolStats {
    fn from(stats: crate::pool::PoolStats) -> Self {
        Self {
            capacity: stats.capacity,
            currently_in_use: stats.currently_in_use,
            peak_usage: stats.peak_usage,
            total_acquisitions: stats.total_acquisitions,
            total_releases: stats.total_releases,
            acquisition_failures: stats.acquisition_failures,
            success_rate: stats.success_rate(),
            utilization: stats.utilization(),
        }
    }
}
