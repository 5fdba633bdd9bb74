//! # pktcore - Packet Processing Data-Plane Primitives
//!
//! pktcore provides the building blocks a packet-processing pipeline passes
//! buffers through: a lock-free bounded ring, a fixed-block object pool and
//! pool-backed packet buffers with cheap header prepend.
//!
//! ## Features
//!
//! - **Lock-free ring queue**: single or multi producer/consumer per side, bulk and burst moves
//! - **Object pool**: preallocated arena, lock-free acquire/release, usage statistics
//! - **Packet buffers (mbufs)**: in-place prepend/append, reference counting, raw handles for rings
//! - **C API**: Stable interface with opaque handles and a named object registry
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐  allocate   ┌──────────────┐  into_raw   ┌──────────────┐
//! │   MbufPool    │ ──────────▶ │    Mbuf      │ ──────────▶ │ Ring<RawMbuf>│
//! │  (Pool +      │ ◀────────── │ prepend/trim │ ◀────────── │  enqueue /   │
//! │   headers)    │    free     └──────────────┘  from_raw   │  dequeue     │
//! └───────────────┘                                         └──────────────┘
//!         │
//!         ▼
//! ┌───────────────┐
//! │     Pool      │  free block indices live in a Ring<u32>
//! └───────────────┘
//! ```
//!
//! None of the core operations retry, block or log on `Full`, `Empty` or
//! `PoolExhausted`; see [`retry`] for caller-side policies.

pub mod error;
pub mod mbuf;
pub mod pool;
pub mod retry;
pub mod ring;

#[cfg(feature = "c-api")]
pub mod ffi;

// Main API re-exports
pub use error::{PktError, Result};
pub use mbuf::{Mbuf, MbufPool, MbufPoolConfig, RawMbuf, SharedMbuf};
pub use pool::{BlockHandle, Pool, PoolConfig, PoolConfigBuilder, PoolStats};
pub use retry::SpinPolicy;
pub use ring::{BurstResult, Ring, RingConfig, RingConfigBuilder, SyncMode};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 3;
pub const VERSION_PATCH: u32 = 0;

/// Default configuration constants
pub mod config {
    /// Assumed cache line size; ring head/tail pairs and pool blocks align to it
    pub const CACHE_LINE_SIZE: usize = 64;

    /// Default ring capacity
    pub const DEFAULT_RING_CAPACITY: usize = 1024;

    /// Largest supported ring capacity
    pub const MAX_RING_CAPACITY: usize = 1 << 28;

    /// Maximum length of ring and pool names
    pub const MAX_NAME_LEN: usize = 32;

    /// Default mbuf head-room
    pub const DEFAULT_HEADROOM: usize = 128;

    /// Default mbuf data room: a standard Ethernet frame plus head-room
    pub const DEFAULT_DATA_ROOM: usize = 2048 + DEFAULT_HEADROOM;

    /// Largest mbuf data room, bounded by the 16-bit header fields
    pub const MAX_DATA_ROOM: usize = u16::MAX as usize;
}
