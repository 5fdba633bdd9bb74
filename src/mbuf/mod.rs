//! Packet buffers
//!
//! An mbuf is a pool block holding a small header followed by a buffer with
//! configurable head-room. Headers are prepended in place by moving the data
//! offset backwards, so encapsulation never copies the payload.

pub mod buffer;
pub mod config;
pub mod header;
pub mod pool;
pub mod shared;


pub use buffer::{Mbuf, RawMbuf};
pub use config::MbufPoolConfig;
pub use header::{MbufHeader, MBUF_HEADER_ROOM};
pub use pool::MbufPool;
pub use shared::SharedMbuf;
