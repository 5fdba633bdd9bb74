//! Fixed-block object pools
//!
//! A pool preallocates one arena of equally sized blocks and hands them out
//! by index. The free set is a [`Ring`](crate::ring::Ring) of block indices,
//! so acquire and release share the ring's lock-free reserve/commit path.

pub mod config;
pub mod mempool;
pub mod stats;

#[cfg(test)]
mod tests;

// Re-export main types
pub use config::{PoolConfig, PoolConfigBuilder};
pub use mempool::{BlockHandle, Pool};
pub use stats::{AtomicPoolStats, PoolStats};
