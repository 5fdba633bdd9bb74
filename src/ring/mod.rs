//! Lock-free ring queue
//!
//! A bounded circular buffer with independent producer and consumer index
//! pairs. Each side runs in single or multi mode; multi mode claims index
//! ranges with compare-and-swap and commits them in claim order.

pub mod config;
pub mod core;
pub(crate) mod headtail;


// Re-export main types for convenience
pub use self::config::{RingConfig, RingConfigBuilder, SyncMode};
pub use self::core::{BurstResult, Ring};
