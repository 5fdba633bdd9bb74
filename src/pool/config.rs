//! Object pool configuration

use crate::config::{CACHE_LINE_SIZE, MAX_NAME_LEN, MAX_RING_CAPACITY};
use crate::error::{PktError, Result};
use crate::ring::SyncMode;

/// Configuration for fixed-block object pools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Name of the pool
    pub name: String,
    /// Size of each block in bytes, before alignment padding
    pub block_size: usize,
    /// Number of blocks in the pool
    pub capacity: usize,
    /// Alignment of every block
    pub alignment: usize,
    /// Mode for threads returning blocks
    pub put_mode: SyncMode,
    /// Mode for threads taking blocks
    pub get_mode: SyncMode,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            block_size: 2048,
            capacity: 1024,
            alignment: CACHE_LINE_SIZE,
            put_mode: SyncMode::Multi,
            get_mode: SyncMode::Multi,
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with custom name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set block size
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Set block count
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set block alignment
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set put and get modes
    pub fn with_modes(mut self, put_mode: SyncMode, get_mode: SyncMode) -> Self {
        self.put_mode = put_mode;
        self.get_mode = get_mode;
        self
    }

    /// Distance in bytes between consecutive blocks
    pub fn stride(&self) -> usize {
        (self.block_size + self.alignment - 1) & !(self.alignment - 1)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > MAX_NAME_LEN {
            return Err(PktError::invalid_parameter(
                "name",
                format!("Name must be 1..={} bytes", MAX_NAME_LEN),
            ));
        }

        if self.block_size == 0 {
            return Err(PktError::invalid_parameter(
                "block_size",
                "Block size cannot be zero",
            ));
        }

        if self.capacity == 0 || self.capacity > MAX_RING_CAPACITY {
            return Err(PktError::invalid_parameter(
                "capacity",
                format!("Capacity must be in 1..={}", MAX_RING_CAPACITY),
            ));
        }

        if self.alignment == 0 || !self.alignment.is_power_of_two() {
            return Err(PktError::invalid_parameter(
                "alignment",
                "Alignment must be a power of two",
            ));
        }

        if self.total_memory_required().is_none() {
            return Err(PktError::invalid_parameter(
                "capacity",
                "Pool arena size overflows",
            ));
        }

        Ok(())
    }

    /// Arena size in bytes, `None` on overflow
    pub fn total_memory_required(&self) -> Option<usize> {
        self.block_size
            .checked_add(self.alignment - 1)
            .map(|padded| padded & !(self.alignment - 1))
            .and_then(|stride| stride.checked_mul(self.capacity))
    }
}

/// Builder pattern for pool configuration
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: PoolConfig::new(name),
        }
    }

    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn alignment(mut self, alignment: usize) -> Self {
        self.config.alignment = alignment;
        self
    }

    /// Only one thread ever returns blocks
    pub fn single_put(mut self) -> Self {
        self.config.put_mode = SyncMode::Single;
        self
    }

    /// Only one thread ever takes blocks
    pub fn single_get(mut self) -> Self {
        self.config.get_mode = SyncMode::Single;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
