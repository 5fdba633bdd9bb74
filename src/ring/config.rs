//! Ring queue configuration

use crate::config::{DEFAULT_RING_CAPACITY, MAX_NAME_LEN, MAX_RING_CAPACITY};
use crate::error::{PktError, Result};

/// Concurrency mode of one side of a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Exactly one thread operates this side at a time
    Single,
    /// Any number of threads may operate this side concurrently
    #[default]
    Multi,
}

impl SyncMode {
    /// Whether this side is restricted to one thread
    pub fn is_single(self) -> bool {
        matches!(self, SyncMode::Single)
    }
}

/// Configuration for a ring queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingConfig {
    /// Name used for lookup and diagnostics
    pub name: String,
    /// Number of items the ring can hold
    pub capacity: usize,
    /// Producer-side mode
    pub producer: SyncMode,
    /// Consumer-side mode
    pub consumer: SyncMode,
    /// Accept a capacity that is not a power of two
    pub exact_size: bool,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            name: "ring".to_string(),
            capacity: DEFAULT_RING_CAPACITY,
            producer: SyncMode::Multi,
            consumer: SyncMode::Multi,
            exact_size: false,
        }
    }
}

impl RingConfig {
    /// Create a new configuration with custom name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set producer mode
    pub fn with_producer(mut self, mode: SyncMode) -> Self {
        self.producer = mode;
        self
    }

    /// Set consumer mode
    pub fn with_consumer(mut self, mode: SyncMode) -> Self {
        self.consumer = mode;
        self
    }

    /// Set both sides to the same mode
    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.producer = mode;
        self.consumer = mode;
        self
    }

    /// Allow a non power-of-two capacity
    pub fn with_exact_size(mut self, exact_size: bool) -> Self {
        self.exact_size = exact_size;
        self
    }

    /// Number of slots backing a ring with this configuration
    pub fn slot_count(&self) -> usize {
        if self.exact_size {
            self.capacity.next_power_of_two()
        } else {
            self.capacity
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > MAX_NAME_LEN {
            return Err(PktError::invalid_parameter(
                "name",
                format!("Name must be 1..={} bytes", MAX_NAME_LEN),
            ));
        }

        if self.capacity == 0 || self.capacity > MAX_RING_CAPACITY {
            return Err(PktError::invalid_parameter(
                "capacity",
                format!("Capacity must be in 1..={}", MAX_RING_CAPACITY),
            ));
        }

        if !self.exact_size && !self.capacity.is_power_of_two() {
            return Err(PktError::invalid_parameter(
                "capacity",
                "Capacity must be a power of 2 unless exact sizing is requested",
            ));
        }

        Ok(())
    }
}

/// Builder pattern for ring configuration
pub struct RingConfigBuilder {
    config: RingConfig,
}

impl RingConfigBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: RingConfig::new(name),
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn single_producer(mut self) -> Self {
        self.config.producer = SyncMode::Single;
        self
    }

    pub fn single_consumer(mut self) -> Self {
        self.config.consumer = SyncMode::Single;
        self
    }

    pub fn exact_size(mut self) -> Self {
        self.config.exact_size = true;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
