//! Packet buffer pool configuration

use crate::config::{DEFAULT_DATA_ROOM, DEFAULT_HEADROOM, MAX_DATA_ROOM, MAX_NAME_LEN};
use crate::error::{PktError, Result};
use crate::ring::SyncMode;

/// Configuration for packet buffer pools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MbufPoolConfig {
    /// Name of the pool
    pub name: String,
    /// Number of packet buffers
    pub capacity: usize,
    /// Buffer bytes per mbuf, head-room included
    pub data_room: usize,
    /// Head-room given to a freshly allocated mbuf
    pub headroom: usize,
    /// Mode for threads freeing mbufs
    pub put_mode: SyncMode,
    /// Mode for threads allocating mbufs
    pub get_mode: SyncMode,
}

impl Default for MbufPoolConfig {
    fn default() -> Self {
        Self {
            name: "mbuf_pool".to_string(),
            capacity: 1024,
            data_room: DEFAULT_DATA_ROOM,
            headroom: DEFAULT_HEADROOM,
            put_mode: SyncMode::Multi,
            get_mode: SyncMode::Multi,
        }
    }
}

impl MbufPoolConfig {
    /// Create a new configuration with custom name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set number of mbufs
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set buffer bytes per mbuf
    pub fn with_data_room(mut self, data_room: usize) -> Self {
        self.data_room = data_room;
        self
    }

    /// Set default head-room
    pub fn with_headroom(mut self, headroom: usize) -> Self {
        self.headroom = headroom;
        self
    }

    /// Set put and get modes
    pub fn with_modes(mut self, put_mode: SyncMode, get_mode: SyncMode) -> Self {
        self.put_mode = put_mode;
        self.get_mode = get_mode;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > MAX_NAME_LEN {
            return Err(PktError::invalid_parameter(
                "name",
                format!("Name must be 1..={} bytes", MAX_NAME_LEN),
            ));
        }

        if self.data_room == 0 || self.data_room > MAX_DATA_ROOM {
            return Err(PktError::invalid_parameter(
                "data_room",
                format!("Data room must be in 1..={}", MAX_DATA_ROOM),
            ));
        }

        if self.headroom > self.data_room {
            return Err(PktError::invalid_parameter(
                "headroom",
                "Headroom cannot exceed data room",
            ));
        }

        if self.capacity == 0 {
            return Err(PktError::invalid_parameter(
                "capacity",
                "Capacity cannot be zero",
            ));
        }

        Ok(())
    }
}
