//! Error types and handling for pktcore

/// Result type alias for pktcore operations
pub type Result<T> = std::result::Result<T, PktError>;

/// Error types for rings, pools and packet buffers
///
/// The first group of variants is expected on the hot path and signals
/// backpressure or a size constraint; none of them carries heap data. The
/// remaining variants only come out of construction and lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PktError {
    /// Ring has no room for the requested items
    #[error("ring is full")]
    Full,

    /// Ring holds fewer items than requested
    #[error("ring is empty")]
    Empty,

    /// Pool cannot hand out the requested number of blocks
    #[error("pool exhausted: requested {requested}, available {available}")]
    PoolExhausted { requested: usize, available: usize },

    /// Not enough head-room for a prepend
    #[error("insufficient headroom: requested {requested}, available {available}")]
    InsufficientHeadroom { requested: usize, available: usize },

    /// Not enough tail-room for an append
    #[error("insufficient tailroom: requested {requested}, available {available}")]
    InsufficientTailroom { requested: usize, available: usize },

    /// Trim request larger than the current data
    #[error("insufficient data: requested {requested}, available {available}")]
    InsufficientData { requested: usize, available: usize },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Memory allocation failures
    #[error("Memory error: {message}")]
    Memory { message: String },

    /// A named object already exists
    #[error("Name already in use: {name}")]
    NameExists { name: String },

    /// No object registered under the name
    #[error("Not found: {name}")]
    NotFound { name: String },
}

impl PktError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a memory error
    pub fn memory(message: impl Into<String>) -> Self {
        Self::Memory {
            message: message.into(),
        }
    }

    /// Create a pool exhausted error
    pub fn pool_exhausted(requested: usize, available: usize) -> Self {
        Self::PoolExhausted {
            requested,
            available,
        }
    }

    /// Create an insufficient headroom error
    pub fn insufficient_headroom(requested: usize, available: usize) -> Self {
        Self::InsufficientHeadroom {
            requested,
            available,
        }
    }

    /// Create an insufficient tailroom error
    pub fn insufficient_tailroom(requested: usize, available: usize) -> Self {
        Self::InsufficientTailroom {
            requested,
            available,
        }
    }

    /// Create an insufficient data error
    pub fn insufficient_data(requested: usize, available: usize) -> Self {
        Self::InsufficientData {
            requested,
            available,
        }
    }

    /// Create a name exists error
    pub fn name_exists(name: impl Into<String>) -> Self {
        Self::NameExists { name: name.into() }
    }

    /// Create a not found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// True for `Full`, `Empty` and `PoolExhausted`, the outcomes a caller
    /// is expected to poll or back off on.
    pub fn is_backpressure(&self) -> bool {
        matches!(
            self,
            Self::Full | Self::Empty | Self::PoolExhausted { .. }
        )
    }
}
