//! C Foreign Function Interface (FFI)
//!
//! Rings, pools and mbuf pools are created by name and handed to C as opaque
//! pointers. Only create, lookup and free go through the registry lock; every
//! other call dereferences the handle directly.

pub mod mbuf;
pub mod mempool;
pub mod ring;
pub mod types;
pub mod utils;
pub mod version;

// Re-export commonly used types and functions
pub use types::{
    ObjPtr, PktErrorCode, PktMbufHandle, PktMbufPoolHandle, PktMempoolHandle, PktMempoolStats,
    PktRingHandle, PKTCORE_MEMPOOL_F_SC_GET, PKTCORE_MEMPOOL_F_SP_PUT, PKTCORE_RING_F_EXACT_SZ,
    PKTCORE_RING_F_SC_DEQ, PKTCORE_RING_F_SP_ENQ,
};

pub use utils::{pktcore_free_string, OBJECT_REGISTRY};

// Ring API
pub use ring::{
    pktcore_ring_count, pktcore_ring_create, pktcore_ring_dequeue, pktcore_ring_dequeue_bulk,
    pktcore_ring_dequeue_burst, pktcore_ring_empty, pktcore_ring_enqueue,
    pktcore_ring_enqueue_bulk, pktcore_ring_enqueue_burst, pktcore_ring_free,
    pktcore_ring_free_count, pktcore_ring_get_capacity, pktcore_ring_lookup,
};

// Pool API
pub use mempool::{
    pktcore_mempool_avail_count, pktcore_mempool_create, pktcore_mempool_empty,
    pktcore_mempool_free, pktcore_mempool_get, pktcore_mempool_get_bulk,
    pktcore_mempool_in_use_count, pktcore_mempool_lookup, pktcore_mempool_put,
    pktcore_mempool_put_bulk, pktcore_mempool_stats,
};

// Packet buffer API
pub use mbuf::{
    pktcore_pktmbuf_adj, pktcore_pktmbuf_alloc, pktcore_pktmbuf_alloc_bulk,
    pktcore_pktmbuf_append, pktcore_pktmbuf_data_len, pktcore_pktmbuf_free,
    pktcore_pktmbuf_headroom, pktcore_pktmbuf_mtod, pktcore_pktmbuf_pool_create,
    pktcore_pktmbuf_pool_free, pktcore_pktmbuf_pool_lookup, pktcore_pktmbuf_prepend,
    pktcore_pktmbuf_refcnt_update, pktcore_pktmbuf_tailroom, pktcore_pktmbuf_trim,
};

// Version API
pub use version::{
    pktcore_version_major, pktcore_version_minor, pktcore_version_patch, pktcore_version_string,
};
