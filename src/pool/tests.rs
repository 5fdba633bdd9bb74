//! Tests for the object pool

use std::{
    collections::HashSet,
    sync::{Arc, Barrier},
    thread,
};

use super::*;
use crate::error::PktError;

fn pool(capacity: usize, block_size: usize) -> Pool {
    Pool::new(
        PoolConfigBuilder::new("test_pool")
            .capacity(capacity)
            .block_size(block_size)
            .build()
            .unwrap(),
    )
    .unwrap()
}

#[test]
fn test_pool_creation() {
    let pool = pool(8, 100);

    assert_eq!(pool.capacity(), 8);
    assert_eq!(pool.block_size(), 100);
    assert_eq!(pool.stride(), 128);
    assert_eq!(pool.available(), 8);
    assert!(pool.is_full());
    assert!(!pool.is_empty());
}

#[test]
fn test_exhaustion_and_single_release() {
    let pool = pool(4, 64);

    let handles: Vec<_> = (0..4).map(|_| pool.acquire().unwrap()).collect();
    assert!(pool.is_empty());
    assert_eq!(
        pool.acquire(),
        Err(PktError::PoolExhausted {
            requested: 1,
            available: 0
        })
    );

    pool.release(handles[2]);
    let again = pool.acquire().unwrap();
    assert_eq!(again, handles[2]);
    assert!(pool.acquire().is_err());

    pool.release(again);
    pool.release_bulk(&[handles[0], handles[1], handles[3]]);
    assert!(pool.is_full());
}

#[test]
fn test_blocks_are_distinct() {
    let pool = pool(16, 32);
    let mut seen = HashSet::new();

    for _ in 0..16 {
        let handle = pool.acquire().unwrap();
        assert!(seen.insert(pool.block_ptr(handle).as_ptr() as usize));
    }
}

#[test]
fn test_bulk_is_all_or_nothing() {
    let pool = pool(4, 64);
    let _held = pool.acquire().unwrap();

    let mut out = [BlockHandle(0); 4];
    let err = pool.acquire_bulk(&mut out).unwrap_err();
    assert_eq!(
        err,
        PktError::PoolExhausted {
            requested: 4,
            available: 3
        }
    );
    assert_eq!(pool.available(), 3);

    let mut out = [BlockHandle(0); 3];
    pool.acquire_bulk(&mut out).unwrap();
    assert!(pool.is_empty());

    let unique: HashSet<_> = out.iter().collect();
    assert_eq!(unique.len(), 3);
}

#[test]
fn test_capacity_one_round_trip() {
    let pool = pool(1, 64);

    let first = pool.acquire().unwrap();
    assert!(pool.is_empty());
    let first_ptr = pool.block_ptr(first);
    pool.release(first);
    assert!(!pool.is_empty());

    let second = pool.acquire().unwrap();
    assert_eq!(pool.block_ptr(second), first_ptr);
    assert!(pool.is_empty());
    pool.release(second);
}

#[test]
fn test_block_memory_is_writable() {
    let pool = pool(2, 64);
    let handle = pool.acquire().unwrap();

    let block = unsafe { pool.block_mut(handle) };
    assert!(block.iter().all(|b| *b == 0));
    block.fill(0xAB);
    assert_eq!(block.len(), 64);

    pool.release(handle);
}

#[test]
fn test_handle_of_pointer() {
    let pool = pool(4, 64);
    let handle = pool.acquire().unwrap();
    let ptr = pool.block_ptr(handle).as_ptr();

    assert_eq!(pool.handle_of(ptr), Some(handle));
    assert!(pool.contains(ptr));
    assert_eq!(pool.handle_of(unsafe { ptr.add(1) }), None);

    let outside = std::ptr::null::<u8>();
    assert_eq!(pool.handle_of(outside), None);
    assert!(!pool.contains(outside));
}

#[test]
fn test_stats_tracking() {
    let pool = pool(2, 64);

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    assert!(pool.acquire().is_err());
    pool.release(a);
    pool.release(b);

    let stats = pool.stats();
    assert_eq!(stats.total_acquisitions, 2);
    assert_eq!(stats.total_releases, 2);
    assert_eq!(stats.acquisition_failures, 1);
    assert_eq!(stats.peak_usage, 2);
    assert_eq!(stats.currently_in_use, 0);
    assert!(stats.success_rate() < 1.0);
    assert!(stats.summary().contains("failures: 1"));
}

#[test]
fn test_invalid_config() {
    assert!(PoolConfigBuilder::new("p").capacity(0).build().is_err());
    assert!(PoolConfigBuilder::new("p").block_size(0).build().is_err());
    assert!(PoolConfigBuilder::new("p").alignment(3).build().is_err());
    assert!(PoolConfig::new("p")
        .with_capacity(usize::MAX)
        .validate()
        .is_err());
}

#[test]
#[should_panic(expected = "does not belong")]
fn test_foreign_handle_panics() {
    let pool = pool(2, 64);
    pool.release(BlockHandle(7));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "released while not in use")]
fn test_bulk_release_of_free_block_panics_in_debug() {
    let pool = pool(4, 64);
    let mut handles = [BlockHandle::default(); 2];
    pool.acquire_bulk(&mut handles).unwrap();
    pool.release_bulk(&handles);
    pool.release_bulk(&handles[..1]);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "released while not in use")]
fn test_double_release_panics_in_debug() {
    let pool = pool(2, 64);
    let handle = pool.acquire().unwrap();
    pool.release(handle);
    pool.release(handle);
}

#[test]
fn test_concurrent_acquire_release() {
    let pool = Arc::new(pool(64, 64));
    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..5_000 {
                    if let Ok(handle) = pool.acquire() {
                        unsafe { pool.block_mut(handle)[0] = 1 };
                        pool.release(handle);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(pool.is_full());
    assert_eq!(pool.stats().currently_in_use, 0);
}
