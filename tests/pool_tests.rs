//! Object pool integration tests

use std::collections::HashSet;

use pktcore::{BlockHandle, PktError, Pool, PoolConfig, PoolConfigBuilder};

#[cfg(test)]
mod pool_tests {
    use super::*;

    fn make_pool(capacity: usize) -> Pool {
        Pool::new(
            PoolConfigBuilder::new("it_pool")
                .capacity(capacity)
                .block_size(256)
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_exhaust_then_release_one() {
        let pool = make_pool(8);
        let handles: Vec<BlockHandle> = (0..8).map(|_| pool.acquire().unwrap()).collect();

        assert!(pool.is_empty());
        assert!(matches!(pool.acquire(), Err(PktError::PoolExhausted { .. })));

        pool.release(handles[5]);
        assert_eq!(pool.acquire().unwrap(), handles[5]);
        assert!(pool.acquire().is_err());
    }

    #[test]
    fn test_handles_are_unique_and_aligned() {
        let pool = Pool::new(
            PoolConfig::new("aligned")
                .with_capacity(32)
                .with_block_size(100)
                .with_alignment(128),
        )
        .unwrap();

        let mut handles = vec![BlockHandle::default(); 32];
        pool.acquire_bulk(&mut handles).unwrap();

        let addrs: HashSet<usize> = handles
            .iter()
            .map(|h| pool.block_ptr(*h).as_ptr() as usize)
            .collect();
        assert_eq!(addrs.len(), 32);
        assert!(addrs.iter().all(|addr| addr % 128 == 0));

        pool.release_bulk(&handles);
        assert!(pool.is_full());
    }

    #[test]
    fn test_bulk_request_larger_than_pool() {
        let pool = make_pool(4);
        let mut handles = vec![BlockHandle::default(); 5];

        assert_eq!(
            pool.acquire_bulk(&mut handles),
            Err(PktError::PoolExhausted {
                requested: 5,
                available: 4
            })
        );
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn test_block_contents_survive_until_release() {
        let pool = make_pool(4);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();

        unsafe {
            pool.block_mut(a).fill(0xAA);
            pool.block_mut(b).fill(0xBB);
            assert!(pool.block_mut(a).iter().all(|x| *x == 0xAA));
            assert!(pool.block_mut(b).iter().all(|x| *x == 0xBB));
        }

        pool.release(a);
        pool.release(b);
    }

    #[test]
    fn test_stats_summary_after_churn() {
        let pool = make_pool(4);

        for _ in 0..10 {
            let h = pool.acquire().unwrap();
            pool.release(h);
        }

        let stats = pool.stats();
        assert_eq!(stats.total_acquisitions, 10);
        assert_eq!(stats.total_releases, 10);
        assert_eq!(stats.peak_usage, 1);
        assert_eq!(stats.utilization(), 0.0);
        assert_eq!(stats.success_rate(), 1.0);
    }
}
