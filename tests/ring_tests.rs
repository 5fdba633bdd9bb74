//! Ring queue integration tests
//! Public-API behaviour of rings: ordering, capacity, bulk and burst moves

use pktcore::{PktError, Ring, RingConfig, RingConfigBuilder, SyncMode};

#[cfg(test)]
mod ring_tests {
    use super::*;

    #[test]
    fn test_capacity_four_scenario() {
        let ring: Ring<char> = Ring::new(4, SyncMode::Single).unwrap();

        for c in ['A', 'B', 'C', 'D'] {
            ring.enqueue(c).unwrap();
        }
        assert_eq!(ring.enqueue('E'), Err(PktError::Full));

        let mut out = ['-'; 10];
        let result = ring.dequeue_burst(&mut out);
        assert_eq!(result.count, 4);
        assert_eq!(result.remaining, 0);
        assert_eq!(&out[..4], &['A', 'B', 'C', 'D']);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_empty_ring_dequeue() {
        let ring: Ring<u32> = Ring::new(8, SyncMode::Multi).unwrap();

        assert!(ring.is_empty());
        assert_eq!(ring.dequeue(), Err(PktError::Empty));

        let mut out = [0u32; 4];
        assert_eq!(ring.dequeue_bulk(&mut out), Err(PktError::Empty));
        assert_eq!(ring.dequeue_burst(&mut out).count, 0);
    }

    #[test]
    fn test_counts_track_contents() {
        let ring: Ring<u32> = Ring::new(16, SyncMode::Single).unwrap();

        assert_eq!(ring.enqueue_bulk(&[1, 2, 3, 4, 5]), Ok(11));
        assert_eq!(ring.count(), 5);
        assert_eq!(ring.free_count(), 11);
        assert_eq!(ring.count() + ring.free_count(), ring.capacity());

        let mut out = [0u32; 2];
        assert_eq!(ring.dequeue_bulk(&mut out), Ok(3));
        assert_eq!(out, [1, 2]);
    }

    #[test]
    fn test_burst_takes_prefix_when_short_of_space() {
        let ring: Ring<u32> = Ring::new(4, SyncMode::Single).unwrap();
        ring.enqueue(0).unwrap();

        let result = ring.enqueue_burst(&[10, 11, 12, 13, 14]);
        assert_eq!(result.count, 3);
        assert_eq!(result.remaining, 0);
        assert!(ring.is_full());

        let mut out = [0u32; 4];
        ring.dequeue_bulk(&mut out).unwrap();
        assert_eq!(out, [0, 10, 11, 12]);
    }

    #[test]
    fn test_bulk_leaves_ring_untouched_on_failure() {
        let ring: Ring<u32> = Ring::new(4, SyncMode::Multi).unwrap();
        ring.enqueue_bulk(&[1, 2]).unwrap();

        assert_eq!(ring.enqueue_bulk(&[3, 4, 5]), Err(PktError::Full));
        assert_eq!(ring.count(), 2);

        let mut out = [0u32; 3];
        assert_eq!(ring.dequeue_bulk(&mut out), Err(PktError::Empty));
        assert_eq!(ring.count(), 2);
    }

    #[test]
    fn test_long_running_wraparound() {
        let ring: Ring<u64> = Ring::new(8, SyncMode::Single).unwrap();
        let mut next_in = 0u64;
        let mut next_out = 0u64;

        for round in 0..10_000 {
            let batch = (round % 7) + 1;
            let items: Vec<u64> = (next_in..next_in + batch).collect();
            next_in += ring.enqueue_burst(&items).count as u64;

            let mut out = [0u64; 5];
            let got = ring.dequeue_burst(&mut out).count;
            for value in &out[..got] {
                assert_eq!(*value, next_out);
                next_out += 1;
            }
        }

        assert_eq!(next_in - next_out, ring.count() as u64);
    }

    #[test]
    fn test_exact_size_ring() {
        let config = RingConfigBuilder::new("exact")
            .capacity(100)
            .exact_size()
            .build()
            .unwrap();
        let ring: Ring<u16> = Ring::with_config(config).unwrap();

        assert_eq!(ring.capacity(), 100);
        let items: Vec<u16> = (0..100).collect();
        assert_eq!(ring.enqueue_bulk(&items), Ok(0));
        assert_eq!(ring.enqueue(100), Err(PktError::Full));
    }

    #[test]
    fn test_config_validation() {
        assert!(Ring::<u8>::with_config(RingConfig::new("r").with_capacity(0)).is_err());
        assert!(Ring::<u8>::with_config(RingConfig::new("r").with_capacity(6)).is_err());
        assert!(Ring::<u8>::with_config(RingConfig::new("").with_capacity(8)).is_err());
        assert!(Ring::<u8>::with_config(RingConfig::new("r").with_capacity(8)).is_ok());
    }

    #[test]
    fn test_modes_are_reported() {
        let ring: Ring<u8> = Ring::with_config(
            RingConfig::new("modes")
                .with_capacity(8)
                .with_producer(SyncMode::Single)
                .with_consumer(SyncMode::Multi),
        )
        .unwrap();

        assert_eq!(ring.name(), "modes");
        assert_eq!(ring.producer_mode(), SyncMode::Single);
        assert_eq!(ring.consumer_mode(), SyncMode::Multi);
    }
}
