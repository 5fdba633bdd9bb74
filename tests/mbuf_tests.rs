//! Packet buffer integration tests
//! Allocation, header prepend and the allocate -> ring -> free pipeline

use std::mem::MaybeUninit;

use pktcore::{
    mbuf::MBUF_HEADER_ROOM, MbufPool, MbufPoolConfig, PktError, RawMbuf, Ring, RingConfig,
    SyncMode,
};

#[cfg(test)]
mod mbuf_tests {
    use super::*;

    fn make_pool(capacity: usize, data_room: usize, headroom: usize) -> MbufPool {
        MbufPool::new(
            MbufPoolConfig::new("it_mbufs")
                .with_capacity(capacity)
                .with_data_room(data_room)
                .with_headroom(headroom),
        )
        .unwrap()
    }

    #[test]
    fn test_block_64_headroom_16() {
        let pool = make_pool(4, 64, 16);
        let mut mbuf = pool.allocate().unwrap();

        assert!(matches!(
            mbuf.prepend(20),
            Err(PktError::InsufficientHeadroom { .. })
        ));
        assert_eq!(mbuf.headroom(), 16);
        assert_eq!(mbuf.data_len(), 0);

        mbuf.prepend(16).unwrap();
        assert_eq!(mbuf.headroom(), 0);
        assert_eq!(mbuf.data_len(), 16);
    }

    #[test]
    fn test_pool_block_size_includes_header() {
        let pool = make_pool(2, 512, 64);
        assert_eq!(pool.pool().block_size(), MBUF_HEADER_ROOM + 512);
        assert_eq!(pool.data_room(), 512);
        assert_eq!(pool.default_headroom(), 64);
    }

    #[test]
    fn test_exhausted_pool_leaves_nothing_allocated() {
        let pool = make_pool(2, 128, 32);
        let held: Vec<_> = (0..2).map(|_| pool.allocate().unwrap()).collect();

        assert!(matches!(
            pool.allocate(),
            Err(PktError::PoolExhausted { .. })
        ));
        assert!(pool.allocate_bulk(1).is_err());
        assert_eq!(pool.in_use(), 2);

        drop(held);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_room_invariant_holds_through_edits() {
        let pool = make_pool(1, 256, 40);
        let mut mbuf = pool.allocate().unwrap();
        let total = mbuf.buf_len();

        let edits: [(&str, usize); 6] = [
            ("append", 100),
            ("prepend", 14),
            ("prepend", 20),
            ("trim_front", 34),
            ("trim_back", 50),
            ("append", 70),
        ];
        for (op, len) in edits {
            match op {
                "append" => {
                    mbuf.append(len).unwrap();
                }
                "prepend" => {
                    mbuf.prepend(len).unwrap();
                }
                "trim_front" => mbuf.trim_front(len).unwrap(),
                _ => mbuf.trim_back(len).unwrap(),
            }
            assert_eq!(mbuf.headroom() + mbuf.data_len() + mbuf.tailroom(), total);
        }
        assert_eq!(mbuf.data_len(), 120);
    }

    #[test]
    fn test_pipeline_through_multi_producer_ring() {
        let pool = make_pool(128, 256, 64);
        let ring: Ring<RawMbuf> = Ring::with_config(
            RingConfig::new("mbuf_ring")
                .with_capacity(32)
                .with_producer(SyncMode::Multi)
                .with_consumer(SyncMode::Single),
        )
        .unwrap();

        let per_producer = 500u32;
        let producers = 3u32;

        std::thread::scope(|s| {
            for p in 0..producers {
                let pool = &pool;
                let ring = &ring;
                s.spawn(move || {
                    for i in 0..per_producer {
                        let mut mbuf = loop {
                            match pool.allocate() {
                                Ok(m) => break m,
                                Err(_) => std::thread::yield_now(),
                            }
                        };
                        mbuf.append(8)
                            .unwrap()
                            .copy_from_slice(&[(p as u8), 0, 0, 0, 0, 0, 0, 0]);
                        mbuf.prepend(4).unwrap().copy_from_slice(&i.to_be_bytes());

                        let raw = mbuf.into_raw();
                        while ring.enqueue(raw).is_err() {
                            std::thread::yield_now();
                        }
                    }
                });
            }

            let mut last_seen = vec![None::<u32>; producers as usize];
            let mut table = vec![MaybeUninit::<RawMbuf>::uninit(); 16];
            let mut received = 0;
            while received < per_producer * producers {
                let got = ring.dequeue_burst_uninit(&mut table).count;
                for slot in &table[..got] {
                    let mbuf = unsafe { pool.from_raw(slot.assume_init()) };
                    let data = mbuf.data();
                    let seq = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
                    let producer = data[4] as usize;

                    if let Some(prev) = last_seen[producer] {
                        assert!(seq > prev, "producer {} reordered", producer);
                    }
                    last_seen[producer] = Some(seq);
                    received += 1;
                }
                if got == 0 {
                    std::thread::yield_now();
                }
            }
        });

        assert_eq!(pool.in_use(), 0);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_shared_clones_keep_block_alive() {
        let pool = make_pool(1, 64, 16);
        let mut mbuf = pool.allocate().unwrap();
        mbuf.append(4).unwrap().copy_from_slice(b"ping");

        let shared = mbuf.into_shared();
        let clones: Vec<_> = (0..5).map(|_| shared.clone()).collect();
        assert_eq!(shared.refcnt(), 6);
        drop(shared);

        assert_eq!(pool.in_use(), 1);
        assert!(clones.iter().all(|c| c.data() == b"ping"));

        drop(clones);
        assert_eq!(pool.in_use(), 0);
        assert!(pool.allocate().is_ok());
    }
}
