//! Two-stage packet pipeline: an RX stage builds packets in mbufs and hands
//! them to a worker over a single-producer/single-consumer ring

use pktcore::{
    retry::{self, SpinPolicy},
    MbufPool, MbufPoolConfig, RawMbuf, Result, Ring, RingConfig, SyncMode,
};
use std::{mem::MaybeUninit, thread, time::Instant};

const PACKETS: u32 = 100_000;
const ETH_HEADER_LEN: usize = 14;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    println!("pktcore Pipeline Example");
    println!("========================");

    let pool = MbufPool::new(
        MbufPoolConfig::new("demo_mbufs")
            .with_capacity(512)
            .with_data_room(2048)
            .with_headroom(128),
    )?;
    let ring: Ring<RawMbuf> = Ring::with_config(
        RingConfig::new("demo_rx")
            .with_capacity(256)
            .with_mode(SyncMode::Single),
    )?;

    println!("Mbuf pool: {} buffers of {} bytes", pool.capacity(), pool.data_room());
    println!("Ring: {} slots", ring.capacity());

    let start = Instant::now();
    let (bytes, checksum) = thread::scope(|s| -> Result<(usize, u64)> {
        let rx = s.spawn(|| -> Result<()> {
            let policy = SpinPolicy::forever();
            for seq in 0..PACKETS {
                let mut mbuf = retry::allocate(&pool, &policy)?;
                let payload_len = 64 + (seq as usize % 16) * 32;
                mbuf.append(payload_len)?.fill((seq % 251) as u8);
                mbuf.prepend(4)?.copy_from_slice(&seq.to_be_bytes());
                mbuf.prepend(ETH_HEADER_LEN)?.fill(0xEE);

                let raw = mbuf.into_raw();
                let (_, sent) = retry::enqueue_all(&ring, &[raw], &policy);
                if let Err(e) = sent {
                    unsafe { pool.free_raw(raw) };
                    return Err(e);
                }
            }
            Ok(())
        });

        let mut table = [MaybeUninit::<RawMbuf>::uninit(); 32];
        let mut received = 0u32;
        let mut bytes = 0usize;
        let mut checksum = 0u64;
        while received < PACKETS {
            let got = ring.dequeue_burst_uninit(&mut table).count;
            for slot in &table[..got] {
                let mut mbuf = unsafe { pool.from_raw(slot.assume_init()) };
                mbuf.trim_front(ETH_HEADER_LEN)?;
                let data = mbuf.data();
                let seq = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
                if seq != received {
                    log::warn!("out of order: expected {}, got {}", received, seq);
                }
                bytes += mbuf.data_len();
                checksum = checksum.wrapping_add(data[4..].iter().map(|b| *b as u64).sum());
                received += 1;
            }
            if got == 0 {
                thread::yield_now();
            }
        }

        match rx.join() {
            Ok(result) => result?,
            Err(_) => log::error!("rx stage panicked"),
        }
        Ok((bytes, checksum))
    })?;

    let elapsed = start.elapsed();
    println!("\nProcessed {} packets ({} bytes) in {:?}", PACKETS, bytes, elapsed);
    println!(
        "  Rate: {:.2} Mpps",
        PACKETS as f64 / elapsed.as_secs_f64() / 1_000_000.0
    );
    println!("  Payload checksum: {:#x}", checksum);

    let stats = pool.stats();
    println!("\nPool statistics:");
    println!("  {}", stats.summary());
    println!("  Buffers in use after run: {}", pool.in_use());

    Ok(())
}
