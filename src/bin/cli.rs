use clap::{App, Arg, ArgMatches, SubCommand};
use log::info;
use pktcore::{
    retry::{self, SpinPolicy},
    MbufPool, MbufPoolConfig, PktError, Pool, PoolConfig, RawMbuf, Result, Ring, RingConfig,
    SyncMode,
};
use std::{mem::MaybeUninit, str::FromStr, thread, time::Instant};

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("pktcore-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Packet processing primitives exerciser")
        .subcommand(
            SubCommand::with_name("ring")
                .about("Measure ring throughput")
                .arg(
                    Arg::with_name("capacity")
                        .short("c")
                        .long("capacity")
                        .value_name("CAPACITY")
                        .help("Ring capacity")
                        .default_value("1024")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("producers")
                        .short("p")
                        .long("producers")
                        .value_name("N")
                        .help("Producer threads")
                        .default_value("1")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("consumers")
                        .short("C")
                        .long("consumers")
                        .value_name("N")
                        .help("Consumer threads")
                        .default_value("1")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("items")
                        .short("n")
                        .long("items")
                        .value_name("COUNT")
                        .help("Items per producer")
                        .default_value("1000000")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("burst")
                        .short("b")
                        .long("burst")
                        .value_name("SIZE")
                        .help("Burst size")
                        .default_value("32")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("pool")
                .about("Measure pool acquire/release churn")
                .arg(
                    Arg::with_name("capacity")
                        .short("c")
                        .long("capacity")
                        .value_name("BLOCKS")
                        .help("Number of blocks")
                        .default_value("4096")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("block_size")
                        .short("b")
                        .long("block-size")
                        .value_name("BYTES")
                        .help("Block size")
                        .default_value("2048")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("threads")
                        .short("t")
                        .long("threads")
                        .value_name("N")
                        .help("Worker threads")
                        .default_value("4")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("ops")
                        .short("n")
                        .long("ops")
                        .value_name("COUNT")
                        .help("Acquire/release pairs per thread")
                        .default_value("1000000")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("pipeline")
                .about("Run an allocate, prepend, ring, free pipeline")
                .arg(
                    Arg::with_name("mbufs")
                        .short("m")
                        .long("mbufs")
                        .value_name("COUNT")
                        .help("Buffers in the pool")
                        .default_value("1024")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("ring_size")
                        .short("r")
                        .long("ring-size")
                        .value_name("CAPACITY")
                        .help("Ring capacity between stages")
                        .default_value("256")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("packets")
                        .short("n")
                        .long("packets")
                        .value_name("COUNT")
                        .help("Packets to push through")
                        .default_value("1000000")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("payload")
                        .short("s")
                        .long("payload")
                        .value_name("BYTES")
                        .help("Payload size")
                        .default_value("64")
                        .takes_value(true),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("ring", Some(ring_matches)) => handle_ring_command(ring_matches)?,
        ("pool", Some(pool_matches)) => handle_pool_command(pool_matches)?,
        ("pipeline", Some(pipeline_matches)) => handle_pipeline_command(pipeline_matches)?,
        _ => println!("Use --help for usage information"),
    }

    Ok(())
}

fn parse_arg<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T> {
    matches
        .value_of(name)
        .ok_or_else(|| PktError::invalid_parameter(name, "Missing value"))?
        .parse()
        .map_err(|_| PktError::invalid_parameter(name, "Invalid number"))
}

fn mode_for(threads: usize) -> SyncMode {
    if threads > 1 {
        SyncMode::Multi
    } else {
        SyncMode::Single
    }
}

fn handle_ring_command(matches: &ArgMatches) -> Result<()> {
    let capacity: usize = parse_arg(matches, "capacity")?;
    let producers: usize = parse_arg(matches, "producers")?;
    let consumers: usize = parse_arg(matches, "consumers")?;
    let items: usize = parse_arg(matches, "items")?;
    let burst: usize = parse_arg(matches, "burst")?;

    if producers == 0 || consumers == 0 || burst == 0 {
        return Err(PktError::invalid_parameter(
            "threads",
            "Producers, consumers and burst must be non-zero",
        ));
    }

    let ring: Ring<u64> = Ring::with_config(
        RingConfig::new("cli_ring")
            .with_capacity(capacity)
            .with_producer(mode_for(producers))
            .with_consumer(mode_for(consumers)),
    )?;

    println!(
        "Ring: capacity {}, {} producer(s), {} consumer(s), burst {}",
        ring.capacity(),
        producers,
        consumers,
        burst
    );

    let total = items * producers;
    let start = Instant::now();

    let consumed: usize = thread::scope(|s| {
        for p in 0..producers {
            let ring = &ring;
            s.spawn(move || {
                let values: Vec<u64> = (0..items as u64).map(|i| ((p as u64) << 32) | i).collect();
                for chunk in values.chunks(burst) {
                    let (_, result) = retry::enqueue_all(ring, chunk, &SpinPolicy::forever());
                    debug_assert!(result.is_ok());
                }
            });
        }

        let workers: Vec<_> = (0..consumers)
            .map(|c| {
                let ring = &ring;
                // Split the total so every item is consumed exactly once
                let share = total / consumers + usize::from(c < total % consumers);
                s.spawn(move || {
                    let mut out = vec![0u64; burst];
                    let mut got = 0;
                    while got < share {
                        let want = burst.min(share - got);
                        got += ring.dequeue_burst(&mut out[..want]).count;
                    }
                    got
                })
            })
            .collect();

        workers.into_iter().map(|w| w.join().unwrap_or(0)).sum()
    });

    let elapsed = start.elapsed();
    println!("  Items moved: {}", consumed);
    println!("  Time taken: {:.2}ms", elapsed.as_secs_f64() * 1e3);
    println!(
        "  Throughput: {:.2} Mitems/s",
        consumed as f64 / elapsed.as_secs_f64() / 1e6
    );

    Ok(())
}

fn handle_pool_command(matches: &ArgMatches) -> Result<()> {
    let capacity: usize = parse_arg(matches, "capacity")?;
    let block_size: usize = parse_arg(matches, "block_size")?;
    let threads: usize = parse_arg(matches, "threads")?;
    let ops: usize = parse_arg(matches, "ops")?;

    let pool = Pool::new(
        PoolConfig::new("cli_pool")
            .with_capacity(capacity)
            .with_block_size(block_size)
            .with_modes(mode_for(threads), mode_for(threads)),
    )?;

    println!(
        "Pool: {} blocks of {} bytes (stride {}), {} thread(s)",
        pool.capacity(),
        pool.block_size(),
        pool.stride(),
        threads
    );

    let start = Instant::now();
    thread::scope(|s| {
        for _ in 0..threads {
            let pool = &pool;
            s.spawn(move || {
                for _ in 0..ops {
                    if let Ok(handle) = pool.acquire() {
                        pool.release(handle);
                    }
                }
            });
        }
    });
    let elapsed = start.elapsed();

    let stats = pool.stats();
    println!("  {}", stats.summary());
    println!("  Time taken: {:.2}ms", elapsed.as_secs_f64() * 1e3);
    println!(
        "  Throughput: {:.2} Mops/s",
        (threads * ops) as f64 / elapsed.as_secs_f64() / 1e6
    );

    Ok(())
}

const PIPELINE_HEADER: [u8; 4] = [0x45, 0x00, 0xCA, 0xFE];

fn handle_pipeline_command(matches: &ArgMatches) -> Result<()> {
    let mbufs: usize = parse_arg(matches, "mbufs")?;
    let ring_size: usize = parse_arg(matches, "ring_size")?;
    let packets: usize = parse_arg(matches, "packets")?;
    let payload: usize = parse_arg(matches, "payload")?;

    let pool = MbufPool::new(
        MbufPoolConfig::new("cli_mbufs")
            .with_capacity(mbufs)
            .with_modes(SyncMode::Single, SyncMode::Single),
    )?;
    let ring: Ring<RawMbuf> = Ring::new(ring_size, SyncMode::Single)?;

    let room = pool.data_room() - pool.default_headroom();
    if payload > room || PIPELINE_HEADER.len() > pool.default_headroom() {
        return Err(PktError::invalid_parameter(
            "payload",
            format!("Payload must fit in {} bytes of tail room", room),
        ));
    }

    println!(
        "Pipeline: {} mbufs (data room {}, headroom {}), ring {}, {} packets of {} bytes",
        pool.capacity(),
        pool.data_room(),
        pool.default_headroom(),
        ring.capacity(),
        packets,
        payload
    );

    let start = Instant::now();
    let (sent, received) = thread::scope(|s| {
        let producer = s.spawn(|| -> Result<usize> {
            for i in 0..packets {
                let mut mbuf = retry::allocate(&pool, &SpinPolicy::forever())?;
                mbuf.append(payload)?.fill(i as u8);
                mbuf.prepend(PIPELINE_HEADER.len())?
                    .copy_from_slice(&PIPELINE_HEADER);

                let raw = mbuf.into_raw();
                let (_, result) = retry::enqueue_all(&ring, &[raw], &SpinPolicy::forever());
                result?;
            }
            Ok(packets)
        });

        let consumer = s.spawn(|| {
            let mut received = 0;
            let mut table = vec![MaybeUninit::<RawMbuf>::uninit(); 32];
            while received < packets {
                let got = ring.dequeue_burst_uninit(&mut table).count;
                for slot in &table[..got] {
                    // SAFETY: dequeue initialised the first `got` slots, and
                    // every raw mbuf in the ring came from `pool`
                    let mut mbuf = unsafe { pool.from_raw(slot.assume_init()) };
                    if mbuf.data().starts_with(&PIPELINE_HEADER) {
                        let _ = mbuf.trim_front(PIPELINE_HEADER.len());
                    }
                    received += 1;
                }
            }
            received
        });

        let sent = producer.join().unwrap_or(Ok(0));
        let received = consumer.join().unwrap_or(0);
        (sent, received)
    });
    let sent = sent?;
    let elapsed = start.elapsed();

    info!("pipeline finished: sent {}, received {}", sent, received);
    println!("  Packets sent: {}", sent);
    println!("  Packets received: {}", received);
    println!("  {}", pool.stats().summary());
    println!("  Time taken: {:.2}ms", elapsed.as_secs_f64() * 1e3);
    println!(
        "  Throughput: {:.2} Mpps",
        received as f64 / elapsed.as_secs_f64() / 1e6
    );

    Ok(())
}
