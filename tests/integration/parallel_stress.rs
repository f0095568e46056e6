use crate::common::{local_options, RecordingBackend};
use statsd_rewrite_proxy::{Offer, Relay, RuleSet};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn rules() -> RuleSet {
    RuleSet::builder()
        .match_rule("stress.{thread}.{index}", "stress.metric")
        .unwrap()
        .build()
}

#[test]
fn test_parallel_workers_dispatch_every_metric_once() {
    let backend = Arc::new(RecordingBackend::default());
    let mut options = local_options(8);
    options.queue_capacity = 100_000;
    let relay = Relay::start(options, rules(), backend.clone()).unwrap();

    let num_threads = 4;
    let packets_per_thread = 2_500;
    let total = num_threads * packets_per_thread;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let queue = relay.packet_queue();
            thread::spawn(move || {
                for i in 0..packets_per_thread {
                    let packet = format!("stress.t{thread_id}.i{i}:1|c").into_bytes();
                    assert_eq!(queue.offer(packet), Offer::Queued);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let deadline = Instant::now() + Duration::from_secs(10);
    while relay.snapshot().metrics < total as u64 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    relay.shutdown();

    let calls = backend.calls();
    assert_eq!(calls.len(), total);

    let unique: HashSet<Vec<String>> = calls.iter().map(|call| call.tags.clone()).collect();
    assert_eq!(unique.len(), total);
    assert!(calls.iter().all(|call| call.name == "stress.metric"));
}

#[test]
fn test_overflow_is_counted_without_blocking() {
    let backend = Arc::new(RecordingBackend::default());
    let mut options = local_options(1);
    options.queue_capacity = 1;
    let relay = Relay::start(options, RuleSet::default(), backend).unwrap();
    let queue = relay.packet_queue();
    let counters = relay.counters();

    let started = Instant::now();
    let mut overflowed = 0;
    for i in 0..10_000 {
        if queue.offer(format!("m{i}:1|c").into_bytes()) == Offer::Overflow {
            overflowed += 1;
        }
    }
    assert!(started.elapsed() < Duration::from_secs(5));

    relay.shutdown();
    assert_eq!(counters.snapshot().overflow, overflowed);
}
