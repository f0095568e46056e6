use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{tick, Receiver};
use crossbeam::select;
use tracing::info;

use super::counters::{CounterSnapshot, RelayCounters};
use super::queue::PacketQueue;

pub struct Reporter {
    pub counters: Arc<RelayCounters>,
    pub queue: PacketQueue,
    pub interval: Duration,
}

impl Reporter {
    /// Logs the counters every `interval` until `shutdown` disconnects, then
    /// logs them one last time.
    pub fn run(&self, shutdown: &Receiver<()>) {
        let ticker = tick(self.interval);

        loop {
            select! {
                recv(ticker) -> _ => self.report(),
                recv(shutdown) -> _ => break,
            }
        }

        self.report();
    }

    /// Current counters and queue depth.
    fn sample(&self) -> (CounterSnapshot, usize) {
        (self.counters.snapshot(), self.queue.len())
    }

    fn report(&self) {
        let (s, queue_depth) = self.sample();
        info!(
            packets_received = s.packets_received,
            packets = s.packets,
            metrics = s.metrics,
            malformed = s.malformed,
            rewritten = s.rewritten,
            relayed = s.relayed,
            dropped = s.dropped,
            missed = s.missed,
            passed_through = s.passed_through,
            overflow = s.overflow,
            backend_errors = s.backend_errors,
            queue_depth,
            "Relay counters"
        );
    }
}
