//! The ingestion pipeline: socket listener, bounded packet queue, worker
//! pool and periodic counter reporting.

pub mod counters;
pub mod listener;
pub mod queue;
pub mod reporter;
pub mod worker;

use std::net::{SocketAddr, UdpSocket};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{unbounded, Sender};
use thiserror::Error;
use tracing::{debug, error};

pub use listener::MAX_DATAGRAM_SIZE;

use self::counters::{CounterSnapshot, RelayCounters};
use self::listener::Listener;
use self::queue::PacketQueue;
use self::reporter::Reporter;
use self::worker::Worker;
use crate::backend::MetricsBackend;
use crate::rules::RuleSet;
use crate::statsd::MetricType;
use crate::RelayResult;

/// A parsed metric whose value does not fit its type.
///
/// The parser never produces such a metric, so this signals a broken
/// internal contract rather than bad input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// The value variant does not belong to the metric type.
    #[error("{metric_type} metric carries unexpected value {value}")]
    TypeMismatch {
        /// The metric's type.
        metric_type: MetricType,
        /// Debug rendering of the value.
        value: String,
    },
}

/// Configuration for [`Relay`].
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Address the StatsD socket binds to.
    pub listen_addr: SocketAddr,
    /// Number of worker threads. Zero means one per available core.
    pub workers: usize,
    /// Packets buffered between the listener and the workers.
    pub queue_capacity: usize,
    /// How often counters are logged.
    pub report_interval: Duration,
    /// Socket read timeout, bounding how long shutdown waits for the listener.
    pub read_timeout: Duration,
    /// Remove `--` from metric names before matching.
    pub strip_double_dashes: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8126)),
            workers: 0,
            queue_capacity: 4096,
            report_interval: Duration::from_secs(60),
            read_timeout: Duration::from_millis(250),
            strip_double_dashes: false,
        }
    }
}

impl RelayOptions {
    /// Worker threads to spawn, resolving zero to the available parallelism.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    }
}

/// A running relay.
///
/// `Relay` owns one listener thread, a pool of worker threads and a reporter
/// thread, all stopped by a shared cancellation channel. Dropping the relay
/// signals every thread and waits for them; queued packets are drained on a
/// best-effort basis.
///
/// # Example
///
/// ```no_run
/// use statsd_rewrite_proxy::{NoopBackend, Relay, RelayOptions, RuleSet};
/// use std::sync::Arc;
///
/// let options = RelayOptions {
///     listen_addr: "127.0.0.1:0".parse().unwrap(),
///     workers: 2,
///     ..RelayOptions::default()
/// };
/// let relay = Relay::start(options, RuleSet::default(), Arc::new(NoopBackend))?;
/// println!("listening on {}", relay.local_addr());
/// relay.shutdown();
/// # Ok::<(), statsd_rewrite_proxy::RelayError>(())
/// ```
pub struct Relay {
    sender: Option<Sender<()>>,
    handles: Vec<JoinHandle<()>>,
    queue: PacketQueue,
    counters: Arc<RelayCounters>,
    local_addr: SocketAddr,
}

impl Relay {
    /// Binds the listen socket and spawns every thread.
    ///
    /// # Errors
    /// Returns an error if the socket cannot be bound or configured, or a
    /// thread cannot be spawned.
    pub fn start<B>(options: RelayOptions, rules: RuleSet, backend: Arc<B>) -> RelayResult<Self>
    where
        B: MetricsBackend + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind(options.listen_addr)?;
        socket.set_read_timeout(Some(options.read_timeout.max(Duration::from_millis(1))))?;
        let local_addr = socket.local_addr()?;

        let counters = Arc::new(RelayCounters::default());
        let (queue, packets) = PacketQueue::bounded(options.queue_capacity, counters.clone());
        let (sender, shutdown) = unbounded::<()>();
        let rules = Arc::new(rules);

        let mut relay = Self {
            sender: Some(sender),
            handles: Vec::new(),
            queue: queue.clone(),
            counters: counters.clone(),
            local_addr,
        };

        let listener = Listener {
            socket,
            queue: queue.clone(),
            counters: counters.clone(),
        };
        let rx = shutdown.clone();
        relay.handles.push(
            Builder::new()
                .name("statsd-listener".to_owned())
                .spawn(move || listener.run(&rx))?,
        );

        let worker_count = options.worker_count();
        for id in 0..worker_count {
            let worker = Worker {
                id,
                rules: rules.clone(),
                backend: backend.clone(),
                counters: counters.clone(),
                strip_double_dashes: options.strip_double_dashes,
            };
            let packets = packets.clone();
            let rx = shutdown.clone();
            relay.handles.push(
                Builder::new()
                    .name(format!("statsd-worker-{id}"))
                    .spawn(move || worker.run(&packets, &rx))?,
            );
        }

        let reporter = Reporter {
            counters,
            queue,
            interval: options.report_interval,
        };
        relay.handles.push(
            Builder::new()
                .name("statsd-reporter".to_owned())
                .spawn(move || reporter.run(&shutdown))?,
        );

        debug!(
            "Relay started on {local_addr} with {worker_count} workers and {} rules",
            rules.len()
        );
        Ok(relay)
    }

    /// Address the listen socket is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The shared counters.
    #[must_use]
    pub fn counters(&self) -> Arc<RelayCounters> {
        self.counters.clone()
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Packets waiting for a worker.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Producer handle onto the packet queue, feeding workers without the
    /// socket.
    #[must_use]
    pub fn packet_queue(&self) -> PacketQueue {
        self.queue.clone()
    }

    /// Signals every thread to stop and waits for them.
    pub fn shutdown(self) {
        drop(self);
    }

    /// Waits for the threads without signaling them, which in practice
    /// blocks until the process exits.
    pub fn wait(mut self) {
        self.join_all();
    }

    fn join_all(&mut self) {
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("relay").to_owned();
            if handle.join().is_err() {
                error!("Thread {name} panicked");
            }
        }
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        // Disconnecting the channel wakes every select! on it.
        drop(self.sender.take());
        self.join_all();
    }
}
