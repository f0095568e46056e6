//! Command-line arguments for the proxy binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::backend::dogstatsd::{DogStatsdOptions, DEFAULT_MAX_PACKET_SIZE};
use crate::relay::counters::CounterSnapshot;
use crate::relay::RelayOptions;

/// Relays StatsD metrics, rewriting names into tags along the way.
#[derive(Parser, Debug, Clone)]
#[command(name = "statsd-rewrite-proxy", version, about)]
pub struct Args {
    /// Address to receive StatsD packets on
    #[arg(short, long, env = "STATSD_PROXY_LISTEN", default_value = "0.0.0.0:8126")]
    pub listen: SocketAddr,

    /// DogStatsD backend to forward metrics to
    #[arg(short, long, env = "STATSD_PROXY_BACKEND", default_value = "127.0.0.1:8125")]
    pub backend: SocketAddr,

    /// Rule file; without one every metric passes through unchanged
    #[arg(short, long, env = "STATSD_PROXY_RULES")]
    pub rules: Option<PathBuf>,

    /// Number of worker threads (default: one per CPU core, 0 also means that)
    #[arg(short, long, env = "STATSD_PROXY_WORKERS")]
    pub workers: Option<usize>,

    /// Packets buffered before new ones are dropped
    #[arg(long, env = "STATSD_PROXY_QUEUE_CAPACITY", default_value = "4096")]
    pub queue_capacity: usize,

    /// Seconds between counter reports
    #[arg(long, env = "STATSD_PROXY_REPORT_INTERVAL", default_value = "60")]
    pub report_interval: u64,

    /// Prefix prepended to every forwarded metric name
    #[arg(long, env = "STATSD_PROXY_STATS_PREFIX", default_value = "")]
    pub stats_prefix: String,

    /// Largest datagram sent to the backend, in bytes
    #[arg(long, env = "STATSD_PROXY_MAX_PACKET_SIZE", default_value_t = DEFAULT_MAX_PACKET_SIZE)]
    pub max_packet_size: u16,

    /// Remove `--` from metric names before matching
    #[arg(long, env = "STATSD_PROXY_STRIP_DOUBLE_DASHES")]
    pub strip_double_dashes: bool,

    /// Print the expvar check descriptor for a debug endpoint on this port and exit
    #[arg(long, value_name = "PORT")]
    pub expvar_descriptor: Option<u16>,
}

impl Args {
    /// Relay configuration derived from the arguments.
    #[must_use]
    pub fn relay_options(&self) -> RelayOptions {
        RelayOptions {
            listen_addr: self.listen,
            workers: self.workers.unwrap_or(0),
            queue_capacity: self.queue_capacity,
            report_interval: Duration::from_secs(self.report_interval.max(1)),
            strip_double_dashes: self.strip_double_dashes,
            ..RelayOptions::default()
        }
    }

    /// Backend configuration derived from the arguments.
    #[must_use]
    pub fn backend_options(&self) -> DogStatsdOptions {
        DogStatsdOptions {
            max_packet_size: self.max_packet_size,
            stats_prefix: self.stats_prefix.clone(),
        }
    }

    /// The expvar check descriptor, when one was asked for.
    #[must_use]
    pub fn expvar_descriptor(&self) -> Option<String> {
        self.expvar_descriptor.map(CounterSnapshot::expvar_descriptor)
    }

    /// Local address for the backend socket, matching the backend's family.
    #[must_use]
    pub const fn backend_bind_addr(&self) -> SocketAddr {
        match self.backend {
            SocketAddr::V4(_) => SocketAddr::new(
                std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
                0,
            ),
            SocketAddr::V6(_) => SocketAddr::new(
                std::net::IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
                0,
            ),
        }
    }
}
