use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide relay counters.
///
/// Every field only grows. Updates use relaxed ordering, so a snapshot taken
/// while traffic flows is eventually consistent.
#[derive(Debug, Default)]
pub struct RelayCounters {
    packets_received: AtomicU64,
    packets: AtomicU64,
    metrics: AtomicU64,
    malformed: AtomicU64,
    rewritten: AtomicU64,
    relayed: AtomicU64,
    dropped: AtomicU64,
    missed: AtomicU64,
    passed_through: AtomicU64,
    overflow: AtomicU64,
    backend_errors: AtomicU64,
}

impl RelayCounters {
    pub(crate) fn incr_packets_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_packets(&self) {
        self.packets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_metrics(&self) {
        self.metrics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_rewritten(&self) {
        self.rewritten.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_relayed(&self) {
        self.relayed.fetch_add(1, Ordering::Relaxed);
        self.passed_through.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_missed(&self) {
        self.missed.fetch_add(1, Ordering::Relaxed);
        self.passed_through.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_overflow(&self) {
        self.overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_backend_errors(&self) {
        self.backend_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            packets: self.packets.load(Ordering::Relaxed),
            metrics: self.metrics.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            rewritten: self.rewritten.load(Ordering::Relaxed),
            relayed: self.relayed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            missed: self.missed.load(Ordering::Relaxed),
            passed_through: self.passed_through.load(Ordering::Relaxed),
            overflow: self.overflow.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RelayCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Datagrams read from the socket.
    pub packets_received: u64,
    /// Packets taken off the queue by workers.
    pub packets: u64,
    /// Metrics parsed.
    pub metrics: u64,
    /// Lines rejected by the parser.
    pub malformed: u64,
    /// Metrics renamed by a `match` rule.
    pub rewritten: u64,
    /// Metrics forwarded by a `relay` rule.
    pub relayed: u64,
    /// Metrics discarded by a `drop` rule.
    pub dropped: u64,
    /// Metrics no rule matched.
    pub missed: u64,
    /// Metrics forwarded under their original name (relayed plus missed).
    pub passed_through: u64,
    /// Packets discarded because the queue was full.
    pub overflow: u64,
    /// Backend calls that returned an error.
    pub backend_errors: u64,
}

impl CounterSnapshot {
    /// Counter names paired with their values, in reporting order.
    #[must_use]
    pub const fn fields(&self) -> [(&'static str, u64); 11] {
        [
            ("packets_received", self.packets_received),
            ("packets", self.packets),
            ("metrics", self.metrics),
            ("malformed", self.malformed),
            ("rewritten", self.rewritten),
            ("relayed", self.relayed),
            ("dropped", self.dropped),
            ("missed", self.missed),
            ("passed_through", self.passed_through),
            ("overflow", self.overflow),
            ("backend_errors", self.backend_errors),
        ]
    }

    /// Renders the expvar check descriptor a monitoring agent uses to scrape
    /// these counters from a debug endpoint on `port`.
    #[must_use]
    pub fn expvar_descriptor(port: u16) -> String {
        let mut out = String::from("---\nexpvar_url: http://127.0.0.1:");
        out.push_str(itoa::Buffer::new().format(port));
        out.push_str("/debug/vars\n");
        out.push_str("tags:\n- project:statsd-rewrite-proxy\n");
        out.push_str("metrics:\n");
        for (name, _) in Self::default().fields() {
            out.push_str("- path: ");
            out.push_str(name);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for CounterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.fields() {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}
