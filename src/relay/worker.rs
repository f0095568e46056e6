use std::sync::Arc;

use crossbeam::channel::Receiver;
use crossbeam::select;
use tracing::{debug, error, warn};

use super::counters::RelayCounters;
use super::queue::Packet;
use super::DispatchError;
use crate::backend::MetricsBackend;
use crate::rules::{RuleResult, RuleSet};
use crate::statsd::parser::{parse_line, PacketLines, ParseError};
use crate::statsd::{Metric, MetricType, MetricValue};
use crate::RelayResult;

pub struct Worker<B: ?Sized> {
    pub id: usize,
    pub rules: Arc<RuleSet>,
    pub backend: Arc<B>,
    pub counters: Arc<RelayCounters>,
    pub strip_double_dashes: bool,
}

impl<B: MetricsBackend + ?Sized> Worker<B> {
    /// Processes packets until `shutdown` disconnects or the queue closes.
    ///
    /// Packets still queued when shutdown is observed are drained first.
    pub fn run(&self, packets: &Receiver<Packet>, shutdown: &Receiver<()>) {
        loop {
            select! {
                recv(packets) -> packet => match packet {
                    Ok(packet) => self.process_packet(&packet),
                    Err(_) => break,
                },
                recv(shutdown) -> _ => {
                    while let Ok(packet) = packets.try_recv() {
                        self.process_packet(&packet);
                    }
                    break;
                },
            }
        }

        debug!("Worker {} stopped", self.id);
    }

    pub fn process_packet(&self, packet: &[u8]) {
        self.counters.incr_packets();

        for line in PacketLines::new(packet) {
            let parsed = line.and_then(|line| {
                parse_line(line).inspect_err(|err| warn!("Malformed line '{line}': {err}"))
            });

            match parsed {
                Ok(metrics) => {
                    for metric in metrics {
                        self.process_metric(metric);
                    }
                }
                Err(err) => {
                    if err == ParseError::InvalidUtf8 {
                        warn!("Malformed line: {err}");
                    }
                    self.counters.incr_malformed();
                }
            }
        }
    }

    fn process_metric(&self, mut metric: Metric) {
        self.counters.incr_metrics();
        if self.strip_double_dashes {
            metric.strip_double_dashes();
        }

        let result = match self.rules.evaluate(&metric.name) {
            RuleResult::Drop => {
                self.counters.incr_dropped();
                return;
            }
            RuleResult::Relay => {
                self.counters.incr_relayed();
                dispatch(&*self.backend, &metric, &metric.name, &[])
            }
            RuleResult::Match { name, tags } => {
                debug!("Rewrote {} to {name} with tags {tags:?}", metric.name);
                self.counters.incr_rewritten();
                dispatch(&*self.backend, &metric, &name, &tags)
            }
            RuleResult::Miss => {
                debug!("No rule matched {}", metric.name);
                self.counters.incr_missed();
                dispatch(&*self.backend, &metric, &metric.name, &[])
            }
        };

        match result {
            Ok(()) => {}
            Err(crate::RelayError::Dispatch(err)) => {
                error!("Worker {}: {err}", self.id);
                std::process::abort();
            }
            Err(err) => {
                self.counters.incr_backend_errors();
                warn!("Error sending metric {}: {err}", metric.name);
            }
        }
    }
}

/// Sends `metric` to `backend` under `name` with `tags`.
///
/// Counters are sent with a sample rate of 1 since their value is already
/// extrapolated; other types carry the metric's own rate.
///
/// # Errors
/// Returns [`DispatchError`] (wrapped) if the value does not fit the type,
/// or the backend's error.
pub fn dispatch<B: MetricsBackend + ?Sized>(
    backend: &B,
    metric: &Metric,
    name: &str,
    tags: &[String],
) -> RelayResult<()> {
    let rate = metric.sample_rate;
    match (metric.metric_type, &metric.value) {
        (MetricType::Counter, MetricValue::Integer(v)) => backend.count(name, *v, tags, 1.0),
        (MetricType::Gauge, MetricValue::Float(v)) => backend.gauge(name, *v, tags, rate),
        (MetricType::Timing, MetricValue::Float(v)) => backend.timing(name, *v, tags, rate),
        (MetricType::Set, MetricValue::Text(v)) => backend.set(name, v, tags, rate),
        (MetricType::Histogram, MetricValue::Float(v)) => backend.histogram(name, *v, tags, rate),
        (metric_type, value) => Err(DispatchError::TypeMismatch {
            metric_type,
            value: format!("{value:?}"),
        }
        .into()),
    }
}
