use std::fmt::Write as _;
use std::net::SocketAddr;

use itoa::Buffer;

use super::writer::{UdpSocketWriter, Writer};
use super::MetricsBackend;
use crate::{MetricType, RelayResult};

// bytes that delimit fields of a line; `:` is allowed inside `key:value` tags
const NAME_RESERVED: [char; 5] = [':', '|', '#', ',', '\n'];
const TAG_RESERVED: [char; 4] = ['|', '#', ',', '\n'];

/// Largest datagram sent by default, sized to fit a typical Ethernet MTU.
pub const DEFAULT_MAX_PACKET_SIZE: u16 = 1432;

/// Configuration for [`DogStatsdBackend`].
#[derive(Debug, Clone)]
pub struct DogStatsdOptions {
    /// Maximum size of a single datagram in bytes. Larger lines are rejected.
    pub max_packet_size: u16,
    /// Prefix prepended verbatim to every metric name. Include a trailing dot if desired (e.g., `"proxy."` results in `"proxy.metric"`).
    pub stats_prefix: String,
}

impl Default for DogStatsdOptions {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            stats_prefix: String::new(),
        }
    }
}

/// Forwards metrics as DogStatsD lines, one datagram per metric.
///
/// Lines have the form `name:value|type[|@rate][|#tag1,tag2]\n`. Delimiter
/// characters inside names and tags are replaced with `_`.
///
/// # Example
///
/// ```no_run
/// use statsd_rewrite_proxy::{DogStatsdBackend, DogStatsdOptions, MetricsBackend};
///
/// let backend = DogStatsdBackend::connect(
///     "0.0.0.0:0".parse().unwrap(),
///     "127.0.0.1:8125".parse().unwrap(),
///     DogStatsdOptions::default(),
/// )?;
/// backend.count("fabio.http.response_code", 1, &["code:200".to_owned()], 1.0)?;
/// # Ok::<(), statsd_rewrite_proxy::RelayError>(())
/// ```
#[derive(Debug)]
pub struct DogStatsdBackend<W = UdpSocketWriter> {
    writer: W,
    options: DogStatsdOptions,
}

impl DogStatsdBackend<UdpSocketWriter> {
    /// Binds a UDP socket on `bind_addr` that sends to `dst_addr`.
    ///
    /// # Errors
    /// Returns an error if the socket cannot be bound.
    pub fn connect(
        bind_addr: SocketAddr,
        dst_addr: SocketAddr,
        options: DogStatsdOptions,
    ) -> RelayResult<Self> {
        Ok(Self::with_writer(
            UdpSocketWriter::bind(bind_addr, dst_addr)?,
            options,
        ))
    }
}

impl<W: Writer> DogStatsdBackend<W> {
    /// Uses a custom transport.
    pub const fn with_writer(writer: W, options: DogStatsdOptions) -> Self {
        Self { writer, options }
    }

    /// The underlying transport.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    fn send(
        &self,
        name: &str,
        value: &str,
        metric_type: MetricType,
        tags: &[String],
        sample_rate: f64,
    ) -> RelayResult<()> {
        let metric_type = metric_type.code();
        let rate = if (sample_rate - 1.0).abs() < f64::EPSILON {
            None
        } else {
            Some(sample_rate)
        };

        let prefix = self.options.stats_prefix.as_str();
        let max = usize::from(self.options.max_packet_size);
        let len = metric_len(prefix, name, tags, value, metric_type);
        let mut line = String::with_capacity(len + 24);

        line.push_str(prefix);
        push_sanitized(&mut line, name, &NAME_RESERVED);
        line.push(':');
        line.push_str(value);
        line.push('|');
        line.push_str(metric_type);
        if let Some(rate) = rate {
            let _ = write!(line, "|@{rate}");
        }
        if !tags.is_empty() {
            line.push_str("|#");
            for (i, tag) in tags.iter().enumerate() {
                if i > 0 {
                    line.push(',');
                }
                push_sanitized(&mut line, tag, &TAG_RESERVED);
            }
        }
        line.push('\n');

        if line.len() > max {
            return Err(format!("Metric is larger than {max}").into());
        }

        self.writer.write(line.as_bytes())?;
        Ok(())
    }
}

fn push_sanitized(line: &mut String, text: &str, reserved: &[char]) {
    if text.contains(reserved) {
        line.extend(
            text.chars()
                .map(|c| if reserved.contains(&c) { '_' } else { c }),
        );
    } else {
        line.push_str(text);
    }
}

fn metric_len(prefix: &str, name: &str, tags: &[String], value: &str, metric_type: &str) -> usize {
    // name:value|type\n without tags or rate
    let mut len = prefix.len() + name.len() + value.len() + metric_type.len() + 3;

    if !tags.is_empty() {
        // '|#' plus separating commas
        len += 2 + tags.iter().map(String::len).sum::<usize>() + tags.len() - 1;
    }
    len
}

impl<W: Writer> MetricsBackend for DogStatsdBackend<W> {
    fn count(&self, name: &str, value: i64, tags: &[String], sample_rate: f64) -> RelayResult<()> {
        let mut buffer = Buffer::new();
        self.send(name, buffer.format(value), MetricType::Counter, tags, sample_rate)
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], sample_rate: f64) -> RelayResult<()> {
        self.send(name, &value.to_string(), MetricType::Gauge, tags, sample_rate)
    }

    fn timing(
        &self,
        name: &str,
        millis: f64,
        tags: &[String],
        sample_rate: f64,
    ) -> RelayResult<()> {
        self.send(name, &millis.to_string(), MetricType::Timing, tags, sample_rate)
    }

    fn set(&self, name: &str, member: &str, tags: &[String], sample_rate: f64) -> RelayResult<()> {
        self.send(name, member, MetricType::Set, tags, sample_rate)
    }

    fn histogram(
        &self,
        name: &str,
        value: f64,
        tags: &[String],
        sample_rate: f64,
    ) -> RelayResult<()> {
        self.send(name, &value.to_string(), MetricType::Histogram, tags, sample_rate)
    }
}
