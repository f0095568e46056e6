//! # statsd-rewrite-proxy
//!
//! A StatsD relay that rewrites noisy, high-cardinality metric names into a
//! clean tag-based scheme before forwarding them to a `DogStatsD` backend.
//!
//! ## Features
//!
//! - **Rule Engine**: ordered `match`/`drop`/`relay` rules, first match wins
//! - **Pattern Templates**: dot segments with `{capture}` and `*` wildcards
//! - **Bounded Ingestion**: packets are shed and counted when workers fall behind
//! - **Worker Pool**: one thread per available core drains the packet queue
//!
//! ## Quick Start
//!
//! ```no_run
//! use statsd_rewrite_proxy::{DogStatsdBackend, DogStatsdOptions, Relay, RelayOptions, RuleSet};
//! use std::sync::Arc;
//!
//! let rules = RuleSet::builder()
//!     .match_rule("nomad.client.uptime.{client}", "nomad.client.uptime")?
//!     .relay("nomad.*")?
//!     .drop("fabio.*")?
//!     .build();
//!
//! let backend = DogStatsdBackend::connect(
//!     "0.0.0.0:0".parse().unwrap(),
//!     "127.0.0.1:8125".parse().unwrap(),
//!     DogStatsdOptions::default(),
//! )?;
//!
//! let relay = Relay::start(RelayOptions::default(), rules, Arc::new(backend))?;
//! relay.wait();
//! # Ok::<(), statsd_rewrite_proxy::RelayError>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![warn(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod args;
mod backend;
mod error;
mod relay;
mod rules;
mod statsd;

pub use args::Args;
pub use backend::dogstatsd::{DogStatsdBackend, DogStatsdOptions, DEFAULT_MAX_PACKET_SIZE};
pub use backend::writer::{UdpSocketWriter, Writer};
pub use backend::{MetricsBackend, NoopBackend};
pub use error::RelayError;
pub use relay::counters::{CounterSnapshot, RelayCounters};
pub use relay::queue::{Offer, Packet, PacketQueue};
pub use relay::worker::dispatch;
pub use relay::{DispatchError, Relay, RelayOptions, MAX_DATAGRAM_SIZE};
pub use rules::loader::{load_rules, parse_rules};
pub use rules::pattern::{compile, Matcher};
pub use rules::template::NameTemplate;
pub use rules::{PatternError, Rule, RuleAction, RuleResult, RuleSet, RuleSetBuilder, RulesError};
pub use statsd::parser::{parse_line, PacketLines, ParseError};
pub use statsd::{Metric, MetricType, MetricValue};

/// Result type for relay operations.
///
/// Wraps errors that can occur while loading rules, binding sockets and
/// forwarding metrics.
pub type RelayResult<T> = Result<T, RelayError>;
