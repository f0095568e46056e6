use std::fmt;

pub mod parser;

/// StatsD metric types understood by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// `c`
    Counter,
    /// `g` or `gf`
    Gauge,
    /// `ms`
    Timing,
    /// `s`
    Set,
    /// `h`
    Histogram,
}

impl MetricType {
    /// Maps a StatsD type code to a metric type.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "c" => Some(Self::Counter),
            "g" | "gf" => Some(Self::Gauge),
            "ms" => Some(Self::Timing),
            "s" => Some(Self::Set),
            "h" => Some(Self::Histogram),
            _ => None,
        }
    }

    /// The canonical StatsD type code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Counter => "c",
            Self::Gauge => "g",
            Self::Timing => "ms",
            Self::Set => "s",
            Self::Histogram => "h",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Timing => "timing",
            Self::Set => "set",
            Self::Histogram => "histogram",
        };
        f.write_str(name)
    }
}

/// The magnitude carried by a metric; which variant is used follows the type.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Counter value, already extrapolated by the sample rate.
    Integer(i64),
    /// Gauge, timing (milliseconds) or histogram value.
    Float(f64),
    /// Set member, verbatim.
    Text(String),
}

/// One parsed StatsD sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Dot-delimited bucket name.
    pub name: String,
    /// The StatsD type.
    pub metric_type: MetricType,
    /// The value, shaped by `metric_type`.
    pub value: MetricValue,
    /// Sample rate in `(0, ∞)`, 1.0 when absent.
    pub sample_rate: f64,
}

impl Metric {
    /// Counter value.
    #[must_use]
    pub const fn integer_value(&self) -> Option<i64> {
        match self.value {
            MetricValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Gauge, timing or histogram value.
    #[must_use]
    pub const fn numeric_value(&self) -> Option<f64> {
        match self.value {
            MetricValue::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Set member.
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            MetricValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Removes `--` sequences from the name, as some emitters pad names with them.
    pub fn strip_double_dashes(&mut self) {
        if self.name.contains("--") {
            self.name = self.name.replace("--", "");
        }
    }
}
