use thiserror::Error;
use tracing::warn;

use super::{Metric, MetricType, MetricValue};

/// Reasons a StatsD line is rejected. Any error discards the whole line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No `:` after the bucket name.
    #[error("missing `:` value separator")]
    MissingValue,
    /// The bucket name before the first `:` is empty.
    #[error("empty bucket name")]
    EmptyName,
    /// A value group has no `|` type separator.
    #[error("missing `|` type separator in `{0}`")]
    MissingType(String),
    /// The type code is not one of `c`, `g`, `gf`, `ms`, `s`, `h`.
    #[error("unknown metric type `{0}`")]
    UnknownType(String),
    /// The value is not a finite number.
    #[error("invalid {metric_type} value `{value}`")]
    InvalidValue {
        /// Type the value was parsed for.
        metric_type: MetricType,
        /// The raw value.
        value: String,
    },
    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// Parses one StatsD line into its metrics.
///
/// A line is `bucket:value|type[|@rate][:value|type[|@rate]...]`; each value
/// group yields one metric sharing the bucket name.
///
/// # Errors
/// Returns [`ParseError`] if any group is malformed; no partial results are
/// returned.
pub fn parse_line(line: &str) -> Result<Vec<Metric>, ParseError> {
    let mut pieces = line.split(':');
    let name = pieces.next().unwrap_or_default();
    let groups: Vec<&str> = pieces.collect();

    if groups.is_empty() {
        return Err(ParseError::MissingValue);
    }
    if name.is_empty() {
        return Err(ParseError::EmptyName);
    }

    groups
        .into_iter()
        .map(|group| parse_group(name, group))
        .collect()
}

fn parse_group(name: &str, group: &str) -> Result<Metric, ParseError> {
    let mut fields = group.split('|');
    let raw_value = fields.next().unwrap_or_default();
    let Some(code) = fields.next() else {
        return Err(ParseError::MissingType(group.to_owned()));
    };
    let metric_type =
        MetricType::from_code(code).ok_or_else(|| ParseError::UnknownType(code.to_owned()))?;

    // DogStatsD extensions such as `|#tags` are ignored
    let sample_rate = fields
        .find_map(|field| field.strip_prefix('@'))
        .map_or(1.0, parse_sample_rate);

    let value = match metric_type {
        MetricType::Set => MetricValue::Text(raw_value.to_owned()),
        MetricType::Counter => MetricValue::Integer(parse_counter(raw_value, sample_rate)?),
        MetricType::Gauge | MetricType::Timing | MetricType::Histogram => {
            MetricValue::Float(parse_number(metric_type, raw_value)?)
        }
    };

    Ok(Metric {
        name: name.to_owned(),
        metric_type,
        value,
        sample_rate,
    })
}

fn parse_sample_rate(raw: &str) -> f64 {
    match raw.parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate > 0.0 => rate,
        _ => {
            warn!("Invalid sample rate '{raw}', using 1");
            1.0
        }
    }
}

fn parse_number(metric_type: MetricType, raw: &str) -> Result<f64, ParseError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidValue {
            metric_type,
            value: raw.to_owned(),
        })
}

// 2^63, exactly representable
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn parse_counter(raw: &str, sample_rate: f64) -> Result<i64, ParseError> {
    let invalid = || ParseError::InvalidValue {
        metric_type: MetricType::Counter,
        value: raw.to_owned(),
    };
    let value = raw.parse::<i64>().map_err(|_| invalid())?;
    if (sample_rate - 1.0).abs() < f64::EPSILON {
        return Ok(value);
    }

    let scaled = (value as f64 / sample_rate).round();
    if (-I64_BOUND..I64_BOUND).contains(&scaled) {
        Ok(scaled as i64)
    } else {
        Err(invalid())
    }
}

/// Iterates over the non-empty lines of a datagram body.
///
/// Lines are separated by `\n`; surrounding ASCII whitespace (including a
/// trailing `\r`) is trimmed and empty lines are skipped.
pub struct PacketLines<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> PacketLines<'a> {
    /// Creates an iterator over `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.offset >= self.buf.len() {
            return None;
        }

        let left = &self.buf[self.offset..];
        match left.iter().position(|b| *b == b'\n') {
            Some(p) => {
                self.offset += p + 1;
                Some(&left[..p])
            }
            None => {
                self.offset = self.buf.len();
                Some(left)
            }
        }
    }
}

impl<'a> Iterator for PacketLines<'a> {
    type Item = Result<&'a str, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.next_line()?.trim_ascii();
            if line.is_empty() {
                continue;
            }
            return Some(std::str::from_utf8(line).map_err(|_| ParseError::InvalidUtf8));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_counter() {
        let metrics = parse_line("x.y:3|c").unwrap();
        assert_eq!(
            metrics,
            vec![Metric {
                name: "x.y".to_owned(),
                metric_type: MetricType::Counter,
                value: MetricValue::Integer(3),
                sample_rate: 1.0,
            }]
        );
    }

    #[test]
    fn multiple_groups_share_the_bucket() {
        let metrics = parse_line("a:1|c:2.5|g").unwrap();
        assert_eq!(metrics.len(), 2);
        assert!(metrics.iter().all(|m| m.name == "a"));
        assert_eq!(metrics[0].metric_type, MetricType::Counter);
        assert_eq!(metrics[0].integer_value(), Some(1));
        assert_eq!(metrics[1].metric_type, MetricType::Gauge);
        assert_eq!(metrics[1].numeric_value(), Some(2.5));
    }

    #[test]
    fn counter_is_extrapolated_by_sample_rate() {
        let metrics = parse_line("a:10|c|@0.1").unwrap();
        assert_eq!(metrics[0].integer_value(), Some(100));
        assert!((metrics[0].sample_rate - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn sample_rate_is_kept_for_other_types() {
        let metrics = parse_line("req.time:320|ms|@0.5").unwrap();
        assert_eq!(metrics[0].metric_type, MetricType::Timing);
        assert_eq!(metrics[0].numeric_value(), Some(320.0));
        assert!((metrics[0].sample_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_sample_rate_falls_back_to_one() {
        for line in ["a:4|c|@abc", "a:4|c|@0", "a:4|c|@-1", "a:4|c|@inf", "a:4|c|@"] {
            let metrics = parse_line(line).unwrap();
            assert_eq!(metrics[0].integer_value(), Some(4), "{line}");
            assert!((metrics[0].sample_rate - 1.0).abs() < f64::EPSILON, "{line}");
        }
    }

    #[test]
    fn dogstatsd_tags_are_ignored() {
        let metrics = parse_line("page.views:1|c|#env:prod|@0.5").unwrap();
        assert_eq!(metrics[0].integer_value(), Some(2));
    }

    #[test]
    fn signed_counters_and_gauges() {
        assert_eq!(parse_line("a:+3|c").unwrap()[0].integer_value(), Some(3));
        assert_eq!(parse_line("a:-3|c").unwrap()[0].integer_value(), Some(-3));
        assert_eq!(parse_line("a:-1.5|g").unwrap()[0].numeric_value(), Some(-1.5));
    }

    #[test]
    fn all_type_codes() {
        let metrics = parse_line("m:1|c:2|g:3|gf:4|ms:5|h:user42|s").unwrap();
        let types: Vec<MetricType> = metrics.iter().map(|m| m.metric_type).collect();
        assert_eq!(
            types,
            [
                MetricType::Counter,
                MetricType::Gauge,
                MetricType::Gauge,
                MetricType::Timing,
                MetricType::Histogram,
                MetricType::Set,
            ]
        );
        assert_eq!(metrics[5].string_value(), Some("user42"));
    }

    #[test]
    fn malformed_lines_yield_nothing() {
        assert_eq!(parse_line("nocolon"), Err(ParseError::MissingValue));
        assert_eq!(
            parse_line("a:novaluepipe"),
            Err(ParseError::MissingType("novaluepipe".to_owned()))
        );
        assert_eq!(parse_line(":1|c"), Err(ParseError::EmptyName));
        assert_eq!(parse_line("a:1|x"), Err(ParseError::UnknownType("x".to_owned())));
        assert_eq!(
            parse_line("a:abc|g"),
            Err(ParseError::InvalidValue {
                metric_type: MetricType::Gauge,
                value: "abc".to_owned(),
            })
        );
        assert!(parse_line("a:NaN|ms").is_err());
        assert!(parse_line("a:|c").is_err());
    }

    fn counter_error(value: &str) -> ParseError {
        ParseError::InvalidValue {
            metric_type: MetricType::Counter,
            value: value.to_owned(),
        }
    }

    #[test]
    fn counters_must_be_integers() {
        assert_eq!(parse_line("a:1.5|c"), Err(counter_error("1.5")));
        assert_eq!(parse_line("a:1e3|c"), Err(counter_error("1e3")));
        assert_eq!(
            parse_line("huge:99999999999999999999|c"),
            Err(counter_error("99999999999999999999"))
        );
    }

    #[test]
    fn counters_keep_full_integer_precision() {
        let metrics = parse_line("a:9007199254740993|c").unwrap();
        assert_eq!(metrics[0].value, MetricValue::Integer(9_007_199_254_740_993));

        let metrics = parse_line("a:-9223372036854775808|c").unwrap();
        assert_eq!(metrics[0].value, MetricValue::Integer(i64::MIN));
    }

    #[test]
    fn extrapolation_out_of_range_is_rejected() {
        assert_eq!(
            parse_line("a:9223372036854775807|c|@0.5"),
            Err(counter_error("9223372036854775807"))
        );
        assert_eq!(
            parse_line("a:-9000000000000000000|c|@0.1"),
            Err(counter_error("-9000000000000000000"))
        );
    }

    #[test]
    fn one_bad_group_invalidates_the_line() {
        assert_eq!(
            parse_line("a:1|c:2|zz:3|g"),
            Err(ParseError::UnknownType("zz".to_owned()))
        );
    }

    #[test]
    fn packet_lines_skip_blank_lines() {
        let buf = b"gorets:1|c\n\r\ngaugor:333|g\r\n\n  \nlast:1|ms";
        let lines: Vec<&str> = PacketLines::new(buf).map(Result::unwrap).collect();
        assert_eq!(lines, ["gorets:1|c", "gaugor:333|g", "last:1|ms"]);
    }

    #[test]
    fn packet_lines_flag_invalid_utf8() {
        let buf = b"ok:1|c\n\xff\xfe:1|c\n";
        let mut lines = PacketLines::new(buf);
        assert_eq!(lines.next(), Some(Ok("ok:1|c")));
        assert_eq!(lines.next(), Some(Err(ParseError::InvalidUtf8)));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_packet_has_no_lines() {
        assert_eq!(PacketLines::new(b"").count(), 0);
        assert_eq!(PacketLines::new(b"\n\n").count(), 0);
    }
}
