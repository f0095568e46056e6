#![no_main]

use libfuzzer_sys::fuzz_target;
use statsd_rewrite_proxy::{parse_line, MetricType, MetricValue, PacketLines};

// Arbitrary datagram bodies must never panic, and every parsed metric must
// carry the value shape of its type.
fuzz_target!(|data: &[u8]| {
    for line in PacketLines::new(data) {
        let Ok(line) = line else {
            continue;
        };
        let Ok(metrics) = parse_line(line) else {
            continue;
        };

        for metric in metrics {
            assert!(!metric.name.is_empty());
            assert!(metric.sample_rate.is_finite() && metric.sample_rate > 0.0);
            match (metric.metric_type, &metric.value) {
                (MetricType::Counter, MetricValue::Integer(_)) | (MetricType::Set, MetricValue::Text(_)) => {}
                (MetricType::Gauge | MetricType::Timing | MetricType::Histogram, MetricValue::Float(v)) => {
                    assert!(v.is_finite());
                }
                (metric_type, value) => panic!("{metric_type} carries {value:?}"),
            }
        }
    }
});
