#![no_main]

use libfuzzer_sys::fuzz_target;
use statsd_rewrite_proxy::{dispatch, parse_line, DogStatsdBackend, DogStatsdOptions, Writer};
use std::cell::Cell;

#[derive(Default)]
struct LimitWriter {
    largest: Cell<usize>,
}

impl Writer for LimitWriter {
    fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
        self.largest.set(self.largest.get().max(buf.len()));
        Ok(buf.len())
    }
}

// Whatever is parsed and forwarded must respect the packet size limit.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let max_packet_size = u16::from(data[0]).max(8);
    let Ok(line) = std::str::from_utf8(&data[1..]) else {
        return;
    };
    let Ok(metrics) = parse_line(line) else {
        return;
    };

    let backend = DogStatsdBackend::with_writer(
        LimitWriter::default(),
        DogStatsdOptions {
            max_packet_size,
            stats_prefix: String::new(),
        },
    );
    let tags = vec!["fuzz:true".to_owned()];
    for metric in metrics {
        let _ = dispatch(&backend, &metric, &metric.name, &tags);
    }

    assert!(backend.writer().largest.get() <= usize::from(max_packet_size));
});
