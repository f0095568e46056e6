use statsd_rewrite_proxy::{MetricsBackend, RelayOptions, RelayResult};
use std::collections::HashSet;
use std::net::UdpSocket;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

// ============================================================================
// Helper functions shared by the integration tests
// ============================================================================

/// Options for a relay bound to an ephemeral loopback port.
pub fn local_options(workers: usize) -> RelayOptions {
    RelayOptions {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        workers,
        read_timeout: Duration::from_millis(10),
        ..RelayOptions::default()
    }
}

/// Binds a receiving socket standing in for the DogStatsD agent.
pub fn bind_receiver() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("couldn't bind to address");
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .expect("set_read_timeout failed");
    socket
}

/// Collects datagrams until `expected_count` arrived or the socket times out.
pub fn spawn_udp_receiver(socket: UdpSocket, expected_count: usize) -> JoinHandle<HashSet<String>> {
    std::thread::spawn(move || {
        let mut buf = [0; 10000];
        let mut received = HashSet::<String>::new();
        while received.len() < expected_count {
            match socket.recv_from(&mut buf) {
                Ok((number_of_bytes, _)) => {
                    let text = String::from_utf8(buf[..number_of_bytes].to_vec()).unwrap();
                    received.insert(text);
                }
                Err(_) => break,
            }
        }
        received
    })
}

/// One backend call, flattened for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: &'static str,
    pub name: String,
    pub value: String,
    pub tags: Vec<String>,
}

/// Backend that records every call.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
}

impl RecordingBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kind: &'static str, name: &str, value: String, tags: &[String]) -> RelayResult<()> {
        self.calls.lock().unwrap().push(Call {
            kind,
            name: name.to_owned(),
            value,
            tags: tags.to_vec(),
        });
        Ok(())
    }
}

impl MetricsBackend for RecordingBackend {
    fn count(&self, name: &str, value: i64, tags: &[String], _: f64) -> RelayResult<()> {
        self.record("c", name, value.to_string(), tags)
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], _: f64) -> RelayResult<()> {
        self.record("g", name, value.to_string(), tags)
    }

    fn timing(&self, name: &str, millis: f64, tags: &[String], _: f64) -> RelayResult<()> {
        self.record("ms", name, millis.to_string(), tags)
    }

    fn set(&self, name: &str, member: &str, tags: &[String], _: f64) -> RelayResult<()> {
        self.record("s", name, member.to_owned(), tags)
    }

    fn histogram(&self, name: &str, value: f64, tags: &[String], _: f64) -> RelayResult<()> {
        self.record("h", name, value.to_string(), tags)
    }
}
