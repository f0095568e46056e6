use crate::common::{bind_receiver, local_options, spawn_udp_receiver};
use statsd_rewrite_proxy::{DogStatsdBackend, DogStatsdOptions, Relay, RuleSet};
use std::collections::HashSet;
use std::net::UdpSocket;
use std::sync::Arc;

fn rules() -> RuleSet {
    RuleSet::builder()
        .match_rule("fabio.http.status.{code}", "fabio.http.response_code")
        .unwrap()
        .drop("vault.*")
        .unwrap()
        .relay("consul.*")
        .unwrap()
        .build()
}

fn start_relay(receiver: &UdpSocket, options: DogStatsdOptions) -> Relay {
    let backend = DogStatsdBackend::connect(
        "127.0.0.1:0".parse().unwrap(),
        receiver.local_addr().unwrap(),
        options,
    )
    .unwrap();
    Relay::start(local_options(2), rules(), Arc::new(backend)).unwrap()
}

#[test]
fn test_rewrites_relays_and_drops_over_udp() {
    let receiver = bind_receiver();
    let relay = start_relay(&receiver, DogStatsdOptions::default());
    let handle = spawn_udp_receiver(receiver.try_clone().unwrap(), 3);

    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client
        .send_to(
            b"fabio.http.status.503:2|c\nvault.core.unsealed:1|g\nconsul.rpc.query:7|ms\nnomad.runtime.heap:42|g\n",
            relay.local_addr(),
        )
        .unwrap();

    let received = handle.join().unwrap();
    let expected: HashSet<String> = [
        "fabio.http.response_code:2|c|#code:503\n",
        "consul.rpc.query:7|ms\n",
        "nomad.runtime.heap:42|g\n",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect();
    assert_eq!(received, expected);

    let counters = relay.counters();
    relay.shutdown();
    let snapshot = counters.snapshot();
    assert_eq!(snapshot.packets_received, 1);
    assert_eq!(snapshot.metrics, 4);
    assert_eq!(snapshot.rewritten, 1);
    assert_eq!(snapshot.dropped, 1);
    assert_eq!(snapshot.relayed, 1);
    assert_eq!(snapshot.missed, 1);
    assert_eq!(snapshot.passed_through, 2);
}

#[test]
fn test_prefix_and_sample_rate_reach_backend() {
    let receiver = bind_receiver();
    let relay = start_relay(
        &receiver,
        DogStatsdOptions {
            stats_prefix: "proxy.".to_owned(),
            ..DogStatsdOptions::default()
        },
    );
    let handle = spawn_udp_receiver(receiver.try_clone().unwrap(), 2);

    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client
        .send_to(b"app.hits:5|c|@0.5\napp.latency:12|ms|@0.5", relay.local_addr())
        .unwrap();

    let received = handle.join().unwrap();
    assert!(received.contains("proxy.app.hits:10|c\n"), "{received:?}");
    assert!(received.contains("proxy.app.latency:12|ms|@0.5\n"), "{received:?}");
    relay.shutdown();
}

#[test]
fn test_malformed_lines_do_not_stop_the_packet() {
    let receiver = bind_receiver();
    let relay = start_relay(&receiver, DogStatsdOptions::default());
    let handle = spawn_udp_receiver(receiver.try_clone().unwrap(), 1);

    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client
        .send_to(b"garbage\nok.metric:1|c\nbad:1|q", relay.local_addr())
        .unwrap();

    let received = handle.join().unwrap();
    assert_eq!(received.len(), 1);
    assert!(received.contains("ok.metric:1|c\n"));

    let counters = relay.counters();
    relay.shutdown();
    assert_eq!(counters.snapshot().malformed, 2);
}
