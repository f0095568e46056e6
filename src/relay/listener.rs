use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::Arc;

use crossbeam::channel::{Receiver, TryRecvError};
use tracing::{debug, warn};

use super::counters::RelayCounters;
use super::queue::{Offer, PacketQueue};

/// Largest datagram the listener reads in one call.
pub const MAX_DATAGRAM_SIZE: usize = 0xffff;

pub struct Listener {
    pub socket: UdpSocket,
    pub queue: PacketQueue,
    pub counters: Arc<RelayCounters>,
}

enum ReadOutcome {
    Retry,
    Closed,
}

impl Listener {
    /// Reads datagrams until `shutdown` disconnects or the socket closes.
    ///
    /// The socket must have a read timeout so the loop can observe
    /// cancellation between reads.
    pub fn run(self, shutdown: &Receiver<()>) {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            match shutdown.try_recv() {
                Err(TryRecvError::Empty) => {}
                Ok(()) | Err(TryRecvError::Disconnected) => break,
            }

            match self.socket.recv_from(&mut buf) {
                Ok((0, _)) => {}
                Ok((len, _)) => {
                    self.counters.incr_packets_received();
                    if self.queue.offer(buf[..len].to_vec()) == Offer::Closed {
                        break;
                    }
                }
                Err(err) => match classify(err.kind()) {
                    ReadOutcome::Retry => {
                        if !is_timeout(err.kind()) {
                            warn!("Error reading from socket: {err}");
                        }
                    }
                    ReadOutcome::Closed => break,
                },
            }
        }

        debug!("Listener stopped");
    }
}

const fn is_timeout(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}

const fn classify(kind: ErrorKind) -> ReadOutcome {
    match kind {
        ErrorKind::NotConnected
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::UnexpectedEof => ReadOutcome::Closed,
        _ => ReadOutcome::Retry,
    }
}
