use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;

use super::counters::RelayCounters;

/// An owned copy of one datagram body.
pub type Packet = Vec<u8>;

/// Result of [`PacketQueue::offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The packet was queued.
    Queued,
    /// The queue was full; the packet was dropped and counted.
    Overflow,
    /// Every receiver is gone.
    Closed,
}

/// Producer side of the bounded packet queue between the listener and the
/// workers.
///
/// `offer` never blocks: when the queue is full the packet is shed, which
/// keeps the socket reader draining the kernel buffer under load.
#[derive(Debug, Clone)]
pub struct PacketQueue {
    sender: Sender<Packet>,
    counters: Arc<RelayCounters>,
}

impl PacketQueue {
    /// Creates a queue holding at most `capacity` packets (at least one).
    #[must_use]
    pub fn bounded(capacity: usize, counters: Arc<RelayCounters>) -> (Self, Receiver<Packet>) {
        let (sender, receiver) = bounded(capacity.max(1));
        (Self { sender, counters }, receiver)
    }

    /// Queues `packet` without blocking.
    pub fn offer(&self, packet: Packet) -> Offer {
        match self.sender.try_send(packet) {
            Ok(()) => Offer::Queued,
            Err(TrySendError::Full(packet)) => {
                self.counters.incr_overflow();
                warn!(
                    "Packet queue full, dropping packet of {} bytes",
                    packet.len()
                );
                Offer::Overflow
            }
            Err(TrySendError::Disconnected(_)) => Offer::Closed,
        }
    }

    /// Packets waiting to be processed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    /// Returns `true` if no packet is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }

    /// Maximum number of waiting packets.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.sender.capacity().unwrap_or_default()
    }
}
