use std::net::{SocketAddr, UdpSocket};

/// Transport for encoded DogStatsD payloads.
///
/// Each call carries one complete datagram.
pub trait Writer {
    /// Sends `buf` as one datagram.
    ///
    /// # Errors
    /// Returns the transport's I/O error.
    fn write(&self, buf: &[u8]) -> std::io::Result<usize>;
}

impl<T> Writer for &T
where
    T: Writer,
{
    fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
        (*self).write(buf)
    }
}

/// UDP transport sending every datagram to a fixed destination.
#[derive(Debug)]
pub struct UdpSocketWriter {
    /// Local socket, usually bound to an ephemeral port.
    pub sock: UdpSocket,
    /// Where datagrams go.
    pub destination_addr: SocketAddr,
}

impl UdpSocketWriter {
    /// Binds `bind_addr` and targets `destination_addr`.
    ///
    /// # Errors
    /// Returns an error if the socket cannot be bound.
    pub fn bind(bind_addr: SocketAddr, destination_addr: SocketAddr) -> std::io::Result<Self> {
        Ok(Self {
            sock: UdpSocket::bind(bind_addr)?,
            destination_addr,
        })
    }
}

impl Writer for UdpSocketWriter {
    fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
        let r = self.sock.send_to(buf, self.destination_addr);
        if let Err(ref err) = r {
            // callers count and log failed sends
            tracing::debug!("UDP send error: {err}");
        }
        r
    }
}
