//! UDP multicast binding for slice datagrams.
//!
//! The runtime loops talk to sockets only through [`DatagramSink`] and
//! [`DatagramSource`], so tests can substitute in-memory transports.

use std::{io, net::SocketAddr};

use async_trait::async_trait;

mod error;
mod socket;

pub use error::TransportError;
pub use socket::{MulticastReceiver, MulticastSender};

/// Destination for outbound datagrams.
///
/// Each call is an independent, unacknowledged send.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatagramSink: Send + Sync {
    /// Send one datagram, returning the number of bytes written.
    async fn send_datagram(&self, datagram: &[u8]) -> io::Result<usize>;
}

/// Origin of inbound datagrams.
///
/// Implementations must be cancellation-safe: dropping a pending
/// `recv_datagram()` future must not lose a datagram that was already read.
#[async_trait]
pub trait DatagramSource: Send + Sync {
    /// Wait for the next datagram, returning its length and sender.
    async fn recv_datagram(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}
