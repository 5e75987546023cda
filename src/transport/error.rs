//! Errors raised by multicast socket operations.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
};

use thiserror::Error;

/// Errors that may occur while setting up or using a transport socket.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Creating or binding the socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// Applying a socket option failed.
    #[error("failed to set {option}: {source}")]
    Configure {
        option: &'static str,
        #[source]
        source: io::Error,
    },
    /// Joining the multicast group failed.
    #[error("failed to join group {group} on {interface}: {source}")]
    Join {
        group: Ipv4Addr,
        interface: Ipv4Addr,
        #[source]
        source: io::Error,
    },
    /// Reading the next datagram failed.
    #[error("receive error: {0}")]
    Receive(#[source] io::Error),
}
