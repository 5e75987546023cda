//! Multicast socket construction.
//!
//! Sockets are configured through `socket2` before being handed to tokio, so
//! options such as the multicast TTL and address reuse are in place before the
//! first datagram moves.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
};

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use super::{DatagramSink, DatagramSource, TransportError};
use crate::config::TransportConfig;

fn new_udp_socket(addr: SocketAddr) -> Result<Socket, TransportError> {
    Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|source| TransportError::Bind { addr, source })
}

fn configure(option: &'static str, result: io::Result<()>) -> Result<(), TransportError> {
    result.map_err(|source| TransportError::Configure { option, source })
}

fn into_tokio(socket: Socket, addr: SocketAddr) -> Result<UdpSocket, TransportError> {
    configure("O_NONBLOCK", socket.set_nonblocking(true))?;
    UdpSocket::from_std(socket.into()).map_err(|source| TransportError::Bind { addr, source })
}

/// Outbound socket addressing the configured group.
#[derive(Debug)]
pub struct MulticastSender {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl MulticastSender {
    /// Bind an ephemeral port on the configured interface.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the socket cannot be created, bound,
    /// or configured.
    pub fn bind(config: &TransportConfig) -> Result<Self, TransportError> {
        let addr = SocketAddr::V4(SocketAddrV4::new(config.interface, 0));
        let socket = new_udp_socket(addr)?;
        if config.is_multicast() {
            configure("IP_MULTICAST_TTL", socket.set_multicast_ttl_v4(config.ttl))?;
            configure(
                "IP_MULTICAST_LOOP",
                socket.set_multicast_loop_v4(config.multicast_loop),
            )?;
            if !config.interface.is_unspecified() {
                configure(
                    "IP_MULTICAST_IF",
                    socket.set_multicast_if_v4(&config.interface),
                )?;
            }
        }
        socket
            .bind(&addr.into())
            .map_err(|source| TransportError::Bind { addr, source })?;

        let socket = into_tokio(socket, addr)?;
        debug!(destination = %config.destination(), ttl = config.ttl, "sender socket ready");
        Ok(Self {
            socket,
            destination: config.destination(),
        })
    }

    /// Address datagrams are sent to.
    #[must_use]
    pub const fn destination(&self) -> SocketAddr { self.destination }

    /// Return the local address of the socket.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the operating system.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }
}

#[async_trait]
impl DatagramSink for MulticastSender {
    async fn send_datagram(&self, datagram: &[u8]) -> io::Result<usize> {
        self.socket.send_to(datagram, self.destination).await
    }
}

/// Inbound socket holding a group membership for its whole lifetime.
///
/// The membership is released when the receiver is dropped, on every exit
/// path of the receive loop.
#[derive(Debug)]
pub struct MulticastReceiver {
    socket: UdpSocket,
    membership: Option<(Ipv4Addr, Ipv4Addr)>,
}

impl MulticastReceiver {
    /// Bind the configured port and join the group when it is multicast.
    ///
    /// Address reuse is enabled so several listeners on one host can share
    /// the port. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if binding, configuring, or joining the
    /// group fails.
    pub fn bind(config: &TransportConfig) -> Result<Self, TransportError> {
        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port));
        let socket = new_udp_socket(addr)?;
        configure("SO_REUSEADDR", socket.set_reuse_address(true))?;
        #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
        configure("SO_REUSEPORT", socket.set_reuse_port(true))?;
        socket
            .bind(&addr.into())
            .map_err(|source| TransportError::Bind { addr, source })?;

        let membership = if config.is_multicast() {
            socket
                .join_multicast_v4(&config.group, &config.interface)
                .map_err(|source| TransportError::Join {
                    group: config.group,
                    interface: config.interface,
                    source,
                })?;
            debug!(group = %config.group, interface = %config.interface, "joined group");
            Some((config.group, config.interface))
        } else {
            None
        };

        // Dropping `socket` on the error path closes it and the membership.
        let socket = into_tokio(socket, addr)?;
        Ok(Self { socket, membership })
    }

    /// Return the local address of the socket.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the operating system.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    /// Group joined by this receiver, if any.
    #[must_use]
    pub fn group(&self) -> Option<Ipv4Addr> { self.membership.map(|(group, _)| group) }
}

#[async_trait]
impl DatagramSource for MulticastReceiver {
    async fn recv_datagram(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }
}

impl Drop for MulticastReceiver {
    fn drop(&mut self) {
        let Some((group, interface)) = self.membership.take() else {
            return;
        };
        match self.socket.leave_multicast_v4(group, interface) {
            Ok(()) => debug!(%group, "left group"),
            Err(err) => warn!(%group, error = %err, "failed to leave group"),
        }
    }
}
