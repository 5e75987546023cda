//! Transport configuration shared by the sender and receiver.
//!
//! A [`TransportConfig`] is built once at startup and passed by reference to
//! the runtime constructors. Two presets mirror the historical deployments:
//! the default site-local group and a LAN preset.

use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    num::NonZeroU16,
    time::Duration,
};

use thiserror::Error;

use crate::fragment::MAX_SLICE_PAYLOAD;

/// Errors raised when a configuration cannot be used.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The slice capacity does not fit a single datagram with its header.
    #[error("max slice size {requested} exceeds the datagram limit of {limit} bytes")]
    SliceTooLarge { requested: u16, limit: u16 },
    /// The pacing interval is zero.
    #[error("frame interval must be non-zero")]
    ZeroInterval,
}

/// Settings for one multicast image channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    /// Destination group. Non-multicast addresses are sent to directly and
    /// receivers skip the group join.
    pub group: Ipv4Addr,
    /// UDP port shared by sender and receivers.
    pub port: u16,
    /// Local interface used for sending and joining the group.
    pub interface: Ipv4Addr,
    /// Multicast time-to-live; small values keep traffic on the local network.
    pub ttl: u32,
    /// Deliver sent datagrams to listeners on the sending host.
    pub multicast_loop: bool,
    /// Payload capacity of each slice.
    pub max_slice_size: NonZeroU16,
    /// Delay between transmitted frames.
    pub frame_interval: Duration,
    /// Inactivity window after which a partial frame is discarded.
    pub session_timeout: Option<Duration>,
}

/// Default multicast group.
pub const DEFAULT_GROUP: Ipv4Addr = Ipv4Addr::new(225, 4, 5, 6);
/// Default UDP port.
pub const DEFAULT_PORT: u16 = 4444;
/// Default multicast TTL.
pub const DEFAULT_TTL: u32 = 2;
/// Default delay between frames.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_secs(2);
/// Default inactivity window for partial frames.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(10);

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP,
            port: DEFAULT_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: DEFAULT_TTL,
            multicast_loop: true,
            max_slice_size: NonZeroU16::new(MAX_SLICE_PAYLOAD).unwrap_or(NonZeroU16::MAX),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            session_timeout: Some(DEFAULT_SESSION_TIMEOUT),
        }
    }
}

impl TransportConfig {
    /// Preset for the LAN deployment on `192.168.0.9:8000`.
    ///
    /// # Examples
    ///
    /// ```
    /// use slicecast::config::TransportConfig;
    ///
    /// let config = TransportConfig::lan_preset();
    /// assert_eq!(config.destination().to_string(), "192.168.0.9:8000");
    /// ```
    #[must_use]
    pub fn lan_preset() -> Self {
        Self {
            group: Ipv4Addr::new(192, 168, 0, 9),
            port: 8000,
            ..Self::default()
        }
    }

    /// Set the destination group.
    #[must_use]
    pub fn group(mut self, group: Ipv4Addr) -> Self {
        self.group = group;
        self
    }

    /// Set the UDP port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the local interface.
    #[must_use]
    pub fn interface(mut self, interface: Ipv4Addr) -> Self {
        self.interface = interface;
        self
    }

    /// Set the multicast time-to-live.
    #[must_use]
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set whether sent datagrams loop back to local listeners.
    #[must_use]
    pub fn multicast_loop(mut self, enabled: bool) -> Self {
        self.multicast_loop = enabled;
        self
    }

    /// Set the payload capacity of each slice.
    #[must_use]
    pub fn max_slice_size(mut self, size: NonZeroU16) -> Self {
        self.max_slice_size = size;
        self
    }

    /// Set the delay between transmitted frames.
    #[must_use]
    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Set the inactivity window for partial frames; `None` disables expiry.
    #[must_use]
    pub fn session_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Address datagrams are sent to.
    #[must_use]
    pub fn destination(&self) -> SocketAddr { SocketAddrV4::new(self.group, self.port).into() }

    /// Whether the destination is a multicast group that receivers must join.
    #[must_use]
    pub fn is_multicast(&self) -> bool { self.group.is_multicast() }

    /// Check the configuration for values the transport cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SliceTooLarge`] when the slice capacity plus the
    /// header exceeds a single datagram, and [`ConfigError::ZeroInterval`]
    /// when the pacing interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_slice_size.get() > MAX_SLICE_PAYLOAD {
            return Err(ConfigError::SliceTooLarge {
                requested: self.max_slice_size.get(),
                limit: MAX_SLICE_PAYLOAD,
            });
        }
        if self.frame_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}
