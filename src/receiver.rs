//! Receive loop: read datagrams, reassemble, publish completed frames.
//!
//! Completed frames are fanned out on a [`broadcast`] channel. Consumers that
//! fall behind skip ahead to newer frames, which suits a "show the latest
//! image" display. The reassembly state itself stays owned by the loop.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::{
    select,
    sync::broadcast,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    config::{ConfigError, TransportConfig},
    fragment::{CompletedFrame, MAX_DATAGRAM_SIZE, Reassembler},
    transport::{DatagramSource, MulticastReceiver, TransportError},
};

/// Number of completed frames buffered for slow subscribers.
pub const FRAME_CHANNEL_CAPACITY: usize = 16;

/// Errors that end a [`FrameReceiver`].
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Setting up or reading from the socket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

enum Event {
    Shutdown,
    Expired,
    Datagram(std::io::Result<(usize, SocketAddr)>),
}

/// Drives a [`Reassembler`] from a datagram source.
#[derive(Debug)]
pub struct FrameReceiver<S = MulticastReceiver> {
    source: S,
    reassembler: Reassembler,
    frames: broadcast::Sender<CompletedFrame>,
    buf: Box<[u8]>,
}

impl FrameReceiver<MulticastReceiver> {
    /// Validate `config`, bind the port, and join the group.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError`] if the configuration is invalid or the socket
    /// cannot be set up.
    pub fn bind(config: &TransportConfig) -> Result<Self, ReceiverError> {
        config.validate()?;
        let source = MulticastReceiver::bind(config)?;
        Ok(Self::new(config, source))
    }
}

impl<S: DatagramSource> FrameReceiver<S> {
    /// Create a receiver reading from `source` with the session timeout from
    /// `config`.
    #[must_use]
    pub fn new(config: &TransportConfig, source: S) -> Self {
        let (frames, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        Self {
            source,
            reassembler: Reassembler::new(config.session_timeout),
            frames,
            buf: vec![0_u8; MAX_DATAGRAM_SIZE].into_boxed_slice(),
        }
    }

    /// Subscribe to completed frames.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CompletedFrame> { self.frames.subscribe() }

    /// Borrow the datagram source.
    #[must_use]
    pub const fn source(&self) -> &S { &self.source }

    /// Borrow the reassembly state.
    #[must_use]
    pub const fn reassembler(&self) -> &Reassembler { &self.reassembler }

    /// Receive and reassemble until `shutdown` is cancelled.
    ///
    /// While a session is in progress the loop also wakes at its inactivity
    /// deadline so the partial buffer is released even if the sender went
    /// quiet.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Receive`] when reading from the source
    /// fails. The loop does not retry.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), ReceiverError> {
        loop {
            let deadline = self.reassembler.deadline();
            let expiry = async move {
                match deadline {
                    Some(at) => sleep_until(Instant::from_std(at)).await,
                    None => std::future::pending().await,
                }
            };

            let event = select! {
                biased;
                () = shutdown.cancelled() => Event::Shutdown,
                () = expiry => Event::Expired,
                received = self.source.recv_datagram(&mut self.buf) => Event::Datagram(received),
            };

            match event {
                Event::Shutdown => {
                    debug!("receive loop stopped");
                    return Ok(());
                }
                Event::Expired => {
                    self.reassembler.purge_expired_at(Instant::now().into_std());
                }
                Event::Datagram(Ok((len, origin))) => self.handle_datagram(len, origin),
                Event::Datagram(Err(err)) => {
                    error!(error = %err, "receive failed");
                    return Err(TransportError::Receive(err).into());
                }
            }
        }
    }

    fn handle_datagram(&mut self, len: usize, origin: SocketAddr) {
        let Some(datagram) = self.buf.get(..len) else {
            return;
        };
        match self
            .reassembler
            .push_at(datagram, Some(origin), Instant::now().into_std())
        {
            Ok(Some(frame)) => {
                debug!(
                    session = %frame.session(),
                    bytes = frame.content_len(),
                    %origin,
                    "frame complete"
                );
                if self.frames.send(frame).is_err() {
                    debug!("no subscribers for completed frame");
                }
            }
            Ok(None) => {}
            Err(err) => debug!(%origin, error = %err, "dropping slice"),
        }
    }
}
