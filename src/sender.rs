//! Paced send loop: obtain a frame, slice it, send every slice, wait.
//!
//! Sending is best effort. A failed datagram is logged and counted, and the
//! remaining slices of the session are still attempted. Frames that need more
//! than 255 slices are skipped without sending anything.

use std::time::Duration;

use thiserror::Error;
use tokio::{
    select,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::{ConfigError, TransportConfig},
    fragment::{FragmentationError, Fragmenter, SessionId},
    metrics,
    source::FrameSource,
    transport::{DatagramSink, MulticastSender, TransportError},
};

/// Errors raised while constructing a [`FrameSender`].
#[derive(Debug, Error)]
pub enum SenderError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The outbound socket could not be set up.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Outcome of transmitting one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendReport {
    /// Session number the frame was sent under.
    pub session: SessionId,
    /// Number of slices attempted.
    pub slices: usize,
    /// Number of slices whose send failed.
    pub failed: usize,
}

/// Drives a [`Fragmenter`] against a datagram sink.
#[derive(Debug)]
pub struct FrameSender<S = MulticastSender> {
    fragmenter: Fragmenter,
    sink: S,
    frame_interval: Duration,
}

impl FrameSender<MulticastSender> {
    /// Validate `config` and bind a multicast sender socket.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SenderError`] if the configuration is invalid or the socket
    /// cannot be set up.
    pub fn bind(config: &TransportConfig) -> Result<Self, SenderError> {
        config.validate()?;
        let sink = MulticastSender::bind(config)?;
        Self::new(config, sink)
    }
}

impl<S: DatagramSink> FrameSender<S> {
    /// Create a sender writing to `sink` with the slice size and pacing from
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SenderError::Config`] if `config` fails validation.
    pub fn new(config: &TransportConfig, sink: S) -> Result<Self, SenderError> {
        config.validate()?;
        Self::with_fragmenter(Fragmenter::new(config.max_slice_size), sink, config.frame_interval)
    }

    /// Create a sender around an existing fragmenter.
    ///
    /// # Errors
    ///
    /// Returns [`SenderError::Config`] if `frame_interval` is zero.
    pub fn with_fragmenter(
        fragmenter: Fragmenter,
        sink: S,
        frame_interval: Duration,
    ) -> Result<Self, SenderError> {
        if frame_interval.is_zero() {
            return Err(ConfigError::ZeroInterval.into());
        }
        Ok(Self {
            fragmenter,
            sink,
            frame_interval,
        })
    }

    /// Borrow the underlying sink.
    #[must_use]
    pub const fn sink(&self) -> &S { &self.sink }

    /// Session number the next frame will use.
    #[must_use]
    pub const fn next_session(&self) -> SessionId { self.fragmenter.next_session() }

    /// Slice `frame` and send every slice once.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::OversizedFrame`] when the frame needs more
    /// than 255 slices. No datagram is sent in that case.
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<SendReport, FragmentationError> {
        let slices = self.fragmenter.fragment(frame)?;
        let session = slices.session();
        let total = slices.len();
        let mut failed = 0;

        for (index, datagram) in slices.enumerate() {
            match self.sink.send_datagram(&datagram).await {
                Ok(_) => metrics::inc_slices(metrics::Direction::Outbound),
                Err(err) => {
                    failed += 1;
                    metrics::inc_send_failures();
                    warn!(%session, slice = index, error = %err, "slice send failed");
                }
            }
        }

        metrics::inc_frames(metrics::Direction::Outbound);
        debug!(%session, slices = total, failed, bytes = frame.len(), "frame sent");
        Ok(SendReport {
            session,
            slices: total,
            failed,
        })
    }

    /// Send one frame from `source` per interval until `shutdown` is cancelled.
    ///
    /// Source failures and oversized frames skip the current cycle.
    pub async fn run<F>(&mut self, source: &mut F, shutdown: CancellationToken)
    where
        F: FrameSource + ?Sized,
    {
        let mut ticker = interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let frame = select! {
                biased;
                () = shutdown.cancelled() => break,
                frame = source.next_frame() => frame,
            };
            let frame = match frame {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(error = %err, "no frame available this cycle");
                    continue;
                }
            };

            if let Err(err) = self.send_frame(&frame).await {
                metrics::inc_skipped();
                warn!(error = %err, "skipping frame");
            }
        }
        debug!("send loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        num::NonZeroU16,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;
    use bytes::Bytes;
    use rstest::{fixture, rstest};
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        fragment::{Reassembler, SliceHeader},
        source::StaticFrameSource,
        transport::MockDatagramSink,
    };

    #[derive(Clone, Debug, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<Bytes>>>,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<Bytes> { self.sent.lock().expect("sink lock").clone() }
    }

    #[async_trait]
    impl DatagramSink for RecordingSink {
        async fn send_datagram(&self, datagram: &[u8]) -> io::Result<usize> {
            self.sent
                .lock()
                .expect("sink lock")
                .push(Bytes::copy_from_slice(datagram));
            Ok(datagram.len())
        }
    }

    #[fixture]
    fn config() -> TransportConfig {
        TransportConfig {
            max_slice_size: NonZeroU16::new(4).expect("non-zero"),
            frame_interval: Duration::from_millis(100),
            ..TransportConfig::default()
        }
    }

    #[rstest]
    #[tokio::test]
    async fn send_frame_emits_every_slice(config: TransportConfig) {
        let sink = RecordingSink::default();
        let mut sender = FrameSender::new(&config, sink.clone()).expect("valid config");
        let frame: Vec<u8> = (0..10).collect();

        let report = sender.send_frame(&frame).await.expect("frame fits");
        assert_eq!(
            report,
            SendReport {
                session: SessionId::new(0),
                slices: 3,
                failed: 0,
            }
        );
        assert_eq!(sender.next_session(), SessionId::new(1));

        let mut reassembler = Reassembler::new(None);
        let mut completed = None;
        for datagram in sink.sent() {
            completed = reassembler.push(&datagram).expect("well-formed");
        }
        let completed = completed.expect("frame complete");
        assert_eq!(completed.content(), frame);
    }

    #[rstest]
    fn zero_interval_is_rejected(config: TransportConfig) {
        let zero = config.frame_interval(Duration::ZERO);
        assert!(matches!(
            FrameSender::new(&zero, RecordingSink::default()),
            Err(SenderError::Config(ConfigError::ZeroInterval))
        ));
        assert!(matches!(
            FrameSender::with_fragmenter(
                Fragmenter::new(NonZeroU16::new(4).expect("non-zero")),
                RecordingSink::default(),
                Duration::ZERO,
            ),
            Err(SenderError::Config(ConfigError::ZeroInterval))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn oversized_frame_sends_nothing(config: TransportConfig) {
        let sink = RecordingSink::default();
        let mut sender = FrameSender::new(&config, sink.clone()).expect("valid config");
        let frame = vec![0_u8; 4 * 256];

        let err = sender
            .send_frame(&frame)
            .await
            .expect_err("frame must be rejected");
        assert!(matches!(
            err,
            FragmentationError::OversizedFrame { slices: 256, .. }
        ));
        assert!(sink.sent().is_empty());
        assert_eq!(sender.next_session(), SessionId::new(0));
    }

    #[rstest]
    #[traced_test]
    #[tokio::test]
    async fn send_failures_do_not_abort_session(config: TransportConfig) {
        let mut sink = MockDatagramSink::new();
        let mut calls = 0;
        sink.expect_send_datagram().times(3).returning(move |datagram| {
            calls += 1;
            if calls == 2 {
                Err(io::Error::new(io::ErrorKind::NetworkUnreachable, "down"))
            } else {
                Ok(datagram.len())
            }
        });
        let mut sender = FrameSender::new(&config, sink).expect("valid config");

        let report = sender
            .send_frame(&[7_u8; 10])
            .await
            .expect("frame fits");
        assert_eq!(report.slices, 3);
        assert_eq!(report.failed, 1);
        assert!(logs_contain("slice send failed"));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn run_paces_frames_and_stops_on_cancel(config: TransportConfig) {
        let sink = RecordingSink::default();
        let mut sender = FrameSender::new(&config, sink.clone()).expect("valid config");
        let mut source = StaticFrameSource::new(vec![1_u8; 6]);
        let shutdown = CancellationToken::new();

        // Three ticks: t = 0, 100 ms, 200 ms.
        let stop = shutdown.clone();
        tokio::join!(sender.run(&mut source, shutdown.clone()), async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            stop.cancel();
        });

        let sent = sink.sent();
        assert_eq!(sent.len(), 6, "three frames of two slices each");
        let sessions: Vec<u8> = sent
            .iter()
            .map(|datagram| {
                SliceHeader::decode(datagram)
                    .expect("header present")
                    .session()
                    .get()
            })
            .collect();
        assert_eq!(sessions, [0, 0, 1, 1, 2, 2]);
        assert_eq!(sender.next_session(), SessionId::new(3));
    }

    #[rstest]
    #[traced_test]
    #[tokio::test(start_paused = true)]
    async fn run_skips_oversized_frames(config: TransportConfig) {
        let sink = RecordingSink::default();
        let mut sender = FrameSender::new(&config, sink.clone()).expect("valid config");
        let mut source = StaticFrameSource::new(vec![0_u8; 4 * 300]);
        let shutdown = CancellationToken::new();

        let stop = shutdown.clone();
        tokio::join!(sender.run(&mut source, shutdown.clone()), async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            stop.cancel();
        });

        assert!(sink.sent().is_empty());
        assert!(logs_contain("skipping frame"));
    }
}
