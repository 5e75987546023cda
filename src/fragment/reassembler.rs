//! Inbound state machine that rebuilds frames from slice datagrams.
//!
//! [`Reassembler`] mirrors the outbound [`Fragmenter`](crate::fragment::Fragmenter).
//! It tracks at most one in-progress session: a START slice for any other
//! session discards the partial frame and begins collecting the new one, which
//! is how a reassembly stalled by packet loss recovers. Every header carries
//! the session geometry, so whichever slice arrives first opens the session;
//! the START slice need not lead. Duplicates are ignored. An optional
//! inactivity timeout frees the buffer of a session that stops receiving
//! slices.

use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use bytes::{Bytes, BytesMut};
use log::debug;

use super::{MalformedSlice, ReassemblyError, SessionId, Slice, SliceHeader};
use crate::metrics;

/// Pushes without an origin match any sender.
fn same_sender(ours: Option<SocketAddr>, theirs: Option<SocketAddr>) -> bool {
    match (ours, theirs) {
        (Some(ours), Some(theirs)) => ours == theirs,
        _ => true,
    }
}

#[derive(Debug)]
struct PartialFrame {
    session: SessionId,
    origin: Option<SocketAddr>,
    slice_count: u8,
    max_slice_size: u16,
    buffer: BytesMut,
    received: Vec<bool>,
    received_count: usize,
    content_len: Option<usize>,
    last_activity: Instant,
}

impl PartialFrame {
    fn open(header: &SliceHeader, origin: Option<SocketAddr>, now: Instant) -> Self {
        let slices = usize::from(header.slice_count());
        let capacity = slices * usize::from(header.max_slice_size());
        Self {
            session: header.session(),
            origin,
            slice_count: header.slice_count(),
            max_slice_size: header.max_slice_size(),
            buffer: BytesMut::zeroed(capacity),
            received: vec![false; slices],
            received_count: 0,
            content_len: None,
            last_activity: now,
        }
    }

    /// Whether a slice from `origin` tagged `session` belongs to this frame.
    fn owns(&self, session: SessionId, origin: Option<SocketAddr>) -> bool {
        self.session == session && same_sender(self.origin, origin)
    }

    fn check_geometry(&self, header: &SliceHeader) -> Result<(), MalformedSlice> {
        if header.slice_count() == self.slice_count && header.max_slice_size() == self.max_slice_size
        {
            return Ok(());
        }
        Err(MalformedSlice::GeometryMismatch {
            session: self.session,
            expected_count: self.slice_count,
            expected_size: self.max_slice_size,
            found_count: header.slice_count(),
            found_size: header.max_slice_size(),
        })
    }

    /// Copy the slice into place, returning `false` for duplicates.
    fn store(&mut self, slice: &Slice<'_>, now: Instant) -> bool {
        let header = slice.header();
        let index = usize::from(header.slice_index());
        let Some(seen) = self.received.get_mut(index) else {
            return false;
        };
        if *seen {
            return false;
        }

        let offset = header.offset();
        let payload = slice.payload();
        let Some(target) = self.buffer.get_mut(offset..offset + payload.len()) else {
            return false;
        };
        target.copy_from_slice(payload);
        *seen = true;
        self.received_count += 1;
        self.last_activity = now;
        if header.is_end() {
            self.content_len = Some(offset + payload.len());
        }
        true
    }

    fn is_complete(&self) -> bool { self.received_count == usize::from(self.slice_count) }

    fn into_frame(self) -> CompletedFrame {
        let content_len = self.content_len.unwrap_or(self.buffer.len());
        CompletedFrame::new(self.session, self.buffer.freeze(), content_len)
    }
}

/// A frame whose every slice has been received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedFrame {
    session: SessionId,
    payload: Bytes,
    content_len: usize,
}

impl CompletedFrame {
    /// Construct a completed frame from its reassembly buffer.
    ///
    /// `content_len` is clamped to the buffer length.
    #[must_use]
    pub fn new(session: SessionId, payload: Bytes, content_len: usize) -> Self {
        let content_len = content_len.min(payload.len());
        Self {
            session,
            payload,
            content_len,
        }
    }

    /// Session the frame was transmitted in.
    #[must_use]
    pub const fn session(&self) -> SessionId { self.session }

    /// The full reassembly buffer, `slice_count * max_slice_size` bytes long.
    ///
    /// Bytes past the end of the original content are zero.
    #[must_use]
    pub fn payload(&self) -> &Bytes { &self.payload }

    /// The buffer up to the end of the END-flagged slice.
    #[must_use]
    pub fn content(&self) -> Bytes { self.payload.slice(..self.content_len) }

    /// Length of [`CompletedFrame::content`].
    #[must_use]
    pub const fn content_len(&self) -> usize { self.content_len }

    /// Consume the frame, returning the padded buffer.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }
}

/// Single-session reassembly state machine.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroU16;
///
/// use slicecast::fragment::{Fragmenter, Reassembler};
///
/// let mut fragmenter = Fragmenter::new(NonZeroU16::new(4).expect("non-zero"));
/// let mut reassembler = Reassembler::new(None);
/// let frame: Vec<u8> = (0..10).collect();
///
/// let mut completed = None;
/// for datagram in fragmenter.fragment(&frame).expect("frame fits") {
///     completed = reassembler.push(&datagram).expect("well-formed slice");
/// }
/// let completed = completed.expect("frame complete");
/// assert_eq!(completed.payload().len(), 12);
/// assert_eq!(completed.content(), frame);
/// ```
#[derive(Debug)]
pub struct Reassembler {
    timeout: Option<Duration>,
    active: Option<PartialFrame>,
    completed: Option<(SessionId, Option<SocketAddr>)>,
}

impl Reassembler {
    /// Create an idle reassembler.
    ///
    /// With `timeout` set, a session that accepts no new slice for that long
    /// is discarded. `None` keeps partial sessions until superseded.
    #[must_use]
    pub const fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            active: None,
            completed: None,
        }
    }

    /// Return the configured inactivity timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> { self.timeout }

    /// Process a datagram of unknown origin using the current time.
    ///
    /// Returns `Ok(Some(_))` when the datagram completes the active session
    /// and `Ok(None)` when more slices are needed or the datagram was ignored
    /// (duplicate, stray, or a late copy of the frame just completed).
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::Malformed`] for datagrams that violate the
    /// header rules. Reassembly state is left unchanged.
    pub fn push(&mut self, datagram: &[u8]) -> Result<Option<CompletedFrame>, ReassemblyError> {
        self.push_at(datagram, None, Instant::now())
    }

    /// Process a datagram received from `origin` using the current time.
    ///
    /// Once a session has started, only slices from the same origin are
    /// attached to it.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::Malformed`] for datagrams that violate the
    /// header rules.
    pub fn push_from(
        &mut self,
        datagram: &[u8],
        origin: SocketAddr,
    ) -> Result<Option<CompletedFrame>, ReassemblyError> {
        self.push_at(datagram, Some(origin), Instant::now())
    }

    /// Process a datagram using an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::Malformed`] for datagrams that violate the
    /// header rules.
    pub fn push_at(
        &mut self,
        datagram: &[u8],
        origin: Option<SocketAddr>,
        now: Instant,
    ) -> Result<Option<CompletedFrame>, ReassemblyError> {
        self.purge_expired_at(now);

        let slice = Slice::parse(datagram).and_then(|slice| {
            slice.validate()?;
            Ok(slice)
        });
        let slice = slice.inspect_err(|err| metrics::inc_dropped(err.reason()))?;
        self.accept(&slice, origin, now)
    }

    fn accept(
        &mut self,
        slice: &Slice<'_>,
        origin: Option<SocketAddr>,
        now: Instant,
    ) -> Result<Option<CompletedFrame>, ReassemblyError> {
        let header = slice.header();

        if self.active.is_none() && self.just_completed(header.session(), origin) {
            debug!(
                "ignoring late slice {} of completed session {}",
                header.slice_index(),
                header.session()
            );
            metrics::inc_dropped("completed");
            return Ok(None);
        }

        let continues_active = self
            .active
            .as_ref()
            .is_some_and(|partial| partial.owns(header.session(), origin));
        if !continues_active && (header.is_start() || self.active.is_none()) {
            if let Some(stale) = self.active.take() {
                debug!(
                    "session {} superseded by {} after {}/{} slices",
                    stale.session,
                    header.session(),
                    stale.received_count,
                    stale.slice_count
                );
                metrics::inc_superseded();
            }
            self.begin(header, origin, now);
        }

        let Some(partial) = self.active.as_mut() else {
            return Ok(None);
        };
        if !partial.owns(header.session(), origin) {
            debug!(
                "ignoring stray slice {} of session {} while collecting {}",
                header.slice_index(),
                header.session(),
                partial.session
            );
            metrics::inc_dropped("stray");
            return Ok(None);
        }
        if let Err(err) = partial.check_geometry(header) {
            metrics::inc_dropped(err.reason());
            return Err(err.into());
        }
        if !partial.store(slice, now) {
            metrics::inc_dropped("duplicate");
            return Ok(None);
        }
        metrics::inc_slices(metrics::Direction::Inbound);

        if !partial.is_complete() {
            return Ok(None);
        }
        let frame = self.active.take().map(|partial| {
            self.completed = Some((partial.session, partial.origin));
            partial.into_frame()
        });
        if frame.is_some() {
            metrics::inc_frames(metrics::Direction::Inbound);
        }
        Ok(frame)
    }

    fn begin(&mut self, header: &SliceHeader, origin: Option<SocketAddr>, now: Instant) {
        self.completed = None;
        self.active = Some(PartialFrame::open(header, origin, now));
    }

    /// Whether a slice repeats the session that completed last.
    fn just_completed(&self, session: SessionId, origin: Option<SocketAddr>) -> bool {
        self.completed
            .is_some_and(|(done, from)| done == session && same_sender(from, origin))
    }

    /// Discard the active session if it exceeded the inactivity timeout.
    ///
    /// Returns the evicted session number.
    pub fn purge_expired(&mut self) -> Option<SessionId> { self.purge_expired_at(Instant::now()) }

    /// Discard the active session if it exceeded the inactivity timeout at
    /// `now`.
    ///
    /// Returns the evicted session number.
    pub fn purge_expired_at(&mut self, now: Instant) -> Option<SessionId> {
        let timeout = self.timeout?;
        let expired = self
            .active
            .as_ref()
            .is_some_and(|partial| now.saturating_duration_since(partial.last_activity) >= timeout);
        if !expired {
            return None;
        }
        let stale = self.active.take()?;
        debug!(
            "session {} expired after {}/{} slices",
            stale.session, stale.received_count, stale.slice_count
        );
        metrics::inc_expired();
        Some(stale.session)
    }

    /// Instant at which the active session will expire, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        let timeout = self.timeout?;
        self.active
            .as_ref()
            .map(|partial| partial.last_activity + timeout)
    }

    /// Whether a session is currently being collected.
    #[must_use]
    pub fn is_collecting(&self) -> bool { self.active.is_some() }

    /// Session number being collected, if any.
    #[must_use]
    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|partial| partial.session)
    }

    /// Number of distinct slices stored for the active session.
    #[must_use]
    pub fn received_count(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |partial| partial.received_count)
    }

    /// Borrow the reassembly buffer of the active session.
    #[must_use]
    pub fn pending_bytes(&self) -> Option<&[u8]> {
        self.active.as_ref().map(|partial| &partial.buffer[..])
    }
}
