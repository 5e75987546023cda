//! Outbound helper that splits frames into header-tagged slice datagrams.
//!
//! [`Fragmenter`] owns the session counter. Each call to
//! [`Fragmenter::fragment`] consumes one session number and hands back a lazy
//! [`Slices`] iterator that encodes one datagram per step, so large frames are
//! never copied into an intermediate batch.

use std::{iter::FusedIterator, num::NonZeroU16};

use bytes::{BufMut, Bytes, BytesMut};

use super::{FragmentationError, HEADER_LEN, SessionId, SliceFlags, SliceHeader};

/// Largest number of slices a session can declare.
pub const MAX_SLICE_COUNT: usize = u8::MAX as usize;

/// Largest UDP payload a single IPv4 datagram can carry.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Largest slice payload that still fits a single datagram with its header.
pub const MAX_SLICE_PAYLOAD: u16 = 65_499;

const _: () = assert!(MAX_SLICE_PAYLOAD as usize + HEADER_LEN == MAX_DATAGRAM_SIZE);

/// Number of slices needed to carry `len` bytes at `max_slice_size` bytes each.
///
/// An empty frame still occupies one (empty) slice.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroU16;
///
/// use slicecast::fragment::slice_count_for;
/// let four = NonZeroU16::new(4).expect("non-zero");
/// assert_eq!(slice_count_for(10, four), 3);
/// assert_eq!(slice_count_for(8, four), 2);
/// assert_eq!(slice_count_for(0, four), 1);
/// ```
#[must_use]
pub fn slice_count_for(len: usize, max_slice_size: NonZeroU16) -> usize {
    len.div_ceil(usize::from(max_slice_size.get())).max(1)
}

/// Splits frames into slice datagrams and tracks session numbers.
#[derive(Debug)]
pub struct Fragmenter {
    max_slice_size: NonZeroU16,
    next_session: SessionId,
}

impl Fragmenter {
    /// Create a fragmenter starting at session `0`.
    #[must_use]
    pub const fn new(max_slice_size: NonZeroU16) -> Self {
        Self::with_starting_session(max_slice_size, SessionId::new(0))
    }

    /// Create a fragmenter whose first frame uses session `start_at`.
    #[must_use]
    pub const fn with_starting_session(max_slice_size: NonZeroU16, start_at: SessionId) -> Self {
        Self {
            max_slice_size,
            next_session: start_at,
        }
    }

    /// Return the payload capacity of each slice.
    #[must_use]
    pub const fn max_slice_size(&self) -> NonZeroU16 { self.max_slice_size }

    /// Return the session number the next frame will use.
    #[must_use]
    pub const fn next_session(&self) -> SessionId { self.next_session }

    /// Slice `frame` into datagrams for a fresh session.
    ///
    /// The session counter advances once the iterator is handed out, whether
    /// or not every datagram ends up being sent. Rejected frames leave the
    /// counter untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroU16;
    ///
    /// use slicecast::fragment::{Fragmenter, SessionId};
    ///
    /// let mut fragmenter = Fragmenter::new(NonZeroU16::new(4).expect("non-zero"));
    /// let frame: Vec<u8> = (0..10).collect();
    /// let slices = fragmenter.fragment(&frame).expect("frame fits");
    /// assert_eq!(slices.len(), 3);
    /// assert_eq!(fragmenter.next_session(), SessionId::new(1));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::OversizedFrame`] when the frame needs
    /// more than [`MAX_SLICE_COUNT`] slices.
    pub fn fragment<'a>(&mut self, frame: &'a [u8]) -> Result<Slices<'a>, FragmentationError> {
        let slices = slice_count_for(frame.len(), self.max_slice_size);
        let Ok(slice_count) = u8::try_from(slices) else {
            return Err(FragmentationError::OversizedFrame {
                len: frame.len(),
                slices,
                max_slice_size: self.max_slice_size.get(),
            });
        };

        let session = self.next_session;
        self.next_session = session.next();
        Ok(Slices {
            frame,
            session,
            slice_count,
            max_slice_size: self.max_slice_size.get(),
            next_index: 0,
        })
    }
}

/// Lazy sequence of encoded slice datagrams for one session.
///
/// Each item is a complete datagram: header followed by payload. The sequence
/// is finite and cannot be restarted.
#[derive(Clone, Debug)]
pub struct Slices<'a> {
    frame: &'a [u8],
    session: SessionId,
    slice_count: u8,
    max_slice_size: u16,
    next_index: usize,
}

impl Slices<'_> {
    /// Session number stamped on every datagram.
    #[must_use]
    pub const fn session(&self) -> SessionId { self.session }

    /// Total number of slices in the session.
    #[must_use]
    pub const fn slice_count(&self) -> u8 { self.slice_count }

    fn header_for(&self, index: usize, payload_size: usize) -> SliceHeader {
        let max = usize::from(self.max_slice_size);
        let flags = SliceFlags::new(index == 0, (index + 1) * max >= self.frame.len());
        #[expect(
            clippy::cast_possible_truncation,
            reason = "index < slice_count <= 255 and payload_size <= max_slice_size"
        )]
        let (slice_index, payload_size) = (index as u8, payload_size as u16);
        SliceHeader::new(
            flags,
            self.session,
            self.slice_count,
            self.max_slice_size,
            slice_index,
            payload_size,
        )
    }
}

impl Iterator for Slices<'_> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next_index;
        if index >= usize::from(self.slice_count) {
            return None;
        }
        self.next_index += 1;

        let max = usize::from(self.max_slice_size);
        let start = (index * max).min(self.frame.len());
        let end = ((index + 1) * max).min(self.frame.len());
        let payload = self.frame.get(start..end).unwrap_or_default();

        let mut datagram = BytesMut::with_capacity(HEADER_LEN + payload.len());
        self.header_for(index, payload.len())
            .encode_into(&mut datagram);
        datagram.put_slice(payload);
        Some(datagram.freeze())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::from(self.slice_count).saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Slices<'_> {}

impl FusedIterator for Slices<'_> {}
