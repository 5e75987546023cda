//! Borrowed view of one inbound slice datagram.

use super::{HEADER_LEN, MalformedSlice, SliceHeader};

/// Header and payload of a received datagram.
///
/// The payload borrows from the receive buffer; nothing is copied until the
/// reassembler accepts the slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slice<'a> {
    header: SliceHeader,
    payload: &'a [u8],
}

impl<'a> Slice<'a> {
    /// Split `datagram` into header and declared payload.
    ///
    /// Bytes beyond the declared payload size are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSlice::TruncatedHeader`] or
    /// [`MalformedSlice::TruncatedPayload`] when the datagram is too short.
    pub fn parse(datagram: &'a [u8]) -> Result<Self, MalformedSlice> {
        let header = SliceHeader::decode(datagram).map_err(|_| MalformedSlice::TruncatedHeader {
            len: datagram.len(),
        })?;
        let declared = usize::from(header.payload_size());
        let body = datagram.get(HEADER_LEN..).unwrap_or_default();
        let Some(payload) = body.get(..declared) else {
            return Err(MalformedSlice::TruncatedPayload {
                declared,
                available: body.len(),
            });
        };
        Ok(Self { header, payload })
    }

    /// Check the header for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`MalformedSlice`] rule the header violates.
    pub fn validate(&self) -> Result<(), MalformedSlice> {
        let header = &self.header;
        if header.slice_count() == 0 {
            return Err(MalformedSlice::ZeroSliceCount);
        }
        if header.max_slice_size() == 0 {
            return Err(MalformedSlice::ZeroSliceSize);
        }
        if header.slice_index() >= header.slice_count() {
            return Err(MalformedSlice::IndexOutOfRange {
                index: header.slice_index(),
                count: header.slice_count(),
            });
        }
        if header.payload_size() > header.max_slice_size() {
            return Err(MalformedSlice::PayloadTooLarge {
                payload: header.payload_size(),
                max: header.max_slice_size(),
            });
        }
        if header.is_start() && header.slice_index() != 0 {
            return Err(MalformedSlice::MisplacedStart {
                index: header.slice_index(),
            });
        }
        Ok(())
    }

    /// Return the decoded header.
    #[must_use]
    pub const fn header(&self) -> &SliceHeader { &self.header }

    /// Return the payload bytes declared by the header.
    #[must_use]
    pub const fn payload(&self) -> &'a [u8] { self.payload }
}
