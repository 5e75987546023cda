//! Bit-exact codec for the eight byte slice header.
//!
//! Layout (all integers unsigned, multi-byte fields big-endian):
//!
//! ```text
//! 0      1        2            3..5             5            6..8
//! flags  session  slice_count  max_slice_size   slice_index  payload_size
//! ```
//!
//! Decoding never validates semantic consistency such as
//! `slice_index < slice_count`; that is the reassembler's job.

use bytes::{Buf, BufMut};

use super::{HeaderError, SessionId};

/// Encoded size of a [`SliceHeader`] in bytes.
pub const HEADER_LEN: usize = 8;

/// START/END markers carried in the first header byte.
///
/// Reserved bits are dropped on decode and never emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SliceFlags(u8);

impl SliceFlags {
    /// Marks the first slice of a session.
    pub const START: Self = Self(0x80);
    /// Marks the slice whose byte range reaches the end of the frame.
    pub const END: Self = Self(0x40);
    /// Neither flag set.
    pub const NONE: Self = Self(0);

    const MASK: u8 = Self::START.0 | Self::END.0;

    /// Build flags from the two markers.
    #[must_use]
    pub const fn new(start: bool, end: bool) -> Self {
        let mut bits = 0;
        if start {
            bits |= Self::START.0;
        }
        if end {
            bits |= Self::END.0;
        }
        Self(bits)
    }

    /// Interpret a raw flags byte, ignoring reserved bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self { Self(bits & Self::MASK) }

    /// Return the wire representation.
    #[must_use]
    pub const fn bits(self) -> u8 { self.0 }

    /// Whether the START marker is set.
    #[must_use]
    pub const fn is_start(self) -> bool { self.0 & Self::START.0 != 0 }

    /// Whether the END marker is set.
    #[must_use]
    pub const fn is_end(self) -> bool { self.0 & Self::END.0 != 0 }
}

/// Metadata describing one slice of a frame.
///
/// # Examples
///
/// ```
/// use slicecast::fragment::{SessionId, SliceFlags, SliceHeader};
///
/// let header = SliceHeader::new(SliceFlags::START, SessionId::new(3), 3, 4, 0, 4);
/// let bytes = header.encode();
/// assert_eq!(bytes, [0x80, 3, 3, 0, 4, 0, 0, 4]);
/// assert_eq!(SliceHeader::decode(&bytes), Ok(header));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SliceHeader {
    flags: SliceFlags,
    session: SessionId,
    slice_count: u8,
    max_slice_size: u16,
    slice_index: u8,
    payload_size: u16,
}

impl SliceHeader {
    /// Create a header from already range-checked field values.
    #[must_use]
    pub const fn new(
        flags: SliceFlags,
        session: SessionId,
        slice_count: u8,
        max_slice_size: u16,
        slice_index: u8,
        payload_size: u16,
    ) -> Self {
        Self {
            flags,
            session,
            slice_count,
            max_slice_size,
            slice_index,
            payload_size,
        }
    }

    /// Create a header from machine-sized values, checking each field width.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::FieldOverflow`] when `slice_count` or
    /// `slice_index` exceed `255`, or when `max_slice_size` or `payload_size`
    /// exceed `65535`.
    pub fn from_parts(
        flags: SliceFlags,
        session: SessionId,
        slice_count: usize,
        max_slice_size: usize,
        slice_index: usize,
        payload_size: usize,
    ) -> Result<Self, HeaderError> {
        Ok(Self::new(
            flags,
            session,
            narrow("slice_count", slice_count)?,
            narrow("max_slice_size", max_slice_size)?,
            narrow("slice_index", slice_index)?,
            narrow("payload_size", payload_size)?,
        ))
    }

    /// Return the START/END markers.
    #[must_use]
    pub const fn flags(&self) -> SliceFlags { self.flags }

    /// Return the session this slice belongs to.
    #[must_use]
    pub const fn session(&self) -> SessionId { self.session }

    /// Return the number of slices in the session.
    #[must_use]
    pub const fn slice_count(&self) -> u8 { self.slice_count }

    /// Return the payload capacity used when the frame was sliced.
    #[must_use]
    pub const fn max_slice_size(&self) -> u16 { self.max_slice_size }

    /// Return the zero-based position of this slice.
    #[must_use]
    pub const fn slice_index(&self) -> u8 { self.slice_index }

    /// Return the number of content bytes following the header.
    #[must_use]
    pub const fn payload_size(&self) -> u16 { self.payload_size }

    /// Shorthand for `flags().is_start()`.
    #[must_use]
    pub const fn is_start(&self) -> bool { self.flags.is_start() }

    /// Shorthand for `flags().is_end()`.
    #[must_use]
    pub const fn is_end(&self) -> bool { self.flags.is_end() }

    /// Byte offset of this slice inside the reassembly buffer.
    #[must_use]
    pub fn offset(&self) -> usize {
        usize::from(self.slice_index) * usize::from(self.max_slice_size)
    }

    /// Append the encoded header to `dst`.
    pub fn encode_into<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.flags.bits());
        dst.put_u8(self.session.get());
        dst.put_u8(self.slice_count);
        dst.put_u16(self.max_slice_size);
        dst.put_u8(self.slice_index);
        dst.put_u16(self.payload_size);
    }

    /// Encode the header into its eight byte wire form.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0_u8; HEADER_LEN];
        self.encode_into(&mut &mut out[..]);
        out
    }

    /// Decode a header from the first eight bytes of `src`.
    ///
    /// Any eight bytes form a valid header; trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::Truncated`] when `src` is shorter than
    /// [`HEADER_LEN`].
    pub fn decode(src: &[u8]) -> Result<Self, HeaderError> {
        let Some(mut buf) = src.get(..HEADER_LEN) else {
            return Err(HeaderError::Truncated { len: src.len() });
        };
        Ok(Self {
            flags: SliceFlags::from_bits(buf.get_u8()),
            session: SessionId::new(buf.get_u8()),
            slice_count: buf.get_u8(),
            max_slice_size: buf.get_u16(),
            slice_index: buf.get_u8(),
            payload_size: buf.get_u16(),
        })
    }
}

fn narrow<T: TryFrom<usize>>(field: &'static str, value: usize) -> Result<T, HeaderError> {
    T::try_from(value).map_err(|_| HeaderError::FieldOverflow { field, value })
}
