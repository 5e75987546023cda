//! Error types emitted by the slicing layer.
//!
//! Outbound and inbound failures are kept apart: the fragmenter only ever
//! refuses frames that do not fit the header, while the reassembler reports
//! datagrams it had to drop so callers can count them.

use thiserror::Error;

use super::SessionId;

/// Errors produced while encoding or decoding a slice header.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// Fewer than [`HEADER_LEN`](super::HEADER_LEN) bytes were supplied.
    #[error("slice header truncated: {len} of 8 bytes present")]
    Truncated { len: usize },
    /// A value does not fit the width of its header field.
    #[error("{field} value {value} does not fit its header field")]
    FieldOverflow { field: &'static str, value: usize },
}

/// Errors produced while slicing outbound frames.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The frame needs more slices than the one-byte count field can carry.
    #[error(
        "frame of {len} bytes needs {slices} slices of {max_slice_size} bytes; at most 255 are \
         allowed"
    )]
    OversizedFrame {
        len: usize,
        slices: usize,
        max_slice_size: u16,
    },
}

/// Reasons an inbound datagram was rejected without touching reassembly state.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MalformedSlice {
    /// The datagram is shorter than a header.
    #[error("datagram of {len} bytes is shorter than the slice header")]
    TruncatedHeader { len: usize },
    /// The datagram carries fewer payload bytes than the header declares.
    #[error("slice declares {declared} payload bytes but only {available} arrived")]
    TruncatedPayload { declared: usize, available: usize },
    /// The header declares a session without slices.
    #[error("slice count is zero")]
    ZeroSliceCount,
    /// The header declares a zero slice capacity.
    #[error("maximum slice size is zero")]
    ZeroSliceSize,
    /// The slice index lies outside the declared slice count.
    #[error("slice index {index} out of range for {count} slices")]
    IndexOutOfRange { index: u8, count: u8 },
    /// The payload is larger than the declared slice capacity.
    #[error("payload of {payload} bytes exceeds slice capacity {max}")]
    PayloadTooLarge { payload: u16, max: u16 },
    /// A START flag appeared on a slice other than the first.
    #[error("START flag set on slice {index}")]
    MisplacedStart { index: u8 },
    /// The slice disagrees with the geometry announced by its session's START.
    #[error(
        "session {session} geometry mismatch: expected {expected_count}x{expected_size}, found \
         {found_count}x{found_size}"
    )]
    GeometryMismatch {
        session: SessionId,
        expected_count: u8,
        expected_size: u16,
        found_count: u8,
        found_size: u16,
    },
}

impl MalformedSlice {
    /// Short label describing the rejection, suitable for metric labels.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::TruncatedHeader { .. } | Self::TruncatedPayload { .. } => "truncated",
            Self::ZeroSliceCount | Self::ZeroSliceSize => "empty_geometry",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::MisplacedStart { .. } => "misplaced_start",
            Self::GeometryMismatch { .. } => "geometry_mismatch",
        }
    }
}

/// Errors produced by [`Reassembler`](crate::fragment::Reassembler).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The datagram was malformed and has been dropped.
    #[error("malformed slice: {0}")]
    Malformed(#[from] MalformedSlice),
}
