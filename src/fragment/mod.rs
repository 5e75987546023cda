//! Frame slicing and reassembly for the multicast transport.
//!
//! This module collects the protocol core: the eight byte header codec, the
//! outbound [`Fragmenter`], and the inbound [`Reassembler`]. None of it touches
//! sockets, so codecs and tests can drive it directly.

pub mod error;
pub mod fragmenter;
pub mod header;
pub mod reassembler;
pub mod session;
pub mod slice;

pub use error::{FragmentationError, HeaderError, MalformedSlice, ReassemblyError};
pub use fragmenter::{
    Fragmenter,
    MAX_DATAGRAM_SIZE,
    MAX_SLICE_COUNT,
    MAX_SLICE_PAYLOAD,
    Slices,
    slice_count_for,
};
pub use header::{HEADER_LEN, SliceFlags, SliceHeader};
pub use reassembler::{CompletedFrame, Reassembler};
pub use session::SessionId;
pub use slice::Slice;

#[cfg(test)]
mod tests;
