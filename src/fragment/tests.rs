//! Unit tests for frame slicing and reassembly.
//!
//! Tests are split into focused submodules to keep each file short and easy
//! to navigate.

mod fragmenter_tests;

use std::num::NonZeroU16;

use bytes::{BufMut, BytesMut};

use super::{SessionId, SliceFlags, SliceHeader};

fn slice_size(size: u16) -> NonZeroU16 { NonZeroU16::new(size).expect("non-zero slice size") }

/// Encode a datagram by hand, bypassing the fragmenter.
fn datagram(
    flags: SliceFlags,
    session: u8,
    slice_count: u8,
    max_slice_size: u16,
    slice_index: u8,
    payload: &[u8],
) -> Vec<u8> {
    let header = SliceHeader::new(
        flags,
        SessionId::new(session),
        slice_count,
        max_slice_size,
        slice_index,
        u16::try_from(payload.len()).expect("payload fits u16"),
    );
    let mut buf = BytesMut::new();
    header.encode_into(&mut buf);
    buf.put_slice(payload);
    buf.to_vec()
}
