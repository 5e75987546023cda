//! Tests for outbound slicing and session numbering.

use bytes::Bytes;
use rstest::rstest;

use super::slice_size;
use crate::fragment::{
    FragmentationError,
    Fragmenter,
    HEADER_LEN,
    SessionId,
    SliceHeader,
    slice_count_for,
};

fn headers(datagrams: &[Bytes]) -> Vec<SliceHeader> {
    datagrams
        .iter()
        .map(|d| SliceHeader::decode(d).expect("fragmenter emits full headers"))
        .collect()
}

#[test]
fn ten_bytes_in_slices_of_four() {
    let mut fragmenter = Fragmenter::with_starting_session(slice_size(4), SessionId::new(3));
    let frame: Vec<u8> = (0..10).collect();

    let datagrams: Vec<Bytes> = fragmenter.fragment(&frame).expect("frame fits").collect();

    assert_eq!(datagrams.len(), 3);
    assert_eq!(&datagrams[0][..], &[0x80, 3, 3, 0, 4, 0, 0, 4, 0, 1, 2, 3]);
    assert_eq!(&datagrams[1][..], &[0x00, 3, 3, 0, 4, 1, 0, 4, 4, 5, 6, 7]);
    assert_eq!(&datagrams[2][..], &[0x40, 3, 3, 0, 4, 2, 0, 2, 8, 9]);
    assert_eq!(fragmenter.next_session(), SessionId::new(4));
}

#[test]
fn small_frame_is_a_single_start_end_slice() {
    let mut fragmenter = Fragmenter::new(slice_size(1024));
    let datagrams: Vec<Bytes> = fragmenter.fragment(b"hello").expect("frame fits").collect();

    let headers = headers(&datagrams);
    let [only] = headers.as_slice() else {
        panic!("expected exactly one slice");
    };
    assert!(only.is_start());
    assert!(only.is_end());
    assert_eq!(only.slice_count(), 1);
    assert_eq!(only.payload_size(), 5);
    assert_eq!(&datagrams[0][HEADER_LEN..], b"hello");
}

#[test]
fn exact_multiple_flags_end_on_last_slice_only() {
    let mut fragmenter = Fragmenter::new(slice_size(4));
    let frame = [7_u8; 8];
    let datagrams: Vec<Bytes> = fragmenter.fragment(&frame).expect("frame fits").collect();
    let headers = headers(&datagrams);

    assert_eq!(headers.len(), 2);
    assert!(headers[0].is_start() && !headers[0].is_end());
    assert!(!headers[1].is_start() && headers[1].is_end());
    assert!(headers.iter().all(|h| h.payload_size() == 4));
}

#[test]
fn empty_frame_still_occupies_one_slice() {
    let mut fragmenter = Fragmenter::new(slice_size(4));
    let datagrams: Vec<Bytes> = fragmenter.fragment(&[]).expect("empty frame fits").collect();

    assert_eq!(datagrams.len(), 1);
    assert_eq!(&datagrams[0][..], &[0xC0, 0, 1, 0, 4, 0, 0, 0]);
}

#[rstest]
#[case(255, true)]
#[case(256, false)]
fn slice_count_is_capped_at_255(#[case] len: usize, #[case] fits: bool) {
    let mut fragmenter = Fragmenter::new(slice_size(1));
    let frame = vec![0_u8; len];
    let result = fragmenter.fragment(&frame).map(|slices| slices.len());
    if fits {
        assert_eq!(result, Ok(255));
    } else {
        assert_eq!(
            result,
            Err(FragmentationError::OversizedFrame {
                len: 256,
                slices: 256,
                max_slice_size: 1,
            })
        );
    }
}

#[test]
fn oversized_frame_does_not_consume_a_session() {
    let mut fragmenter = Fragmenter::with_starting_session(slice_size(2), SessionId::new(40));
    let frame = vec![0_u8; 2 * 255 + 1];
    assert!(fragmenter.fragment(&frame).is_err());
    assert_eq!(fragmenter.next_session(), SessionId::new(40));
}

#[test]
fn session_numbers_wrap_after_255() {
    let mut fragmenter = Fragmenter::with_starting_session(slice_size(4), SessionId::new(254));
    let sessions: Vec<SessionId> = (0..3)
        .map(|_| fragmenter.fragment(b"x").expect("frame fits").session())
        .collect();
    assert_eq!(
        sessions,
        [SessionId::new(254), SessionId::new(255), SessionId::new(0)]
    );
}

#[test]
fn every_slice_carries_the_session_geometry() {
    let mut fragmenter = Fragmenter::with_starting_session(slice_size(100), SessionId::new(12));
    let frame = vec![1_u8; 950];
    let slices = fragmenter.fragment(&frame).expect("frame fits");
    assert_eq!(slices.slice_count(), 10);
    let datagrams: Vec<Bytes> = slices.collect();

    for (index, header) in headers(&datagrams).iter().enumerate() {
        assert_eq!(header.session(), SessionId::new(12));
        assert_eq!(header.slice_count(), 10);
        assert_eq!(header.max_slice_size(), 100);
        assert_eq!(usize::from(header.slice_index()), index);
        assert_eq!(header.is_start(), index == 0);
        assert_eq!(header.is_end(), index == 9);
    }
    assert_eq!(datagrams.last().map(Bytes::len), Some(HEADER_LEN + 50));
}

#[test]
fn iterator_reports_remaining_slices() {
    let mut fragmenter = Fragmenter::new(slice_size(4));
    let frame = [0_u8; 10];
    let mut slices = fragmenter.fragment(&frame).expect("frame fits");
    assert_eq!(slices.len(), 3);
    slices.next();
    assert_eq!(slices.len(), 2);
    slices.by_ref().for_each(drop);
    assert_eq!(slices.next(), None);
}

#[rstest]
#[case(0, 4, 1)]
#[case(1, 4, 1)]
#[case(4, 4, 1)]
#[case(5, 4, 2)]
#[case(10, 4, 3)]
#[case(65_500, 65_499, 2)]
fn slice_count_rounds_up(#[case] len: usize, #[case] max: u16, #[case] expected: usize) {
    assert_eq!(slice_count_for(len, slice_size(max)), expected);
}
