#![cfg(feature = "metrics")]
//! Tests for `slicecast` metric helpers.
//!
//! These tests verify that counters update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.

use std::num::NonZeroU16;

use metrics::{SharedString, Unit};
use metrics_util::{
    CompositeKey,
    debugging::{DebugValue, DebuggingRecorder, Snapshotter},
};
use rstest::rstest;
use slicecast::{
    Fragmenter,
    Reassembler,
    metrics::{self as m, Direction},
};

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

type Snapshot = Vec<(CompositeKey, Option<Unit>, Option<SharedString>, DebugValue)>;

/// Sum the counters named `name` carrying `label` in one snapshot.
///
/// Taking a snapshot resets the recorded counters, so every assertion in a
/// test must read from the same one.
fn counter_value(snapshot: &Snapshot, name: &str, label: (&str, &str)) -> u64 {
    snapshot
        .iter()
        .filter(|(k, _, _, _)| {
            k.key().name() == name
                && k.key()
                    .labels()
                    .any(|l| l.key() == label.0 && l.value() == label.1)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => *c,
            _ => 0,
        })
        .sum()
}

#[rstest]
#[case(Direction::Inbound, "inbound")]
#[case(Direction::Outbound, "outbound")]
fn frame_metric_carries_direction(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || m::inc_frames(direction));

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_value(&snapshot, m::FRAMES_TOTAL, ("direction", label)),
        1
    );
}

#[test]
fn reassembly_counts_accepted_and_dropped_slices() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let mut fragmenter = Fragmenter::new(NonZeroU16::new(4).expect("non-zero"));
    let frame: Vec<u8> = (0..10).collect();
    let datagrams: Vec<_> = fragmenter.fragment(&frame).expect("fits").collect();

    metrics::with_local_recorder(&recorder, || {
        let mut reassembler = Reassembler::new(None);
        let _ = reassembler.push(&datagrams[1]);
        let _ = reassembler.push(&datagrams[0]);
        let _ = reassembler.push(&datagrams[0]);
        let _ = reassembler.push(&datagrams[0][..3]);
        let _ = reassembler.push(&datagrams[1]);
        let _ = reassembler.push(&datagrams[2]);
        // Late copy of the frame that just completed.
        let _ = reassembler.push(&datagrams[2]);
    });

    let snapshot = snapshotter.snapshot().into_vec();
    let dropped = |reason: &str| counter_value(&snapshot, m::SLICES_DROPPED, ("reason", reason));
    assert_eq!(
        counter_value(&snapshot, m::SLICES_TOTAL, ("direction", "inbound")),
        3
    );
    assert_eq!(
        counter_value(&snapshot, m::FRAMES_TOTAL, ("direction", "inbound")),
        1
    );
    assert_eq!(dropped("duplicate"), 2);
    assert_eq!(dropped("truncated"), 1);
    assert_eq!(dropped("completed"), 1);
}

#[test]
fn superseded_session_is_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let mut fragmenter = Fragmenter::new(NonZeroU16::new(4).expect("non-zero"));
    let first: Vec<_> = fragmenter.fragment(&[1; 10]).expect("fits").collect();
    let second: Vec<_> = fragmenter.fragment(&[2; 10]).expect("fits").collect();

    metrics::with_local_recorder(&recorder, || {
        let mut reassembler = Reassembler::new(None);
        let _ = reassembler.push(&first[0]);
        let _ = reassembler.push(&second[0]);
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_value(&snapshot, m::SESSIONS_ABANDONED, ("cause", "superseded")),
        1
    );
}
