//! Metric helpers for `slicecast`.
//!
//! This module defines metric names and thin wrappers around the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! every helper compiles to a no-op.

/// Name of the counter tracking slices sent or accepted.
pub const SLICES_TOTAL: &str = "slicecast_slices_total";
/// Name of the counter tracking frames sent or completed.
pub const FRAMES_TOTAL: &str = "slicecast_frames_total";
/// Name of the counter tracking inbound datagrams that were dropped.
pub const SLICES_DROPPED: &str = "slicecast_slices_dropped_total";
/// Name of the counter tracking partial sessions abandoned by the receiver.
pub const SESSIONS_ABANDONED: &str = "slicecast_sessions_abandoned_total";
/// Name of the counter tracking datagram send failures.
pub const SEND_FAILURES: &str = "slicecast_send_failures_total";
/// Name of the counter tracking frames skipped for exceeding the slice limit.
pub const FRAMES_SKIPPED: &str = "slicecast_frames_skipped_total";

/// Direction of slice processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Slices and frames received from the group.
    Inbound,
    /// Slices and frames sent to the group.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "labels need metrics"))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

#[cfg(feature = "metrics")]
mod imp {
    use metrics::counter;

    use super::*;

    pub fn inc_slices(direction: Direction) {
        counter!(SLICES_TOTAL, "direction" => direction.as_str()).increment(1);
    }

    pub fn inc_frames(direction: Direction) {
        counter!(FRAMES_TOTAL, "direction" => direction.as_str()).increment(1);
    }

    pub fn inc_dropped(reason: &'static str) {
        counter!(SLICES_DROPPED, "reason" => reason).increment(1);
    }

    pub fn inc_abandoned(cause: &'static str) {
        counter!(SESSIONS_ABANDONED, "cause" => cause).increment(1);
    }

    pub fn inc_send_failures() { counter!(SEND_FAILURES).increment(1); }

    pub fn inc_skipped() { counter!(FRAMES_SKIPPED).increment(1); }
}

#[cfg(not(feature = "metrics"))]
mod imp {
    use super::Direction;

    pub fn inc_slices(_: Direction) {}

    pub fn inc_frames(_: Direction) {}

    pub fn inc_dropped(_: &'static str) {}

    pub fn inc_abandoned(_: &'static str) {}

    pub fn inc_send_failures() {}

    pub fn inc_skipped() {}
}

/// Record a slice sent or accepted in the given direction.
pub fn inc_slices(direction: Direction) { imp::inc_slices(direction); }

/// Record a frame sent or completed in the given direction.
pub fn inc_frames(direction: Direction) { imp::inc_frames(direction); }

/// Record an inbound datagram dropped for `reason`.
pub fn inc_dropped(reason: &'static str) { imp::inc_dropped(reason); }

/// Record a partial session discarded because a newer session started.
pub fn inc_superseded() { imp::inc_abandoned("superseded"); }

/// Record a partial session discarded by the inactivity timeout.
pub fn inc_expired() { imp::inc_abandoned("expired"); }

/// Record a failed datagram send.
pub fn inc_send_failures() { imp::inc_send_failures(); }

/// Record a frame skipped because it needs too many slices.
pub fn inc_skipped() { imp::inc_skipped(); }
