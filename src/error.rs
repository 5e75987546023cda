//! Canonical error and result types for the crate.
//!
//! This module defines the single `SlicecastError` surface returned by the
//! binary's top-level operations. Library components keep their own narrower
//! error enums and convert into this one at the edge.

use thiserror::Error;

use crate::{receiver::ReceiverError, sender::SenderError};

/// Top-level error type exposed by `slicecast`.
#[derive(Debug, Error)]
pub enum SlicecastError {
    /// The send loop could not be started.
    #[error("sender error: {0}")]
    Sender(#[from] SenderError),
    /// The receive loop failed or could not be started.
    #[error("receiver error: {0}")]
    Receiver(#[from] ReceiverError),
    /// The metrics exporter could not be installed.
    #[error("metrics exporter error: {0}")]
    Metrics(String),
}

/// Canonical result alias used by `slicecast` entry points.
pub type Result<T> = std::result::Result<T, SlicecastError>;
