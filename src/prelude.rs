//! Optional convenience imports for running a sender or receiver.
//!
//! Prefer importing protocol-level types directly from [`crate::fragment`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use slicecast::prelude::*;
//!
//! # async fn run() -> Result<()> {
//! let config = TransportConfig::default();
//! let mut receiver = FrameReceiver::bind(&config)?;
//! let mut frames = receiver.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(frame) = frames.recv().await {
//!         println!("session {} carried {} bytes", frame.session(), frame.content_len());
//!     }
//! });
//! receiver.run(CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub use tokio_util::sync::CancellationToken;

pub use crate::{
    config::TransportConfig,
    error::{Result, SlicecastError},
    fragment::CompletedFrame,
    receiver::FrameReceiver,
    sender::FrameSender,
    source::{FileFrameSource, FrameSource, StaticFrameSource},
};
