//! Producers of the frames handed to the sender.
//!
//! Capturing and encoding images is outside the transport; the sender only
//! asks a [`FrameSource`] for the next opaque blob once per cycle.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

/// Supplies one frame per transmission cycle.
#[async_trait]
pub trait FrameSource: Send {
    /// Produce the next frame to transmit.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when no frame can be produced this cycle; the
    /// sender logs it and tries again on the next cycle.
    async fn next_frame(&mut self) -> io::Result<Bytes>;
}

/// Re-reads a file on every cycle, so an external capture tool can keep
/// overwriting it with the latest image.
#[derive(Clone, Debug)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    /// Create a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    async fn next_frame(&mut self) -> io::Result<Bytes> {
        tokio::fs::read(&self.path).await.map(Bytes::from)
    }
}

/// Yields the same frame every cycle.
#[derive(Clone, Debug)]
pub struct StaticFrameSource {
    frame: Bytes,
}

impl StaticFrameSource {
    /// Create a source that repeats `frame`.
    #[must_use]
    pub fn new(frame: impl Into<Bytes>) -> Self {
        Self {
            frame: frame.into(),
        }
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn next_frame(&mut self) -> io::Result<Bytes> { Ok(self.frame.clone()) }
}
