#![doc(html_root_url = "https://docs.rs/slicecast/latest")]
//! Public API for the `slicecast` library.
//!
//! This crate distributes still frames over IP multicast. Frames are split
//! into bounded slices tagged with an eight byte header, sent as independent
//! datagrams, and reassembled by any number of listeners, each of which
//! surfaces the most recently completed frame.

pub mod config;
pub mod error;
pub mod fragment;
pub mod metrics;
pub mod prelude;
pub mod receiver;
pub mod sender;
pub mod source;
pub mod transport;

pub use config::{ConfigError, TransportConfig};
/// Result type alias re-exported for convenience at the crate root.
pub use error::{Result, SlicecastError};
pub use fragment::{
    CompletedFrame,
    FragmentationError,
    Fragmenter,
    HEADER_LEN,
    MalformedSlice,
    Reassembler,
    ReassemblyError,
    SessionId,
    SliceFlags,
    SliceHeader,
};
pub use receiver::{FrameReceiver, ReceiverError};
pub use sender::{FrameSender, SendReport, SenderError};
