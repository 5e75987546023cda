//! Command line interface for the `slicecast` binary.
//!
//! Kept free of crate imports so the build script can render a man page from
//! the same definition.

use std::{
    net::{Ipv4Addr, SocketAddr},
    num::NonZeroU16,
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand};

/// Command line arguments for the `slicecast` binary.
#[derive(Debug, Parser)]
#[command(
    name = "slicecast",
    version,
    about = "Distribute still frames over IP multicast"
)]
pub struct Cli {
    /// Serve Prometheus metrics on this address.
    #[arg(long, global = true)]
    pub metrics_listen: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operating mode.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Re-read a file every interval and multicast its contents.
    Send(SendArgs),
    /// Listen on the group and keep the latest complete frame.
    Receive(ReceiveArgs),
}

/// Group addressing shared by both modes.
#[derive(Debug, Args)]
pub struct ChannelArgs {
    /// Multicast group (or unicast destination) address.
    #[arg(long)]
    pub group: Option<Ipv4Addr>,
    /// UDP port.
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Local interface for sending and joining the group.
    #[arg(long)]
    pub interface: Option<Ipv4Addr>,
    /// Start from the LAN preset (192.168.0.9:8000) instead of 225.4.5.6:4444.
    #[arg(long)]
    pub lan: bool,
}

/// Options for `slicecast send`.
#[derive(Debug, Args)]
pub struct SendArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// File holding the frame to send; re-read on every cycle.
    #[arg(short, long)]
    pub input: PathBuf,
    /// Payload bytes per slice.
    #[arg(long)]
    pub max_slice_size: Option<NonZeroU16>,
    /// Milliseconds between frames.
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Multicast time-to-live.
    #[arg(long)]
    pub ttl: Option<u32>,
    /// Do not loop datagrams back to listeners on this host.
    #[arg(long)]
    pub no_loopback: bool,
}

/// Options for `slicecast receive`.
#[derive(Debug, Args)]
pub struct ReceiveArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// Write each completed frame to this file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Milliseconds without progress before a partial frame is dropped.
    #[arg(long, conflicts_with = "no_timeout")]
    pub session_timeout_ms: Option<u64>,
    /// Keep partial frames until a newer frame starts.
    #[arg(long)]
    pub no_timeout: bool,
}
