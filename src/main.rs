//! `slicecast` binary: send or receive frames on a multicast group.
//!
//! Capture and display stay outside the tool. The sender re-reads a file that
//! some capture program keeps overwriting; the receiver writes each completed
//! frame to a file that a viewer can watch.

mod cli;

use std::{path::Path, time::Duration};

use clap::Parser;
use slicecast::{
    FrameReceiver,
    FrameSender,
    Result,
    TransportConfig,
    source::FileFrameSource,
};
use tokio::{signal, sync::broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{ChannelArgs, Cli, Command, ReceiveArgs, SendArgs};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Some(addr) = cli.metrics_listen {
        install_metrics_exporter(addr)?;
    }

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        on_signal.cancel();
    });

    match cli.command {
        Command::Send(args) => send(args, shutdown).await,
        Command::Receive(args) => receive(args, shutdown).await,
    }
}

fn base_config(channel: &ChannelArgs) -> TransportConfig {
    let mut config = if channel.lan {
        TransportConfig::lan_preset()
    } else {
        TransportConfig::default()
    };
    if let Some(group) = channel.group {
        config.group = group;
    }
    if let Some(port) = channel.port {
        config.port = port;
    }
    if let Some(interface) = channel.interface {
        config.interface = interface;
    }
    config
}

async fn send(args: SendArgs, shutdown: CancellationToken) -> Result<()> {
    let mut config = base_config(&args.channel);
    if let Some(size) = args.max_slice_size {
        config.max_slice_size = size;
    }
    if let Some(ms) = args.interval_ms {
        config.frame_interval = Duration::from_millis(ms);
    }
    if let Some(ttl) = args.ttl {
        config.ttl = ttl;
    }
    config.multicast_loop = !args.no_loopback;

    let mut sender = FrameSender::bind(&config)?;
    let mut source = FileFrameSource::new(args.input);
    info!(destination = %config.destination(), "sending frames");
    sender.run(&mut source, shutdown).await;
    Ok(())
}

async fn receive(args: ReceiveArgs, shutdown: CancellationToken) -> Result<()> {
    let mut config = base_config(&args.channel);
    if args.no_timeout {
        config.session_timeout = None;
    } else if let Some(ms) = args.session_timeout_ms {
        config.session_timeout = Some(Duration::from_millis(ms));
    }

    let mut receiver = FrameReceiver::bind(&config)?;
    if let Some(output) = args.output {
        tokio::spawn(write_frames(receiver.subscribe(), output));
    }
    info!(group = %config.group, port = config.port, "receiving frames");
    let result = receiver.run(shutdown).await;
    // Leave the group before reporting the outcome.
    drop(receiver);
    result?;
    Ok(())
}

async fn write_frames(
    mut frames: broadcast::Receiver<slicecast::CompletedFrame>,
    output: impl AsRef<Path>,
) {
    let output = output.as_ref();
    let staging = output.with_extension("partial");
    loop {
        let frame = match frames.recv().await {
            Ok(frame) => frame,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "frame writer fell behind");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };
        let written = async {
            tokio::fs::write(&staging, frame.content()).await?;
            tokio::fs::rename(&staging, output).await
        };
        if let Err(err) = written.await {
            warn!(path = %output.display(), error = %err, "failed to write frame");
        }
    }
}

#[cfg(feature = "metrics")]
fn install_metrics_exporter(addr: std::net::SocketAddr) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| slicecast::SlicecastError::Metrics(err.to_string()))?;
    info!(%addr, "metrics exporter listening");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics_exporter(addr: std::net::SocketAddr) -> Result<()> {
    warn!(%addr, "built without the metrics feature; ignoring --metrics-listen");
    Ok(())
}
