//! Receive ceremony frames over UDP until the decode completes.
//!
//! Stands in for the camera: datagrams arrive in arbitrary order, with
//! duplicates and gaps, and anything unreadable is ignored while the
//! decoder keeps collecting.

use std::net::UdpSocket;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use padlink_cli::store;
use padlink_core::derive;
use padlink_core::fountain::FountainDecoder;
use padlink_core::pad::Pad;

#[derive(Parser)]
#[command(
    name = "padlink-frame-fetch",
    about = "Receive UDP frames and decode the ceremony"
)]
struct Args {
    /// Local bind address, e.g. 0.0.0.0:9500.
    #[arg(long)]
    bind: String,
    /// Where to write the recovered pad store.
    #[arg(long)]
    out: PathBuf,
    /// Passphrase matching the sender's, if one was used.
    #[arg(long)]
    passphrase: Option<String>,
    /// Give up after this long without any datagram.
    #[arg(long, default_value_t = 30_000)]
    idle_timeout_ms: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let socket = UdpSocket::bind(&args.bind)
        .with_context(|| format!("binding {}", args.bind))?;
    socket.set_read_timeout(Some(Duration::from_millis(args.idle_timeout_ms)))?;
    info!(bind = %args.bind, "waiting for frames");

    let mut decoder = FountainDecoder::new(args.passphrase.as_deref())?;
    let mut buffer = [0u8; 65_535];
    let mut last_progress = 0.0f64;

    loop {
        let received = match socket.recv(&mut buffer) {
            Ok(received) => received,
            Err(error)
                if error.kind() == std::io::ErrorKind::WouldBlock
                    || error.kind() == std::io::ErrorKind::TimedOut =>
            {
                bail!(
                    "no frames for {}ms with {}/{} blocks solved",
                    args.idle_timeout_ms,
                    (decoder.progress() * decoder.source_count() as f64).round() as usize,
                    decoder.source_count()
                );
            }
            Err(error) => return Err(error.into()),
        };

        match decoder.add_frame_bytes(&buffer[..received]) {
            Ok(true) => break,
            Ok(false) => {
                let progress = decoder.progress();
                if progress > last_progress {
                    last_progress = progress;
                    debug!(
                        solved_percent = (progress * 100.0) as u32,
                        frames = decoder.unique_frames_received(),
                        "progress"
                    );
                }
            }
            Err(error) => warn!(%error, "ignoring datagram"),
        }
    }

    let decoded = decoder.result()?;
    info!(
        frames_used = decoded.frames_used,
        relay = %decoded.metadata.relay_url,
        "decode complete"
    );

    let pad = Pad::from_bytes(decoded.pad_bytes.to_vec())?;
    store::save(&args.out, &pad)?;
    decoder.close();

    println!("conversation id: {}", derive::conversation_id(&pad));
    println!("mnemonic: {}", derive::generate_mnemonic(&pad).join(" "));
    println!("compare the mnemonic out loud before trusting this channel");
    Ok(())
}
