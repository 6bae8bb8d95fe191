//! Stream a ceremony frame file over UDP, optionally with synthetic loss.
//!
//! Stands in for the QR display loop: each datagram is one frame in wire
//! form, and because frames are self-describing the receiver can join at
//! any point of the cycle.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::UdpSocket;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Parser;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "padlink-frame-serve",
    about = "Stream a frames.b64 file over UDP"
)]
struct Args {
    /// Frame file produced by `padlink create`.
    frames: PathBuf,
    /// Destination address, e.g. 127.0.0.1:9500.
    #[arg(long)]
    to: String,
    /// Local bind address.
    #[arg(long, default_value = "0.0.0.0:0")]
    bind: String,
    /// Frames per second.
    #[arg(long, default_value_t = 200)]
    fps: u64,
    /// Synthetic drop probability on the sending side, 0.0..1.0.
    #[arg(long, default_value_t = 0.0)]
    loss: f64,
    /// Restart from the top when the file ends, like a cycling display.
    #[arg(long)]
    repeat: bool,
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
    socket
        .connect(&args.to)
        .with_context(|| format!("connecting {}", args.to))?;
    info!(to = %args.to, fps = args.fps, loss = args.loss, "serving frames");

    let pause = (args.fps > 0).then(|| Duration::from_micros(1_000_000 / args.fps));
    let mut rng = rand::thread_rng();

    loop {
        let file = File::open(&args.frames)
            .with_context(|| format!("opening {}", args.frames.display()))?;
        let mut sent = 0usize;
        let mut dropped = 0usize;

        for line in BufReader::new(file).lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let bytes = match STANDARD.decode(trimmed) {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(%error, "skipping unreadable line");
                    continue;
                }
            };

            if args.loss > 0.0 && rng.gen_bool(args.loss.clamp(0.0, 1.0)) {
                dropped += 1;
            } else {
                socket.send(&bytes)?;
                sent += 1;
            }

            if let Some(pause) = pause {
                thread::sleep(pause);
            }
        }

        info!(sent, dropped, repeat = args.repeat, "pass finished");
        if !args.repeat {
            return Ok(());
        }
    }
}
