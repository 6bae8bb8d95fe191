//! padlink: drive a pad ceremony and OTP message exchange from the
//! command line.
//!
//! The QR screens of the real apps are replaced by a frame file: `create`
//! writes one base64 frame per line (what each QR image would contain),
//! `receive` plays the scanner and feeds them into the decoder. The
//! `padlink-frame-serve` / `padlink-frame-fetch` binaries stream the same
//! frames over lossy UDP for end-to-end rehearsals.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use padlink_cli::{store, CeremonyManifest};
use padlink_core::derive;
use padlink_core::fountain::{Frame, FountainDecoder, FountainEncoder, DEFAULT_BLOCK_SIZE};
use padlink_core::metadata::{CeremonyMetadata, NotificationFlags};
use padlink_core::otp;
use padlink_core::pad::Pad;

#[derive(Parser)]
#[command(name = "padlink", version, about = "One-time-pad ceremony tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a pad and emit its fountain frame file.
    Create(CreateArgs),
    /// Decode a frame file into a pad store.
    Receive(ReceiveArgs),
    /// Print the relay registration view of a stored pad.
    Tokens(TokensArgs),
    /// Check a spoken mnemonic against a stored pad.
    Verify(VerifyArgs),
    /// Encrypt a message, consuming pad bytes from one end.
    Encrypt(EncryptArgs),
    /// Decrypt a message envelope, consuming the matching pad bytes.
    Decrypt(DecryptArgs),
    /// Destroy a stored pad beyond recovery.
    Burn(BurnArgs),
}

/// Which end of the pad a message direction consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PadEnd {
    /// The ceremony initiator's sending direction.
    Front,
    /// The other party's sending direction.
    Back,
}

#[derive(clap::Args)]
struct CreateArgs {
    /// Directory receiving frames.b64, ceremony.json, and pad.json.
    #[arg(long)]
    out: PathBuf,
    /// Pad size in bytes.
    #[arg(long, default_value_t = 64 * 1024)]
    size: usize,
    /// Extra entropy file mixed into pad generation (e.g. collected touch
    /// samples); OS randomness is always included.
    #[arg(long)]
    entropy_file: Option<PathBuf>,
    /// Optional passphrase masking every frame payload.
    #[arg(long)]
    passphrase: Option<String>,
    /// Relay the channel will meet on.
    #[arg(long, default_value = "https://relay.example/v1")]
    relay_url: String,
    /// Server message retention in seconds.
    #[arg(long, default_value_t = 7 * 24 * 3600)]
    ttl: u64,
    /// Disappearing-message timer in seconds, 0 to disable.
    #[arg(long, default_value_t = 0)]
    disappearing: u32,
    /// Notification bitfield transmitted verbatim.
    #[arg(long, default_value_t = 0)]
    notification_flags: u16,
    /// Source block size.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: u16,
    /// Frames to pre-generate; default is twice the source count.
    #[arg(long)]
    frames: Option<usize>,
    /// Fixed stream seed (testing only; omit for a random one).
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::Args)]
struct ReceiveArgs {
    /// Frame file produced by `create` (or captured off the wire).
    #[arg(long)]
    frames: PathBuf,
    /// Where to write the recovered pad store.
    #[arg(long)]
    out: PathBuf,
    /// Passphrase matching the sender's, if one was used.
    #[arg(long)]
    passphrase: Option<String>,
}

#[derive(clap::Args)]
struct TokensArgs {
    /// Pad store path.
    #[arg(long)]
    pad: PathBuf,
    /// Print raw tokens instead of their registration hashes.
    #[arg(long)]
    reveal: bool,
}

#[derive(clap::Args)]
struct VerifyArgs {
    /// Pad store path.
    #[arg(long)]
    pad: PathBuf,
    /// The six words the other party read out, space separated.
    #[arg(long)]
    words: String,
}

#[derive(clap::Args)]
struct EncryptArgs {
    /// Pad store path; cursors advance and are persisted.
    #[arg(long)]
    pad: PathBuf,
    /// Which pad end this direction consumes.
    #[arg(long, value_enum)]
    end: PadEnd,
    /// Message text.
    message: String,
}

#[derive(clap::Args)]
struct DecryptArgs {
    /// Pad store path; cursors advance and are persisted.
    #[arg(long)]
    pad: PathBuf,
    /// Envelope JSON file as printed by `encrypt`.
    #[arg(long)]
    envelope: PathBuf,
}

#[derive(clap::Args)]
struct BurnArgs {
    /// Pad store path to destroy.
    #[arg(long)]
    pad: PathBuf,
}

/// What `encrypt` emits and `decrypt` consumes.
#[derive(Serialize, Deserialize)]
struct MessageEnvelope {
    end: PadEnd,
    offset: usize,
    ciphertext_hex: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Create(args) => create(args),
        Command::Receive(args) => receive(args),
        Command::Tokens(args) => tokens(args),
        Command::Verify(args) => verify(args),
        Command::Encrypt(args) => encrypt(args),
        Command::Decrypt(args) => decrypt(args),
        Command::Burn(args) => burn(args),
    }
}

fn create(args: CreateArgs) -> Result<()> {
    let mut entropy = vec![0u8; 64];
    OsRng.fill_bytes(&mut entropy);
    if let Some(path) = &args.entropy_file {
        let extra = fs::read(path)
            .with_context(|| format!("reading entropy file {}", path.display()))?;
        info!(bytes = extra.len(), "mixing in caller entropy");
        entropy.extend_from_slice(&extra);
    }

    let pad = Pad::from_entropy(&entropy, args.size)?;
    let metadata = CeremonyMetadata::new(
        args.ttl,
        args.disappearing,
        NotificationFlags::new(args.notification_flags),
        args.relay_url.clone(),
    )?;

    let encoder = match args.seed {
        Some(seed) => FountainEncoder::with_seed(
            &metadata,
            pad.bytes(),
            args.block_size,
            args.passphrase.as_deref(),
            seed,
        )?,
        None => FountainEncoder::new(
            &metadata,
            pad.bytes(),
            args.block_size,
            args.passphrase.as_deref(),
        )?,
    };

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    // Twice the source count gives a camera plenty of slack without
    // ballooning the file; the stream is unbounded if more are needed.
    let frame_count = args.frames.unwrap_or(encoder.source_count() * 2);
    let frames_path = args.out.join("frames.b64");
    let mut writer = BufWriter::new(
        File::create(&frames_path)
            .with_context(|| format!("creating {}", frames_path.display()))?,
    );
    for index in 0..frame_count {
        let index = u32::try_from(index).context("frame count out of range")?;
        writeln!(writer, "{}", encoder.generate_frame(index).to_base64())?;
    }
    writer.flush()?;

    let manifest = CeremonyManifest {
        version: metadata.version,
        source_count: encoder.source_count(),
        block_size: encoder.block_size(),
        total_size: encoder.total_size(),
        seed: encoder.seed(),
        frames_written: frame_count,
        masked: args.passphrase.is_some(),
    };
    fs::write(
        args.out.join("ceremony.json"),
        serde_json::to_string_pretty(&manifest)?,
    )?;

    store::save(&args.out.join("pad.json"), &pad)?;
    encoder.close();

    info!(
        frames = frame_count,
        blocks = manifest.source_count,
        "ceremony material written to {}",
        args.out.display()
    );
    println!("conversation id: {}", derive::conversation_id(&pad));
    println!("mnemonic: {}", derive::generate_mnemonic(&pad).join(" "));
    Ok(())
}

fn receive(args: ReceiveArgs) -> Result<()> {
    let file = File::open(&args.frames)
        .with_context(|| format!("opening {}", args.frames.display()))?;
    let mut decoder = FountainDecoder::new(args.passphrase.as_deref())?;

    let mut scanned = 0usize;
    let mut complete = false;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        scanned += 1;
        // Bad lines are the file equivalent of camera misreads: note them
        // and keep going.
        let frame = match Frame::from_base64(&line) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(%error, line = scanned, "skipping unreadable frame");
                continue;
            }
        };
        match decoder.add_frame(frame) {
            Ok(done) => {
                if done {
                    complete = true;
                    break;
                }
            }
            Err(error) => warn!(%error, line = scanned, "skipping rejected frame"),
        }
    }

    if !complete {
        bail!(
            "frame file exhausted before decode completed ({}/{} blocks, {} frames seen)",
            (decoder.progress() * decoder.source_count() as f64).round() as usize,
            decoder.source_count(),
            decoder.unique_frames_received()
        );
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

fn tokens(args: TokensArgs) -> Result<()> {
    let pad = store::load(&args.pad)?;
    let tokens = derive::derive_tokens(&pad);

    let view = if args.reveal {
        serde_json::json!({
            "conversation_id": tokens.conversation_id,
            "auth_token": tokens.auth_token,
            "burn_token": tokens.burn_token,
        })
    } else {
        serde_json::json!({
            "conversation_id": tokens.conversation_id,
            "auth_token_hash": derive::hash_token(&tokens.auth_token),
            "burn_token_hash": derive::hash_token(&tokens.burn_token),
        })
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn verify(args: VerifyArgs) -> Result<()> {
    let pad = store::load(&args.pad)?;
    let spoken: Vec<&str> = args.words.split_whitespace().collect();
    match derive::verify_mnemonic(&pad, &spoken) {
        Ok(()) => {
            println!("mnemonic matches");
            Ok(())
        }
        Err(error) => {
            bail!("{error}; discard this pad and redo the ceremony");
        }
    }
}

fn encrypt(args: EncryptArgs) -> Result<()> {
    let pad = store::load(&args.pad)?;
    let message = args.message.as_bytes();

    let offset = match args.end {
        PadEnd::Front => pad.consumed_front(),
        PadEnd::Back => pad.consumed_back(),
    };
    let key = match args.end {
        PadEnd::Front => pad.consume_front(message.len())?,
        PadEnd::Back => pad.consume_back(message.len())?,
    };
    let ciphertext = otp::encrypt(&key, message)?;
    store::save(&args.pad, &pad)?;

    let envelope = MessageEnvelope {
        end: args.end,
        offset,
        ciphertext_hex: hex::encode(ciphertext),
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    info!(remaining = pad.remaining(), "pad bytes left");
    Ok(())
}

fn decrypt(args: DecryptArgs) -> Result<()> {
    let pad = store::load(&args.pad)?;
    let envelope: MessageEnvelope = serde_json::from_str(
        &fs::read_to_string(&args.envelope)
            .with_context(|| format!("reading {}", args.envelope.display()))?,
    )
    .context("parsing envelope")?;
    let ciphertext = hex::decode(&envelope.ciphertext_hex).context("ciphertext hex")?;

    let cursor = match envelope.end {
        PadEnd::Front => pad.consumed_front(),
        PadEnd::Back => pad.consumed_back(),
    };
    if cursor != envelope.offset {
        bail!(
            "pad cursor out of sync: envelope expects offset {}, store is at {}",
            envelope.offset,
            cursor
        );
    }

    let key = match envelope.end {
        PadEnd::Front => pad.consume_front(ciphertext.len())?,
        PadEnd::Back => pad.consume_back(ciphertext.len())?,
    };
    let plaintext = otp::decrypt(&key, &ciphertext)?;
    store::save(&args.pad, &pad)?;

    println!(
        "{}",
        String::from_utf8(plaintext).context("plaintext is not utf-8")?
    );
    Ok(())
}

fn burn(args: BurnArgs) -> Result<()> {
    let pad = store::load(&args.pad)?;
    let token = derive::burn_token(&pad);
    pad.burn();
    store::shred(&args.pad)?;

    info!("pad store destroyed");
    println!("burn token (present to the relay): {token}");
    Ok(())
}
