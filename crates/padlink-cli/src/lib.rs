//! Shared plumbing for the padlink CLI and its transport demo binaries.

pub mod store;

use serde::{Deserialize, Serialize};

/// Public description of an emitted frame set, written next to the frame
/// file. Contains no secrets; everything here is also present in each
/// frame header.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CeremonyManifest {
    /// Ceremony protocol version.
    pub version: u16,
    /// Source blocks in the stream.
    pub source_count: usize,
    /// Block size in bytes.
    pub block_size: u16,
    /// Serialized metadata plus pad length.
    pub total_size: usize,
    /// Per-ceremony stream seed.
    pub seed: u64,
    /// Frames pre-generated into the frame file.
    pub frames_written: usize,
    /// Whether payloads are passphrase-masked.
    pub masked: bool,
}
