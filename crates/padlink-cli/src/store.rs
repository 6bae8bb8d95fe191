//! On-disk pad store.
//!
//! Stand-in for the encrypted storage collaborator a real app would use:
//! a JSON file holding the pad bytes in hex plus the two consumption
//! cursors, so a restart never reuses bytes. Treat the file like the key
//! material it is.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use padlink_core::derive;
use padlink_core::pad::Pad;

/// Serialized pad state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PadStore {
    /// Channel identifier, kept for human inspection; always re-derivable
    /// from the pad bytes.
    pub conversation_id: String,
    /// Pad bytes, hex.
    pub pad_hex: String,
    /// Bytes consumed from the front.
    pub consumed_front: usize,
    /// Bytes consumed from the back.
    pub consumed_back: usize,
}

impl PadStore {
    /// Snapshot a pad for persistence.
    pub fn from_pad(pad: &Pad) -> Self {
        Self {
            conversation_id: derive::conversation_id(pad),
            pad_hex: hex::encode(pad.bytes()),
            consumed_front: pad.consumed_front(),
            consumed_back: pad.consumed_back(),
        }
    }
}

/// Write `pad` to `path` as JSON.
pub fn save(path: &Path, pad: &Pad) -> Result<()> {
    let store = PadStore::from_pad(pad);
    let json = serde_json::to_string_pretty(&store)?;
    fs::write(path, json).with_context(|| format!("writing pad store {}", path.display()))?;
    Ok(())
}

/// Load a pad from `path`, restoring its consumption state.
pub fn load(path: &Path) -> Result<Pad> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading pad store {}", path.display()))?;
    let store: PadStore =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    let bytes = hex::decode(&store.pad_hex).context("pad hex is malformed")?;
    let pad = Pad::restore(bytes, store.consumed_front, store.consumed_back)
        .context("stored pad state is invalid")?;
    Ok(pad)
}

/// Overwrite `path` with zeros and remove it.
pub fn shred(path: &Path) -> Result<()> {
    if let Ok(metadata) = fs::metadata(path) {
        let len = usize::try_from(metadata.len()).unwrap_or(0);
        fs::write(path, vec![0u8; len])
            .with_context(|| format!("overwriting {}", path.display()))?;
    }
    fs::remove_file(path).with_context(|| format!("removing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pad.json");

        let pad = Pad::from_entropy(b"store test entropy", 2048).expect("pad");
        pad.consume_front(10).expect("front");
        pad.consume_back(4).expect("back");
        save(&path, &pad).expect("save");

        let restored = load(&path).expect("load");
        assert_eq!(restored.bytes(), pad.bytes());
        assert_eq!(restored.consumed_front(), 10);
        assert_eq!(restored.consumed_back(), 4);
    }

    #[test]
    fn shred_removes_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pad.json");
        let pad = Pad::from_entropy(b"shred test entropy", 1024).expect("pad");
        save(&path, &pad).expect("save");

        shred(&path).expect("shred");
        assert!(!path.exists());
    }

    #[test]
    fn load_rejects_tampered_cursors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pad.json");
        let pad = Pad::from_entropy(b"tamper test entropy", 1024).expect("pad");
        save(&path, &pad).expect("save");

        let mut store: PadStore =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
        store.consumed_front = 2048;
        std::fs::write(&path, serde_json::to_string(&store).expect("json")).expect("write");

        assert!(load(&path).is_err());
    }
}
