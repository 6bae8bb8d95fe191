//! One-time-pad key material with exactly-once, bidirectional consumption.
//!
//! Each conversation owns a single [`Pad`]. The party sending in the
//! "forward" direction consumes bytes from the front, the other party from
//! the back; the two cursors grow toward each other and may never cross.
//! Every byte is handed out by at most one successful consume call, which
//! is the entire security argument of the OTP channel.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use zeroize::{Zeroize, Zeroizing};

use crate::error::PadlinkError;

/// Smallest pad accepted for a ceremony.
pub const MIN_PAD_SIZE: usize = 1024;

/// Largest pad accepted for a ceremony.
pub const MAX_PAD_SIZE: usize = 4 * 1024 * 1024;

/// Pad sizes offered by the ceremony UI. Custom sizes within
/// [`MIN_PAD_SIZE`]..=[`MAX_PAD_SIZE`] are equally valid.
pub const PAD_SIZE_PRESETS: [usize; 4] = [16 * 1024, 64 * 1024, 256 * 1024, 1024 * 1024];

const EXPAND_CONTEXT: &str = "padlink v1 pad expand";

/// Shared one-time-pad key material plus its two consumption cursors.
///
/// The byte sequence is immutable after construction; only the cursors
/// move. Consume calls are atomic with respect to concurrent callers: a
/// single mutex guards both cursors, so overlapping ranges can never be
/// issued even under racing sends.
pub struct Pad {
    bytes: Zeroizing<Vec<u8>>,
    cursors: Mutex<Cursors>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Cursors {
    front: usize,
    back: usize,
}

impl Pad {
    /// Stretch caller-supplied entropy into exactly `size` uniformly
    /// distributed pad bytes.
    ///
    /// The entropy is compressed into a 32-byte key with a domain-separated
    /// BLAKE3 derivation, then expanded through the keyed BLAKE3 XOF.
    /// Deterministic given identical entropy, which is what makes the
    /// expansion testable; production callers must supply high-entropy
    /// input (touch/motion samples mixed with CSPRNG output).
    pub fn from_entropy(entropy: &[u8], size: usize) -> Result<Self, PadlinkError> {
        if entropy.is_empty() {
            return Err(PadlinkError::InvalidState("entropy must not be empty"));
        }
        if !(MIN_PAD_SIZE..=MAX_PAD_SIZE).contains(&size) {
            return Err(PadlinkError::InvalidState("pad size out of bounds"));
        }

        let mut key = blake3::derive_key(EXPAND_CONTEXT, entropy);
        let mut bytes = Zeroizing::new(vec![0u8; size]);
        blake3::Hasher::new_keyed(&key)
            .finalize_xof()
            .fill(&mut bytes);
        key.zeroize();

        Ok(Self {
            bytes,
            cursors: Mutex::new(Cursors::default()),
        })
    }

    /// Reconstruct a fresh pad from raw bytes (receiver side of a
    /// ceremony, or a never-used stored pad).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PadlinkError> {
        Self::restore(bytes, 0, 0)
    }

    /// Reconstruct a pad from storage, preserving consumption state.
    pub fn restore(
        bytes: Vec<u8>,
        consumed_front: usize,
        consumed_back: usize,
    ) -> Result<Self, PadlinkError> {
        if bytes.is_empty() {
            return Err(PadlinkError::InvalidState("pad must not be empty"));
        }
        let overrun = consumed_front
            .checked_add(consumed_back)
            .map_or(true, |used| used > bytes.len());
        if overrun {
            return Err(PadlinkError::InvalidState(
                "consumed cursors exceed pad length",
            ));
        }
        Ok(Self {
            bytes: Zeroizing::new(bytes),
            cursors: Mutex::new(Cursors {
                front: consumed_front,
                back: consumed_back,
            }),
        })
    }

    /// Hand out the next `n` unused bytes from the front and advance the
    /// front cursor. Fails with [`PadlinkError::PadExhausted`] and leaves
    /// both cursors unchanged if fewer than `n` bytes remain.
    pub fn consume_front(&self, n: usize) -> Result<Zeroizing<Vec<u8>>, PadlinkError> {
        let mut cursors = self.lock();
        let remaining = self.bytes.len() - cursors.front - cursors.back;
        if n > remaining {
            return Err(PadlinkError::PadExhausted {
                requested: n,
                remaining,
            });
        }
        let start = cursors.front;
        cursors.front += n;
        Ok(Zeroizing::new(self.bytes[start..start + n].to_vec()))
    }

    /// Hand out the next `n` unused bytes from the back (in ascending byte
    /// order) and advance the back cursor.
    pub fn consume_back(&self, n: usize) -> Result<Zeroizing<Vec<u8>>, PadlinkError> {
        let mut cursors = self.lock();
        let remaining = self.bytes.len() - cursors.front - cursors.back;
        if n > remaining {
            return Err(PadlinkError::PadExhausted {
                requested: n,
                remaining,
            });
        }
        let end = self.bytes.len() - cursors.back;
        cursors.back += n;
        Ok(Zeroizing::new(self.bytes[end - n..end].to_vec()))
    }

    /// Unused bytes left between the two cursors.
    pub fn remaining(&self) -> usize {
        let cursors = self.lock();
        self.bytes.len() - cursors.front - cursors.back
    }

    /// True once every byte has been consumed. An exhausted pad can never
    /// encrypt another message.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Total pad length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: empty pads are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes consumed from the front so far (persisted by storage).
    pub fn consumed_front(&self) -> usize {
        self.lock().front
    }

    /// Bytes consumed from the back so far (persisted by storage).
    pub fn consumed_back(&self) -> usize {
        self.lock().back
    }

    /// The full pad byte sequence, independent of consumption state.
    /// Channel derivation and fountain encoding read this; message
    /// encryption must go through the consume calls instead.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Irreversibly destroy the pad, synchronously zeroing the key
    /// material rather than waiting for a later drop.
    pub fn burn(mut self) {
        self.bytes.zeroize();
        let mut cursors = self.lock();
        cursors.front = 0;
        cursors.back = 0;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Cursors> {
        self.cursors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cursors = self.lock();
        f.debug_struct("Pad")
            .field("len", &self.bytes.len())
            .field("consumed_front", &cursors.front)
            .field("consumed_back", &cursors.back)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pad(size: usize) -> Pad {
        Pad::from_entropy(b"pad unit test entropy", size).expect("pad")
    }

    #[test]
    fn from_entropy_is_deterministic() {
        let a = Pad::from_entropy(b"same entropy", 2048).expect("pad a");
        let b = Pad::from_entropy(b"same entropy", 2048).expect("pad b");
        assert_eq!(a.bytes(), b.bytes());

        let c = Pad::from_entropy(b"other entropy", 2048).expect("pad c");
        assert_ne!(a.bytes(), c.bytes());
    }

    #[test]
    fn from_entropy_rejects_bad_inputs() {
        assert!(matches!(
            Pad::from_entropy(b"", 2048),
            Err(PadlinkError::InvalidState(_))
        ));
        assert!(matches!(
            Pad::from_entropy(b"x", MIN_PAD_SIZE - 1),
            Err(PadlinkError::InvalidState(_))
        ));
        assert!(matches!(
            Pad::from_entropy(b"x", MAX_PAD_SIZE + 1),
            Err(PadlinkError::InvalidState(_))
        ));
        for size in PAD_SIZE_PRESETS {
            assert!(Pad::from_entropy(b"x", size).is_ok());
        }
    }

    #[test]
    fn consume_front_hands_out_prefix_exactly_once() {
        let pad = test_pad(2048);
        let first = pad.consume_front(16).expect("first");
        let second = pad.consume_front(16).expect("second");

        assert_eq!(&*first, &pad.bytes()[..16]);
        assert_eq!(&*second, &pad.bytes()[16..32]);
        assert_eq!(pad.consumed_front(), 32);
        assert_eq!(pad.remaining(), 2048 - 32);
    }

    #[test]
    fn consume_back_hands_out_suffix_exactly_once() {
        let pad = test_pad(2048);
        let first = pad.consume_back(16).expect("first");
        let second = pad.consume_back(16).expect("second");

        assert_eq!(&*first, &pad.bytes()[2048 - 16..]);
        assert_eq!(&*second, &pad.bytes()[2048 - 32..2048 - 16]);
        assert_eq!(pad.consumed_back(), 32);
    }

    #[test]
    fn cursors_never_cross() {
        let pad = Pad::restore(vec![7u8; 1024], 0, 0).expect("pad");
        pad.consume_front(1000).expect("front");
        let err = pad.consume_back(25).expect_err("must exhaust");
        assert!(matches!(
            err,
            PadlinkError::PadExhausted {
                requested: 25,
                remaining: 24
            }
        ));
        // A failed call leaves the cursors untouched.
        assert_eq!(pad.consumed_back(), 0);
        pad.consume_back(24).expect("exact remainder");
        assert!(pad.is_exhausted());
        assert!(matches!(
            pad.consume_front(1),
            Err(PadlinkError::PadExhausted { .. })
        ));
    }

    #[test]
    fn restore_round_trips_consumption_state() {
        let pad = test_pad(2048);
        pad.consume_front(100).expect("front");
        pad.consume_back(50).expect("back");

        let restored = Pad::restore(
            pad.bytes().to_vec(),
            pad.consumed_front(),
            pad.consumed_back(),
        )
        .expect("restore");
        assert_eq!(restored.remaining(), pad.remaining());
        // The restored pad continues where the original left off.
        assert_eq!(&*restored.consume_front(8).expect("next"), &pad.bytes()[100..108]);
    }

    #[test]
    fn restore_rejects_overrun_cursors() {
        assert!(matches!(
            Pad::restore(vec![0u8; 100], 60, 41),
            Err(PadlinkError::InvalidState(_))
        ));
        assert!(Pad::restore(vec![0u8; 100], 60, 40).is_ok());
        assert!(matches!(
            Pad::restore(Vec::new(), 0, 0),
            Err(PadlinkError::InvalidState(_))
        ));
        assert!(matches!(
            Pad::restore(vec![0u8; 8], usize::MAX, 1),
            Err(PadlinkError::InvalidState(_))
        ));
    }

    #[test]
    fn concurrent_consumers_never_overlap() {
        use std::collections::HashSet;
        use std::sync::Arc;

        // Every 4-byte aligned chunk starts with a distinct u16, so the
        // first two bytes identify the exact range that was handed out.
        let bytes: Vec<u8> = (0..1024u16).flat_map(u16::to_be_bytes).collect();
        let pad = Arc::new(Pad::restore(bytes, 0, 0).expect("pad"));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pad = Arc::clone(&pad);
            handles.push(std::thread::spawn(move || {
                let mut ranges = Vec::new();
                for _ in 0..100 {
                    if let Ok(chunk) = pad.consume_front(4) {
                        ranges.push(chunk.to_vec());
                    }
                }
                ranges
            }));
        }

        let mut starts = HashSet::new();
        let mut issued = 0usize;
        for handle in handles {
            for chunk in handle.join().expect("join") {
                let start = u16::from_be_bytes([chunk[0], chunk[1]]);
                assert!(starts.insert(start), "byte range issued twice");
                issued += chunk.len();
            }
        }
        assert_eq!(issued, pad.consumed_front());
        assert_eq!(pad.consumed_front(), 4 * 4 * 100);
    }
}
