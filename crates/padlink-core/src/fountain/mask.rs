//! Optional passphrase obscuration of frame payloads.
//!
//! With a passphrase in play, photographing the QR sequence is no longer
//! enough to steal the pad; the attacker also needs the phrase spoken
//! between the two people holding the devices. The mask is deliberately
//! unauthenticated: a wrong passphrase unmasks to well-formed garbage that
//! decodes normally and is only caught when the mnemonics disagree.

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use crate::error::PadlinkError;
use crate::fountain::xor_in_place;

const SALT_CONTEXT: &str = "padlink v1 frame mask salt";

// Argon2id cost: 19 MiB, 2 passes, 1 lane. The KDF runs once per ceremony
// on a phone while the other party waits, so the memory cost stays modest.
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_LANES: u32 = 1;

/// Passphrase-derived keystream generator, shared by encoder and decoder.
pub(crate) struct FrameMask {
    key: Zeroizing<[u8; 32]>,
}

impl FrameMask {
    /// Stretch `passphrase` into a 32-byte mask key with Argon2id.
    ///
    /// The salt is a fixed domain-derived constant: both devices must
    /// arrive at the same key with nothing but the phrase, so there is no
    /// channel to carry a random salt. The hardening against precomputation
    /// therefore rests on the memory-hard cost alone.
    pub fn new(passphrase: &str) -> Result<Self, PadlinkError> {
        let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_ITERATIONS, ARGON2_LANES, Some(32))
            .map_err(|_| PadlinkError::Passphrase("invalid argon2 parameters"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = blake3::hash(SALT_CONTEXT.as_bytes());
        let mut key = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(passphrase.as_bytes(), &salt.as_bytes()[..16], &mut *key)
            .map_err(|_| PadlinkError::Passphrase("argon2 expansion failed"))?;

        Ok(Self { key })
    }

    /// XOR the keystream for `frame_index` into `payload`. Applying twice
    /// restores the original, so mask and unmask are the same call.
    pub fn apply(&self, frame_index: u32, payload: &mut [u8]) {
        let mut keystream = Zeroizing::new(vec![0u8; payload.len()]);
        blake3::Hasher::new_keyed(&self.key)
            .update(&frame_index.to_be_bytes())
            .finalize_xof()
            .fill(&mut keystream);
        xor_in_place(payload, &keystream);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_an_involution() {
        let mask = FrameMask::new("correct horse").expect("mask");
        let original = vec![0x42u8; 128];

        let mut payload = original.clone();
        mask.apply(3, &mut payload);
        assert_ne!(payload, original);
        mask.apply(3, &mut payload);
        assert_eq!(payload, original);
    }

    #[test]
    fn keystream_differs_per_index_and_passphrase() {
        let mask_a = FrameMask::new("alpha").expect("mask");
        let mask_b = FrameMask::new("beta").expect("mask");

        let mut index_0 = vec![0u8; 64];
        let mut index_1 = vec![0u8; 64];
        mask_a.apply(0, &mut index_0);
        mask_a.apply(1, &mut index_1);
        assert_ne!(index_0, index_1);

        let mut other_phrase = vec![0u8; 64];
        mask_b.apply(0, &mut other_phrase);
        assert_ne!(index_0, other_phrase);
    }

    #[test]
    fn same_passphrase_agrees_across_instances() {
        let sender = FrameMask::new("shared phrase").expect("mask");
        let receiver = FrameMask::new("shared phrase").expect("mask");

        let mut masked = vec![0x99u8; 32];
        sender.apply(12, &mut masked);
        receiver.apply(12, &mut masked);
        assert_eq!(masked, vec![0x99u8; 32]);
    }
}
