//! Deterministic channel derivation from the pad byte sequence.
//!
//! Both devices finish the ceremony holding bit-identical pad bytes, so
//! every value here can be computed independently on each side and is
//! guaranteed to agree without further negotiation. All functions read the
//! full byte sequence and ignore consumption state.
//!
//! Domain separation: each output applies BLAKE3 `derive_key` with its own
//! context string, so the three tokens and the mnemonic never collide even
//! though they come from the same pad.

use sha2::{Digest, Sha256};

use crate::error::PadlinkError;
use crate::pad::Pad;
use crate::wordlist::WORDS;

const CONVERSATION_ID_CONTEXT: &str = "padlink v1 conversation-id";
const AUTH_TOKEN_CONTEXT: &str = "padlink v1 auth-token";
const BURN_TOKEN_CONTEXT: &str = "padlink v1 burn-token";
const MNEMONIC_CONTEXT: &str = "padlink v1 mnemonic";

/// Number of words in the spoken checksum.
pub const MNEMONIC_WORDS: usize = 6;

/// The three relay-facing identifiers of a conversation, bundled for
/// callers that register a channel in one shot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedTokens {
    /// Public channel identifier, 32 hex chars.
    pub conversation_id: String,
    /// Bearer token authorizing message submission, 64 hex chars.
    pub auth_token: String,
    /// Bearer token authorizing channel destruction, 64 hex chars.
    pub burn_token: String,
}

/// Derive all three tokens at once.
pub fn derive_tokens(pad: &Pad) -> DerivedTokens {
    DerivedTokens {
        conversation_id: conversation_id(pad),
        auth_token: auth_token(pad),
        burn_token: burn_token(pad),
    }
}

/// Public identifier both devices use to address the shared channel on a
/// relay. 16 bytes of a domain-separated digest, lowercase hex.
pub fn conversation_id(pad: &Pad) -> String {
    hex::encode(&blake3::derive_key(CONVERSATION_ID_CONTEXT, pad.bytes())[..16])
}

/// Token a device presents when submitting messages. Full 32-byte digest,
/// lowercase hex.
pub fn auth_token(pad: &Pad) -> String {
    hex::encode(blake3::derive_key(AUTH_TOKEN_CONTEXT, pad.bytes()))
}

/// Token a device presents when burning the channel.
pub fn burn_token(pad: &Pad) -> String {
    hex::encode(blake3::derive_key(BURN_TOKEN_CONTEXT, pad.bytes()))
}

/// One-way hash of a token, lowercase hex. A relay stores this at
/// registration and later compares it against the raw token presented on
/// submission, so the registration step never reveals the token itself.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Derive the six-word spoken checksum from the pad bytes.
///
/// The digest is split into six 16-bit big-endian segments, each reduced
/// modulo the wordlist size. Collision resistance here only needs to make
/// accidental agreement between unrelated pads astronomically unlikely;
/// humans compare the words out loud, they do not feed them back into any
/// key derivation.
pub fn generate_mnemonic(pad: &Pad) -> [&'static str; MNEMONIC_WORDS] {
    let digest = blake3::derive_key(MNEMONIC_CONTEXT, pad.bytes());
    let mut words = [""; MNEMONIC_WORDS];
    for (i, word) in words.iter_mut().enumerate() {
        let segment = u16::from_be_bytes([digest[2 * i], digest[2 * i + 1]]);
        *word = WORDS[usize::from(segment) % WORDS.len()];
    }
    words
}

/// Compare a spoken mnemonic against the one derived from `pad`.
///
/// Case-insensitive; surrounding whitespace on each word is ignored. Any
/// difference is [`PadlinkError::ChecksumMismatch`], after which the caller
/// must discard the freshly exchanged pad: a mismatch can mean a wrong
/// passphrase, an eavesdropper, or transfer corruption that happened to
/// still complete.
pub fn verify_mnemonic<S: AsRef<str>>(pad: &Pad, spoken: &[S]) -> Result<(), PadlinkError> {
    let expected = generate_mnemonic(pad);
    if spoken.len() != expected.len() {
        return Err(PadlinkError::ChecksumMismatch);
    }
    for (said, word) in spoken.iter().zip(expected.iter()) {
        if !said.as_ref().trim().eq_ignore_ascii_case(word) {
            return Err(PadlinkError::ChecksumMismatch);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad_from(entropy: &[u8]) -> Pad {
        Pad::from_entropy(entropy, 4096).expect("pad")
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = pad_from(b"derivation entropy");
        let b = pad_from(b"derivation entropy");

        assert_eq!(conversation_id(&a), conversation_id(&b));
        assert_eq!(auth_token(&a), auth_token(&b));
        assert_eq!(burn_token(&a), burn_token(&b));
        assert_eq!(generate_mnemonic(&a), generate_mnemonic(&b));
    }

    #[test]
    fn tokens_are_pairwise_distinct() {
        let pad = pad_from(b"distinct tokens");
        let tokens = derive_tokens(&pad);

        assert_ne!(tokens.conversation_id, tokens.auth_token);
        assert_ne!(tokens.auth_token, tokens.burn_token);
        assert_ne!(tokens.conversation_id, tokens.burn_token);
    }

    #[test]
    fn different_pads_disagree() {
        let a = pad_from(b"pad one");
        let b = pad_from(b"pad two");

        assert_ne!(conversation_id(&a), conversation_id(&b));
        assert_ne!(generate_mnemonic(&a), generate_mnemonic(&b));
    }

    #[test]
    fn token_formats() {
        let pad = pad_from(b"formats");
        let id = conversation_id(&pad);
        let auth = auth_token(&pad);

        assert_eq!(id.len(), 32);
        assert_eq!(auth.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_token_matches_sha256() {
        let hash = hash_token("abc");
        // SHA-256("abc"), the FIPS 180 test vector.
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn mnemonic_words_come_from_the_list() {
        let pad = pad_from(b"wordlist membership");
        for word in generate_mnemonic(&pad) {
            assert!(WORDS.contains(&word));
        }
    }

    #[test]
    fn verify_mnemonic_accepts_case_and_whitespace() {
        let pad = pad_from(b"spoken words");
        let spoken: Vec<String> = generate_mnemonic(&pad)
            .iter()
            .map(|w| format!(" {} ", w.to_uppercase()))
            .collect();
        verify_mnemonic(&pad, &spoken).expect("must match");
    }

    #[test]
    fn verify_mnemonic_rejects_any_difference() {
        let pad = pad_from(b"spoken words");
        let mut spoken: Vec<String> =
            generate_mnemonic(&pad).iter().map(|w| (*w).to_owned()).collect();

        assert!(matches!(
            verify_mnemonic(&pad, &spoken[..5]),
            Err(PadlinkError::ChecksumMismatch)
        ));

        spoken[3] = "wrongword".to_owned();
        assert!(matches!(
            verify_mnemonic(&pad, &spoken),
            Err(PadlinkError::ChecksumMismatch)
        ));
    }
}
