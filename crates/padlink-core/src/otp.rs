//! The one-time-pad cipher primitive.
//!
//! A plain byte-wise XOR of equal-length inputs. The primitive carries no
//! state; the exactly-once guarantee lives entirely in
//! [`Pad`](crate::pad::Pad)'s consumption cursors, which callers must use
//! to source the key slice.

use crate::error::PadlinkError;

/// XOR `plaintext` with `key`.
///
/// The key must be at least as long as the data; trailing key bytes are
/// ignored. A short key is a cursor-usage bug in the caller, surfaced as
/// [`PadlinkError::KeyTooShort`].
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, PadlinkError> {
    if key.len() < plaintext.len() {
        return Err(PadlinkError::KeyTooShort {
            key_len: key.len(),
            data_len: plaintext.len(),
        });
    }
    Ok(plaintext
        .iter()
        .zip(key.iter())
        .map(|(byte, key_byte)| byte ^ key_byte)
        .collect())
}

/// XOR `ciphertext` with `key`. The transform is an involution, so this is
/// the same operation as [`encrypt`]; the separate name keeps call sites
/// readable.
pub fn decrypt(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, PadlinkError> {
    encrypt(key, ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_identity() {
        let key = b"0123456789abcdef";
        let plaintext = b"attack at dawn";

        let ciphertext = encrypt(key, plaintext).expect("encrypt");
        assert_ne!(&ciphertext, plaintext);
        let recovered = decrypt(key, &ciphertext).expect("decrypt");
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn empty_plaintext_is_fine() {
        assert_eq!(encrypt(b"key", b"").expect("encrypt"), Vec::<u8>::new());
        assert_eq!(encrypt(b"", b"").expect("encrypt"), Vec::<u8>::new());
    }

    #[test]
    fn short_key_is_rejected() {
        let err = encrypt(b"ab", b"abc").expect_err("must fail");
        assert!(matches!(
            err,
            PadlinkError::KeyTooShort {
                key_len: 2,
                data_len: 3
            }
        ));
    }

    #[test]
    fn xor_against_known_vector() {
        let key = [0xffu8, 0x00, 0x0f];
        let data = [0x12u8, 0x34, 0x56];
        assert_eq!(encrypt(&key, &data).expect("encrypt"), vec![0xed, 0x34, 0x59]);
    }
}
