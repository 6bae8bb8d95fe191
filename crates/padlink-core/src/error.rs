use thiserror::Error;

/// Canonical error type exposed by the ceremony primitives.
#[derive(Debug, Error)]
pub enum PadlinkError {
    /// A consume call would hand out more bytes than the pad has left.
    /// Fatal for further sends on that conversation; never retried.
    #[error("pad exhausted: requested {requested} bytes, {remaining} remaining")]
    PadExhausted {
        /// Bytes the caller asked for.
        requested: usize,
        /// Unused bytes left between the two cursors.
        remaining: usize,
    },

    /// OTP key material shorter than the data it must cover. Indicates a
    /// caller bug in cursor usage rather than a runtime condition.
    #[error("key too short: {key_len} key bytes for {data_len} data bytes")]
    KeyTooShort {
        /// Length of the supplied key slice.
        key_len: usize,
        /// Length of the data to transform.
        data_len: usize,
    },

    /// Malformed persisted pad or invalid construction parameters.
    #[error("invalid pad state: {0}")]
    InvalidState(&'static str),

    /// Malformed or mismatched fountain frame. Rejected frames never
    /// corrupt decoder state; callers keep scanning.
    #[error("invalid frame: {0}")]
    InvalidFrame(&'static str),

    /// Decode result requested before all source blocks were solved.
    #[error("incomplete decode: {solved} of {total} blocks solved")]
    IncompleteDecode {
        /// Source blocks recovered so far.
        solved: usize,
        /// Total source blocks in the stream.
        total: usize,
    },

    /// The spoken mnemonic does not match the one derived from the pad.
    /// The freshly exchanged pad must be discarded.
    #[error("mnemonic checksum mismatch")]
    ChecksumMismatch,

    /// Passphrase key derivation failure.
    #[error("passphrase derivation failure: {0}")]
    Passphrase(&'static str),
}
