//! Frame wire format.
//!
//! Every frame is self-describing: the header carries the stream seed and
//! payload geometry, so a receiver can join mid-stream from any frame and
//! needs no out-of-band setup. Layout, big-endian:
//!
//! ```text
//! index u32 || seed u64 || payload_len u32 || block_size u16 || payload
//! ```
//!
//! The payload is exactly `block_size` bytes and is the only part touched
//! by the optional passphrase mask; the header stays clear so the mask
//! keystream can be keyed by frame index.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::PadlinkError;

/// Byte length of the fixed frame header.
pub const FRAME_HEADER_LEN: usize = 18;

/// One encoded frame of the fountain stream. Frames are stateless and
/// reproducible from their index alone given the encoder configuration; a
/// frame has no identity beyond its index and content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Position in the unbounded frame sequence.
    pub index: u32,
    /// Per-ceremony seed all frames of one stream share.
    pub seed: u64,
    /// True payload length before block padding.
    pub payload_len: u32,
    /// Source block size for this stream.
    pub block_size: u16,
    /// XOR-combined (and possibly masked) block contents, exactly
    /// `block_size` bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Number of source blocks in the stream this frame belongs to.
    pub fn source_count(&self) -> usize {
        let block = usize::from(self.block_size);
        (self.payload_len as usize).div_ceil(block)
    }

    /// Serialize to the wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAME_HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.index.to_be_bytes());
        out.extend_from_slice(&self.seed.to_be_bytes());
        out.extend_from_slice(&self.payload_len.to_be_bytes());
        out.extend_from_slice(&self.block_size.to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse the wire form. Every malformed-input path is
    /// [`PadlinkError::InvalidFrame`]; a failed parse has no side effects.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PadlinkError> {
        if bytes.len() < FRAME_HEADER_LEN {
            return Err(PadlinkError::InvalidFrame("frame header truncated"));
        }
        let index = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let seed = u64::from_be_bytes([
            bytes[4], bytes[5], bytes[6], bytes[7], bytes[8], bytes[9], bytes[10], bytes[11],
        ]);
        let payload_len = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        let block_size = u16::from_be_bytes([bytes[16], bytes[17]]);

        if block_size == 0 {
            return Err(PadlinkError::InvalidFrame("zero block size"));
        }
        if payload_len == 0 {
            return Err(PadlinkError::InvalidFrame("zero payload length"));
        }
        let payload = &bytes[FRAME_HEADER_LEN..];
        if payload.len() != usize::from(block_size) {
            return Err(PadlinkError::InvalidFrame("payload is not one block"));
        }

        Ok(Self {
            index,
            seed,
            payload_len,
            block_size,
            payload: payload.to_vec(),
        })
    }

    /// The base64 text that actually lands inside a QR code image.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Parse a scanned QR text payload.
    pub fn from_base64(text: &str) -> Result<Self, PadlinkError> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|_| PadlinkError::InvalidFrame("invalid base64"))?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame {
            index: 7,
            seed: 0xdead_beef_0123_4567,
            payload_len: 4000,
            block_size: 1500,
            payload: vec![0x5a; 1500],
        }
    }

    #[test]
    fn wire_round_trip() {
        let frame = sample();
        let bytes = frame.to_bytes();
        assert_eq!(bytes.len(), FRAME_HEADER_LEN + 1500);
        assert_eq!(Frame::from_bytes(&bytes).expect("parse"), frame);
    }

    #[test]
    fn base64_round_trip() {
        let frame = sample();
        let text = frame.to_base64();
        assert_eq!(Frame::from_base64(&text).expect("parse"), frame);
        // Scanned text often carries stray whitespace.
        assert_eq!(
            Frame::from_base64(&format!("  {text}\n")).expect("parse"),
            frame
        );
    }

    #[test]
    fn source_count_rounds_up() {
        let mut frame = sample();
        assert_eq!(frame.source_count(), 3);
        frame.payload_len = 4500;
        assert_eq!(frame.source_count(), 3);
        frame.payload_len = 4501;
        assert_eq!(frame.source_count(), 4);
        frame.payload_len = 1;
        assert_eq!(frame.source_count(), 1);
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        let bytes = sample().to_bytes();

        assert!(matches!(
            Frame::from_bytes(&bytes[..FRAME_HEADER_LEN - 1]),
            Err(PadlinkError::InvalidFrame(_))
        ));
        assert!(matches!(
            Frame::from_bytes(&bytes[..bytes.len() - 1]),
            Err(PadlinkError::InvalidFrame(_))
        ));

        let mut zero_block = bytes.clone();
        zero_block[16] = 0;
        zero_block[17] = 0;
        assert!(matches!(
            Frame::from_bytes(&zero_block),
            Err(PadlinkError::InvalidFrame(_))
        ));

        let mut zero_len = bytes;
        zero_len[12..16].copy_from_slice(&[0; 4]);
        assert!(matches!(
            Frame::from_bytes(&zero_len),
            Err(PadlinkError::InvalidFrame(_))
        ));

        assert!(matches!(
            Frame::from_base64("not!base64!!"),
            Err(PadlinkError::InvalidFrame(_))
        ));
    }
}
