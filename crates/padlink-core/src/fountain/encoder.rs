//! Frame generator: the sender half of the fountain code.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::PadlinkError;
use crate::fountain::degree::{self, DegreeTable};
use crate::fountain::frame::Frame;
use crate::fountain::mask::FrameMask;
use crate::fountain::xor_in_place;
use crate::metadata::CeremonyMetadata;

/// Streams `metadata || pad` as an unbounded, deterministic sequence of
/// encoded frames.
///
/// `generate_frame` is a pure function of the frozen configuration and the
/// frame index, with no hidden mutable state, so a pre-generation pass and
/// a live display loop may call it concurrently, and any frame can be
/// re-displayed at any time.
pub struct FountainEncoder {
    blocks: Vec<Zeroizing<Vec<u8>>>,
    degrees: DegreeTable,
    block_size: u16,
    payload_len: u32,
    seed: u64,
    mask: Option<FrameMask>,
}

impl FountainEncoder {
    /// Build an encoder with a fresh random per-ceremony seed.
    pub fn new(
        metadata: &CeremonyMetadata,
        pad_bytes: &[u8],
        block_size: u16,
        passphrase: Option<&str>,
    ) -> Result<Self, PadlinkError> {
        let mut seed_bytes = [0u8; 8];
        OsRng.fill_bytes(&mut seed_bytes);
        Self::with_seed(
            metadata,
            pad_bytes,
            block_size,
            passphrase,
            u64::from_be_bytes(seed_bytes),
        )
    }

    /// Build an encoder with an explicit seed. Two encoders with identical
    /// configuration and seed emit identical frame sequences; tests and
    /// resumed ceremonies rely on this.
    pub fn with_seed(
        metadata: &CeremonyMetadata,
        pad_bytes: &[u8],
        block_size: u16,
        passphrase: Option<&str>,
        seed: u64,
    ) -> Result<Self, PadlinkError> {
        if block_size == 0 {
            return Err(PadlinkError::InvalidState("block size must be nonzero"));
        }

        let header = metadata.to_bytes()?;
        let mut payload = Zeroizing::new(Vec::with_capacity(header.len() + pad_bytes.len()));
        payload.extend_from_slice(&header);
        payload.extend_from_slice(pad_bytes);

        let payload_len = u32::try_from(payload.len())
            .map_err(|_| PadlinkError::InvalidState("payload too large"))?;

        // Last block zero-padded; payload_len in the frame header lets the
        // decoder strip the padding again.
        let block = usize::from(block_size);
        let blocks: Vec<Zeroizing<Vec<u8>>> = payload
            .chunks(block)
            .map(|chunk| {
                let mut buffer = Zeroizing::new(vec![0u8; block]);
                buffer[..chunk.len()].copy_from_slice(chunk);
                buffer
            })
            .collect();

        if blocks.len() > super::MAX_SOURCE_COUNT {
            return Err(PadlinkError::InvalidState(
                "block size too small for payload",
            ));
        }

        let mask = passphrase.map(FrameMask::new).transpose()?;

        Ok(Self {
            degrees: DegreeTable::new(blocks.len()),
            blocks,
            block_size,
            payload_len,
            seed,
            mask,
        })
    }

    /// Number of source blocks the payload was split into.
    pub fn source_count(&self) -> usize {
        self.blocks.len()
    }

    /// Source block size for this stream.
    pub fn block_size(&self) -> u16 {
        self.block_size
    }

    /// True payload length: serialized metadata plus pad bytes.
    pub fn total_size(&self) -> usize {
        self.payload_len as usize
    }

    /// The per-ceremony seed embedded in every frame header.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate frame `index`. Indices below `source_count` yield the
    /// source blocks verbatim; the rest are XOR combinations chosen
    /// deterministically from `(seed, index)`.
    pub fn generate_frame(&self, index: u32) -> Frame {
        let indices = degree::source_indices(&self.degrees, self.seed, index);
        let mut payload = vec![0u8; usize::from(self.block_size)];
        for block_index in indices {
            xor_in_place(&mut payload, &self.blocks[block_index]);
        }
        if let Some(mask) = &self.mask {
            mask.apply(index, &mut payload);
        }

        Frame {
            index,
            seed: self.seed,
            payload_len: self.payload_len,
            block_size: self.block_size,
            payload,
        }
    }

    /// Frame `index` in wire form, ready for base64/QR rendering.
    pub fn generate_frame_bytes(&self, index: u32) -> Vec<u8> {
        self.generate_frame(index).to_bytes()
    }

    /// Release the encoder, zeroing the source blocks (which contain the
    /// pad) and the mask key.
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::NotificationFlags;

    fn metadata() -> CeremonyMetadata {
        CeremonyMetadata::new(3600, 0, NotificationFlags::default(), "https://r.example")
            .expect("metadata")
    }

    #[test]
    fn systematic_frames_are_source_blocks() {
        let metadata = metadata();
        let pad = vec![0xabu8; 700];
        let encoder =
            FountainEncoder::with_seed(&metadata, &pad, 256, None, 11).expect("encoder");

        let header = metadata.to_bytes().expect("header");
        assert_eq!(encoder.total_size(), header.len() + 700);
        assert_eq!(
            encoder.source_count(),
            (header.len() + 700).div_ceil(256)
        );

        let frame_0 = encoder.generate_frame(0);
        assert_eq!(&frame_0.payload[..header.len()], &header[..]);
        assert_eq!(frame_0.payload[header.len()], 0xab);

        // Final block is zero-padded past the payload end.
        let last = encoder.generate_frame(encoder.source_count() as u32 - 1);
        let tail = encoder.total_size() % 256;
        assert!(last.payload[tail..].iter().all(|&b| b == 0));
    }

    #[test]
    fn generation_is_pure_and_repeatable() {
        let metadata = metadata();
        let pad = vec![0x11u8; 1000];
        let a = FountainEncoder::with_seed(&metadata, &pad, 128, None, 77).expect("a");
        let b = FountainEncoder::with_seed(&metadata, &pad, 128, None, 77).expect("b");

        for index in 0..64u32 {
            let frame = a.generate_frame(index);
            assert_eq!(frame, a.generate_frame(index), "same encoder");
            assert_eq!(frame, b.generate_frame(index), "same config");
        }
    }

    #[test]
    fn coded_frames_mix_multiple_blocks() {
        let metadata = metadata();
        let pad = vec![0x42u8; 4096];
        let encoder =
            FountainEncoder::with_seed(&metadata, &pad, 128, None, 5).expect("encoder");
        let source_count = encoder.source_count() as u32;

        // Not every coded frame has degree > 1, but some in a short run must.
        let mixed = (source_count..source_count + 32)
            .map(|i| encoder.generate_frame(i))
            .any(|frame| {
                (0..source_count).all(|j| frame.payload != encoder.generate_frame(j).payload)
            });
        assert!(mixed);
    }

    #[test]
    fn mask_changes_payload_but_not_header() {
        let metadata = metadata();
        let pad = vec![0x33u8; 512];
        let clear = FountainEncoder::with_seed(&metadata, &pad, 128, None, 9).expect("clear");
        let masked =
            FountainEncoder::with_seed(&metadata, &pad, 128, Some("phrase"), 9).expect("masked");

        let clear_frame = clear.generate_frame(0);
        let masked_frame = masked.generate_frame(0);
        assert_ne!(clear_frame.payload, masked_frame.payload);
        assert_eq!(clear_frame.index, masked_frame.index);
        assert_eq!(clear_frame.seed, masked_frame.seed);
        assert_eq!(clear_frame.payload_len, masked_frame.payload_len);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        assert!(matches!(
            FountainEncoder::with_seed(&metadata(), &[1, 2, 3], 0, None, 1),
            Err(PadlinkError::InvalidState(_))
        ));
    }
}
