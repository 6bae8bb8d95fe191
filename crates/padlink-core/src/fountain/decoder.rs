//! Frame receiver: peel-and-solve decoding of the fountain stream.

use std::collections::HashSet;

use zeroize::Zeroizing;

use crate::error::PadlinkError;
use crate::fountain::degree::{self, DegreeTable};
use crate::fountain::frame::Frame;
use crate::fountain::mask::FrameMask;
use crate::fountain::{xor_in_place, MAX_SOURCE_COUNT};
use crate::metadata::CeremonyMetadata;

/// The recovered ceremony payload.
pub struct DecodedCeremony {
    /// Channel configuration from the payload header.
    pub metadata: CeremonyMetadata,
    /// The pad byte sequence, zeroed on drop.
    pub pad_bytes: Zeroizing<Vec<u8>>,
    /// Frames that contributed information to the solution.
    pub frames_used: usize,
}

/// Mutable receiver state for one ceremony.
///
/// Frames may arrive in any order and multiplicity; duplicates are ignored
/// idempotently and malformed frames are rejected without touching state,
/// because transient camera misreads are a normal part of scanning. Calls
/// must be serialized per instance (one per scanned frame, in arrival
/// order); arrival order does not affect the outcome.
pub struct FountainDecoder {
    mask: Option<FrameMask>,
    stream: Option<Stream>,
    solved: Vec<Option<Zeroizing<Vec<u8>>>>,
    solved_count: usize,
    pending: Vec<Equation>,
    seen: HashSet<u32>,
    frames_used: usize,
}

/// Geometry locked in from the first accepted frame.
struct Stream {
    seed: u64,
    payload_len: u32,
    block_size: u16,
    source_count: usize,
    degrees: DegreeTable,
}

/// One not-yet-solved XOR relation over source blocks.
struct Equation {
    indices: Vec<usize>,
    payload: Zeroizing<Vec<u8>>,
}

impl FountainDecoder {
    /// Create a decoder. The passphrase must match the encoder's for the
    /// stream to unmask to the real payload; a mismatch is not detected
    /// here but by the mnemonic comparison afterwards.
    pub fn new(passphrase: Option<&str>) -> Result<Self, PadlinkError> {
        Ok(Self {
            mask: passphrase.map(FrameMask::new).transpose()?,
            stream: None,
            solved: Vec::new(),
            solved_count: 0,
            pending: Vec::new(),
            seen: HashSet::new(),
            frames_used: 0,
        })
    }

    /// Parse and fold in a scanned frame in wire form. Returns whether
    /// decoding is now complete.
    pub fn add_frame_bytes(&mut self, bytes: &[u8]) -> Result<bool, PadlinkError> {
        let frame = Frame::from_bytes(bytes)?;
        self.add_frame(frame)
    }

    /// Fold in a parsed frame. Returns whether decoding is now complete.
    pub fn add_frame(&mut self, frame: Frame) -> Result<bool, PadlinkError> {
        self.check_geometry(&frame)?;
        if self.stream.is_none() {
            self.init_stream(&frame);
        }

        // Idempotent on duplicates: the frame content is a pure function
        // of its index, so a seen index carries no new information.
        if !self.seen.insert(frame.index) {
            return Ok(self.is_complete());
        }
        if self.is_complete() {
            return Ok(true);
        }

        let stream = self
            .stream
            .as_ref()
            .ok_or(PadlinkError::InvalidFrame("stream not initialized"))?;

        let mut payload = Zeroizing::new(frame.payload);
        if let Some(mask) = &self.mask {
            mask.apply(frame.index, &mut payload);
        }
        let indices = degree::source_indices(&stream.degrees, stream.seed, frame.index);

        let mut equation = Equation { indices, payload };
        self.reduce(&mut equation);
        match equation.indices.len() {
            // Fully redundant: everything it references is already solved.
            // Nonzero residue means the frame disagrees with the solution
            // (wrong passphrase, corruption); either way it is discarded
            // and scanning continues.
            0 => {}
            1 => {
                self.frames_used += 1;
                let index = equation.indices[0];
                self.solve(index, equation.payload);
            }
            _ => {
                self.frames_used += 1;
                self.pending.push(equation);
            }
        }

        Ok(self.is_complete())
    }

    /// Number of source blocks, 0 until the first frame arrives.
    pub fn source_count(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.source_count)
    }

    /// Distinct frame indices accepted so far.
    pub fn unique_frames_received(&self) -> usize {
        self.seen.len()
    }

    /// Frames that contributed information to the solution so far.
    pub fn frames_used(&self) -> usize {
        self.frames_used
    }

    /// Solved fraction in `[0, 1]`, monotonically non-decreasing. Drives
    /// UI progress bars.
    pub fn progress(&self) -> f64 {
        match &self.stream {
            None => 0.0,
            Some(stream) => self.solved_count as f64 / stream.source_count as f64,
        }
    }

    /// True once every source block is solved.
    pub fn is_complete(&self) -> bool {
        self.stream
            .as_ref()
            .is_some_and(|s| self.solved_count == s.source_count)
    }

    /// Recover the ceremony payload: metadata parsed off the front, block
    /// padding stripped via the true payload length.
    pub fn result(&self) -> Result<DecodedCeremony, PadlinkError> {
        let stream = match &self.stream {
            Some(stream) if self.solved_count == stream.source_count => stream,
            _ => {
                return Err(PadlinkError::IncompleteDecode {
                    solved: self.solved_count,
                    total: self.source_count(),
                })
            }
        };

        let mut payload = Zeroizing::new(Vec::with_capacity(
            stream.source_count * usize::from(stream.block_size),
        ));
        for block in &self.solved {
            match block {
                Some(block) => payload.extend_from_slice(block),
                None => {
                    return Err(PadlinkError::IncompleteDecode {
                        solved: self.solved_count,
                        total: stream.source_count,
                    })
                }
            }
        }
        payload.truncate(stream.payload_len as usize);

        let (metadata, header_len) = CeremonyMetadata::from_bytes(&payload)?;
        let pad_bytes = Zeroizing::new(payload[header_len..].to_vec());

        Ok(DecodedCeremony {
            metadata,
            pad_bytes,
            frames_used: self.frames_used,
        })
    }

    /// Zero and drop all solved and partial block buffers. Runs implicitly
    /// on drop as well; the explicit call supports synchronous cancellation.
    pub fn close(&mut self) {
        self.solved.clear();
        self.pending.clear();
        self.seen.clear();
        self.solved_count = 0;
        self.stream = None;
    }

    /// Validate a frame against the locked-in stream geometry.
    fn check_geometry(&self, frame: &Frame) -> Result<(), PadlinkError> {
        if frame.block_size == 0 || frame.payload_len == 0 {
            return Err(PadlinkError::InvalidFrame("empty geometry"));
        }
        if frame.payload.len() != usize::from(frame.block_size) {
            return Err(PadlinkError::InvalidFrame("payload is not one block"));
        }
        if frame.source_count() > MAX_SOURCE_COUNT {
            return Err(PadlinkError::InvalidFrame("implausible source count"));
        }
        if let Some(stream) = &self.stream {
            let matches = frame.seed == stream.seed
                && frame.payload_len == stream.payload_len
                && frame.block_size == stream.block_size;
            if !matches {
                return Err(PadlinkError::InvalidFrame("frame from another stream"));
            }
        }
        Ok(())
    }

    fn init_stream(&mut self, frame: &Frame) {
        let source_count = frame.source_count();
        self.solved = (0..source_count).map(|_| None).collect();
        self.stream = Some(Stream {
            seed: frame.seed,
            payload_len: frame.payload_len,
            block_size: frame.block_size,
            source_count,
            degrees: DegreeTable::new(source_count),
        });
    }

    /// XOR already-solved blocks out of an equation.
    fn reduce(&self, equation: &mut Equation) {
        let Equation { indices, payload } = equation;
        indices.retain(|&index| match &self.solved[index] {
            Some(block) => {
                xor_in_place(payload, block);
                false
            }
            None => true,
        });
    }

    /// Record a newly solved block and peel: every pending equation that
    /// references it is simplified, and equations that drop to a single
    /// unknown solve further blocks, recursively.
    fn solve(&mut self, index: usize, payload: Zeroizing<Vec<u8>>) {
        let mut worklist = vec![(index, payload)];

        while let Some((solved_index, block)) = worklist.pop() {
            if self.solved[solved_index].is_some() {
                // Conflicting re-derivation (wrong passphrase or corrupt
                // frame): first solution wins, the rest is discarded.
                continue;
            }
            self.solved[solved_index] = Some(block.clone());
            self.solved_count += 1;

            let mut i = 0;
            while i < self.pending.len() {
                let equation = &mut self.pending[i];
                if let Some(position) =
                    equation.indices.iter().position(|&idx| idx == solved_index)
                {
                    equation.indices.swap_remove(position);
                    xor_in_place(&mut equation.payload, &block);
                }

                match self.pending[i].indices.len() {
                    0 => {
                        // Redundant or inconsistent either way; drop it.
                        self.pending.swap_remove(i);
                    }
                    1 => {
                        let equation = self.pending.swap_remove(i);
                        if self.solved[equation.indices[0]].is_none() {
                            worklist.push((equation.indices[0], equation.payload));
                        }
                    }
                    _ => i += 1,
                }
            }
        }
    }
}

impl Drop for FountainDecoder {
    fn drop(&mut self) {
        self.close();
    }
}
