//! Deterministic frame composition: which source blocks a frame XORs.
//!
//! Both ends must agree exactly, so randomness comes from a `ChaCha8Rng`
//! seeded from the per-ceremony seed and the frame index; `rand_chacha`
//! streams are portable and stable across platforms, unlike `StdRng`.
//! Degrees follow a robust soliton distribution, which keeps most coded
//! frames at degree 1–3 so the peeling decoder makes early progress.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Robust soliton shape parameters, shared by every ceremony.
const SOLITON_C: f64 = 0.1;
const SOLITON_DELTA: f64 = 0.05;

/// Odd 64-bit constant (2^64 / phi) spreading consecutive indices across
/// seed space.
const INDEX_SPREAD: u64 = 0x9e37_79b9_7f4a_7c15;

/// Cumulative robust soliton distribution for one stream geometry.
/// Built once per encoder or decoder, then shared by every frame.
#[derive(Clone, Debug)]
pub(crate) struct DegreeTable {
    cumulative: Vec<f64>,
    source_count: usize,
}

impl DegreeTable {
    pub fn new(source_count: usize) -> Self {
        if source_count <= 1 {
            return Self {
                cumulative: vec![1.0],
                source_count,
            };
        }

        let k = source_count as f64;
        // Ideal soliton: rho(1) = 1/k, rho(d) = 1/(d(d-1)).
        let mut weights: Vec<f64> = (1..=source_count)
            .map(|d| {
                if d == 1 {
                    1.0 / k
                } else {
                    let d = d as f64;
                    1.0 / (d * (d - 1.0))
                }
            })
            .collect();

        // Robust correction: extra mass on small degrees plus a spike at
        // k/s, which is what makes decoding succeed with high probability
        // at a small constant overhead.
        let s = SOLITON_C * (k / SOLITON_DELTA).ln() * k.sqrt();
        let spike = ((k / s).round() as usize).clamp(1, source_count);
        for (d, weight) in weights.iter_mut().enumerate().take(spike - 1) {
            *weight += s / (k * (d + 1) as f64);
        }
        weights[spike - 1] += (s * (s / SOLITON_DELTA).ln() / k).max(0.0);

        let total: f64 = weights.iter().sum();
        let mut acc = 0.0;
        let cumulative = weights
            .iter()
            .map(|w| {
                acc += w / total;
                acc
            })
            .collect();

        Self {
            cumulative,
            source_count,
        }
    }

    pub fn source_count(&self) -> usize {
        self.source_count
    }

    /// Sample a degree in `1..=source_count`.
    fn sample(&self, rng: &mut ChaCha8Rng) -> usize {
        let roll: f64 = rng.gen();
        let position = self.cumulative.partition_point(|&p| p < roll);
        position.min(self.cumulative.len() - 1) + 1
    }
}

/// The source block subset for frame `index`, ascending.
///
/// Frames below `source_count` are the systematic prefix and map to their
/// own block; everything above is a pseudo-random subset derived from
/// `(seed, index)` alone.
pub(crate) fn source_indices(table: &DegreeTable, seed: u64, frame_index: u32) -> Vec<usize> {
    let source_count = table.source_count();
    if (frame_index as usize) < source_count {
        return vec![frame_index as usize];
    }

    let mut rng = frame_rng(seed, frame_index);
    let degree = table.sample(&mut rng);
    let mut indices = index::sample(&mut rng, source_count, degree).into_vec();
    indices.sort_unstable();
    indices
}

fn frame_rng(seed: u64, frame_index: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed ^ u64::from(frame_index).wrapping_mul(INDEX_SPREAD))
}
