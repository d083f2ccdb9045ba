// ============================================================
// Layer 3 — SpikeSample Domain Type
// ============================================================
// A training example: a fixed-length calcium window cut from a
// Recording, labelled with one spike bin per timestep.
//
// Spike bins:
//   The network classifies each 10 ms step into one of NUM_BINS
//   classes — 0 spikes, 1 spike, ... NUM_BINS-1 or more spikes.
//   Counts are rounded then clamped into that range.
//
// Class weights:
//   Silent steps vastly outnumber spiking ones, so each bin i
//   gets weight 1 / 2^(NUM_BINS - i): bin 0 → 1/128, bin 6 → 1/2.

use serde::{Deserialize, Serialize};

/// Number of spike-count classes predicted per timestep
pub const NUM_BINS: usize = 7;

/// Map a (possibly fractional) spike count to its bin index.
pub fn spike_bin(count: f32, num_bins: usize) -> usize {
    if !count.is_finite() || count <= 0.0 {
        return 0;
    }
    (count.round() as usize).min(num_bins - 1)
}

/// Per-bin weights used to counteract label imbalance.
pub fn class_weights(num_bins: usize) -> Vec<f32> {
    (0..num_bins)
        .map(|i| 1.0 / 2f32.powi((num_bins - i) as i32))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpikeSample {
    pub dataset: usize,
    pub calcium: Vec<f32>,
    pub bins:    Vec<usize>,
}

impl SpikeSample {
    pub fn num_timesteps(&self) -> usize {
        self.calcium.len()
    }

    /// Mean class weight over the sample's labels.
    /// This is how per-timestep class weights reduce to one
    /// weight for sequence-level losses like Pearson.
    pub fn sample_weight(&self, weights: &[f32]) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let total: f32 = self.bins.iter().map(|&b| weights[b]).sum();
        total / self.bins.len() as f32
    }

    /// Number of timesteps labelled with at least one spike
    pub fn active_steps(&self) -> usize {
        self.bins.iter().filter(|&&b| b > 0).count()
    }
}
