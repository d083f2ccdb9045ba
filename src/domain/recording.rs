// ============================================================
// Layer 3 — Recording Domain Type
// ============================================================
// A single neuron's calcium fluorescence trace together with
// the ground-truth spike counts measured at the same instants.
//
// Recordings are sampled at 100 Hz, so every entry covers one
// 10 ms interval. The two series always have the same length;
// the constructor enforces it so later windowing never has to.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Sampling rate shared by every dataset (Hz)
pub const SAMPLING_RATE_HZ: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Experiment identifier, 0-based. Fed to the dataset embedding.
    pub dataset: usize,

    /// Column index of the neuron inside its dataset
    pub neuron: usize,

    /// Fluorescence value per timestep
    pub calcium: Vec<f32>,

    /// Spike count per timestep (may be fractional after resampling)
    pub spikes: Vec<f32>,
}

impl Recording {
    pub fn new(
        dataset: usize,
        neuron:  usize,
        calcium: Vec<f32>,
        spikes:  Vec<f32>,
    ) -> Result<Self> {
        ensure!(
            calcium.len() == spikes.len(),
            "dataset {dataset} neuron {neuron}: calcium has {} steps but spikes has {}",
            calcium.len(),
            spikes.len(),
        );
        Ok(Self { dataset, neuron, calcium, spikes })
    }

    pub fn len(&self) -> usize {
        self.calcium.len()
    }

    /// Recording length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / SAMPLING_RATE_HZ as f64
    }

    pub fn total_spikes(&self) -> f32 {
        self.spikes.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_lengths_rejected() {
        let r = Recording::new(0, 0, vec![0.1, 0.2], vec![0.0]);
        assert!(r.is_err());
    }

    #[test]
    fn test_duration_and_totals() {
        let r = Recording::new(3, 1, vec![0.0; 250], vec![1.0; 250]).unwrap();
        assert_eq!(r.len(), 250);
        assert!((r.duration_secs() - 2.5).abs() < 1e-9);
        assert_eq!(r.total_spikes(), 250.0);
    }
}
