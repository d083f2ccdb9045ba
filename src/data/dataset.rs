// ============================================================
// Layer 4 — Window Dataset
// ============================================================
// Wraps a fixed list of SpikeSamples so Burn's DataLoader can
// batch them. Training draws fresh windows from the generator
// every step; validation uses this frozen set instead.

use burn::data::dataset::Dataset;

use crate::data::generator::WindowGenerator;
use crate::domain::sample::SpikeSample;

/// A frozen set of windows, used for validation so every epoch is
/// scored on the same examples.
pub struct WindowDataset {
    samples: Vec<SpikeSample>,
}

impl WindowDataset {
    pub fn new(samples: Vec<SpikeSample>) -> Self { Self { samples } }

    /// Materialise `count` draws from a generator.
    pub fn from_generator(generator: &mut WindowGenerator, count: usize) -> Self {
        Self::new(generator.next_batch(count))
    }

    pub fn active_fraction(&self) -> f64 {
        let steps: usize  = self.samples.iter().map(SpikeSample::num_timesteps).sum();
        let active: usize = self.samples.iter().map(SpikeSample::active_steps).sum();
        if steps == 0 { 0.0 } else { active as f64 / steps as f64 }
    }
}

impl Dataset<SpikeSample> for WindowDataset {
    fn get(&self, index: usize) -> Option<SpikeSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::Recording;
    use crate::domain::sample::NUM_BINS;

    #[test]
    fn test_from_generator_len_and_get() {
        let rec = Recording::new(0, 0, vec![0.0; 40], vec![1.0; 40]).unwrap();
        let mut gen = WindowGenerator::new(vec![rec], 8, NUM_BINS, 0).unwrap();
        let ds = WindowDataset::from_generator(&mut gen, 5);

        assert_eq!(ds.len(), 5);
        assert!(ds.get(4).is_some());
        assert!(ds.get(5).is_none());
        assert_eq!(ds.active_fraction(), 1.0);
    }
}
