// ============================================================
// Layer 4 — Window Generator
// ============================================================
// An endless stream of training examples. Every call:
//
//   1. picks a recording uniformly at random
//   2. picks a start offset uniformly within it
//   3. cuts num_timesteps of calcium and maps the matching
//      spike counts to bins
//
// Recordings shorter than one window are dropped up front so the
// stream can never stall. The RNG is seeded, making a run
// reproducible end to end.
//
// `next_batch` groups consecutive draws into one mini-batch,
// which is what the training loop consumes.

use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::recording::Recording;
use crate::domain::sample::{spike_bin, SpikeSample};

pub struct WindowGenerator {
    recordings:    Vec<Recording>,
    num_timesteps: usize,
    num_bins:      usize,
    rng:           StdRng,
}

impl WindowGenerator {
    pub fn new(
        recordings:    Vec<Recording>,
        num_timesteps: usize,
        num_bins:      usize,
        seed:          u64,
    ) -> Result<Self> {
        let total = recordings.len();
        let recordings: Vec<Recording> = recordings
            .into_iter()
            .filter(|r| r.len() >= num_timesteps)
            .collect();

        if recordings.is_empty() {
            bail!(
                "None of the {total} recordings is at least {num_timesteps} steps long; \
                 nothing to sample from"
            );
        }
        if recordings.len() < total {
            tracing::debug!(
                "Dropped {} recordings shorter than {} steps",
                total - recordings.len(),
                num_timesteps
            );
        }

        Ok(Self {
            recordings,
            num_timesteps,
            num_bins,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn pool_size(&self) -> usize {
        self.recordings.len()
    }

    /// Draw `batch_size` samples.
    pub fn next_batch(&mut self, batch_size: usize) -> Vec<SpikeSample> {
        self.by_ref().take(batch_size).collect()
    }

    fn draw(&mut self) -> SpikeSample {
        let idx   = self.rng.gen_range(0..self.recordings.len());
        let rec   = &self.recordings[idx];
        let start = self.rng.gen_range(0..=rec.len() - self.num_timesteps);
        let end   = start + self.num_timesteps;

        SpikeSample {
            dataset: rec.dataset,
            calcium: rec.calcium[start..end].to_vec(),
            bins:    rec.spikes[start..end]
                .iter()
                .map(|&c| spike_bin(c, self.num_bins))
                .collect(),
        }
    }
}

impl Iterator for WindowGenerator {
    type Item = SpikeSample;

    /// Never returns None.
    fn next(&mut self) -> Option<SpikeSample> {
        Some(self.draw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::NUM_BINS;

    fn ramp(dataset: usize, len: usize) -> Recording {
        let calcium = (0..len).map(|i| i as f32).collect();
        let spikes  = (0..len).map(|i| (i % 9) as f32).collect();
        Recording::new(dataset, 0, calcium, spikes).unwrap()
    }

    #[test]
    fn test_windows_have_requested_length() {
        let mut gen = WindowGenerator::new(vec![ramp(0, 50), ramp(4, 80)], 20, NUM_BINS, 0).unwrap();
        for s in gen.next_batch(32) {
            assert_eq!(s.calcium.len(), 20);
            assert_eq!(s.bins.len(), 20);
            assert!(s.dataset == 0 || s.dataset == 4);
            assert!(s.bins.iter().all(|&b| b < NUM_BINS));
        }
    }

    #[test]
    fn test_windows_are_contiguous_slices() {
        let mut gen = WindowGenerator::new(vec![ramp(0, 30)], 10, NUM_BINS, 3).unwrap();
        let s = gen.next().unwrap();
        // The ramp makes every window consecutive integers
        for pair in s.calcium.windows(2) {
            assert_eq!(pair[1] - pair[0], 1.0);
        }
    }

    #[test]
    fn test_short_recordings_are_dropped() {
        let gen = WindowGenerator::new(vec![ramp(0, 5), ramp(1, 10)], 10, NUM_BINS, 0).unwrap();
        assert_eq!(gen.pool_size(), 1);
    }

    #[test]
    fn test_no_usable_recordings_is_an_error() {
        assert!(WindowGenerator::new(vec![ramp(0, 5)], 10, NUM_BINS, 0).is_err());
        assert!(WindowGenerator::new(Vec::new(), 10, NUM_BINS, 0).is_err());
    }

    #[test]
    fn test_exact_length_recording_is_usable() {
        let mut gen = WindowGenerator::new(vec![ramp(2, 10)], 10, NUM_BINS, 0).unwrap();
        let s = gen.next().unwrap();
        assert_eq!(s.calcium[0], 0.0);
        assert_eq!(s.calcium[9], 9.0);
    }
}
