// ============================================================
// Layer 4 — Synthetic Recording Source
// ============================================================
// Simulates calcium imaging so the full pipeline can run without
// the spikefinder files (demo mode, tests).
//
// Generative model per neuron, at 100 Hz:
//   spikes[t]  ~ Poisson(rate / 100)
//   conc[t]    = conc[t-1] · exp(-dt / tau) + amplitude · spikes[t]
//   calcium[t] = baseline + conc[t] + Normal(0, noise)
//
// Each dataset gets its own indicator decay (tau) and noise
// level, which is what the dataset embedding has to learn.

use anyhow::{anyhow, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};

use crate::domain::recording::{Recording, SAMPLING_RATE_HZ};
use crate::domain::traits::RecordingSource;

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pub num_datasets:        usize,
    pub neurons_per_dataset: usize,
    pub steps_per_neuron:    usize,
    pub seed:                u64,
}

impl SyntheticSource {
    pub fn new(num_datasets: usize, neurons_per_dataset: usize, steps_per_neuron: usize, seed: u64) -> Self {
        Self { num_datasets, neurons_per_dataset, steps_per_neuron, seed }
    }

    fn simulate(&self, rng: &mut StdRng, dataset: usize, neuron: usize) -> Result<Recording> {
        let dt        = 1.0 / SAMPLING_RATE_HZ as f64;
        // Indicator kinetics depend on the dataset only
        let tau       = 0.3 + 0.1 * dataset as f64;
        let noise_std = 0.02 + 0.01 * (dataset % 4) as f64;
        let decay     = (-dt / tau).exp();

        let rate_hz   = rng.gen_range(0.5..4.0);
        let amplitude = rng.gen_range(0.5..1.5);
        let baseline  = rng.gen_range(0.0..0.2);

        let poisson = Poisson::new(rate_hz * dt)
            .map_err(|e| anyhow!("invalid spike rate {rate_hz}: {e}"))?;
        let noise = Normal::new(0.0, noise_std)
            .map_err(|e| anyhow!("invalid noise level {noise_std}: {e}"))?;

        let mut conc    = 0.0f64;
        let mut calcium = Vec::with_capacity(self.steps_per_neuron);
        let mut spikes  = Vec::with_capacity(self.steps_per_neuron);
        for _ in 0..self.steps_per_neuron {
            let count: f64 = poisson.sample(rng);
            conc = conc * decay + amplitude * count;
            calcium.push((baseline + conc + noise.sample(rng)) as f32);
            spikes.push(count as f32);
        }

        Recording::new(dataset, neuron, calcium, spikes)
    }
}

impl RecordingSource for SyntheticSource {
    fn load_all(&self) -> Result<Vec<Recording>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut recordings = Vec::with_capacity(self.num_datasets * self.neurons_per_dataset);
        for dataset in 0..self.num_datasets {
            for neuron in 0..self.neurons_per_dataset {
                recordings.push(self.simulate(&mut rng, dataset, neuron)?);
            }
        }
        tracing::info!(
            "Simulated {} neurons across {} datasets",
            recordings.len(),
            self.num_datasets
        );
        Ok(recordings)
    }
}
