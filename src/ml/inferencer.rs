// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs a trained SpikeModel over full-length calcium traces.
//
//   trace ──split_windows──► [W, T] windows
//         ──forward (chunks of batch_size)──► [W, T, bins]
//         ──argmax──► bins per window
//         ──stitch──► one bin per input step
//
// Runs on the inner (non-autodiff) backend, so BatchNorm uses
// the running statistics gathered during training.

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::data::windows::{split_windows, stitch};
use crate::domain::traits::SpikePredictor;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::SpikeModel;

pub struct Inferencer<B: Backend> {
    model:         SpikeModel<B>,
    num_timesteps: usize,
    num_datasets:  usize,
    batch_size:    usize,
    device:        B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(
        model:        SpikeModel<B>,
        num_datasets: usize,
        batch_size:   usize,
        device:       B::Device,
    ) -> Self {
        let num_timesteps = model.num_timesteps;
        Self { model, num_timesteps, num_datasets, batch_size: batch_size.max(1), device }
    }

    /// Rebuild the model from train_config.json and load the newest weights.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg   = ckpt_manager.load_config()?;
        let model = cfg.model_config().init::<B>(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint ({} timesteps)", cfg.num_timesteps);
        Ok(Self::new(model, cfg.num_datasets, cfg.batch_size, device))
    }

    /// Most likely bin for every step of every window.
    fn predict_windows(&self, dataset: usize, windows: &[Vec<f32>]) -> Vec<Vec<usize>> {
        let t = self.num_timesteps;
        let mut out = Vec::with_capacity(windows.len());

        for chunk in windows.chunks(self.batch_size) {
            let n = chunk.len();
            let flat: Vec<f32> = chunk.iter().flat_map(|w| w.iter().copied()).collect();
            let ids = vec![dataset as i32; n];

            let calcium = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
                .reshape([n, t, 1]);
            let ids = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device);

            let bins: Vec<usize> = self.model
                .forward(ids, calcium)
                .argmax(2)
                .into_data()
                .iter::<i64>()
                .map(|b| b as usize)
                .collect();

            out.extend(bins.chunks(t).map(<[usize]>::to_vec));
        }
        out
    }
}

impl<B: Backend> SpikePredictor for Inferencer<B> {
    fn predict(&self, dataset: usize, calcium: &[f32]) -> Result<Vec<usize>> {
        ensure!(
            dataset < self.num_datasets,
            "dataset id {dataset} out of range: the model knows {} datasets",
            self.num_datasets
        );

        let windows = split_windows(calcium, self.num_timesteps);
        let values: Vec<Vec<f32>> = windows.iter().map(|w| w.values.clone()).collect();
        let per_window = self.predict_windows(dataset, &values);

        let bins = stitch(&windows, &per_window, calcium.len());
        tracing::debug!(
            "Predicted {} steps over {} windows, {} active",
            bins.len(),
            windows.len(),
            bins.iter().filter(|&&b| b > 0).count()
        );
        Ok(bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::SpikeModelConfig;

    type TestBackend = burn::backend::NdArray;

    fn inferencer(t: usize) -> Inferencer<TestBackend> {
        let device = Default::default();
        let model = SpikeModelConfig::new(t)
            .with_lstm_hidden(4)
            .with_num_inception_cells(1)
            .init::<TestBackend>(&device);
        Inferencer::new(model, 10, 3, device)
    }

    #[test]
    fn test_one_bin_per_input_step() {
        let inf = inferencer(5);
        for len in [1, 5, 12, 17] {
            let trace: Vec<f32> = (0..len).map(|i| (i as f32 * 0.7).cos()).collect();
            let bins = inf.predict(2, &trace).unwrap();
            assert_eq!(bins.len(), len);
            assert!(bins.iter().all(|&b| b < 7));
        }
    }

    #[test]
    fn test_unknown_dataset_is_rejected() {
        let inf = inferencer(4);
        assert!(inf.predict(10, &[0.0; 8]).is_err());
    }

    #[test]
    fn test_empty_trace_gives_empty_prediction() {
        let inf = inferencer(4);
        assert!(inf.predict(0, &[]).unwrap().is_empty());
    }
}
