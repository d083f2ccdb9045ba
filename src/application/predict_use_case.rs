// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Turns a calcium CSV into a spike-bin CSV with the same column
// layout:
//
//   Step 1: Load the checkpoint's config and weights  (infra + ml)
//   Step 2: Read the calcium columns                  (data)
//   Step 3: Predict one bin per step for every neuron (ml)
//   Step 4: Write the predictions                     (data)
//
// The backend recorded at training time is reused, so a model
// trained on ndarray also predicts on ndarray.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::data::csv_io::{read_columns, write_columns};
use crate::domain::traits::SpikePredictor;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::backend::DeviceKind;
use crate::ml::inferencer::Inferencer;

#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub checkpoint_dir: String,
    pub calcium_path:   PathBuf,
    pub dataset:        usize,
    pub output_path:    PathBuf,
}

/// What was written, for the CLI to report.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSummary {
    pub neurons:      usize,
    pub steps:        usize,
    pub active_steps: usize,
}

pub struct PredictUseCase {
    config: PredictConfig,
}

impl PredictUseCase {
    pub fn new(config: PredictConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PredictionSummary> {
        let ckpt_manager = CheckpointManager::new(self.config.checkpoint_dir.clone());
        let train_cfg    = ckpt_manager.load_config()?;

        match train_cfg.backend {
            DeviceKind::Wgpu => {
                let device = burn::backend::wgpu::WgpuDevice::default();
                let inferencer = Inferencer::<burn::backend::Wgpu>::from_checkpoint(&ckpt_manager, device)?;
                self.run(&inferencer)
            }
            DeviceKind::NdArray => {
                let device = burn::backend::ndarray::NdArrayDevice::default();
                let inferencer = Inferencer::<burn::backend::NdArray>::from_checkpoint(&ckpt_manager, device)?;
                self.run(&inferencer)
            }
        }
    }

    /// Steps 2–4, independent of how the predictor was built.
    pub fn run<P: SpikePredictor>(&self, predictor: &P) -> Result<PredictionSummary> {
        let cfg = &self.config;

        let columns = read_columns(&cfg.calcium_path)
            .with_context(|| format!("Cannot read calcium from '{}'", cfg.calcium_path.display()))?;
        tracing::info!(
            "Predicting {} neurons of dataset {} from '{}'",
            columns.len(),
            cfg.dataset,
            cfg.calcium_path.display()
        );

        let mut predictions = Vec::with_capacity(columns.len());
        for (neuron, trace) in columns.iter().enumerate() {
            let bins = predictor
                .predict(cfg.dataset, trace)
                .with_context(|| format!("Prediction failed for neuron {neuron}"))?;
            predictions.push(bins);
        }

        let headers: Vec<String> = (0..predictions.len()).map(|i| i.to_string()).collect();
        write_columns(&cfg.output_path, &headers, &predictions)?;

        let summary = PredictionSummary {
            neurons:      predictions.len(),
            steps:        predictions.iter().map(Vec::len).sum(),
            active_steps: predictions.iter().flatten().filter(|&&b| b > 0).count(),
        };
        tracing::info!("Wrote predictions to '{}'", cfg.output_path.display());
        Ok(summary)
    }
}
