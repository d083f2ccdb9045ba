// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration
//   Step 2: Load recordings            (Layer 4 - data)
//           falling back to simulated neurons if none are found
//   Step 3: Hold out neurons           (Layer 4 - data)
//   Step 4: Build window generators    (Layer 4 - data)
//   Step 5: Save config                (Layer 6 - infra)
//   Step 6: Run training loop          (Layer 5 - ml)

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::WindowDataset,
    generator::WindowGenerator,
    loader::SpikefinderLoader,
    splitter::split_train_val,
    synthetic::SyntheticSource,
};
use crate::domain::recording::Recording;
use crate::domain::sample::NUM_BINS;
use crate::domain::traits::RecordingSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::backend::DeviceKind;
use crate::ml::loss::LossKind;
use crate::ml::model::SpikeModelConfig;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// Serialised to train_config.json so `predict` can rebuild the
// exact same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:          String,
    pub checkpoint_dir:    String,
    pub num_timesteps:     usize,
    pub batch_size:        usize,
    pub batches_per_epoch: usize,
    pub epochs:            usize,
    pub lr:                f64,
    pub loss:              LossKind,
    pub l2:                f64,
    pub lstm_hidden:       usize,
    pub num_datasets:      usize,
    pub val_fraction:      f64,
    pub val_batches:       usize,
    pub seed:              u64,
    pub backend:           DeviceKind,
    pub synthetic_neurons: usize,
    pub synthetic_steps:   usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:          "data".to_string(),
            checkpoint_dir:    "checkpoints".to_string(),
            num_timesteps:     100, // 1 s at 100 Hz
            batch_size:        32,
            batches_per_epoch: 1000,
            epochs:            10,
            lr:                1e-3,
            loss:              LossKind::Pearson,
            l2:                0.01,
            lstm_hidden:       64,
            num_datasets:      10,
            val_fraction:      0.1,
            val_batches:       0,
            seed:              42,
            backend:           DeviceKind::Wgpu,
            synthetic_neurons: 8,
            synthetic_steps:   6000,
        }
    }
}

impl TrainConfig {
    pub fn num_bins(&self) -> usize {
        NUM_BINS
    }

    pub fn model_config(&self) -> SpikeModelConfig {
        SpikeModelConfig::new(self.num_timesteps)
            .with_num_datasets(self.num_datasets)
            .with_num_bins(self.num_bins())
            .with_lstm_hidden(self.lstm_hidden)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.num_timesteps > 0, "num_timesteps must be positive");
        ensure!(self.batch_size > 0, "batch_size must be positive");
        ensure!(self.batches_per_epoch > 0, "batches_per_epoch must be positive");
        ensure!(self.lstm_hidden > 0, "lstm_hidden must be positive");
        ensure!(self.num_datasets > 0, "num_datasets must be positive");
        ensure!(self.lr > 0.0, "learning rate must be positive, got {}", self.lr);
        ensure!(self.l2 >= 0.0, "l2 must not be negative, got {}", self.l2);
        ensure!(
            (0.0..1.0).contains(&self.val_fraction),
            "val_fraction must be in [0, 1), got {}",
            self.val_fraction
        );
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    /// Returns the metrics of the final epoch.
    pub fn execute(&self) -> Result<EpochMetrics> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Load recordings ───────────────────────────────────────────
        let recordings = self.load_recordings()?;
        if let Some(bad) = recordings.iter().find(|r| r.dataset >= cfg.num_datasets) {
            anyhow::bail!(
                "Recording from dataset {} but the model only embeds {} datasets",
                bad.dataset,
                cfg.num_datasets
            );
        }
        let total_secs: f64   = recordings.iter().map(Recording::duration_secs).sum();
        let total_spikes: f32 = recordings.iter().map(Recording::total_spikes).sum();
        tracing::info!(
            "{} recordings, {:.0} s of calcium, {:.0} spikes",
            recordings.len(), total_secs, total_spikes
        );

        // ── Step 3: Hold out neurons for validation ───────────────────────────
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let (train_recs, val_recs) = if cfg.val_batches > 0 {
            split_train_val(recordings, 1.0 - cfg.val_fraction, &mut rng)
        } else {
            (recordings, Vec::new())
        };

        // ── Step 4: Window generators ─────────────────────────────────────────
        let generator = WindowGenerator::new(train_recs, cfg.num_timesteps, cfg.num_bins(), cfg.seed)?;
        tracing::info!("Sampling training windows from {} recordings", generator.pool_size());

        let validation = self.build_validation(val_recs);

        // ── Step 5: Save config for prediction ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(cfg.checkpoint_dir.clone());
        ckpt_manager.save_config(cfg)?;
        let logger = MetricsLogger::new(cfg.checkpoint_dir.clone(), cfg.num_bins())?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, generator, validation, &ckpt_manager, &logger)
    }

    fn load_recordings(&self) -> Result<Vec<Recording>> {
        let cfg = &self.config;
        let recordings = SpikefinderLoader::new(&cfg.data_dir, cfg.num_datasets).load_all()?;
        if !recordings.is_empty() {
            return Ok(recordings);
        }

        tracing::warn!(
            "No recordings found in '{}' — training on simulated neurons",
            cfg.data_dir
        );
        SyntheticSource::new(
            cfg.num_datasets,
            cfg.synthetic_neurons,
            cfg.synthetic_steps,
            cfg.seed,
        )
        .load_all()
    }

    /// A fixed validation window set, or None when validation is
    /// disabled or the held-out neurons are unusable.
    fn build_validation(&self, val_recs: Vec<Recording>) -> Option<WindowDataset> {
        let cfg = &self.config;
        if cfg.val_batches == 0 {
            return None;
        }
        if val_recs.is_empty() {
            tracing::warn!("Too few recordings to hold any out — skipping validation");
            return None;
        }

        match WindowGenerator::new(val_recs, cfg.num_timesteps, cfg.num_bins(), cfg.seed.wrapping_add(1)) {
            Ok(mut val_gen) => Some(WindowDataset::from_generator(
                &mut val_gen,
                cfg.val_batches * cfg.batch_size,
            )),
            Err(e) => {
                tracing::warn!("Skipping validation: {e}");
                None
            }
        }
    }
}
