// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// File layout:
//   checkpoints/
//     model_epoch_1.mpk   ← weights after epoch 1
//     model_epoch_2.mpk
//     ...
//     latest_epoch.json      ← number of the newest checkpoint
//     train_config.json      ← hyperparameters, incl. num_timesteps
//
// The config is required to rebuild a model with the same shape
// before its weights can be loaded: every BatchNorm is sized by
// num_timesteps, so a mismatched window length fails the load.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::SpikeModel;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Cannot create checkpoint dir '{}': {}", dir.display(), e);
        }
        Self { dir }
    }

    /// Save weights as {dir}/model_epoch_{epoch}.mpk and
    /// point latest_epoch.json at them.
    pub fn save_model<B: Backend>(&self, model: &SpikeModel<B>, epoch: usize) -> Result<()> {
        // Recorder appends the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the newest weights into `model`, which must have the
    /// architecture described by the saved config.
    pub fn load_model<B: Backend>(
        &self,
        model:  SpikeModel<B>,
        device: &B::Device,
    ) -> Result<SpikeModel<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'predict'.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    /// Returns an error if training hasn't been run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");

        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest_epoch.json'. \
                 Have you run 'train' first?"
            })?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
