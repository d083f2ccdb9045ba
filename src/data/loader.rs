// ============================================================
// Layer 4 — Spikefinder Recording Loader
// ============================================================
// Loads paired calcium / spike recordings laid out the way the
// spikefinder challenge distributes them:
//
//   data/
//     1.train.calcium.csv   1.train.spikes.csv
//     2.train.calcium.csv   2.train.spikes.csv
//     ...
//     10.train.calcium.csv  10.train.spikes.csv
//
// File N holds dataset id N-1. Column j of the calcium file and
// column j of the spikes file describe the same neuron.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::data::csv_io::read_columns;
use crate::domain::recording::Recording;
use crate::domain::traits::RecordingSource;

/// Loads every available dataset from a directory.
pub struct SpikefinderLoader {
    dir:          PathBuf,
    num_datasets: usize,
}

impl SpikefinderLoader {
    pub fn new(dir: impl Into<PathBuf>, num_datasets: usize) -> Self {
        Self { dir: dir.into(), num_datasets }
    }

    fn calcium_path(&self, file_no: usize) -> PathBuf {
        self.dir.join(format!("{file_no}.train.calcium.csv"))
    }

    fn spikes_path(&self, file_no: usize) -> PathBuf {
        self.dir.join(format!("{file_no}.train.spikes.csv"))
    }

    /// Load a single dataset's neurons.
    fn load_dataset(&self, dataset: usize, calcium: &Path, spikes: &Path) -> Result<Vec<Recording>> {
        let calcium_cols = read_columns(calcium)?;
        let spike_cols   = read_columns(spikes)?;

        if calcium_cols.len() != spike_cols.len() {
            tracing::warn!(
                "Dataset {}: {} calcium columns vs {} spike columns, pairing the first {}",
                dataset,
                calcium_cols.len(),
                spike_cols.len(),
                calcium_cols.len().min(spike_cols.len()),
            );
        }

        let mut recordings = Vec::new();
        for (neuron, (mut ca, mut sp)) in calcium_cols.into_iter().zip(spike_cols).enumerate() {
            // Ragged padding can differ by a row between the two files
            let len = ca.len().min(sp.len());
            ca.truncate(len);
            sp.truncate(len);
            if len == 0 {
                tracing::debug!("Dataset {} neuron {} is empty, skipping", dataset, neuron);
                continue;
            }
            recordings.push(Recording::new(dataset, neuron, ca, sp)?);
        }
        Ok(recordings)
    }
}

impl RecordingSource for SpikefinderLoader {
    fn load_all(&self) -> Result<Vec<Recording>> {
        // A missing directory is not fatal: callers fall back to
        // simulated data when nothing was found.
        if !self.dir.exists() {
            tracing::warn!(
                "Data directory '{}' does not exist — no recordings loaded",
                self.dir.display()
            );
            return Ok(Vec::new());
        }

        let mut all = Vec::new();
        for file_no in 1..=self.num_datasets {
            let calcium = self.calcium_path(file_no);
            let spikes  = self.spikes_path(file_no);
            if !calcium.exists() || !spikes.exists() {
                tracing::warn!("Dataset {} not found in '{}', skipping", file_no, self.dir.display());
                continue;
            }

            let recordings = self
                .load_dataset(file_no - 1, &calcium, &spikes)
                .with_context(|| format!("Failed to load dataset {file_no}"))?;
            tracing::info!("Dataset {}: {} neurons", file_no, recordings.len());
            all.extend(recordings);
        }
        Ok(all)
    }
}
