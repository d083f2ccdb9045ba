// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands: `train` and `predict`.
//
// Defaults reproduce the reference setup: 1 s windows at 100 Hz,
// batches of 32, 1000 batches per epoch, 10 epochs, Pearson loss.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::predict_use_case::PredictConfig;
use crate::application::train_use_case::TrainConfig;
use crate::ml::backend::DeviceKind;
use crate::ml::loss::LossKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the spike model on calcium recordings
    Train(TrainArgs),

    /// Predict spike bins for a calcium CSV using a trained checkpoint
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory with N.train.calcium.csv / N.train.spikes.csv pairs.
    /// Simulated neurons are used if nothing is found there.
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory to save checkpoints, config, and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Window length in samples (100 Hz, so 100 = one second)
    #[arg(long, default_value_t = 100)]
    pub num_timesteps: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Batches drawn from the generator per epoch
    #[arg(long, default_value_t = 1000)]
    pub batches_per_epoch: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Training objective: pearson or cross-entropy
    #[arg(long, default_value_t = LossKind::Pearson)]
    pub loss: LossKind,

    /// L2 penalty on the output layer weights
    #[arg(long, default_value_t = 0.01)]
    pub l2: f64,

    /// Hidden units per LSTM direction
    #[arg(long, default_value_t = 64)]
    pub lstm_hidden: usize,

    /// Number of distinct dataset ids the model embeds
    #[arg(long, default_value_t = 10)]
    pub num_datasets: usize,

    /// Share of recordings held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub val_fraction: f64,

    /// Validation batches per epoch (0 disables validation)
    #[arg(long, default_value_t = 0)]
    pub val_batches: usize,

    /// Seed for splitting and window sampling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Compute backend: wgpu (GPU) or ndarray (CPU)
    #[arg(long, default_value_t = DeviceKind::Wgpu)]
    pub backend: DeviceKind,

    /// Simulated neurons per dataset when no files are found
    #[arg(long, default_value_t = 8)]
    pub synthetic_neurons: usize,

    /// Length of each simulated recording in samples
    #[arg(long, default_value_t = 6000)]
    pub synthetic_steps: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:          a.data_dir,
            checkpoint_dir:    a.checkpoint_dir,
            num_timesteps:     a.num_timesteps,
            batch_size:        a.batch_size,
            batches_per_epoch: a.batches_per_epoch,
            epochs:            a.epochs,
            lr:                a.lr,
            loss:              a.loss,
            l2:                a.l2,
            lstm_hidden:       a.lstm_hidden,
            num_datasets:      a.num_datasets,
            val_fraction:      a.val_fraction,
            val_batches:       a.val_batches,
            seed:              a.seed,
            backend:           a.backend,
            synthetic_neurons: a.synthetic_neurons,
            synthetic_steps:   a.synthetic_steps,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Calcium CSV: header row, one column per neuron
    #[arg(long)]
    pub calcium: PathBuf,

    /// 0-based dataset id the recording belongs to
    #[arg(long)]
    pub dataset: usize,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Output CSV of predicted spike bins
    #[arg(long, default_value = "predictions.csv")]
    pub output: PathBuf,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            checkpoint_dir: a.checkpoint_dir,
            calcium_path:   a.calcium,
            dataset:        a.dataset,
            output_path:    a.output,
        }
    }
}
