// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Generator-driven fit loop:
//
//   for epoch in 1..=epochs
//     for _ in 0..batches_per_epoch
//       draw batch_size windows → SpikeBatch
//       forward + weighted loss + L2
//       backward, Adam step
//     optional validation pass (inner backend, running BN stats)
//     checkpoint + metrics.csv row
//
// Key Burn insights:
//   - Training runs on Autodiff<Backend> for gradients
//   - model.valid() returns the model on the inner backend,
//     so the validation batcher uses B::InnerBackend too
//   - BatchNorm switches to running statistics automatically
//     on the inner backend
//
// There is no retry or recovery: any error ends the run.

use anyhow::Result;
use burn::{
    data::{
        dataloader::{batcher::Batcher, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SpikeBatcher, dataset::WindowDataset, generator::WindowGenerator};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::backend::{DeviceKind, NdArrayTrainBackend, WgpuTrainBackend};
use crate::ml::loss::{categorical_crossentropy, pearson_loss, weighted_mean, LossKind};
use crate::ml::metrics::{BatchMetrics, MetricsAccumulator};
use crate::ml::model::SpikeModel;

/// Log a progress line every this many batches
const LOG_EVERY: usize = 100;

pub fn run_training(
    cfg:          &TrainConfig,
    generator:    WindowGenerator,
    validation:   Option<WindowDataset>,
    ckpt_manager: &CheckpointManager,
    logger:       &MetricsLogger,
) -> Result<EpochMetrics> {
    match cfg.backend {
        DeviceKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<WgpuTrainBackend>(cfg, generator, validation, ckpt_manager, logger, device)
        }
        DeviceKind::NdArray => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            tracing::info!("Using NdArray CPU device");
            train_loop::<NdArrayTrainBackend>(cfg, generator, validation, ckpt_manager, logger, device)
        }
    }
}

fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    mut generator: WindowGenerator,
    validation:    Option<WindowDataset>,
    ckpt_manager:  &CheckpointManager,
    logger:        &MetricsLogger,
    device:        B::Device,
) -> Result<EpochMetrics> {

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: SpikeModel<B> = cfg.model_config().init(&device);
    tracing::info!(
        "Model ready: {} timesteps, BiLSTM({}), loss={}",
        cfg.num_timesteps, cfg.lstm_hidden, cfg.loss
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let train_batcher = SpikeBatcher::<B>::new(device.clone(), cfg.num_bins());

    // ── Validation loader (InnerBackend, no autodiff overhead) ────────────────
    let val_loader = validation.map(|dataset| {
        tracing::info!(
            "Validation set: {} windows, {:.2}% active steps",
            dataset.len(),
            dataset.active_fraction() * 100.0
        );
        DataLoaderBuilder::new(SpikeBatcher::<B::InnerBackend>::new(device.clone(), cfg.num_bins()))
            .batch_size(cfg.batch_size)
            .build(dataset)
    });

    tracing::info!("Logging metrics to '{}'", logger.csv_path().display());

    let mut best_val_loss = f64::INFINITY;
    let mut last = None;
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_acc = MetricsAccumulator::new(cfg.num_bins());

        for step in 1..=cfg.batches_per_epoch {
            let batch   = train_batcher.batch(generator.next_batch(cfg.batch_size));
            let labels  = batch.labels.clone();

            let out = model.forward_loss(batch, cfg.loss, cfg.l2);
            let loss_val: f64 = out.loss.clone().into_scalar().elem::<f64>();
            train_acc.add(&BatchMetrics::compute(loss_val, labels, out.predictions));

            let grads = out.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);

            if step % LOG_EVERY == 0 {
                let running = train_acc.mean();
                tracing::debug!(
                    "epoch {} batch {}/{} loss={:.4} pearson={:.4}",
                    epoch, step, cfg.batches_per_epoch, running.loss, running.pearson
                );
            }
        }
        let train = train_acc.mean();

        // ── Validation phase ──────────────────────────────────────────────────
        let val = val_loader.as_ref().map(|loader| {
            let model_valid = model.valid();
            let mut acc = MetricsAccumulator::new(cfg.num_bins());

            for batch in loader.iter() {
                let predictions = model_valid.forward(batch.dataset, batch.calcium);
                let per_sample = match cfg.loss {
                    LossKind::Pearson      => pearson_loss(batch.targets, predictions.clone()),
                    LossKind::CrossEntropy => categorical_crossentropy(batch.targets, predictions.clone()),
                };
                let loss: f64 = weighted_mean(per_sample, batch.weights)
                    .into_scalar()
                    .elem::<f64>();
                acc.add(&BatchMetrics::compute(loss, batch.labels, predictions));
            }
            acc.mean()
        });

        let metrics = EpochMetrics::new(epoch, &train, val.as_ref());

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_pearson={:.4} | val_loss={:.4} | val_pearson={:.4} | bins={}",
            epoch, cfg.epochs,
            metrics.train_loss, metrics.train_pearson,
            metrics.val_loss, metrics.val_pearson,
            format_bins(&metrics.bin_fractions),
        );

        if metrics.is_improvement(best_val_loss) {
            tracing::info!("Validation loss improved {:.4} → {:.4}", best_val_loss, metrics.val_loss);
            best_val_loss = metrics.val_loss;
        }

        logger.log(&metrics)?;
        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);

        last = Some(metrics);
    }

    tracing::info!("Training complete!");
    last.ok_or_else(|| anyhow::anyhow!("Training ran zero epochs"))
}

/// "0:91.2% 1:6.0% ..." for the epoch summary line.
fn format_bins(fractions: &[f64]) -> String {
    fractions
        .iter()
        .enumerate()
        .map(|(bin, f)| format!("{bin}:{:.1}%", f * 100.0))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::SyntheticSource;
    use crate::domain::traits::RecordingSource;

    fn tiny_config(dir: &std::path::Path, loss: LossKind) -> TrainConfig {
        TrainConfig {
            checkpoint_dir:    dir.to_string_lossy().into_owned(),
            num_timesteps:     8,
            batch_size:        2,
            batches_per_epoch: 2,
            epochs:            2,
            lstm_hidden:       4,
            backend:           DeviceKind::NdArray,
            loss,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_format_bins() {
        assert_eq!(format_bins(&[0.5, 0.25]), "0:50.0% 1:25.0%");
    }

    #[test]
    fn test_two_epochs_on_cpu_write_checkpoints_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path(), LossKind::Pearson);

        let recordings = SyntheticSource::new(2, 2, 64, 0).load_all().unwrap();
        let mut generator = WindowGenerator::new(recordings, cfg.num_timesteps, cfg.num_bins(), 1).unwrap();
        let validation = WindowDataset::from_generator(&mut generator, 4);

        let ckpt   = CheckpointManager::new(&cfg.checkpoint_dir);
        let logger = MetricsLogger::new(&cfg.checkpoint_dir, cfg.num_bins()).unwrap();

        let last = run_training(&cfg, generator, Some(validation), &ckpt, &logger).unwrap();

        assert_eq!(last.epoch, 2);
        assert!(last.train_loss.is_finite());
        assert!(last.val_loss.is_finite());
        assert!((last.bin_fractions.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        assert!(dir.path().join("model_epoch_2.mpk").exists());

        let csv = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3); // header + 2 epochs
    }

    #[test]
    fn test_cross_entropy_without_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(dir.path(), LossKind::CrossEntropy);
        cfg.epochs = 1;

        let recordings = SyntheticSource::new(1, 1, 32, 3).load_all().unwrap();
        let generator  = WindowGenerator::new(recordings, cfg.num_timesteps, cfg.num_bins(), 0).unwrap();

        let ckpt   = CheckpointManager::new(&cfg.checkpoint_dir);
        let logger = MetricsLogger::new(&cfg.checkpoint_dir, cfg.num_bins()).unwrap();

        let last = run_training(&cfg, generator, None, &ckpt, &logger).unwrap();
        assert!(last.train_loss.is_finite());
        assert!(last.val_loss.is_nan());
    }
}
