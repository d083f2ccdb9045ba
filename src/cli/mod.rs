// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to the use cases.
//
//   `train`   — fits the model and writes checkpoints
//   `predict` — loads a checkpoint and writes spike predictions

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "calcium-spikes",
    version,
    about = "Train an inception/BiLSTM model to infer spike counts from calcium imaging, then predict."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on recordings in: {}", args.data_dir);

    let last = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete after {} epochs (train_pearson={:.4}). Checkpoint saved.",
        last.epoch, last.train_pearson
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let output = args.output.clone();
    let summary = PredictUseCase::new(args.into()).execute()?;

    println!(
        "Predicted {} neurons ({} steps, {} with spikes) → {}",
        summary.neurons,
        summary.steps,
        summary.active_steps,
        output.display()
    );
    Ok(())
}
