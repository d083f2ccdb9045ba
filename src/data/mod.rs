// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from recordings on disk to device tensors.
//
//   *.train.calcium.csv / *.train.spikes.csv   (or simulator)
//       │
//       ▼
//   SpikefinderLoader / SyntheticSource → Vec<Recording>
//       │
//       ▼
//   split_train_val   → held-out neurons for validation
//       │
//       ▼
//   WindowGenerator   → endless random SpikeSample windows
//       │
//       ▼
//   SpikeBatcher      → SpikeBatch tensors for the model
//
// For inference, `windows` cuts a full trace into model-sized
// pieces and stitches the predictions back together.

/// Column-oriented CSV reading and writing
pub mod csv_io;

/// Loads spikefinder-style calcium/spike CSV pairs
pub mod loader;

/// Simulated recordings for demo runs and tests
pub mod synthetic;

/// Endless random window sampler
pub mod generator;

/// Fixed window set implementing Burn's Dataset trait
pub mod dataset;

/// Implements Burn's Batcher trait for spike samples
pub mod batcher;

/// Shuffles and splits recordings into train/validation sets
pub mod splitter;

/// Cuts traces into model windows and stitches outputs back
pub mod windows;
