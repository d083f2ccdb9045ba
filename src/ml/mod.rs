// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor maths lives here; the other layers only see plain
// Rust types (plus the SpikeBatch the batcher hands over).
//
//   model.rs      — inception / BiLSTM network and its config
//   loss.rs       — Pearson and cross-entropy objectives,
//                   class-weighted reduction
//   metrics.rs    — Pearson correlation and per-bin shares
//   trainer.rs    — generator-driven fit loop with Adam
//   inferencer.rs — checkpoint loading and trace prediction
//   backend.rs    — runtime choice between wgpu and ndarray

/// Runtime backend selection
pub mod backend;

/// Inception / bidirectional LSTM spike model
pub mod model;

/// Training objectives
pub mod loss;

/// Batch and epoch metrics
pub mod metrics;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Loads a checkpoint and predicts spike bins for whole traces
pub mod inferencer;
