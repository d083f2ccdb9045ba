// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by both workflows:
//
//   checkpoint.rs — model weights (Burn CompactRecorder) plus the
//                   TrainConfig JSON needed to rebuild the model
//                   for prediction
//
//   metrics.rs    — per-epoch loss / Pearson / bin-share rows
//                   appended to a CSV file

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
