// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits so the
// recording backend (CSV files, simulator) and the predictor
// (trained network) can be swapped without touching workflows.

use anyhow::Result;
use crate::domain::recording::Recording;

// ─── RecordingSource ─────────────────────────────────────────────────────────
/// Any component that can produce calcium recordings.
///
/// Implementations:
///   - SpikefinderLoader → paired calcium/spike CSV files
///   - SyntheticSource   → simulated neurons
pub trait RecordingSource {
    fn load_all(&self) -> Result<Vec<Recording>>;
}

// ─── SpikePredictor ──────────────────────────────────────────────────────────
/// Any component that maps a full calcium trace to spike bins,
/// one bin per input step.
pub trait SpikePredictor {
    fn predict(&self, dataset: usize, calcium: &[f32]) -> Result<Vec<usize>>;
}
