// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor maths, no printing.
// Each use case tells the data, ml, and infra layers what to do
// in which order.

// Train a model from recordings
pub mod train_use_case;

// Predict spike bins for a calcium CSV with a trained checkpoint
pub mod predict_use_case;
