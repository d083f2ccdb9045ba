// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Holds out whole neurons for validation. Splitting at the
// recording level (not the window level) keeps overlapping
// windows of one neuron from landing on both sides.
//
// The shuffle takes the caller's RNG so a seeded run produces
// the same split every time.

use rand::{seq::SliceRandom, Rng};

/// Shuffle `items` and split into (train, validation).
///
/// `train_fraction` of 0.8 keeps 80% for training. The split index
/// is rounded and clamped, so tiny inputs never panic.
pub fn split_train_val<T, R: Rng + ?Sized>(
    mut items:      Vec<T>,
    train_fraction: f64,
    rng:            &mut R,
) -> (Vec<T>, Vec<T>) {
    items.shuffle(rng);

    let total    = items.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    let val = items.split_off(split_at);

    tracing::debug!(
        "Split {} recordings: {} training, {} validation",
        total,
        items.len(),
        val.len(),
    );

    (items, val)
}
