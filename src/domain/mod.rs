// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing calcium recordings and the
// training examples cut from them.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, and traits
//
// Everything here can be unit tested without a device.

/// One neuron's full calcium trace with its spike counts
pub mod recording;

/// A fixed-length training window and the spike bin mapping
pub mod sample;

/// Core abstractions that other layers implement
pub mod traits;
