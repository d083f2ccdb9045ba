// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// Training and inference are generic over Burn's Backend trait.
// The concrete backend is picked at runtime from the CLI and
// stored in train_config.json so `predict` reuses it.
//
//   wgpu    — GPU via WebGPU (Vulkan / Metal / DX12)
//   ndarray — CPU, no GPU required

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type WgpuTrainBackend    = burn::backend::Autodiff<burn::backend::Wgpu>;
pub type NdArrayTrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Wgpu,
    NdArray,
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgpu" | "gpu"    => Ok(Self::Wgpu),
            "ndarray" | "cpu" => Ok(Self::NdArray),
            other => Err(format!("unknown backend '{other}' (expected wgpu or ndarray)")),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wgpu    => write!(f, "wgpu"),
            Self::NdArray => write!(f, "ndarray"),
        }
    }
}
