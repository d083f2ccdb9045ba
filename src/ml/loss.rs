// ============================================================
// Layer 5 — Training Objectives
// ============================================================
// Two per-sample objectives over [batch, T, bins] tensors:
//
//   pearson_loss              — negative correlation between the
//                               one-hot truth and the predicted
//                               distribution (experimental)
//   categorical_crossentropy  — mean over time of -Σ y·log(p)
//
// Both return shape [batch] so the caller can apply sample
// weights with `weighted_mean`.

use std::fmt;
use std::str::FromStr;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Guards the Pearson denominator against zero variance.
const PEARSON_EPS: f64 = 1e-12;

/// Probability clamp before taking the log.
const PROB_EPS: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LossKind {
    Pearson,
    CrossEntropy,
}

impl FromStr for LossKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pearson"                        => Ok(Self::Pearson),
            "cross-entropy" | "crossentropy" => Ok(Self::CrossEntropy),
            other => Err(format!("unknown loss '{other}' (expected pearson or cross-entropy)")),
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pearson      => write!(f, "pearson"),
            Self::CrossEntropy => write!(f, "cross-entropy"),
        }
    }
}

/// Negative Pearson-style correlation per sample. Work in progress.
///
/// The centring terms are the batch-wide mean of the argmax class
/// of truth and prediction. They are constants with respect to the
/// weights, so gradients flow only through `y_pred` itself.
///
///   x = y_true - mean(argmax y_true)
///   y = y_pred - mean(argmax y_pred)
///   loss_s = -(ΣtΣk x·y) / (sqrt(ΣtΣk x² · ΣtΣk y²) + ε)
pub fn pearson_loss<B: Backend>(y_true: Tensor<B, 3>, y_pred: Tensor<B, 3>) -> Tensor<B, 1> {
    let [batch, _, _] = y_true.dims();

    let true_centre = y_true.clone().argmax(2).float().mean().into_scalar();
    let pred_centre = y_pred.clone().argmax(2).float().mean().into_scalar();

    let x = y_true.sub_scalar(true_centre);
    let y = y_pred.sub_scalar(pred_centre);

    let numerator = (x.clone() * y.clone())
        .sum_dim(2)
        .sum_dim(1)
        .reshape([batch]);
    let denominator = x.powf_scalar(2.0).sum_dim(2).sum_dim(1).reshape([batch])
        * y.powf_scalar(2.0).sum_dim(2).sum_dim(1).reshape([batch]);

    numerator.div(denominator.sqrt().add_scalar(PEARSON_EPS)).neg()
}

/// Mean over time of the per-step cross-entropy, per sample.
pub fn categorical_crossentropy<B: Backend>(y_true: Tensor<B, 3>, y_pred: Tensor<B, 3>) -> Tensor<B, 1> {
    let [batch, _, _] = y_true.dims();

    let log_p = y_pred.clamp(PROB_EPS, 1.0 - PROB_EPS).log();
    (y_true * log_p)
        .sum_dim(2)
        .mean_dim(1)
        .reshape([batch])
        .neg()
}

/// Σ w·l / Σ w, shape [1].
pub fn weighted_mean<B: Backend>(per_sample: Tensor<B, 1>, weights: Tensor<B, 1>) -> Tensor<B, 1> {
    let total_weight = weights.clone().sum().add_scalar(PEARSON_EPS);
    (per_sample * weights).sum().div(total_weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    /// One-hot [1, T, k] tensor from bin indices.
    fn one_hot(bins: &[usize], k: usize) -> Tensor<TestBackend, 3> {
        let mut flat = vec![0.0f32; bins.len() * k];
        for (t, &b) in bins.iter().enumerate() {
            flat[t * k + b] = 1.0;
        }
        Tensor::<TestBackend, 1>::from_floats(flat.as_slice(), &Default::default())
            .reshape([1, bins.len(), k])
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar()
    }

    #[test]
    fn test_perfect_prediction_gives_minus_one() {
        let y = one_hot(&[0, 2, 1, 0, 3], 4);
        let loss = scalar(pearson_loss(y.clone(), y).mean());
        assert!((loss + 1.0).abs() < 1e-5, "loss = {loss}");
    }

    #[test]
    fn test_wrong_prediction_scores_worse_than_right_one() {
        let truth = one_hot(&[0, 2, 1, 0, 3], 4);
        let wrong = one_hot(&[3, 0, 0, 2, 1], 4);
        let right = scalar(pearson_loss(truth.clone(), truth.clone()).mean());
        let bad   = scalar(pearson_loss(truth, wrong).mean());
        assert!(bad > right);
    }

    #[test]
    fn test_crossentropy_of_confident_truth_is_near_zero() {
        let y = one_hot(&[1, 0, 2], 3);
        let ce = scalar(categorical_crossentropy(y.clone(), y).mean());
        assert!(ce >= 0.0 && ce < 1e-5, "ce = {ce}");
    }

    #[test]
    fn test_crossentropy_of_uniform_is_log_k() {
        let y = one_hot(&[1, 0, 2], 3);
        let uniform = Tensor::<TestBackend, 3>::ones([1, 3, 3], &Default::default()).div_scalar(3.0);
        let ce = scalar(categorical_crossentropy(y, uniform).mean());
        assert!((ce - 3f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_weighted_mean_respects_weights() {
        let device = Default::default();
        let l = Tensor::<TestBackend, 1>::from_floats([1.0, 3.0], &device);
        let w = Tensor::<TestBackend, 1>::from_floats([3.0, 1.0], &device);
        // (3·1 + 1·3) / 4
        assert!((scalar(weighted_mean(l, w)) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_loss_kind_parses_and_displays() {
        assert_eq!("pearson".parse::<LossKind>().unwrap(), LossKind::Pearson);
        assert_eq!("Cross-Entropy".parse::<LossKind>().unwrap(), LossKind::CrossEntropy);
        assert!("mse".parse::<LossKind>().is_err());
        assert_eq!(LossKind::CrossEntropy.to_string(), "cross-entropy");
    }
}
