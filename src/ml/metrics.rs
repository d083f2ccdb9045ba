// ============================================================
// Layer 5 — Evaluation Metrics
// ============================================================
// Reported every batch, never differentiated:
//
//   pearson_corr   — correlation of true bins vs argmax prediction
//   bin_fractions  — share of predicted steps in each bin
//
// bin_fractions is the early warning for collapse: with heavy
// class imbalance a model that predicts bin 0 everywhere shows
// up as [1.0, 0.0, ...] long before the loss stalls.

use burn::prelude::*;

const EPS: f64 = 1e-12;

/// Pearson correlation between true bins and argmax predictions,
/// averaged over samples.
///
/// `labels` is the [batch, T] bin index per step. Both sequences are
/// centred on their batch-wide mean, then each sample contributes
/// Σxy / (sqrt(Σx² Σy²) + ε) along time. A constant prediction
/// therefore scores 0, not NaN.
pub fn pearson_corr<B: Backend>(labels: Tensor<B, 2, Int>, y_pred: Tensor<B, 3>) -> f64 {
    let [batch, steps] = labels.dims();

    let x = labels.float();
    let y = y_pred.argmax(2).float().reshape([batch, steps]);

    let x_mean = x.clone().mean().into_scalar();
    let y_mean = y.clone().mean().into_scalar();
    let x = x.sub_scalar(x_mean);
    let y = y.sub_scalar(y_mean);

    let n = (x.clone() * y.clone()).sum_dim(1);
    let d = x.powf_scalar(2.0).sum_dim(1) * y.powf_scalar(2.0).sum_dim(1);

    n.div(d.sqrt().add_scalar(EPS))
        .mean()
        .into_scalar()
        .elem::<f64>()
}

/// Fraction of predicted steps whose argmax is each bin.
pub fn bin_fractions<B: Backend>(y_pred: Tensor<B, 3>) -> Vec<f64> {
    let [_, _, bins] = y_pred.dims();
    let predicted = y_pred.argmax(2);

    (0..bins)
        .map(|bin| {
            predicted
                .clone()
                .equal_elem(bin as i64)
                .float()
                .mean()
                .into_scalar()
                .elem::<f64>()
        })
        .collect()
}

// ─── Running averages ─────────────────────────────────────────────────────────
/// Metrics of a single batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMetrics {
    pub loss:          f64,
    pub pearson:       f64,
    pub bin_fractions: Vec<f64>,
}

impl BatchMetrics {
    pub fn compute<B: Backend>(loss: f64, labels: Tensor<B, 2, Int>, y_pred: Tensor<B, 3>) -> Self {
        Self {
            loss,
            pearson:       pearson_corr(labels, y_pred.clone()),
            bin_fractions: bin_fractions(y_pred),
        }
    }
}

/// Averages BatchMetrics over an epoch.
#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    loss_sum:    f64,
    pearson_sum: f64,
    bin_sums:    Vec<f64>,
    batches:     usize,
}

impl MetricsAccumulator {
    pub fn new(num_bins: usize) -> Self {
        Self { loss_sum: 0.0, pearson_sum: 0.0, bin_sums: vec![0.0; num_bins], batches: 0 }
    }

    pub fn add(&mut self, m: &BatchMetrics) {
        self.loss_sum    += m.loss;
        self.pearson_sum += m.pearson;
        for (sum, f) in self.bin_sums.iter_mut().zip(&m.bin_fractions) {
            *sum += f;
        }
        self.batches += 1;
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Mean over all added batches; NaN loss/pearson if none were added.
    pub fn mean(&self) -> BatchMetrics {
        if self.batches == 0 {
            return BatchMetrics {
                loss:          f64::NAN,
                pearson:       f64::NAN,
                bin_fractions: vec![0.0; self.bin_sums.len()],
            };
        }
        let n = self.batches as f64;
        BatchMetrics {
            loss:          self.loss_sum / n,
            pearson:       self.pearson_sum / n,
            bin_fractions: self.bin_sums.iter().map(|s| s / n).collect(),
        }
    }
}
