// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one row per epoch to checkpoints/metrics.csv:
//
//   epoch,train_loss,train_pearson,val_loss,val_pearson,bin_0,...,bin_6
//   1,-0.081200,0.094100,-0.075300,0.088000,0.951000,...,0.000000
//
// bin_i is the share of training-set predictions that fell into
// spike bin i during that epoch. Without validation the val_*
// columns hold NaN.
//
// How to read it:
//   - With the Pearson loss, loss ≈ -pearson; both should move
//     away from zero as training progresses
//   - bin_0 near 1.0 for several epochs means the model has
//     collapsed onto "no spike"

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

use crate::ml::metrics::BatchMetrics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    pub train_loss:    f64,
    pub train_pearson: f64,

    /// NaN when no validation set was configured
    pub val_loss:    f64,
    pub val_pearson: f64,

    /// Fraction of training predictions per spike bin
    pub bin_fractions: Vec<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train: &BatchMetrics, val: Option<&BatchMetrics>) -> Self {
        Self {
            epoch,
            train_loss:    train.loss,
            train_pearson: train.pearson,
            val_loss:      val.map_or(f64::NAN, |v| v.loss),
            val_pearson:   val.map_or(f64::NAN, |v| v.pearson),
            bin_fractions: train.bin_fractions.clone(),
        }
    }

    /// Returns true if this epoch's val_loss beats `best_val_loss`
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
    num_bins: usize,
}

impl MetricsLogger {
    /// Writes the header if the file doesn't exist yet, so
    /// repeated runs append to the same log.
    pub fn new(dir: impl Into<String>, num_bins: usize) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut writer = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writer.write_record(Self::header(num_bins))?;
            writer.flush()?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path, num_bins })
    }

    fn header(num_bins: usize) -> Vec<String> {
        let mut cols = vec![
            "epoch".to_string(),
            "train_loss".to_string(),
            "train_pearson".to_string(),
            "val_loss".to_string(),
            "val_pearson".to_string(),
        ];
        cols.extend((0..num_bins).map(|i| format!("bin_{i}")));
        cols
    }

    /// Append one epoch's metrics.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        let mut writer = csv::Writer::from_writer(file);

        let mut row = vec![
            m.epoch.to_string(),
            format!("{:.6}", m.train_loss),
            format!("{:.6}", m.train_pearson),
            format!("{:.6}", m.val_loss),
            format!("{:.6}", m.val_pearson),
        ];
        row.extend((0..self.num_bins).map(|i| {
            format!("{:.6}", m.bin_fractions.get(i).copied().unwrap_or(0.0))
        }));
        writer.write_record(&row)?;
        writer.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn train_metrics() -> BatchMetrics {
        BatchMetrics { loss: -0.5, pearson: 0.4, bin_fractions: vec![0.75, 0.25] }
    }

    #[test]
    fn test_is_improvement() {
        let val = BatchMetrics { loss: 2.3, pearson: 0.1, bin_fractions: vec![] };
        let m = EpochMetrics::new(2, &train_metrics(), Some(&val));
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_missing_validation_is_nan() {
        let m = EpochMetrics::new(1, &train_metrics(), None);
        assert!(m.val_loss.is_nan());
        assert!(m.val_pearson.is_nan());
        // NaN never counts as an improvement
        assert!(!m.is_improvement(f64::INFINITY));
    }

    #[test]
    fn test_header_and_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().to_string_lossy(), 2).unwrap();
        logger.log(&EpochMetrics::new(1, &train_metrics(), None)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,train_pearson,val_loss,val_pearson,bin_0,bin_1");
        assert_eq!(lines[1], "1,-0.500000,0.400000,NaN,NaN,0.750000,0.250000");
    }

    #[test]
    fn test_reopening_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().into_owned();

        MetricsLogger::new(path.clone(), 2).unwrap()
            .log(&EpochMetrics::new(1, &train_metrics(), None)).unwrap();
        let logger = MetricsLogger::new(path, 2).unwrap();
        logger.log(&EpochMetrics::new(2, &train_metrics(), None)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_rows_parse_back_with_csv_reader() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().to_string_lossy(), 2).unwrap();
        let val    = BatchMetrics { loss: -0.25, pearson: 0.3, bin_fractions: vec![] };
        logger.log(&EpochMetrics::new(1, &train_metrics(), Some(&val))).unwrap();
        logger.log(&EpochMetrics::new(2, &train_metrics(), None)).unwrap();

        let mut reader = csv::Reader::from_path(logger.csv_path()).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 7);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(rows[0][3].parse::<f64>().unwrap(), -0.25);
        assert_eq!(&rows[1][0], "2");
        assert!(rows[1][4].parse::<f64>().unwrap().is_nan());
    }
}
