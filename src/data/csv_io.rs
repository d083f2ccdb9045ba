// ============================================================
// Layer 4 — Column CSV I/O
// ============================================================
// Recordings are stored column-wise: a header row naming each
// neuron, then one row per 10 ms step. Neurons have different
// lengths, so shorter columns are padded with empty or NaN cells
// at the bottom.
//
//   0,1,2
//   0.12,0.40,0.33
//   0.15,0.38,
//   0.11,,
//
// Reading trims that padding; writing reproduces it.

use anyhow::{Context, Result};
use std::path::Path;

/// Parse one cell. Empty and "nan" cells become NaN.
fn parse_cell(raw: &str) -> Result<f32> {
    let cell = raw.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(f32::NAN);
    }
    cell.parse::<f32>()
        .with_context(|| format!("'{cell}' is not a number"))
}

/// Read a column CSV into one Vec per column.
///
/// Trailing NaN padding is removed; NaNs inside a column
/// (dropped frames) are replaced with 0.0.
pub fn read_columns(path: &Path) -> Result<Vec<Vec<f32>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;

    let width = reader.headers()
        .with_context(|| format!("Cannot read header of '{}'", path.display()))?
        .len();
    let mut columns: Vec<Vec<f32>> = vec![Vec::new(); width];

    for (row_idx, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Bad row {} in '{}'", row_idx + 2, path.display()))?;
        for (col, column) in columns.iter_mut().enumerate() {
            let value = match record.get(col) {
                Some(raw) => parse_cell(raw).with_context(|| {
                    format!("row {}, column {} of '{}'", row_idx + 2, col, path.display())
                })?,
                None => f32::NAN,
            };
            column.push(value);
        }
    }

    for column in columns.iter_mut() {
        while column.last().is_some_and(|v| v.is_nan()) {
            column.pop();
        }
        for v in column.iter_mut() {
            if v.is_nan() {
                *v = 0.0;
            }
        }
    }

    Ok(columns)
}

/// Write columns under `headers`, padding short columns with empty cells.
pub fn write_columns<T: ToString>(
    path:    &Path,
    headers: &[String],
    columns: &[Vec<T>],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;

    writer.write_record(headers)?;

    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    for row in 0..rows {
        let record: Vec<String> = columns
            .iter()
            .map(|c| c.get(row).map(ToString::to_string).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()
        .with_context(|| format!("Cannot flush '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_ragged_columns_are_trimmed() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.train.calcium.csv");
        fs::write(&path, "0,1\n0.5,1.5\n0.6,\n,nan\n").unwrap();

        let cols = read_columns(&path).unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0], vec![0.5, 0.6]);
        assert_eq!(cols[1], vec![1.5]);
    }

    #[test]
    fn test_interior_gaps_become_zero() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("gap.csv");
        fs::write(&path, "0\n1.0\nnan\n2.0\n").unwrap();

        let cols = read_columns(&path).unwrap();
        assert_eq!(cols[0], vec![1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_garbage_cell_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "0\nabc\n").unwrap();
        assert!(read_columns(&path).is_err());
    }

    #[test]
    fn test_write_pads_short_columns() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let headers = vec!["0".to_string(), "1".to_string()];
        write_columns(&path, &headers, &[vec![1usize, 2, 3], vec![4usize]]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["0,1", "1,4", "2,", "3,"]);
    }
}
