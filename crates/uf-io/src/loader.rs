//! Delimited-text ingestion.
//!
//! Input files are comma-separated with a header row. Column names ending
//! in the truth suffix (default `"sim"`) carry the simulated/true quantity;
//! every other column carries the measured one. Both sides are sorted by
//! column name and zipped row-wise into two equal-length, index-aligned
//! vector sequences — the only input shape the core consumes.

use std::fs;
use std::path::Path;
use tracing::debug;
use uf_core::{Error, Result};

/// Default column-name suffix marking the truth side.
pub const TRUTH_SUFFIX: &str = "sim";

#[derive(Debug, Clone)]
struct Column {
    name: String,
    data: Vec<f64>,
}

/// Aligned measured/truth row collections parsed from delimited text.
#[derive(Debug, Clone)]
pub struct InputData {
    /// Measured-side column names, sorted.
    pub measured_names: Vec<String>,
    /// Truth-side column names, sorted.
    pub truth_names: Vec<String>,
    /// Measured rows; each row has one entry per measured column.
    pub measured: Vec<Vec<f64>>,
    /// Truth rows, index-aligned with `measured`.
    pub truth: Vec<Vec<f64>>,
}

impl InputData {
    /// Full column dimensionality of either side.
    pub fn dims(&self) -> usize {
        self.measured_names.len()
    }

    /// Number of aligned rows.
    pub fn len(&self) -> usize {
        self.measured.len()
    }

    /// True when no rows were parsed.
    pub fn is_empty(&self) -> bool {
        self.measured.is_empty()
    }

    /// Select `dims` active columns, rotating the column order by
    /// `dim_shift`, and return the two reduced, aligned row collections.
    pub fn select(&self, dims: usize, dim_shift: usize) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        let total = self.dims();
        if dims == 0 || dims > total {
            return Err(Error::Configuration(format!(
                "active dimensionality {dims} invalid for {total} column(s)"
            )));
        }
        let cols: Vec<usize> = (0..dims).map(|k| (k + dim_shift) % total).collect();
        let reduce = |rows: &[Vec<f64>]| -> Vec<Vec<f64>> {
            rows.iter().map(|row| cols.iter().map(|&c| row[c]).collect()).collect()
        };
        Ok((reduce(&self.measured), reduce(&self.truth)))
    }
}

/// Load and pair one or more delimited files.
///
/// Columns from all files are pooled before pairing; the two sides must
/// end up with equal column counts.
pub fn load_delimited<P: AsRef<Path>>(paths: &[P], truth_suffix: &str) -> Result<InputData> {
    let mut columns: Vec<Column> = Vec::new();
    for path in paths {
        parse_file(path.as_ref(), &mut columns)?;
    }
    if columns.is_empty() {
        return Err(Error::Input("no columns parsed".to_string()));
    }

    let (mut truth_cols, mut measured_cols): (Vec<Column>, Vec<Column>) =
        columns.into_iter().partition(|c| c.name.ends_with(truth_suffix));
    if truth_cols.len() != measured_cols.len() {
        return Err(Error::Input(format!(
            "unpaired columns: {} measured vs {} truth (suffix '{truth_suffix}')",
            measured_cols.len(),
            truth_cols.len()
        )));
    }
    measured_cols.sort_by(|a, b| a.name.cmp(&b.name));
    truth_cols.sort_by(|a, b| a.name.cmp(&b.name));

    let rows = measured_cols[0].data.len();
    for c in measured_cols.iter().chain(truth_cols.iter()) {
        if c.data.len() != rows {
            return Err(Error::Input(format!(
                "column '{}' has {} rows, expected {rows}",
                c.name,
                c.data.len()
            )));
        }
    }

    let to_rows = |cols: &[Column]| -> Vec<Vec<f64>> {
        (0..rows).map(|r| cols.iter().map(|c| c.data[r]).collect()).collect()
    };
    let data = InputData {
        measured_names: measured_cols.iter().map(|c| c.name.clone()).collect(),
        truth_names: truth_cols.iter().map(|c| c.name.clone()).collect(),
        measured: to_rows(&measured_cols),
        truth: to_rows(&truth_cols),
    };
    debug!(rows = data.len(), dims = data.dims(), "input data loaded");
    Ok(data)
}

fn parse_file(path: &Path, columns: &mut Vec<Column>) -> Result<()> {
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| Error::Input(format!("{}: empty file", path.display())))?;

    let start = columns.len();
    for name in header.split(',') {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Input(format!("{}: empty column name", path.display())));
        }
        columns.push(Column { name: name.to_string(), data: Vec::new() });
    }
    let width = columns.len() - start;

    for (lineno, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != width {
            return Err(Error::Input(format!(
                "{}:{}: expected {width} fields, found {}",
                path.display(),
                lineno + 2,
                fields.len()
            )));
        }
        for (k, field) in fields.iter().enumerate() {
            let value: f64 = field.parse().map_err(|_| {
                Error::Input(format!(
                    "{}:{}: unparsable number '{field}'",
                    path.display(),
                    lineno + 2
                ))
            })?;
            columns[start + k].data.push(value);
        }
    }
    Ok(())
}
