//! Labelled square matrices stored as CSV.
//!
//! The first row holds the column labels (its first cell is ignored) and
//! every following row starts with its own label:
//!
//! ```text
//! ,1,2,3
//! 1,0,0.5,0.25
//! 2,0.5,0,1
//! 3,0.25,1,0
//! ```

use std::path::Path;

use ::csv::ReaderBuilder;
use kinex_core::{KinexError, Result};

use crate::{open, parse_error};

/// A square matrix whose rows and columns share one label set.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl LabeledMatrix {
    /// Build a matrix, checking it is square and matches `labels`.
    pub fn new(labels: Vec<String>, values: Vec<Vec<f64>>) -> Result<Self> {
        let n = labels.len();
        if values.len() != n || values.iter().any(|row| row.len() != n) {
            return Err(KinexError::InvalidInput(format!(
                "matrix: expected {n}x{n} values for {n} labels"
            )));
        }
        let mut seen = labels.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != n {
            return Err(KinexError::InvalidInput("matrix: duplicate labels".into()));
        }
        Ok(Self { labels, values })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The same matrix with rows and columns rearranged into `order`.
    ///
    /// `order` must be a permutation of this matrix's labels.
    pub fn reorder<S: AsRef<str>>(&self, order: &[S]) -> Result<Self> {
        if order.len() != self.len() {
            return Err(KinexError::InvalidInput(format!(
                "reorder: {} labels given for a {}-label matrix",
                order.len(),
                self.len()
            )));
        }
        let index: Vec<usize> = order
            .iter()
            .map(|label| {
                let label = label.as_ref();
                self.labels
                    .iter()
                    .position(|l| l == label)
                    .ok_or_else(|| {
                        KinexError::InvalidInput(format!("reorder: unknown label '{label}'"))
                    })
            })
            .collect::<Result<_>>()?;
        let values = index
            .iter()
            .map(|&i| index.iter().map(|&j| self.values[i][j]).collect())
            .collect();
        Self::new(order.iter().map(|l| l.as_ref().to_string()).collect(), values)
    }
}

/// Read a labelled square matrix from a CSV file.
///
/// # Errors
///
/// `Io` if the file cannot be opened; `Parse` for non-numeric cells, ragged
/// rows or row labels that differ from the header labels.
pub fn read_matrix(path: impl AsRef<Path>) -> Result<LabeledMatrix> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(::csv::Trim::All)
        .from_reader(open(path)?);

    let headers = reader.headers().map_err(|e| parse_error(path, e))?;
    let labels: Vec<String> = headers.iter().skip(1).map(|s| s.to_string()).collect();

    let mut values = Vec::with_capacity(labels.len());
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| parse_error(path, e))?;
        let row_label = record.get(0).unwrap_or_default();
        match labels.get(row_idx) {
            Some(expected) if expected == row_label => {}
            _ => {
                return Err(parse_error(
                    path,
                    format!(
                        "row {} is labelled '{row_label}', expected the column order",
                        row_idx + 1
                    ),
                ))
            }
        }
        let row = record
            .iter()
            .skip(1)
            .map(|cell| {
                cell.parse::<f64>().map_err(|_| {
                    parse_error(path, format!("row '{row_label}': '{cell}' is not a number"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        values.push(row);
    }

    LabeledMatrix::new(labels, values).map_err(|e| parse_error(path, e))
}
