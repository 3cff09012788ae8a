//! Mantel test for association between two relationship matrices.
//!
//! Both matrices are defined over the same ordered set of entities (here,
//! households). The statistic is the correlation between corresponding
//! off-diagonal cells; significance comes from jointly permuting the rows
//! and columns of the first matrix, which preserves its internal structure
//! while breaking the pairing with the second.
//!
//! # Example
//!
//! ```
//! use kinex_stats::mantel::{mantel_test, MantelConfig};
//!
//! let a = vec![
//!     vec![0.0, 1.0, 2.0, 3.0],
//!     vec![1.0, 0.0, 1.5, 2.5],
//!     vec![2.0, 1.5, 0.0, 1.0],
//!     vec![3.0, 2.5, 1.0, 0.0],
//! ];
//! let config = MantelConfig { permutations: 99, ..MantelConfig::default() };
//! let result = mantel_test(&a, &a, &config).unwrap();
//! assert!((result.statistic - 1.0).abs() < 1e-12);
//! ```

use kinex_core::{KinexError, Result, Scored, Summarizable};

use crate::correlation;
use crate::rng::Xorshift64;

/// Correlation used for the Mantel statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
}

/// Which tail(s) of the permutation distribution count as extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alternative {
    /// `|r_perm| >= |r_obs|`
    #[default]
    TwoSided,
    /// `r_perm >= r_obs`
    Greater,
    /// `r_perm <= r_obs`
    Less,
}

impl std::fmt::Display for Alternative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Alternative::TwoSided => "two-sided",
            Alternative::Greater => "greater",
            Alternative::Less => "less",
        })
    }
}

impl std::str::FromStr for Alternative {
    type Err = KinexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "two-sided" | "two.sided" => Ok(Alternative::TwoSided),
            "greater" => Ok(Alternative::Greater),
            "less" => Ok(Alternative::Less),
            other => Err(KinexError::InvalidInput(format!(
                "mantel: alternative must be 'two-sided', 'greater' or 'less', got '{other}'"
            ))),
        }
    }
}

/// Parameters of a Mantel test.
#[derive(Debug, Clone, PartialEq)]
pub struct MantelConfig {
    /// Number of random relabellings of the first matrix.
    pub permutations: usize,
    /// Seed for the permutation stream.
    pub seed: u64,
    pub method: CorrelationMethod,
    pub alternative: Alternative,
}

impl Default for MantelConfig {
    fn default() -> Self {
        Self {
            permutations: 20_000,
            seed: 1,
            method: CorrelationMethod::Pearson,
            alternative: Alternative::TwoSided,
        }
    }
}

/// Result of a Mantel test.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MantelResult {
    /// Observed correlation between the off-diagonal cells.
    pub statistic: f64,
    /// Empirical p-value, `(extreme + 1) / (permutations + 1)`.
    pub p_value: f64,
    /// Number of permutations drawn.
    pub permutations: usize,
    /// Number of permuted statistics at least as extreme as the observed one.
    pub n_extreme: usize,
    pub method: CorrelationMethod,
    pub alternative: Alternative,
}

impl Scored for MantelResult {
    fn score(&self) -> f64 {
        self.p_value
    }
}

impl Summarizable for MantelResult {
    fn summary(&self) -> String {
        format!(
            "Mantel ({:?}, {}): r = {:.4}, p = {:.5} ({} permutations)",
            self.method, self.alternative, self.statistic, self.p_value, self.permutations
        )
    }
}

/// Mantel test between `matrix_a` and `matrix_b`.
///
/// Every off-diagonal cell takes part, including zeros.
///
/// # Errors
///
/// Returns an error if the matrices are not square, symmetric and finite,
/// differ in size, have fewer than 3 rows, or if `permutations` is zero.
pub fn mantel_test(
    matrix_a: &[Vec<f64>],
    matrix_b: &[Vec<f64>],
    config: &MantelConfig,
) -> Result<MantelResult> {
    let n = matrix_a.len();
    validate_relationship_matrix(matrix_a)?;
    validate_relationship_matrix(matrix_b)?;
    if matrix_b.len() != n {
        return Err(KinexError::InvalidInput(format!(
            "mantel: matrices must have same size ({} vs {})",
            n,
            matrix_b.len()
        )));
    }
    if config.permutations == 0 {
        return Err(KinexError::InvalidInput(
            "mantel: permutations must be > 0".into(),
        ));
    }

    let flat_b = upper_triangle(matrix_b, None);
    let observed = statistic(&upper_triangle(matrix_a, None), &flat_b, config.method)?;

    let mut rng = Xorshift64::new(config.seed);
    let mut order: Vec<usize> = (0..n).collect();
    let mut n_extreme = 0usize;

    for _ in 0..config.permutations {
        rng.shuffle(&mut order);
        let permuted = upper_triangle(matrix_a, Some(&order));
        let r = statistic(&permuted, &flat_b, config.method)?;
        if is_extreme(r, observed, config.alternative) {
            n_extreme += 1;
        }
    }

    let p_value = (n_extreme as f64 + 1.0) / (config.permutations as f64 + 1.0);

    Ok(MantelResult {
        statistic: observed,
        p_value,
        permutations: config.permutations,
        n_extreme,
        method: config.method,
        alternative: config.alternative,
    })
}

/// Mantel statistic alone, without the permutation procedure.
pub fn mantel_statistic(
    matrix_a: &[Vec<f64>],
    matrix_b: &[Vec<f64>],
    method: CorrelationMethod,
) -> Result<f64> {
    validate_relationship_matrix(matrix_a)?;
    validate_relationship_matrix(matrix_b)?;
    if matrix_a.len() != matrix_b.len() {
        return Err(KinexError::InvalidInput(format!(
            "mantel: matrices must have same size ({} vs {})",
            matrix_a.len(),
            matrix_b.len()
        )));
    }
    statistic(
        &upper_triangle(matrix_a, None),
        &upper_triangle(matrix_b, None),
        method,
    )
}

fn statistic(a: &[f64], b: &[f64], method: CorrelationMethod) -> Result<f64> {
    match method {
        CorrelationMethod::Pearson => correlation::pearson(a, b),
        CorrelationMethod::Spearman => correlation::spearman(a, b),
    }
}

// Relative slack absorbs floating-point noise in the permuted statistic when
// the permutation maps a matrix onto itself.
fn is_extreme(r: f64, observed: f64, alternative: Alternative) -> bool {
    let slack = 1e-12 * observed.abs().max(1.0);
    match alternative {
        Alternative::TwoSided => r.abs() >= observed.abs() - slack,
        Alternative::Greater => r >= observed - slack,
        Alternative::Less => r <= observed + slack,
    }
}

// ── Common helpers ──────────────────────────────────────────────────────────

/// Strict upper triangle, row by row, optionally relabelled by `order`.
fn upper_triangle(matrix: &[Vec<f64>], order: Option<&[usize]>) -> Vec<f64> {
    let n = matrix.len();
    let mut v = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let value = match order {
                Some(p) => matrix[p[i]][p[j]],
                None => matrix[i][j],
            };
            v.push(value);
        }
    }
    v
}

fn validate_relationship_matrix(matrix: &[Vec<f64>]) -> Result<()> {
    let n = matrix.len();
    if n < 3 {
        return Err(KinexError::InvalidInput(
            "mantel: matrix must have at least 3 rows".into(),
        ));
    }
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            return Err(KinexError::InvalidInput(format!(
                "mantel: matrix must be square (row {} has {} columns, expected {})",
                i,
                row.len(),
                n
            )));
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (matrix[i][j], matrix[j][i]);
            if !a.is_finite() || !b.is_finite() {
                return Err(KinexError::InvalidInput(format!(
                    "mantel: non-finite value at ({i}, {j})"
                )));
            }
            if (a - b).abs() > 1e-9 * a.abs().max(b.abs()).max(1.0) {
                return Err(KinexError::InvalidInput(format!(
                    "mantel: matrix is not symmetric at ({i}, {j}): {a} vs {b}"
                )));
            }
        }
    }
    Ok(())
}
