//! Dense linear algebra on small row-major matrices.
//!
//! Model fits in this crate have a handful of parameters, so plain Gaussian
//! elimination with partial pivoting is sufficient.

use kinex_core::{KinexError, Result};

const PIVOT_EPS: f64 = 1e-12;

/// Solve `A x = b` for square row-major `a` (n×n).
pub fn solve(a: &[f64], b: &[f64], n: usize) -> Result<Vec<f64>> {
    check_square(a, n)?;
    if b.len() != n {
        return Err(KinexError::InvalidInput(format!(
            "solve: rhs has length {}, expected {}",
            b.len(),
            n
        )));
    }

    let cols = n + 1;
    let mut aug = vec![0.0; n * cols];
    for i in 0..n {
        aug[i * cols..i * cols + n].copy_from_slice(&a[i * n..(i + 1) * n]);
        aug[i * cols + n] = b[i];
    }
    let scale = max_abs(a);

    for col in 0..n {
        let pivot_row = pivot(&aug, cols, col, n);
        if aug[pivot_row * cols + col].abs() <= PIVOT_EPS * scale {
            return Err(KinexError::Singular(format!(
                "pivot {col} vanishes in linear solve"
            )));
        }
        swap_rows(&mut aug, cols, col, pivot_row);
        let p = aug[col * cols + col];
        for row in (col + 1)..n {
            let factor = aug[row * cols + col] / p;
            if factor == 0.0 {
                continue;
            }
            for j in col..cols {
                aug[row * cols + j] -= factor * aug[col * cols + j];
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = aug[i * cols + n];
        for j in (i + 1)..n {
            sum -= aug[i * cols + j] * x[j];
        }
        x[i] = sum / aug[i * cols + i];
    }
    Ok(x)
}

/// Invert square row-major `a` (n×n) by Gauss-Jordan elimination.
pub fn invert(a: &[f64], n: usize) -> Result<Vec<f64>> {
    check_square(a, n)?;
    let cols = 2 * n;
    let mut aug = vec![0.0; n * cols];
    for i in 0..n {
        aug[i * cols..i * cols + n].copy_from_slice(&a[i * n..(i + 1) * n]);
        aug[i * cols + n + i] = 1.0;
    }
    let scale = max_abs(a);

    for col in 0..n {
        let pivot_row = pivot(&aug, cols, col, n);
        if aug[pivot_row * cols + col].abs() <= PIVOT_EPS * scale {
            return Err(KinexError::Singular(format!(
                "pivot {col} vanishes in matrix inverse"
            )));
        }
        swap_rows(&mut aug, cols, col, pivot_row);
        let p = aug[col * cols + col];
        for j in 0..cols {
            aug[col * cols + j] /= p;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[row * cols + col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..cols {
                aug[row * cols + j] -= factor * aug[col * cols + j];
            }
        }
    }

    let mut inv = vec![0.0; n * n];
    for i in 0..n {
        inv[i * n..(i + 1) * n].copy_from_slice(&aug[i * cols + n..(i + 1) * cols]);
    }
    Ok(inv)
}

fn check_square(a: &[f64], n: usize) -> Result<()> {
    if n == 0 || a.len() != n * n {
        return Err(KinexError::InvalidInput(format!(
            "expected a non-empty {n}x{n} matrix, got {} values",
            a.len()
        )));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(KinexError::InvalidInput("matrix has non-finite entries".into()));
    }
    Ok(())
}

fn max_abs(a: &[f64]) -> f64 {
    a.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(f64::MIN_POSITIVE)
}

fn pivot(aug: &[f64], cols: usize, col: usize, n: usize) -> usize {
    let mut best = col;
    for row in (col + 1)..n {
        if aug[row * cols + col].abs() > aug[best * cols + col].abs() {
            best = row;
        }
    }
    best
}

fn swap_rows(aug: &mut [f64], cols: usize, r1: usize, r2: usize) {
    if r1 == r2 {
        return;
    }
    for j in 0..cols {
        aug.swap(r1 * cols + j, r2 * cols + j);
    }
}
