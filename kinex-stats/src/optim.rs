//! Quasi-Newton minimisation with numerical derivatives.
//!
//! [`minimize`] runs BFGS with Armijo backtracking on an objective closure.
//! Gradients come from central differences, so objectives only need to
//! return a value; non-finite values are treated as infeasible points and
//! the line search backs away from them. [`hessian`] gives the
//! central-difference Hessian used for standard errors at the optimum.

use kinex_core::{KinexError, Result};

/// Stopping rules for [`minimize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimConfig {
    /// Maximum number of BFGS iterations.
    pub max_iter: usize,
    /// Converged when the gradient infinity-norm falls below this.
    pub grad_tol: f64,
    /// Converged when the objective changes by less than this, relatively.
    pub f_tol: f64,
}

impl Default for OptimConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            grad_tol: 1e-6,
            f_tol: 1e-12,
        }
    }
}

/// Location and value of a converged minimum.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

const ARMIJO_C1: f64 = 1e-4;
const MIN_STEP: f64 = 1e-14;

/// Minimise `f` starting from `x0`.
///
/// # Errors
///
/// `InvalidInput` if `x0` is empty or `f(x0)` is not finite; `Convergence` if
/// neither stopping rule is met within `max_iter` iterations or the line
/// search cannot make progress.
pub fn minimize<F>(f: F, x0: &[f64], config: &OptimConfig) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    let n = x0.len();
    if n == 0 {
        return Err(KinexError::InvalidInput("minimize: no parameters".into()));
    }
    let mut x = x0.to_vec();
    let mut fx = f(&x);
    if !fx.is_finite() {
        return Err(KinexError::InvalidInput(
            "minimize: objective is not finite at the starting point".into(),
        ));
    }
    let mut g = gradient(&f, &x);
    let mut h_inv = identity(n);
    let mut fresh = true;

    for iter in 0..config.max_iter {
        if inf_norm(&g) < config.grad_tol {
            return Ok(Minimum { x, value: fx, iterations: iter });
        }

        let mut p = mat_vec(&h_inv, &g, n);
        p.iter_mut().for_each(|v| *v = -*v);
        let mut slope = dot(&g, &p);
        if slope >= 0.0 {
            // Curvature estimate went bad; fall back to steepest descent.
            h_inv = identity(n);
            fresh = true;
            p = g.iter().map(|v| -v).collect();
            slope = dot(&g, &p);
        }

        let mut t = 1.0;
        let (x_new, f_new) = loop {
            let candidate: Vec<f64> = x.iter().zip(&p).map(|(xi, pi)| xi + t * pi).collect();
            let fc = f(&candidate);
            if fc.is_finite() && fc <= fx + ARMIJO_C1 * t * slope {
                break (candidate, fc);
            }
            t *= 0.5;
            if t < MIN_STEP {
                if !fresh {
                    break (Vec::new(), f64::NAN);
                }
                // Numerical gradients bottom out near the optimum.
                if inf_norm(&g) < config.grad_tol.sqrt() {
                    return Ok(Minimum { x, value: fx, iterations: iter });
                }
                return Err(KinexError::Convergence(format!(
                    "line search stalled after {iter} iterations (|grad| = {:.3e})",
                    inf_norm(&g)
                )));
            }
        };
        if x_new.is_empty() {
            h_inv = identity(n);
            fresh = true;
            continue;
        }

        let g_new = gradient(&f, &x_new);
        let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);
        if sy > 1e-12 * dot(&s, &s).sqrt() * dot(&y, &y).sqrt() {
            if fresh {
                let scale = sy / dot(&y, &y);
                h_inv = identity(n);
                h_inv.iter_mut().for_each(|v| *v *= scale);
            }
            bfgs_update(&mut h_inv, &s, &y, sy, n);
            fresh = false;
        }

        let f_change = (fx - f_new).abs();
        x = x_new;
        g = g_new;
        let prev = fx;
        fx = f_new;
        if f_change <= config.f_tol * (prev.abs() + config.f_tol)
            && inf_norm(&g) < config.grad_tol.sqrt()
        {
            return Ok(Minimum { x, value: fx, iterations: iter + 1 });
        }
    }

    if inf_norm(&g) < config.grad_tol {
        return Ok(Minimum { x, value: fx, iterations: config.max_iter });
    }
    Err(KinexError::Convergence(format!(
        "BFGS did not converge in {} iterations (|grad| = {:.3e})",
        config.max_iter,
        inf_norm(&g)
    )))
}

/// Central-difference gradient of `f` at `x`.
pub fn gradient<F>(f: &F, x: &[f64]) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut probe = x.to_vec();
    (0..x.len())
        .map(|i| {
            let h = 1e-6 * x[i].abs().max(1.0);
            probe[i] = x[i] + h;
            let up = f(&probe);
            probe[i] = x[i] - h;
            let down = f(&probe);
            probe[i] = x[i];
            (up - down) / (2.0 * h)
        })
        .collect()
}

/// Central-difference Hessian of `f` at `x`, row-major n×n and symmetric.
pub fn hessian<F>(f: &F, x: &[f64]) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = x.len();
    let steps: Vec<f64> = x.iter().map(|v| 1e-4 * v.abs().max(1.0)).collect();
    let f0 = f(x);
    let mut probe = x.to_vec();
    let mut eval = |deltas: &[(usize, f64)]| {
        for &(i, d) in deltas {
            probe[i] = x[i] + d;
        }
        let v = f(&probe);
        for &(i, _) in deltas {
            probe[i] = x[i];
        }
        v
    };

    let mut h = vec![0.0; n * n];
    for i in 0..n {
        let hi = steps[i];
        let up = eval(&[(i, hi)]);
        let down = eval(&[(i, -hi)]);
        h[i * n + i] = (up - 2.0 * f0 + down) / (hi * hi);
        for j in 0..i {
            let hj = steps[j];
            let pp = eval(&[(i, hi), (j, hj)]);
            let pm = eval(&[(i, hi), (j, -hj)]);
            let mp = eval(&[(i, -hi), (j, hj)]);
            let mm = eval(&[(i, -hi), (j, -hj)]);
            let v = (pp - pm - mp + mm) / (4.0 * hi * hj);
            h[i * n + j] = v;
            h[j * n + i] = v;
        }
    }
    h
}

// H ← (I − ρ s yᵀ) H (I − ρ y sᵀ) + ρ s sᵀ
fn bfgs_update(h: &mut [f64], s: &[f64], y: &[f64], sy: f64, n: usize) {
    let rho = 1.0 / sy;
    let hy = mat_vec(h, y, n);
    let yhy = dot(y, &hy);
    for i in 0..n {
        for j in 0..n {
            h[i * n + j] +=
                -rho * (s[i] * hy[j] + hy[i] * s[j]) + (rho * rho * yhy + rho) * s[i] * s[j];
        }
    }
}

fn identity(n: usize) -> Vec<f64> {
    let mut m = vec![0.0; n * n];
    for i in 0..n {
        m[i * n + i] = 1.0;
    }
    m
}

fn mat_vec(m: &[f64], v: &[f64], n: usize) -> Vec<f64> {
    (0..n).map(|i| dot(&m[i * n..(i + 1) * n], v)).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}
