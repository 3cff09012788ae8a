//! Gauss-Hermite quadrature for integrating over normal random effects.

use kinex_core::{KinexError, Result};

/// Nodes and weights of an n-point Gauss-Hermite rule.
///
/// Integrates `∫ f(x) exp(-x²) dx ≈ Σ wᵢ f(xᵢ)`; the weights sum to √π.
/// Nodes are returned in descending order.
#[derive(Debug, Clone)]
pub struct GaussHermite {
    pub nodes: Vec<f64>,
    pub weights: Vec<f64>,
}

impl GaussHermite {
    /// Compute the rule by Newton iteration on the orthonormal Hermite
    /// recurrence.
    pub fn new(n: usize) -> Result<Self> {
        if !(1..=100).contains(&n) {
            return Err(KinexError::InvalidInput(format!(
                "gauss_hermite: need 1..=100 points, got {n}"
            )));
        }
        const EPS: f64 = 3e-14;
        const PI_M4: f64 = 0.751_125_544_464_942_5; // π^(-1/4)
        const MAX_ITER: usize = 100;

        let nf = n as f64;
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        let m = (n + 1) / 2;
        let mut z = 0.0_f64;

        for i in 0..m {
            z = match i {
                0 => (2.0 * nf + 1.0).sqrt() - 1.85575 * (2.0 * nf + 1.0).powf(-0.16667),
                1 => z - 1.14 * nf.powf(0.426) / z,
                2 => 1.86 * z - 0.86 * nodes[0],
                3 => 1.91 * z - 0.91 * nodes[1],
                _ => 2.0 * z - nodes[i - 2],
            };

            let mut pp = 0.0;
            let mut converged = false;
            for _ in 0..MAX_ITER {
                let mut p1 = PI_M4;
                let mut p2 = 0.0;
                for j in 1..=n {
                    let p3 = p2;
                    p2 = p1;
                    let jf = j as f64;
                    p1 = z * (2.0 / jf).sqrt() * p2 - ((jf - 1.0) / jf).sqrt() * p3;
                }
                pp = (2.0 * nf).sqrt() * p2;
                let z1 = z;
                z = z1 - p1 / pp;
                if (z - z1).abs() <= EPS {
                    converged = true;
                    break;
                }
            }
            if !converged {
                return Err(KinexError::Convergence(format!(
                    "gauss_hermite: root {i} of {n} did not converge"
                )));
            }
            nodes[i] = z;
            nodes[n - 1 - i] = -z;
            weights[i] = 2.0 / (pp * pp);
            weights[n - 1 - i] = weights[i];
        }

        Ok(Self { nodes, weights })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The rule rescaled for a standard normal: `(z, w)` pairs with
    /// `E[g(Z)] ≈ Σ w g(z)` for `Z ~ N(0, 1)`. Uses `z = √2 x`, `w = wᵢ / √π`.
    pub fn standard_normal(&self) -> Vec<(f64, f64)> {
        let norm = core::f64::consts::PI.sqrt();
        self.nodes
            .iter()
            .zip(&self.weights)
            .map(|(&x, &w)| (core::f64::consts::SQRT_2 * x, w / norm))
            .collect()
    }
}
