//! Poisson regression by iteratively reweighted least squares.
//!
//! Fits `log E[y] = Xβ` for count responses. Alongside the maximum
//! likelihood fit, [`PoissonFit`] carries the Pearson χ² and the
//! quasi-Poisson dispersion estimate `χ²_P / (n − p)` used to judge
//! overdispersion.
//!
//! # Example
//!
//! ```
//! use kinex_stats::glm::{poisson_glm, GlmConfig};
//! use kinex_stats::model_frame::{Factor, Formula, Frame, Term};
//!
//! let frame = Frame::new()
//!     .with_numeric("degree", vec![2.0, 3.0, 1.0, 6.0, 7.0, 5.0])
//!     .unwrap()
//!     .with_factor(
//!         "head",
//!         Factor::from_labels(&["FALSE", "FALSE", "FALSE", "TRUE", "TRUE", "TRUE"]),
//!     )
//!     .unwrap();
//! let formula = Formula::new("degree").term(Term::Factor("head".into()));
//! let fit = poisson_glm(&frame, &formula, &GlmConfig::default()).unwrap();
//! // exp(β_head) is the ratio of group means, 6 / 2.
//! assert!((fit.coefficients[1].exp() - 3.0).abs() < 1e-6);
//! ```

use kinex_core::{KinexError, Result, Summarizable};

use crate::distribution::{Normal, Poisson};
use crate::linalg;
use crate::model_frame::{DesignMatrix, Formula, Frame};
use crate::model_selection::LikelihoodModel;

/// IRLS stopping rules; defaults follow the usual `glm` control values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlmConfig {
    pub max_iter: usize,
    /// Relative deviance change that counts as converged.
    pub tol: f64,
}

impl Default for GlmConfig {
    fn default() -> Self {
        Self {
            max_iter: 25,
            tol: 1e-8,
        }
    }
}

/// A fitted Poisson log-linear model.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoissonFit {
    /// Rendered formula, e.g. `degree ~ factor(head) + factor(gender)`.
    pub formula: String,
    pub coefficient_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub z_values: Vec<f64>,
    pub p_values: Vec<f64>,
    /// Fitted means.
    pub fitted: Vec<f64>,
    pub deviance: f64,
    /// Deviance of the intercept-only model.
    pub null_deviance: f64,
    pub log_likelihood: f64,
    pub pearson_chi2: f64,
    /// Quasi-Poisson dispersion, `pearson_chi2 / df_residual`.
    pub dispersion: f64,
    pub n_obs: usize,
    pub n_params: usize,
    pub df_residual: usize,
    pub iterations: usize,
}

impl PoissonFit {
    /// Akaike information criterion.
    pub fn aic(&self) -> f64 {
        crate::model_selection::aic(self.log_likelihood, self.n_params)
    }

    /// Bayesian information criterion.
    pub fn bic(&self) -> f64 {
        crate::model_selection::bic(self.log_likelihood, self.n_params, self.n_obs)
    }

    /// Standard errors rescaled by the quasi-Poisson dispersion.
    pub fn quasi_std_errors(&self) -> Vec<f64> {
        let scale = self.dispersion.sqrt();
        self.std_errors.iter().map(|se| se * scale).collect()
    }

    /// Whether the dispersion estimate exceeds `threshold` (1.0 is nominal).
    pub fn is_overdispersed(&self, threshold: f64) -> bool {
        self.dispersion > threshold
    }

    /// Multi-line coefficient table.
    pub fn coefficient_table(&self) -> String {
        let mut out = format!(
            "{:<20} {:>10} {:>10} {:>8} {:>10}\n",
            "", "Estimate", "Std.Error", "z", "Pr(>|z|)"
        );
        for i in 0..self.coefficients.len() {
            out.push_str(&format!(
                "{:<20} {:>10.4} {:>10.4} {:>8.3} {:>10.4}\n",
                self.coefficient_names[i],
                self.coefficients[i],
                self.std_errors[i],
                self.z_values[i],
                self.p_values[i]
            ));
        }
        out
    }
}

impl Summarizable for PoissonFit {
    fn summary(&self) -> String {
        format!(
            "Poisson GLM {}: deviance = {:.3} on {} df, logLik = {:.3}, dispersion = {:.3}",
            self.formula, self.deviance, self.df_residual, self.log_likelihood, self.dispersion
        )
    }
}

impl LikelihoodModel for PoissonFit {
    fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    fn n_params(&self) -> usize {
        self.n_params
    }

    fn label(&self) -> String {
        self.formula.clone()
    }
}

/// Fit a Poisson GLM with log link.
///
/// An intercept is always included.
///
/// # Errors
///
/// `InvalidInput` for a grouped formula, negative / non-integer / non-finite
/// responses or no residual degrees of freedom; `Singular` for a
/// rank-deficient design; `Convergence` if IRLS does not settle within
/// `max_iter` iterations.
pub fn poisson_glm(frame: &Frame, formula: &Formula, config: &GlmConfig) -> Result<PoissonFit> {
    if formula.group.is_some() {
        return Err(KinexError::InvalidInput(format!(
            "poisson_glm: random effects are not supported ('{formula}')"
        )));
    }
    let y = frame.numeric(&formula.response)?.to_vec();
    validate_counts(&y)?;
    let x = frame.design(&formula.terms, true)?;
    let n = x.rows;
    let p = x.cols;
    if n <= p {
        return Err(KinexError::InvalidInput(format!(
            "poisson_glm: {n} observations cannot support {p} parameters"
        )));
    }

    let (beta, mu, xtwx, deviance, iterations) = irls(&x, &y, config)?;

    let cov = linalg::invert(&xtwx, p)?;
    let std_errors: Vec<f64> = (0..p).map(|j| cov[j * p + j].max(0.0).sqrt()).collect();
    let z_values: Vec<f64> = beta
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| if *se > 0.0 { b / se } else { 0.0 })
        .collect();
    let p_values = z_values.iter().map(|&z| Normal::two_sided_p(z)).collect();

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let null_deviance = poisson_deviance(&y, &vec![y_mean; n]);
    let log_likelihood = poisson_log_likelihood(&y, &mu)?;
    let pearson_chi2: f64 = y.iter().zip(&mu).map(|(yi, mi)| (yi - mi).powi(2) / mi).sum();
    let df_residual = n - p;

    Ok(PoissonFit {
        formula: formula.to_string(),
        coefficient_names: x.column_names.clone(),
        coefficients: beta,
        std_errors,
        z_values,
        p_values,
        fitted: mu,
        deviance,
        null_deviance,
        log_likelihood,
        pearson_chi2,
        dispersion: pearson_chi2 / df_residual as f64,
        n_obs: n,
        n_params: p,
        df_residual,
        iterations,
    })
}

type IrlsState = (Vec<f64>, Vec<f64>, Vec<f64>, f64, usize);

fn irls(x: &DesignMatrix, y: &[f64], config: &GlmConfig) -> Result<IrlsState> {
    let n = x.rows;
    let p = x.cols;
    let mut mu: Vec<f64> = y.iter().map(|v| v + 0.1).collect();
    let mut eta: Vec<f64> = mu.iter().map(|m| m.ln()).collect();
    let mut dev_old = poisson_deviance(y, &mu);

    for iter in 1..=config.max_iter {
        // Working response and weights for the log link: z = η + (y − μ)/μ, w = μ.
        let mut xtwx = vec![0.0; p * p];
        let mut xtwz = vec![0.0; p];
        for i in 0..n {
            let w = mu[i];
            let z = eta[i] + (y[i] - mu[i]) / mu[i];
            let row = x.row(i);
            for a in 0..p {
                xtwz[a] += row[a] * w * z;
                for b in 0..p {
                    xtwx[a * p + b] += row[a] * w * row[b];
                }
            }
        }
        let beta = linalg::solve(&xtwx, &xtwz, p)?;
        eta = x.linear_predictor(&beta);
        mu = eta.iter().map(|e| e.exp()).collect();
        if mu.iter().any(|m| !m.is_finite() || *m <= 0.0) {
            return Err(KinexError::Convergence(
                "poisson_glm: fitted means left the valid range".into(),
            ));
        }

        let dev = poisson_deviance(y, &mu);
        if (dev - dev_old).abs() / (dev.abs() + 0.1) < config.tol {
            let xtwx_final = weighted_cross_product(x, &mu);
            return Ok((beta, mu, xtwx_final, dev, iter));
        }
        dev_old = dev;
    }

    Err(KinexError::Convergence(format!(
        "poisson_glm: IRLS did not converge in {} iterations",
        config.max_iter
    )))
}

fn weighted_cross_product(x: &DesignMatrix, w: &[f64]) -> Vec<f64> {
    let p = x.cols;
    let mut out = vec![0.0; p * p];
    for (i, wi) in w.iter().enumerate() {
        let row = x.row(i);
        for a in 0..p {
            for b in 0..p {
                out[a * p + b] += row[a] * wi * row[b];
            }
        }
    }
    out
}

/// Residual deviance `2 Σ [y ln(y/μ) − (y − μ)]`.
pub fn poisson_deviance(y: &[f64], mu: &[f64]) -> f64 {
    2.0 * y
        .iter()
        .zip(mu)
        .map(|(&yi, &mi)| {
            let term = if yi > 0.0 { yi * (yi / mi).ln() } else { 0.0 };
            term - (yi - mi)
        })
        .sum::<f64>()
}

fn poisson_log_likelihood(y: &[f64], mu: &[f64]) -> Result<f64> {
    let mut ll = 0.0;
    for (&yi, &mi) in y.iter().zip(mu) {
        ll += Poisson::new(mi)?.ln_pmf(yi);
    }
    Ok(ll)
}

fn validate_counts(y: &[f64]) -> Result<()> {
    for (i, &v) in y.iter().enumerate() {
        if !v.is_finite() || v < 0.0 || v.fract() != 0.0 {
            return Err(KinexError::InvalidInput(format!(
                "poisson_glm: response {i} is {v}, expected a non-negative count"
            )));
        }
    }
    Ok(())
}
