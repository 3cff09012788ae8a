//! Cumulative-link (proportional-odds) models for ordered outcomes.
//!
//! The fixed-effects model is
//!
//! ```text
//! P(Y ≤ j | x) = logistic(θ_j − xᵀβ)
//! ```
//!
//! with ordered thresholds θ₁ < … < θ_J. [`clmm`] adds a normal random
//! intercept `u_g ~ N(0, σ²)` shared by all observations of group `g`,
//! integrating it out of the likelihood with Gauss-Hermite quadrature.
//!
//! Both models are fitted by BFGS on an unconstrained parameter vector
//! `(θ₁, ln(θ₂ − θ₁), …, ln(θ_J − θ_{J−1}), β, [ln σ])`, which keeps the
//! thresholds ordered throughout.

use kinex_core::{KinexError, Result, Summarizable};

use crate::distribution::Normal;
use crate::linalg;
use crate::model_frame::{DesignMatrix, Formula, Frame};
use crate::model_selection::LikelihoodModel;
use crate::optim::{self, OptimConfig};
use crate::quadrature::GaussHermite;

/// Starting ln σ for the second mixed-model start; close enough to zero
/// that it reproduces the fixed-effects likelihood.
const LOG_SIGMA_NEAR_ZERO: f64 = -12.0;

/// Fitting controls for [`clm`] and [`clmm`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrdinalConfig {
    /// Gauss-Hermite points per group for the random intercept.
    pub quadrature_points: usize,
    pub optim: OptimConfig,
}

impl Default for OrdinalConfig {
    fn default() -> Self {
        Self {
            quadrature_points: 20,
            optim: OptimConfig::default(),
        }
    }
}

/// A fitted cumulative-link model, with or without random intercept.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrdinalFit {
    pub formula: String,
    /// Outcome levels in ascending order.
    pub levels: Vec<String>,
    pub thresholds: Vec<f64>,
    pub coefficient_names: Vec<String>,
    pub coefficients: Vec<f64>,
    /// Standard errors of thresholds followed by coefficients; `None` when
    /// the observed information matrix is not invertible.
    pub std_errors: Option<Vec<f64>>,
    /// Random-intercept standard deviation (mixed models only).
    pub sigma: Option<f64>,
    pub log_likelihood: f64,
    pub n_params: usize,
    pub n_obs: usize,
    pub n_groups: Option<usize>,
    pub iterations: usize,
}

impl OrdinalFit {
    pub fn aic(&self) -> f64 {
        crate::model_selection::aic(self.log_likelihood, self.n_params)
    }

    pub fn bic(&self) -> f64 {
        crate::model_selection::bic(self.log_likelihood, self.n_params, self.n_obs)
    }

    pub fn is_mixed(&self) -> bool {
        self.sigma.is_some()
    }

    /// Threshold labels in the `lower|upper` form, one per threshold.
    pub fn threshold_names(&self) -> Vec<String> {
        self.levels.windows(2).map(|w| format!("{}|{}", w[0], w[1])).collect()
    }

    /// Multi-line table of thresholds and coefficients with Wald tests.
    /// Standard errors print as `NA` when the information matrix was
    /// singular.
    pub fn coefficient_table(&self) -> String {
        let mut out = format!(
            "{:<20} {:>10} {:>10} {:>8} {:>10}\n",
            "", "Estimate", "Std.Error", "z", "Pr(>|z|)"
        );
        let names = self.threshold_names().into_iter().chain(self.coefficient_names.clone());
        let estimates = self.thresholds.iter().chain(&self.coefficients);
        for (i, (name, &estimate)) in names.zip(estimates).enumerate() {
            match self.std_errors.as_ref().map(|se| se[i]) {
                Some(se) => {
                    let z = estimate / se;
                    out.push_str(&format!(
                        "{:<20} {:>10.4} {:>10.4} {:>8.3} {:>10.4}\n",
                        name,
                        estimate,
                        se,
                        z,
                        Normal::two_sided_p(z)
                    ));
                }
                None => {
                    out.push_str(&format!(
                        "{:<20} {:>10.4} {:>10} {:>8} {:>10}\n",
                        name, estimate, "NA", "NA", "NA"
                    ));
                }
            }
        }
        out
    }
}

impl LikelihoodModel for OrdinalFit {
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

impl Summarizable for OrdinalFit {
    fn summary(&self) -> String {
        let sigma = match self.sigma {
            Some(s) => format!(", sigma = {s:.4}"),
            None => String::new(),
        };
        format!(
            "{} {}: logLik = {:.3}, AIC = {:.3}, BIC = {:.3}, {} params{}",
            if self.is_mixed() { "CLMM" } else { "CLM" },
            self.formula,
            self.log_likelihood,
            self.aic(),
            self.bic(),
            self.n_params,
            sigma
        )
    }
}

// ── Prepared data ──────────────────────────────────────────────────────────

struct OrdinalData {
    /// Outcome category per row, 0-based.
    y: Vec<usize>,
    x: DesignMatrix,
    levels: Vec<String>,
}

impl OrdinalData {
    fn new(frame: &Frame, formula: &Formula) -> Result<Self> {
        let response = frame.factor(&formula.response)?;
        if response.n_levels() < 2 {
            return Err(KinexError::InvalidInput(format!(
                "ordinal: outcome '{}' has {} observed level(s), need at least 2",
                formula.response,
                response.n_levels()
            )));
        }
        let x = frame.design(&formula.terms, false)?;
        Ok(Self {
            y: response.codes().to_vec(),
            x,
            levels: response.levels().to_vec(),
        })
    }

    fn n_thresholds(&self) -> usize {
        self.levels.len() - 1
    }

    fn n_beta(&self) -> usize {
        self.x.cols
    }

    /// Thresholds from the marginal cumulative proportions, β = 0.
    fn start(&self) -> Vec<f64> {
        let j = self.n_thresholds();
        let n = self.y.len() as f64;
        let mut counts = vec![0usize; j + 1];
        for &c in &self.y {
            counts[c] += 1;
        }
        let mut cum = 0usize;
        let mut thetas = Vec::with_capacity(j);
        for &c in counts.iter().take(j) {
            cum += c;
            let p = cum as f64 / n;
            thetas.push((p / (1.0 - p)).ln());
        }
        let mut params = Vec::with_capacity(j + self.n_beta());
        params.push(thetas[0]);
        for k in 1..j {
            params.push((thetas[k] - thetas[k - 1]).ln());
        }
        params.extend(std::iter::repeat(0.0).take(self.n_beta()));
        params
    }

    /// Negative log-likelihood of the fixed-effects model at natural
    /// `thresholds` and `beta`.
    fn fixed_nll(&self, thresholds: &[f64], beta: &[f64]) -> f64 {
        let eta = self.x.linear_predictor(beta);
        let ll: f64 = self
            .y
            .iter()
            .zip(&eta)
            .map(|(&y, &e)| ln_category_prob(thresholds, y, e))
            .sum();
        finite_or_inf(-ll)
    }

    /// Negative marginal log-likelihood with a random intercept of sd `sigma`.
    fn mixed_nll(
        &self,
        groups: &[Vec<usize>],
        gh: &QuadratureRule,
        thresholds: &[f64],
        beta: &[f64],
        sigma: f64,
    ) -> f64 {
        let eta = self.x.linear_predictor(beta);
        let mut ll = 0.0;
        let mut terms = vec![0.0; gh.shifts.len()];
        for members in groups {
            for (q, term) in terms.iter_mut().enumerate() {
                let u = gh.shifts[q] * sigma;
                *term = gh.ln_weights[q]
                    + members
                        .iter()
                        .map(|&i| ln_category_prob(thresholds, self.y[i], eta[i] + u))
                        .sum::<f64>();
            }
            ll += log_sum_exp(&terms);
        }
        finite_or_inf(-ll)
    }
}

/// Gauss-Hermite rule rescaled for a standard normal: `u = shift · σ`.
struct QuadratureRule {
    shifts: Vec<f64>,
    ln_weights: Vec<f64>,
}

impl QuadratureRule {
    fn new(points: usize) -> Result<Self> {
        let (shifts, weights): (Vec<f64>, Vec<f64>) =
            GaussHermite::new(points)?.standard_normal().into_iter().unzip();
        Ok(Self {
            shifts,
            ln_weights: weights.iter().map(|w| w.ln()).collect(),
        })
    }
}

// ── Fitting ────────────────────────────────────────────────────────────────

/// Fit a fixed-effects cumulative logit model.
///
/// The formula must not carry a grouping term; thresholds take the place
/// of an intercept.
///
/// # Errors
///
/// `InvalidInput` for a grouped formula or an outcome with fewer than two
/// levels; `Convergence` if the optimiser does not converge.
pub fn clm(frame: &Frame, formula: &Formula, config: &OrdinalConfig) -> Result<OrdinalFit> {
    if formula.group.is_some() {
        return Err(KinexError::InvalidInput(format!(
            "clm: '{formula}' has a random intercept, use clmm"
        )));
    }
    let data = OrdinalData::new(frame, formula)?;
    let j = data.n_thresholds();

    let objective = |params: &[f64]| {
        let thresholds = thresholds_from(&params[..j]);
        data.fixed_nll(&thresholds, &params[j..])
    };
    let min = optim::minimize(objective, &data.start(), &config.optim)?;

    let thresholds = thresholds_from(&min.x[..j]);
    let beta = min.x[j..].to_vec();

    let mut natural = thresholds.clone();
    natural.extend_from_slice(&beta);
    let std_errors = standard_errors(
        |p: &[f64]| {
            if !is_increasing(&p[..j]) {
                return f64::INFINITY;
            }
            data.fixed_nll(&p[..j], &p[j..])
        },
        &natural,
        natural.len(),
    );

    let fit = OrdinalFit {
        formula: formula.to_string(),
        levels: data.levels.clone(),
        thresholds,
        coefficient_names: data.x.column_names.clone(),
        coefficients: beta,
        std_errors,
        sigma: None,
        log_likelihood: -min.value,
        n_params: j + data.n_beta(),
        n_obs: data.y.len(),
        n_groups: None,
        iterations: min.iterations,
    };
    tracing::debug!(
        formula = %fit.formula,
        log_lik = fit.log_likelihood,
        iterations = fit.iterations,
        "clm fitted"
    );
    Ok(fit)
}

/// Fit a cumulative logit model with a random intercept per level of
/// `formula.group`.
///
/// The optimiser is started twice from the fixed-effects estimates, once
/// with σ = 1 and once with σ ≈ 0, and the better optimum is kept. The
/// second start guarantees the mixed fit is never worse than the
/// corresponding [`clm`] fit beyond quadrature error.
///
/// # Errors
///
/// `InvalidInput` for a formula without a grouping term, an outcome with
/// fewer than two levels or an invalid quadrature size; `Convergence` if
/// neither start converges.
pub fn clmm(frame: &Frame, formula: &Formula, config: &OrdinalConfig) -> Result<OrdinalFit> {
    let group = formula.group.as_deref().ok_or_else(|| {
        KinexError::InvalidInput(format!("clmm: '{formula}' has no random intercept, use clm"))
    })?;
    if config.quadrature_points < 2 {
        return Err(KinexError::InvalidInput(format!(
            "clmm: need at least 2 quadrature points, got {}",
            config.quadrature_points
        )));
    }
    let data = OrdinalData::new(frame, formula)?;
    let groups = group_members(&frame.factor(group)?);
    let rule = QuadratureRule::new(config.quadrature_points)?;
    let j = data.n_thresholds();
    let k = j + data.n_beta();

    let fixed = clm(frame, &formula.without_group()?, config)?;
    let mut base = thresholds_to_params(&fixed.thresholds);
    base.extend_from_slice(&fixed.coefficients);

    let objective = |params: &[f64]| {
        let thresholds = thresholds_from(&params[..j]);
        data.mixed_nll(&groups, &rule, &thresholds, &params[j..k], params[k].exp())
    };

    let mut best: Option<optim::Minimum> = None;
    let mut last_err = None;
    for log_sigma in [0.0, LOG_SIGMA_NEAR_ZERO] {
        let mut start = base.clone();
        start.push(log_sigma);
        match optim::minimize(objective, &start, &config.optim) {
            Ok(min) => {
                tracing::debug!(
                    start_log_sigma = log_sigma,
                    nll = min.value,
                    "clmm start converged"
                );
                if best.as_ref().map_or(true, |b| min.value < b.value) {
                    best = Some(min);
                }
            }
            Err(e) => {
                tracing::warn!(start_log_sigma = log_sigma, error = %e, "clmm start failed");
                last_err = Some(e);
            }
        }
    }
    let min = match (best, last_err) {
        (Some(min), _) => min,
        (None, Some(e)) => return Err(e),
        (None, None) => {
            return Err(KinexError::Convergence("clmm: no optimiser start succeeded".into()))
        }
    };

    let thresholds = thresholds_from(&min.x[..j]);
    let beta = min.x[j..k].to_vec();
    let log_sigma = min.x[k];

    let mut natural = thresholds.clone();
    natural.extend_from_slice(&beta);
    natural.push(log_sigma);
    let std_errors = standard_errors(
        |p: &[f64]| {
            if !is_increasing(&p[..j]) {
                return f64::INFINITY;
            }
            data.mixed_nll(&groups, &rule, &p[..j], &p[j..k], p[k].exp())
        },
        &natural,
        k,
    );

    let fit = OrdinalFit {
        formula: formula.to_string(),
        levels: data.levels.clone(),
        thresholds,
        coefficient_names: data.x.column_names.clone(),
        coefficients: beta,
        std_errors,
        sigma: Some(log_sigma.exp()),
        log_likelihood: -min.value,
        n_params: k + 1,
        n_obs: data.y.len(),
        n_groups: Some(groups.len()),
        iterations: min.iterations,
    };
    tracing::debug!(
        formula = %fit.formula,
        log_lik = fit.log_likelihood,
        sigma = log_sigma.exp(),
        iterations = fit.iterations,
        "clmm fitted"
    );
    Ok(fit)
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn thresholds_from(params: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(params.len());
    let mut current = params[0];
    out.push(current);
    for p in &params[1..] {
        current += p.exp();
        out.push(current);
    }
    out
}

fn thresholds_to_params(thresholds: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(thresholds.len());
    out.push(thresholds[0]);
    for w in thresholds.windows(2) {
        out.push((w[1] - w[0]).ln());
    }
    out
}

fn is_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] > w[0])
}

fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln P(Y = category)` for linear predictor `eta`.
fn ln_category_prob(thresholds: &[f64], category: usize, eta: f64) -> f64 {
    let j = thresholds.len();
    let p = if category == 0 {
        logistic(thresholds[0] - eta)
    } else if category == j {
        logistic(eta - thresholds[j - 1])
    } else {
        let upper = thresholds[category] - eta;
        let lower = thresholds[category - 1] - eta;
        if lower > 0.0 {
            // Both in the upper tail: difference of survival terms.
            logistic(-lower) - logistic(-upper)
        } else {
            logistic(upper) - logistic(lower)
        }
    };
    p.ln()
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn finite_or_inf(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        f64::INFINITY
    }
}

fn group_members(factor: &crate::model_frame::Factor) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); factor.n_levels()];
    for (i, &c) in factor.codes().iter().enumerate() {
        groups[c].push(i);
    }
    groups.retain(|g| !g.is_empty());
    groups
}

/// Square roots of the leading `keep` diagonal entries of the inverse
/// Hessian of `f` at `x`.
fn standard_errors<F: Fn(&[f64]) -> f64>(f: F, x: &[f64], keep: usize) -> Option<Vec<f64>> {
    let n = x.len();
    let h = optim::hessian(&f, x);
    if h.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let cov = linalg::invert(&h, n).ok()?;
    (0..keep)
        .map(|i| {
            let v = cov[i * n + i];
            (v > 0.0).then(|| v.sqrt())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_frame::{Factor, Term};
    use crate::model_selection::likelihood_ratio_test;
    use crate::rng::Xorshift64;

    const THETA: [f64; 3] = [-1.0, 0.5, 2.0];

    /// Households observed in three survey years with a latent logistic
    /// outcome cut at `THETA`.
    fn simulated_households(n_groups: usize, sigma: f64, seed: u64) -> Frame {
        let mut rng = Xorshift64::new(seed);
        let years = [1986.0, 1992.0, 2010.0];
        let mut outcome = Vec::new();
        let mut size = Vec::new();
        let mut year = Vec::new();
        let mut household = Vec::new();
        for g in 0..n_groups {
            let u = sigma * rng.next_normal();
            for &yr in &years {
                let s = 2.0 + (rng.next_f64() * 8.0).floor();
                let eta = 0.3 * (s - 6.0) + if yr > 2000.0 { 0.8 } else { 0.0 } + u;
                let v = rng.next_f64().clamp(1e-12, 1.0 - 1e-12);
                let latent = eta + (v / (1.0 - v)).ln();
                let category = THETA.iter().filter(|&&t| latent > t).count();
                outcome.push(1.0 + category as f64);
                size.push(s);
                year.push(yr);
                household.push(format!("H{g:03}"));
            }
        }
        Frame::new()
            .with_numeric("median", outcome)
            .unwrap()
            .with_numeric("size", size)
            .unwrap()
            .with_numeric("year", year)
            .unwrap()
            .with_factor("household", Factor::from_labels(&household))
            .unwrap()
    }

    fn full_formula(year: Term) -> Formula {
        Formula::new("median")
            .term(Term::Numeric("size".into()))
            .term(year)
            .group("household")
    }

    #[test]
    fn clm_recovers_effects() {
        let frame = simulated_households(150, 0.0, 21);
        let formula = full_formula(Term::Factor("year".into())).without_group().unwrap();
        let fit = clm(&frame, &formula, &OrdinalConfig::default()).unwrap();
        assert_eq!(fit.thresholds.len(), 3);
        assert!(is_increasing(&fit.thresholds));
        assert_eq!(fit.coefficient_names, vec!["size", "year1992", "year2010"]);
        assert!((fit.coefficients[0] - 0.3).abs() < 0.15, "{:?}", fit.coefficients);
        assert!((fit.coefficients[2] - 0.8).abs() < 0.5, "{:?}", fit.coefficients);
        assert_eq!(fit.n_params, 6);
        assert!(fit.std_errors.is_some());
    }

    #[test]
    fn intercept_only_clm_matches_marginal_proportions() {
        let frame = Frame::new()
            .with_numeric("y", vec![1.0, 1.0, 2.0, 2.0, 2.0, 3.0])
            .unwrap();
        let fit = clm(&frame, &Formula::new("y"), &OrdinalConfig::default()).unwrap();
        let expected = [(2.0_f64 / 4.0).ln(), (5.0_f64 / 1.0).ln()];
        for (t, e) in fit.thresholds.iter().zip(expected) {
            assert!((t - e).abs() < 1e-4, "{:?}", fit.thresholds);
        }
        let ll = 2.0 * (2.0_f64 / 6.0).ln() + 3.0 * (3.0_f64 / 6.0).ln() + (1.0_f64 / 6.0).ln();
        assert!((fit.log_likelihood - ll).abs() < 1e-8);
    }

    #[test]
    fn binary_outcome_standard_errors_match_closed_form() {
        // 2×2 table: x = 0 has 3 low / 7 high, x = 1 has 6 low / 4 high.
        let mut y = Vec::new();
        let mut x = Vec::new();
        for (xv, low, high) in [(0.0, 3, 7), (1.0, 6, 4)] {
            y.extend(std::iter::repeat(1.0).take(low));
            y.extend(std::iter::repeat(2.0).take(high));
            x.extend(std::iter::repeat(xv).take(low + high));
        }
        let frame = Frame::new()
            .with_numeric("y", y)
            .unwrap()
            .with_numeric("x", x)
            .unwrap();
        let formula = Formula::new("y").term(Term::Numeric("x".into()));
        let fit = clm(&frame, &formula, &OrdinalConfig::default()).unwrap();

        // Saturated logistic model: θ = logit(0.3), β = θ − logit(0.6).
        assert!((fit.thresholds[0] - (3.0_f64 / 7.0).ln()).abs() < 1e-4);
        assert!((fit.coefficients[0] - (2.0_f64 / 7.0).ln()).abs() < 1e-4);
        let se = fit.std_errors.as_ref().unwrap();
        let se_theta = (1.0 / 3.0 + 1.0 / 7.0_f64).sqrt();
        let se_beta = (1.0 / 3.0 + 1.0 / 7.0 + 1.0 / 6.0 + 1.0 / 4.0_f64).sqrt();
        assert!((se[0] - se_theta).abs() < 1e-4, "{se:?}");
        assert!((se[1] - se_beta).abs() < 1e-4, "{se:?}");

        assert_eq!(fit.threshold_names(), vec!["1|2"]);
        let table = fit.coefficient_table();
        assert_eq!(table.lines().count(), 3);
        assert!(table.lines().nth(1).unwrap().starts_with("1|2"));
        assert!(!table.contains("NA"), "{table}");
    }

    #[test]
    fn intercept_only_standard_error() {
        // SE(logit p̂) = 1 / √(n p̂ (1 − p̂)) with p̂ = 0.3, n = 10.
        let frame = Frame::new()
            .with_numeric("y", vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0])
            .unwrap();
        let fit = clm(&frame, &Formula::new("y"), &OrdinalConfig::default()).unwrap();
        let se = fit.std_errors.unwrap();
        assert!((se[0] - 1.0 / 2.1_f64.sqrt()).abs() < 1e-4, "{se:?}");
    }

    #[test]
    fn mixed_fit_is_never_worse_than_fixed() {
        for (sigma, seed) in [(0.0, 5), (1.5, 6)] {
            let frame = simulated_households(40, sigma, seed);
            let formula = full_formula(Term::Centered("year".into()));
            let config = OrdinalConfig::default();
            let mixed = clmm(&frame, &formula, &config).unwrap();
            let fixed = clm(&frame, &formula.without_group().unwrap(), &config).unwrap();
            assert!(
                mixed.log_likelihood >= fixed.log_likelihood - 1e-6,
                "sigma {sigma}: {} < {}",
                mixed.log_likelihood,
                fixed.log_likelihood
            );
            let lrt = likelihood_ratio_test(&fixed, &mixed).unwrap();
            assert_eq!(lrt.df, 1);
            assert!(lrt.statistic >= 0.0);
        }
    }

    #[test]
    fn strong_household_effect_is_detected() {
        let frame = simulated_households(60, 2.0, 8);
        let formula = full_formula(Term::Factor("year".into()));
        let config = OrdinalConfig::default();
        let mixed = clmm(&frame, &formula, &config).unwrap();
        let fixed = clm(&frame, &formula.without_group().unwrap(), &config).unwrap();
        let sigma = mixed.sigma.unwrap();
        assert!(sigma > 0.8 && sigma < 4.0, "sigma {sigma}");
        assert!(likelihood_ratio_test(&fixed, &mixed).unwrap().p_value < 0.01);
        assert_eq!(mixed.n_groups, Some(60));
    }

    #[test]
    fn nested_fixed_models_are_monotone() {
        let frame = simulated_households(50, 0.0, 9);
        let full = full_formula(Term::Factor("year".into())).without_group().unwrap();
        let config = OrdinalConfig::default();
        let full_fit = clm(&frame, &full, &config).unwrap();
        for (column, df) in [("year", 2), ("size", 1)] {
            let reduced = clm(&frame, &full.without(column).unwrap(), &config).unwrap();
            assert!(full_fit.log_likelihood >= reduced.log_likelihood - 1e-8);
            let lrt = likelihood_ratio_test(&reduced, &full_fit).unwrap();
            assert_eq!(lrt.df, df);
        }
    }

    #[test]
    fn year_encodings_differ_in_parameter_count() {
        let frame = simulated_households(30, 1.0, 10);
        let config = OrdinalConfig::default();
        let as_factor = clmm(&frame, &full_formula(Term::Factor("year".into())), &config).unwrap();
        let centered = clmm(&frame, &full_formula(Term::Centered("year".into())), &config).unwrap();
        // 3 thresholds + size + year terms + sigma
        assert_eq!(as_factor.n_params, 3 + 1 + 2 + 1);
        assert_eq!(centered.n_params, 3 + 1 + 1 + 1);
        assert_eq!(centered.coefficient_names, vec!["size", "year.c"]);
    }

    #[test]
    fn refit_is_bit_identical() {
        let frame = simulated_households(25, 1.0, 11);
        let formula = full_formula(Term::Factor("year".into()));
        let config = OrdinalConfig::default();
        let a = clmm(&frame, &formula, &config).unwrap();
        let b = clmm(&frame, &formula, &config).unwrap();
        assert_eq!(a.log_likelihood.to_bits(), b.log_likelihood.to_bits());
        let bits = |f: &OrdinalFit| {
            f.coefficients
                .iter()
                .chain(&f.thresholds)
                .map(|v| v.to_bits())
                .collect::<Vec<_>>()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn invalid_models_are_rejected() {
        let frame = simulated_households(10, 0.0, 12);
        let config = OrdinalConfig::default();
        let grouped = full_formula(Term::Factor("year".into()));
        assert!(clm(&frame, &grouped, &config).is_err());
        assert!(clmm(&frame, &grouped.without_group().unwrap(), &config).is_err());
        let too_few = OrdinalConfig {
            quadrature_points: 1,
            ..config
        };
        assert!(clmm(&frame, &grouped, &too_few).is_err());

        let constant = Frame::new().with_numeric("y", vec![2.0; 5]).unwrap();
        assert!(matches!(
            clm(&constant, &Formula::new("y"), &config),
            Err(KinexError::InvalidInput(_))
        ));
    }

    #[test]
    fn category_probabilities_sum_to_one() {
        let thresholds = [-1.0, 0.2, 3.5];
        for eta in [-40.0, -2.0, 0.0, 1.3, 40.0] {
            let total: f64 = (0..4).map(|c| ln_category_prob(&thresholds, c, eta).exp()).sum();
            assert!((total - 1.0).abs() < 1e-12, "eta {eta}: {total}");
        }
    }
}
