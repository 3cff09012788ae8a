//! Likelihood-based model comparison: AIC, BIC and the likelihood ratio
//! test between nested fits.

use kinex_core::{KinexError, Result, Scored, Summarizable};

use crate::distribution::{ChiSquared, Distribution};

/// A fitted model that exposes its maximised log-likelihood.
pub trait LikelihoodModel {
    fn log_likelihood(&self) -> f64;
    /// Number of estimated parameters, including variance components.
    fn n_params(&self) -> usize;
    /// Human-readable model label, usually the formula.
    fn label(&self) -> String;
}

/// Outcome of comparing a reduced model against the full model it nests in.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LrtResult {
    pub reduced: String,
    pub full: String,
    pub reduced_ll: f64,
    pub full_ll: f64,
    /// `max(0, 2 (ll_full − ll_reduced))`.
    pub statistic: f64,
    pub df: usize,
    pub p_value: f64,
}

impl Scored for LrtResult {
    fn score(&self) -> f64 {
        self.p_value
    }
}

impl Summarizable for LrtResult {
    fn summary(&self) -> String {
        format!(
            "LRT [{}] vs [{}]: logLik {:.3} vs {:.3}, chisq = {:.4}, df = {}, p = {:.4e}",
            self.reduced,
            self.full,
            self.reduced_ll,
            self.full_ll,
            self.statistic,
            self.df,
            self.p_value
        )
    }
}

/// Akaike Information Criterion: AIC = -2 ln(L) + 2k
pub fn aic(log_likelihood: f64, n_params: usize) -> f64 {
    -2.0 * log_likelihood + 2.0 * n_params as f64
}

/// Bayesian Information Criterion: BIC = -2 ln(L) + k ln(n)
pub fn bic(log_likelihood: f64, n_params: usize, n_obs: usize) -> f64 {
    -2.0 * log_likelihood + n_params as f64 * (n_obs as f64).ln()
}

/// Likelihood ratio test of `reduced` against `full`.
///
/// The statistic is floored at zero, so an optimiser landing marginally
/// below the reduced optimum reports no evidence rather than a negative
/// statistic. The reference distribution is χ² with the difference in
/// parameter counts as degrees of freedom.
///
/// # Errors
///
/// `InvalidInput` if `full` does not have more parameters than `reduced`,
/// or either log-likelihood is not finite.
pub fn likelihood_ratio_test<R, F>(reduced: &R, full: &F) -> Result<LrtResult>
where
    R: LikelihoodModel + ?Sized,
    F: LikelihoodModel + ?Sized,
{
    let (k_red, k_full) = (reduced.n_params(), full.n_params());
    if k_full <= k_red {
        return Err(KinexError::InvalidInput(format!(
            "likelihood_ratio_test: full model has {k_full} parameters, reduced has {k_red}"
        )));
    }
    let (ll_red, ll_full) = (reduced.log_likelihood(), full.log_likelihood());
    if !ll_red.is_finite() || !ll_full.is_finite() {
        return Err(KinexError::InvalidInput(
            "likelihood_ratio_test: log-likelihoods must be finite".into(),
        ));
    }

    let df = k_full - k_red;
    let statistic = (2.0 * (ll_full - ll_red)).max(0.0);
    let p_value = ChiSquared::new(df as f64)?.sf(statistic).clamp(0.0, 1.0);

    Ok(LrtResult {
        reduced: reduced.label(),
        full: full.label(),
        reduced_ll: ll_red,
        full_ll: ll_full,
        statistic,
        df,
        p_value,
    })
}
