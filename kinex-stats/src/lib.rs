//! Statistical models for household kinship and exchange networks.
//!
//! - **Mantel test** — permutation test for association between two
//!   relationship matrices ([`mantel`])
//! - **Cumulative-link models** — ordinal regression with an optional
//!   normal random intercept ([`ordinal`])
//! - **Poisson GLM** — log-linear count regression with a quasi-Poisson
//!   dispersion check ([`glm`])
//! - **Model comparison** — AIC, BIC and likelihood ratio tests
//!   ([`model_selection`])
//!
//! Supporting modules cover distributions, correlation, formulas and
//! design matrices, dense linear algebra, quasi-Newton optimisation and
//! Gauss-Hermite quadrature. Every routine is deterministic: the same
//! inputs and seed give bit-identical output.

pub mod correlation;
pub mod descriptive;
pub mod distribution;
pub mod glm;
pub mod linalg;
pub mod mantel;
pub mod model_frame;
pub mod model_selection;
pub mod optim;
pub mod ordinal;
pub mod quadrature;
pub mod rng;

pub use glm::{poisson_glm, GlmConfig, PoissonFit};
pub use mantel::{mantel_test, Alternative, CorrelationMethod, MantelConfig, MantelResult};
pub use model_frame::{Factor, Formula, Frame, Term};
pub use model_selection::{likelihood_ratio_test, LikelihoodModel, LrtResult};
pub use ordinal::{clm, clmm, OrdinalConfig, OrdinalFit};
