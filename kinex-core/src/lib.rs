//! Shared primitives and traits for the kinex household network analysis.
//!
//! `kinex-core` provides the foundation that the other kinex crates build on:
//!
//! - **Error types** — [`KinexError`] and [`Result`] for structured error handling
//! - **Traits** — [`Summarizable`] for console reports, [`Scored`] for test
//!   results ranked by p-value

pub mod error;
pub mod traits;

pub use error::{KinexError, Result};
pub use traits::*;
