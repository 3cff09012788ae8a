//! Core trait definitions shared across the kinex crates.

/// A type that carries a numeric score. Hypothesis tests score by p-value.
pub trait Scored {
    /// The score value.
    fn score(&self) -> f64;
}

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}
