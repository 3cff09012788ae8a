//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "kinex")]
#[command(version)]
#[command(about = "Household kinship and exchange network analyses", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./kinex.toml when present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run a single report section
    #[arg(long, value_enum, value_name = "SECTION")]
    pub only: Option<Section>,
}

/// Report sections, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    Mantel,
    Ordinal,
    Poisson,
    Network,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Mantel,
        Section::Ordinal,
        Section::Poisson,
        Section::Network,
    ];

    /// Sections selected by `--only`, or all of them.
    pub fn selected(only: Option<Section>) -> Vec<Section> {
        match only {
            Some(s) => vec![s],
            None => Self::ALL.to_vec(),
        }
    }
}
