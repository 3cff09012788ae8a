//! `kinex.toml` configuration.
//!
//! Resolution order (highest priority first):
//! 1. `KINEX_SEED` environment variable (Mantel seed only)
//! 2. The config file, if one is found
//! 3. Compiled defaults
//!
//! Relative data paths are resolved against the config file's directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use kinex_stats::glm::GlmConfig;
use kinex_stats::mantel::{Alternative, MantelConfig};
use kinex_stats::optim::OptimConfig;
use kinex_stats::ordinal::OrdinalConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "kinex.toml";
pub const SEED_ENV: &str = "KINEX_SEED";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct KinexConfig {
    pub data: DataConfig,
    pub mantel: MantelSection,
    pub ordinal: OrdinalSection,
    pub poisson: PoissonSection,
    pub network: NetworkSection,
}

/// Input files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Household × household inverse kinship distance.
    pub distance_matrix: PathBuf,
    /// Household × household count of shared people.
    pub exchange_matrix: PathBuf,
    pub households: PathBuf,
    pub people: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            distance_matrix: PathBuf::from("data/inverse-distance.csv"),
            exchange_matrix: PathBuf::from("data/shared-people.csv"),
            households: PathBuf::from("data/household-stats.csv"),
            people: PathBuf::from("data/household-degree.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MantelSection {
    pub permutations: usize,
    pub seed: u64,
    pub alternative: String,
}

impl Default for MantelSection {
    fn default() -> Self {
        let defaults = MantelConfig::default();
        Self {
            permutations: defaults.permutations,
            seed: defaults.seed,
            alternative: defaults.alternative.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrdinalSection {
    pub quadrature_points: usize,
    pub max_iter: usize,
    /// Gradient infinity-norm at which the optimiser stops.
    pub grad_tol: f64,
}

impl Default for OrdinalSection {
    fn default() -> Self {
        let defaults = OrdinalConfig::default();
        Self {
            quadrature_points: defaults.quadrature_points,
            max_iter: defaults.optim.max_iter,
            grad_tol: defaults.optim.grad_tol,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoissonSection {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for PoissonSection {
    fn default() -> Self {
        let defaults = GlmConfig::default();
        Self {
            max_iter: defaults.max_iter,
            tol: defaults.tol,
        }
    }
}

/// Optional kinship-network inputs; the network report is skipped when
/// none of `nodes`/`edges`, `snapshots` or `residences` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkSection {
    pub nodes: Option<PathBuf>,
    pub edges: Option<PathBuf>,
    /// Per-year node and edge lists, summarised alongside the full network.
    pub snapshots: Vec<NetworkSnapshot>,
    /// Per-person household in each of `years`.
    pub residences: Option<PathBuf>,
    pub years: Vec<String>,
    /// Households to report comers and leavers for.
    pub turnover: Vec<String>,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            nodes: None,
            edges: None,
            snapshots: Vec::new(),
            residences: None,
            years: ["1986", "1992", "1999", "2010"].map(String::from).to_vec(),
            turnover: Vec::new(),
        }
    }
}

impl NetworkSection {
    pub fn is_configured(&self) -> bool {
        self.nodes.is_some() || !self.snapshots.is_empty() || self.residences.is_some()
    }
}

/// One `[[network.snapshots]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSnapshot {
    pub label: String,
    pub nodes: PathBuf,
    pub edges: PathBuf,
}

impl KinexConfig {
    /// Load from `path`, or from `kinex.toml` in the working directory if it
    /// exists, falling back to defaults. Applies environment overrides and
    /// validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                tracing::debug!("no config file, using defaults");
                Self::default()
            }
        };
        config.apply_seed_override(std::env::var(SEED_ENV).ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config =
            Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.data.distance_matrix);
        resolve(&mut self.data.exchange_matrix);
        resolve(&mut self.data.households);
        resolve(&mut self.data.people);
        for p in [&mut self.network.nodes, &mut self.network.edges, &mut self.network.residences]
            .into_iter()
            .flatten()
        {
            resolve(p);
        }
        for snapshot in &mut self.network.snapshots {
            resolve(&mut snapshot.nodes);
            resolve(&mut snapshot.edges);
        }
    }

    /// Replace the Mantel seed with `value` when set.
    pub fn apply_seed_override(&mut self, value: Option<&str>) -> Result<()> {
        if let Some(raw) = value {
            self.mantel.seed = raw
                .trim()
                .parse()
                .with_context(|| format!("{SEED_ENV}='{raw}' is not an unsigned integer"))?;
            tracing::debug!(seed = self.mantel.seed, "seed overridden from environment");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.mantel.permutations == 0 {
            bail!("mantel.permutations must be greater than 0");
        }
        self.mantel_alternative()?;
        if self.ordinal.quadrature_points < 2 {
            bail!("ordinal.quadrature_points must be at least 2");
        }
        if self.ordinal.max_iter == 0 || self.poisson.max_iter == 0 {
            bail!("max_iter must be greater than 0");
        }
        if !(self.ordinal.grad_tol > 0.0) || !(self.poisson.tol > 0.0) {
            bail!("tolerances must be positive");
        }
        if self.network.nodes.is_some() != self.network.edges.is_some() {
            bail!("network.nodes and network.edges must be given together");
        }
        if self.network.snapshots.iter().any(|s| s.label.trim().is_empty()) {
            bail!("network.snapshots entries need a label");
        }
        Ok(())
    }

    fn mantel_alternative(&self) -> Result<Alternative> {
        self.mantel
            .alternative
            .parse()
            .map_err(|e| anyhow::anyhow!("mantel.alternative: {e}"))
    }

    pub fn mantel_config(&self) -> Result<MantelConfig> {
        Ok(MantelConfig {
            permutations: self.mantel.permutations,
            seed: self.mantel.seed,
            alternative: self.mantel_alternative()?,
            ..MantelConfig::default()
        })
    }

    pub fn ordinal_config(&self) -> OrdinalConfig {
        OrdinalConfig {
            quadrature_points: self.ordinal.quadrature_points,
            optim: OptimConfig {
                max_iter: self.ordinal.max_iter,
                grad_tol: self.ordinal.grad_tol,
                ..OptimConfig::default()
            },
        }
    }

    pub fn glm_config(&self) -> GlmConfig {
        GlmConfig {
            max_iter: self.poisson.max_iter,
            tol: self.poisson.tol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_library_defaults() {
        let config = KinexConfig::default();
        config.validate().unwrap();
        assert_eq!(config.mantel.permutations, 20_000);
        assert_eq!(config.ordinal.quadrature_points, 20);
        assert_eq!(config.glm_config(), GlmConfig::default());
        assert_eq!(config.mantel_config().unwrap().alternative, Alternative::TwoSided);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = KinexConfig::from_toml(
            r#"
            [mantel]
            permutations = 999
            alternative = "greater"

            [network]
            nodes = "nodes.txt"
            edges = "edges.txt"
            "#,
        )
        .unwrap();
        assert_eq!(config.mantel.permutations, 999);
        assert_eq!(config.mantel.seed, 1);
        assert_eq!(config.mantel_config().unwrap().alternative, Alternative::Greater);
        assert_eq!(config.poisson, PoissonSection::default());
        assert_eq!(config.network.years.len(), 4);
        assert!(config.network.snapshots.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn snapshot_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kinex.toml");
        std::fs::write(
            &path,
            r#"
            [[network.snapshots]]
            label = "1986"
            nodes = "nodelist1986.txt"
            edges = "edgelist1986.txt"

            [[network.snapshots]]
            label = "2010"
            nodes = "nodelist2010.txt"
            edges = "edgelist2010.txt"
            "#,
        )
        .unwrap();
        let config = KinexConfig::from_file(&path).unwrap();
        config.validate().unwrap();
        assert!(config.network.is_configured());
        let labels: Vec<&str> = config.network.snapshots.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["1986", "2010"]);
        assert_eq!(config.network.snapshots[1].edges, dir.path().join("edgelist2010.txt"));
        assert!(!KinexConfig::default().network.is_configured());
    }

    #[test]
    fn invalid_values_are_rejected() {
        for text in [
            "[mantel]\npermutations = 0",
            "[mantel]\nalternative = \"sideways\"",
            "[ordinal]\nquadrature_points = 1",
            "[poisson]\ntol = 0.0",
            "[network]\nnodes = \"nodes.txt\"",
            "[[network.snapshots]]\nlabel = \" \"\nnodes = \"n.txt\"\nedges = \"e.txt\"",
        ] {
            let config = KinexConfig::from_toml(text).unwrap();
            assert!(config.validate().is_err(), "{text}");
        }
        assert!(KinexConfig::from_toml("[mantel]\npermutations = \"many\"").is_err());
    }

    #[test]
    fn seed_override() {
        let mut config = KinexConfig::default();
        config.apply_seed_override(None).unwrap();
        assert_eq!(config.mantel.seed, 1);
        config.apply_seed_override(Some(" 42 ")).unwrap();
        assert_eq!(config.mantel.seed, 42);
        assert!(config.apply_seed_override(Some("-3")).is_err());
    }

    #[test]
    fn file_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kinex.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[data]\npeople = \"tables/people.csv\"\nhouseholds = \"/abs/hh.csv\""
        )
        .unwrap();
        let config = KinexConfig::from_file(&path).unwrap();
        assert_eq!(config.data.people, dir.path().join("tables/people.csv"));
        assert_eq!(config.data.households, PathBuf::from("/abs/hh.csv"));
        assert!(KinexConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
