//! The analyses behind each report section.
//!
//! Each `run_*` function loads its inputs, fits the models and writes a
//! plain-text report to `out`. The fitting steps are split out so they can
//! be exercised on in-memory data.

use std::fmt;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use kinex_core::{Scored, Summarizable};
use kinex_io::{HouseholdYear, LabeledMatrix, Person};
use kinex_network::{
    household_changes, household_turnover, migration_flows, KinshipGraph, NetworkParams,
};
use kinex_stats::glm::{poisson_glm, GlmConfig, PoissonFit};
use kinex_stats::mantel::{mantel_test, MantelResult};
use kinex_stats::model_frame::{Factor, Formula, Frame, Term};
use kinex_stats::model_selection::{likelihood_ratio_test, LrtResult};
use kinex_stats::ordinal::{clm, clmm, OrdinalConfig, OrdinalFit};

use crate::config::KinexConfig;

/// R-style significance code for a p-valued result.
pub fn significance(result: &impl Scored) -> &'static str {
    match result.score() {
        p if p < 0.001 => "***",
        p if p < 0.01 => "**",
        p if p < 0.05 => "*",
        p if p < 0.1 => ".",
        _ => "",
    }
}

// ── Mantel ─────────────────────────────────────────────────────────────────

/// Mantel test of kinship distance against exchange, aligned by household.
pub fn run_mantel(config: &KinexConfig, out: &mut impl Write) -> Result<MantelResult> {
    let data = &config.data;
    let distance = kinex_io::read_matrix(&data.distance_matrix)
        .with_context(|| format!("loading distance matrix {}", data.distance_matrix.display()))?;
    let exchange = kinex_io::read_matrix(&data.exchange_matrix)
        .with_context(|| format!("loading exchange matrix {}", data.exchange_matrix.display()))?;
    let result = mantel_on_matrices(&distance, &exchange, config)?;

    writeln!(out, "== Mantel test: kinship distance vs exchange ==")?;
    writeln!(out, "households: {}", distance.len())?;
    writeln!(out, "{} {}", result.summary(), significance(&result))?;
    writeln!(out)?;
    Ok(result)
}

/// Align `exchange` to the household order of `distance` and test.
pub fn mantel_on_matrices(
    distance: &LabeledMatrix,
    exchange: &LabeledMatrix,
    config: &KinexConfig,
) -> Result<MantelResult> {
    let exchange = exchange
        .reorder(&distance.labels)
        .context("matching exchange households to distance households")?;
    let mantel = config.mantel_config()?;
    tracing::info!(
        households = distance.len(),
        permutations = mantel.permutations,
        seed = mantel.seed,
        "running Mantel test"
    );
    Ok(mantel_test(&distance.values, &exchange.values, &mantel)?)
}

// ── Ordinal models ─────────────────────────────────────────────────────────

/// How survey year enters the ordinal models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearEncoding {
    /// One coefficient per year after the first.
    Factor,
    /// A single slope on mean-centred year.
    Centered,
}

impl YearEncoding {
    pub const ALL: [YearEncoding; 2] = [YearEncoding::Factor, YearEncoding::Centered];

    fn term(self) -> Term {
        match self {
            YearEncoding::Factor => Term::Factor("year".into()),
            YearEncoding::Centered => Term::Centered("year".into()),
        }
    }
}

impl fmt::Display for YearEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearEncoding::Factor => write!(f, "year as factor"),
            YearEncoding::Centered => write!(f, "year centred"),
        }
    }
}

/// One nested comparison against the full mixed model.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub encoding: YearEncoding,
    pub dropped: &'static str,
    pub lrt: LrtResult,
}

/// Household-year table as a model frame: `median`, `size`, `year`,
/// `household`.
pub fn household_frame(rows: &[HouseholdYear]) -> Result<Frame> {
    let households: Vec<&str> = rows.iter().map(|r| r.household.as_str()).collect();
    Ok(Frame::new()
        .with_numeric("median", rows.iter().map(|r| r.median_distance).collect())?
        .with_numeric("size", rows.iter().map(|r| r.size).collect())?
        .with_numeric("year", rows.iter().map(|r| f64::from(r.year)).collect())?
        .with_factor("household", Factor::from_labels(&households))?)
}

/// Full mixed models, one per year encoding, and the six nested
/// comparisons against them.
#[derive(Debug, Clone)]
pub struct OrdinalReport {
    pub full_fits: Vec<(YearEncoding, OrdinalFit)>,
    pub comparisons: Vec<Comparison>,
}

/// The six nested comparisons: for each year encoding, the full model
/// `median ~ size + year + (1 | household)` against the model without the
/// household intercept, without year and without size.
pub fn ordinal_analysis(frame: &Frame, config: &OrdinalConfig) -> Result<OrdinalReport> {
    let mut full_fits = Vec::with_capacity(YearEncoding::ALL.len());
    let mut comparisons = Vec::with_capacity(6);
    for encoding in YearEncoding::ALL {
        let full_formula = Formula::new("median")
            .term(Term::Numeric("size".into()))
            .term(encoding.term())
            .group("household");
        tracing::info!(formula = %full_formula, "fitting full ordinal model");
        let full = clmm(frame, &full_formula, config)
            .with_context(|| format!("fitting {full_formula}"))?;

        let no_household = full_formula.without_group()?;
        let reduced =
            clm(frame, &no_household, config).with_context(|| format!("fitting {no_household}"))?;
        comparisons.push(Comparison {
            encoding,
            dropped: "household intercept",
            lrt: likelihood_ratio_test(&reduced, &full)?,
        });

        for (column, dropped) in [("year", "year"), ("size", "size")] {
            let formula = full_formula.without(column)?;
            let reduced =
                clmm(frame, &formula, config).with_context(|| format!("fitting {formula}"))?;
            comparisons.push(Comparison {
                encoding,
                dropped,
                lrt: likelihood_ratio_test(&reduced, &full)?,
            });
        }
        full_fits.push((encoding, full));
    }
    Ok(OrdinalReport {
        full_fits,
        comparisons,
    })
}

pub fn run_ordinal(config: &KinexConfig, out: &mut impl Write) -> Result<OrdinalReport> {
    let path = &config.data.households;
    let rows = kinex_io::read_household_years(path)
        .with_context(|| format!("loading household table {}", path.display()))?;
    let frame = household_frame(&rows)?;
    let report = ordinal_analysis(&frame, &config.ordinal_config())?;

    writeln!(out, "== Ordinal models: median kinship distance ==")?;
    writeln!(out, "household-years: {}", rows.len())?;
    for (encoding, fit) in &report.full_fits {
        writeln!(out, "[{encoding}] {}", fit.summary())?;
        write!(out, "{}", fit.coefficient_table())?;
        if let (Some(sigma), Some(groups)) = (fit.sigma, fit.n_groups) {
            writeln!(out, "household intercept: sd {sigma:.4} over {groups} households")?;
        }
        for c in report.comparisons.iter().filter(|c| c.encoding == *encoding) {
            writeln!(out, "drop {}: {} {}", c.dropped, c.lrt.summary(), significance(&c.lrt))?;
        }
    }
    writeln!(out)?;
    Ok(report)
}

// ── Poisson degree model ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PoissonReport {
    pub fit: PoissonFit,
    pub drop_head: LrtResult,
    pub drop_gender: LrtResult,
}

/// Person table as a model frame: `degree`, `head`, `gender`.
pub fn people_frame(people: &[Person]) -> Result<Frame> {
    let head: Vec<&str> = people
        .iter()
        .map(|p| if p.is_household_head { "TRUE" } else { "FALSE" })
        .collect();
    let gender: Vec<&str> = people.iter().map(|p| p.gender.as_str()).collect();
    Ok(Frame::new()
        .with_numeric("degree", people.iter().map(|p| f64::from(p.degree)).collect())?
        .with_factor("head", Factor::from_labels(&head))?
        .with_factor("gender", Factor::from_labels(&gender))?)
}

/// `degree ~ head + gender`, plus the two single-term deletions.
pub fn poisson_analysis(frame: &Frame, config: &GlmConfig) -> Result<PoissonReport> {
    let formula = Formula::new("degree")
        .term(Term::Factor("head".into()))
        .term(Term::Factor("gender".into()));
    let fit = poisson_glm(frame, &formula, config).with_context(|| format!("fitting {formula}"))?;
    tracing::info!(
        dispersion = fit.dispersion,
        iterations = fit.iterations,
        "poisson model fitted"
    );

    let without_head = poisson_glm(frame, &formula.without("head")?, config)?;
    let without_gender = poisson_glm(frame, &formula.without("gender")?, config)?;
    Ok(PoissonReport {
        drop_head: likelihood_ratio_test(&without_head, &fit)?,
        drop_gender: likelihood_ratio_test(&without_gender, &fit)?,
        fit,
    })
}

pub fn run_poisson(config: &KinexConfig, out: &mut impl Write) -> Result<PoissonReport> {
    let path = &config.data.people;
    let people = kinex_io::read_people(path)
        .with_context(|| format!("loading person table {}", path.display()))?;
    let report = poisson_analysis(&people_frame(&people)?, &config.glm_config())?;
    let fit = &report.fit;

    writeln!(out, "== Poisson model: individual degree ==")?;
    writeln!(out, "{}", fit.summary())?;
    write!(out, "{}", fit.coefficient_table())?;
    writeln!(
        out,
        "null deviance {:.3} on {} df; residual deviance {:.3} on {} df; AIC {:.3}; BIC {:.3}",
        fit.null_deviance,
        fit.n_obs - 1,
        fit.deviance,
        fit.df_residual,
        fit.aic(),
        fit.bic()
    )?;
    let verdict = if fit.is_overdispersed(1.0) { "overdispersed" } else { "not overdispersed" };
    writeln!(out, "quasi-Poisson dispersion {:.4} ({verdict})", fit.dispersion)?;
    for (name, se) in fit.coefficient_names.iter().zip(fit.quasi_std_errors()) {
        writeln!(out, "  quasi std. error {name}: {se:.4}")?;
    }
    for (label, lrt) in [("head", &report.drop_head), ("gender", &report.drop_gender)] {
        writeln!(out, "drop {label}: {} {}", lrt.summary(), significance(lrt))?;
    }
    writeln!(out)?;
    Ok(report)
}

// ── Kinship network ────────────────────────────────────────────────────────

/// Summaries of the full network and of each yearly snapshot.
#[derive(Debug, Clone, Default)]
pub struct NetworkReport {
    pub full: Option<NetworkParams>,
    pub snapshots: Vec<(String, NetworkParams)>,
}

fn load_graph(nodes: &Path, edges: &Path) -> Result<KinshipGraph> {
    let nodes = kinex_io::read_node_list(nodes)
        .with_context(|| format!("loading node list {}", nodes.display()))?;
    let edges = kinex_io::read_edge_list(edges)
        .with_context(|| format!("loading edge list {}", edges.display()))?;
    Ok(KinshipGraph::from_lists(&nodes, &edges))
}

fn write_params(out: &mut impl Write, params: &NetworkParams) -> Result<()> {
    writeln!(out, "{}", params.summary())?;
    let sizes: Vec<String> = params.component_sizes.iter().map(|s| s.to_string()).collect();
    writeln!(out, "component sizes: {}", sizes.join(" "))?;
    Ok(())
}

fn ids(list: &[String]) -> String {
    list.join(", ")
}

/// Network summaries, degree distribution, household kinship, migration
/// flows, household turnover and new or defunct households.
///
/// Returns `None` without output when no network input is configured.
pub fn run_network(
    config: &KinexConfig,
    out: &mut impl Write,
) -> Result<Option<NetworkReport>> {
    let net = &config.network;
    if !net.is_configured() {
        tracing::info!("no kinship network configured, skipping");
        return Ok(None);
    }
    let mut report = NetworkReport::default();
    writeln!(out, "== Kinship network ==")?;

    let graph = match (&net.nodes, &net.edges) {
        (Some(nodes), Some(edges)) => Some(load_graph(nodes, edges)?),
        _ => None,
    };
    if let Some(graph) = &graph {
        let params = graph.params()?;
        writeln!(out, "full network:")?;
        write_params(out, &params)?;
        writeln!(out, "degree distribution (degree: people):")?;
        for (degree, people) in graph.degree_distribution() {
            writeln!(out, "  {degree}: {}", people.len())?;
        }
        report.full = Some(params);
    }

    for snapshot in &net.snapshots {
        let params = load_graph(&snapshot.nodes, &snapshot.edges)?
            .params()
            .with_context(|| format!("summarising network {}", snapshot.label))?;
        writeln!(out, "year {}:", snapshot.label)?;
        write_params(out, &params)?;
        report.snapshots.push((snapshot.label.clone(), params));
    }

    if let Some(path) = &net.residences {
        let residences = kinex_io::read_residences(path, net.years.len())
            .with_context(|| format!("loading residences {}", path.display()))?;

        if let Some(graph) = &graph {
            writeln!(out, "household distances (household, year, size, median, max):")?;
            for row in graph.household_distances(&residences, &net.years)? {
                let na = || "NA".to_string();
                let median = row.median_distance.map_or_else(na, |m| format!("{m}"));
                let max = row.max_distance.map_or_else(na, |m| m.to_string());
                writeln!(
                    out,
                    "  {}\t{}\t{}\t{}\t{}",
                    row.household, row.year, row.size, median, max
                )?;
                if !row.unrelated.is_empty() {
                    writeln!(
                        out,
                        "  household {} in {}: unrelated [{}]",
                        row.household,
                        row.year,
                        ids(&row.unrelated)
                    )?;
                }
            }
        }

        writeln!(out, "migration flows (source, target, people):")?;
        for flow in migration_flows(&residences) {
            writeln!(out, "  {}\t{}\t{}", flow.source, flow.target, flow.weight)?;
        }

        if let Some(first) = net.years.first() {
            writeln!(out, "year {first}: baseline")?;
        }
        for change in household_changes(&residences, &net.years)? {
            writeln!(
                out,
                "year {}: new households [{}], defunct households [{}]",
                change.year,
                ids(&change.new),
                ids(&change.defunct)
            )?;
        }

        for household in &net.turnover {
            for t in household_turnover(&residences, household, &net.years)? {
                writeln!(
                    out,
                    "household {} {}->{}: comers [{}], leavers [{}]",
                    t.household,
                    t.from_year,
                    t.to_year,
                    ids(&t.comers),
                    ids(&t.leavers)
                )?;
            }
        }
    }
    writeln!(out)?;
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkSnapshot;
    use kinex_stats::rng::Xorshift64;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn symmetric(n: usize, rng: &mut Xorshift64) -> Vec<Vec<f64>> {
        let mut m = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let v = (rng.next_f64() * 5.0).floor();
                m[i][j] = v;
                m[j][i] = v;
            }
        }
        m
    }

    fn matrix_csv(labels: &[String], values: &[Vec<f64>]) -> String {
        let mut s = format!(",{}\n", labels.join(","));
        for (label, row) in labels.iter().zip(values) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            s.push_str(&format!("{label},{}\n", cells.join(",")));
        }
        s
    }

    fn household_rows(n_households: usize, seed: u64) -> Vec<HouseholdYear> {
        let mut rng = Xorshift64::new(seed);
        let mut rows = Vec::new();
        for h in 0..n_households {
            let effect = rng.next_normal();
            for year in [1986, 1992, 2010] {
                let size = 2.0 + (rng.next_f64() * 7.0).floor();
                let latent = 0.2 * size + effect + rng.next_normal();
                let median = (latent.clamp(0.0, 3.9) * 2.0).floor() / 2.0 + 1.0;
                rows.push(HouseholdYear {
                    household: format!("{}", h + 1),
                    year,
                    size,
                    median_distance: median,
                    wealth: None,
                });
            }
        }
        rows
    }

    #[test]
    fn mantel_aligns_households_before_testing() {
        let mut rng = Xorshift64::new(3);
        let labels: Vec<String> = (1..=8).map(|i| i.to_string()).collect();
        let values = symmetric(8, &mut rng);
        let distance = LabeledMatrix::new(labels.clone(), values.clone()).unwrap();
        let reversed: Vec<String> = labels.iter().rev().cloned().collect();
        let exchange = distance.reorder(&reversed).unwrap();

        let mut config = KinexConfig::default();
        config.mantel.permutations = 199;
        let result = mantel_on_matrices(&distance, &exchange, &config).unwrap();
        assert!((result.statistic - 1.0).abs() < 1e-12);
    }

    #[test]
    fn run_mantel_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = Xorshift64::new(17);
        let labels: Vec<String> = ["1", "2", "3", "3.1", "4", "5"].map(String::from).to_vec();
        let mut config = KinexConfig::default();
        config.mantel.permutations = 99;
        let distance = matrix_csv(&labels, &symmetric(6, &mut rng));
        let exchange = matrix_csv(&labels, &symmetric(6, &mut rng));
        config.data.distance_matrix = write_file(dir.path(), "d.csv", &distance);
        config.data.exchange_matrix = write_file(dir.path(), "e.csv", &exchange);

        let mut out = Vec::new();
        let result = run_mantel(&config, &mut out).unwrap();
        assert!(result.p_value > 0.0 && result.p_value <= 1.0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("households: 6"));

        config.data.exchange_matrix = dir.path().join("missing.csv");
        let err = run_mantel(&config, &mut Vec::new()).unwrap_err();
        assert!(format!("{err:#}").contains("missing.csv"));
    }

    #[test]
    fn six_ordinal_comparisons_with_expected_df() {
        let frame = household_frame(&household_rows(30, 5)).unwrap();
        let report = ordinal_analysis(&frame, &OrdinalConfig::default()).unwrap();
        let comparisons = &report.comparisons;
        assert_eq!(comparisons.len(), 6);
        let df: Vec<usize> = comparisons.iter().map(|c| c.lrt.df).collect();
        // factor year: RE 1, year 2 (three years), size 1; centred year: 1, 1, 1
        assert_eq!(df, vec![1, 2, 1, 1, 1, 1]);
        for c in comparisons {
            assert!(c.lrt.statistic >= 0.0);
            assert!((0.0..=1.0).contains(&c.lrt.p_value));
        }
        assert_eq!(comparisons[0].encoding, YearEncoding::Factor);
        assert_eq!(comparisons[3].encoding, YearEncoding::Centered);

        // each comparison is against the full fit kept in the report
        for (k, (encoding, full)) in report.full_fits.iter().enumerate() {
            assert_eq!(*encoding, YearEncoding::ALL[k]);
            assert!(full.is_mixed());
            for c in &comparisons[3 * k..3 * k + 3] {
                assert_eq!(c.lrt.full_ll.to_bits(), full.log_likelihood.to_bits());
            }
        }
    }

    #[test]
    fn ordinal_report_prints_full_models() {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = String::from("Household ID,Year,Size,Median Dist\n");
        for row in household_rows(30, 5) {
            csv.push_str(&format!(
                "{},{},{},{}\n",
                row.household, row.year, row.size, row.median_distance
            ));
        }
        let mut config = KinexConfig::default();
        config.data.households = write_file(dir.path(), "hh.csv", &csv);

        let mut out = Vec::new();
        let report = run_ordinal(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(report.full_fits.len(), 2);
        assert!(text.contains("household-years: 90"), "{text}");
        assert_eq!(text.matches("Std.Error").count(), 2, "{text}");
        assert_eq!(text.matches("household intercept: sd").count(), 2, "{text}");
        assert_eq!(text.matches("drop ").count(), 6, "{text}");
        assert!(text.contains("[year centred] CLMM"), "{text}");
        assert!(text.contains("year.c"), "{text}");
    }

    #[test]
    fn significance_codes() {
        let lrt = |p_value| LrtResult {
            reduced: "a".into(),
            full: "b".into(),
            reduced_ll: -2.0,
            full_ll: -1.0,
            statistic: 2.0,
            df: 1,
            p_value,
        };
        let codes: Vec<&str> =
            [0.0005, 0.005, 0.03, 0.07, 0.5].iter().map(|&p| significance(&lrt(p))).collect();
        assert_eq!(codes, vec!["***", "**", "*", ".", ""]);
    }

    #[test]
    fn poisson_report_drops_each_covariate() {
        let mut rng = Xorshift64::new(9);
        let people: Vec<Person> = (0..200)
            .map(|i| Person {
                id: format!("p{i}"),
                household: format!("{}", i % 20),
                degree: (rng.next_f64() * 6.0) as u32 + if i % 10 == 0 { 3 } else { 0 },
                is_household_head: i % 10 == 0,
                gender: if rng.next_f64() < 0.5 { "M".into() } else { "F".into() },
            })
            .collect();
        let frame = people_frame(&people).unwrap();
        let report = poisson_analysis(&frame, &GlmConfig::default()).unwrap();
        assert_eq!(report.fit.n_params, 3);
        assert_eq!(report.drop_head.df, 1);
        assert_eq!(report.drop_gender.df, 1);
        assert!(report.drop_head.p_value < 0.05);
    }

    #[test]
    fn network_section_is_optional() {
        let config = KinexConfig::default();
        assert!(run_network(&config, &mut Vec::new()).unwrap().is_none());
    }

    #[test]
    fn network_report_from_lists() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = KinexConfig::default();
        let nodes = "a\tM\nb\tF\nc\tM\nd\tF\n";
        let edges = "a\tb\tundirected\nb\tc\tundirected\n";
        config.network.nodes = Some(write_file(dir.path(), "nodes.txt", nodes));
        config.network.edges = Some(write_file(dir.path(), "edges.txt", edges));
        config.network.residences = Some(write_file(
            dir.path(),
            "res.txt",
            "a\t1\t1\t1\t2\nb\t1\t1\t0\t2\nc\t2\t1\t1\t1\nd\t2\t2\t2\t2\ne\t0\t3\t0\t0\n",
        ));
        config.network.turnover = vec!["1".into()];

        let mut out = Vec::new();
        let report = run_network(&config, &mut out).unwrap().unwrap();
        let params = report.full.unwrap();
        assert_eq!(params.nodes, 4);
        assert_eq!(params.component_sizes, vec![3, 1]);
        assert!(report.snapshots.is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("component sizes: 3 1"));
        assert!(text.contains("  0: 1\n  1: 2\n  2: 1\n"), "{text}");
        assert!(text.contains("  1\t1986\t2\t1\t1\n"), "{text}");
        assert!(text.contains("  2\t1986\t2\tNA\tNA\n"), "{text}");
        assert!(text.contains("household 2 in 1986: unrelated [c, d]"), "{text}");
        assert!(text.contains("  1\t2\t2\n"), "{text}");
        assert!(text.contains("year 1992: new households [3], defunct households []"), "{text}");
        assert!(text.contains("year 1999: new households [], defunct households [3]"), "{text}");
        assert!(text.contains("household 1 1986->1992: comers [c], leavers []"), "{text}");
    }

    #[test]
    fn yearly_snapshots_are_summarised() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = KinexConfig::default();
        for (label, nodes, edges) in [
            ("1986", "a\nb\n", "a\tb\tundirected\n"),
            ("2010", "a\nb\nc\n", "a\tb\tundirected\nb\tc\tundirected\n"),
        ] {
            config.network.snapshots.push(NetworkSnapshot {
                label: label.into(),
                nodes: write_file(dir.path(), &format!("nodelist{label}.txt"), nodes),
                edges: write_file(dir.path(), &format!("edgelist{label}.txt"), edges),
            });
        }

        let mut out = Vec::new();
        let report = run_network(&config, &mut out).unwrap().unwrap();
        assert!(report.full.is_none());
        let summary: Vec<(&str, usize, usize)> = report
            .snapshots
            .iter()
            .map(|(label, p)| (label.as_str(), p.nodes, p.edges))
            .collect();
        assert_eq!(summary, vec![("1986", 2, 1), ("2010", 3, 2)]);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("year 1986:\n2 nodes, 1 edges"), "{text}");
        assert!(!text.contains("migration flows"), "{text}");
    }
}
