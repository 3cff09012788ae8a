//! Movement of people between households across survey years.

use std::collections::{BTreeMap, BTreeSet};

use kinex_core::{KinexError, Result};
use kinex_io::Residence;

/// Number of people who lived in `source` in an earlier survey year and in
/// `target` in a later one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFlow {
    pub source: String,
    pub target: String,
    pub weight: usize,
}

/// Arrivals and departures of one household between consecutive years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turnover {
    pub household: String,
    pub from_year: String,
    pub to_year: String,
    pub comers: Vec<String>,
    pub leavers: Vec<String>,
}

/// Directed household-to-household flows, heaviest first.
///
/// Every ordered pair of survey years is considered, so a person recorded
/// in households `A B B C` contributes to `A→B`, `A→C` and `B→C`. Each
/// person counts once per flow; absent years are skipped.
pub fn migration_flows(residences: &[Residence]) -> Vec<MigrationFlow> {
    let mut totals: BTreeMap<(String, String), usize> = BTreeMap::new();
    for person in residences {
        let mut links = BTreeSet::new();
        let hh = &person.households;
        for i in 0..hh.len() {
            for j in (i + 1)..hh.len() {
                if let (Some(a), Some(b)) = (&hh[i], &hh[j]) {
                    if a != b {
                        links.insert((a.clone(), b.clone()));
                    }
                }
            }
        }
        for link in links {
            *totals.entry(link).or_default() += 1;
        }
    }
    let mut flows: Vec<MigrationFlow> = totals
        .into_iter()
        .map(|((source, target), weight)| MigrationFlow { source, target, weight })
        .collect();
    // stable: ties stay in (source, target) order
    flows.sort_by(|a, b| b.weight.cmp(&a.weight));
    flows
}

/// Comers and leavers of `household` between each pair of consecutive
/// years. `years` labels the residence columns in order.
pub fn household_turnover<S: AsRef<str>>(
    residences: &[Residence],
    household: &str,
    years: &[S],
) -> Result<Vec<Turnover>> {
    check_columns(residences, years.len())?;
    let members_in = |k: usize| -> Vec<&str> {
        residences
            .iter()
            .filter(|r| r.households[k].as_deref() == Some(household))
            .map(|r| r.id.as_str())
            .collect()
    };
    let missing_from = |ids: &[&str], other: &[&str]| -> Vec<String> {
        ids.iter()
            .filter(|id| !other.contains(*id))
            .map(|s| s.to_string())
            .collect()
    };

    Ok((1..years.len())
        .map(|k| {
            let before = members_in(k - 1);
            let after = members_in(k);
            Turnover {
                household: household.to_string(),
                from_year: years[k - 1].as_ref().to_string(),
                to_year: years[k].as_ref().to_string(),
                comers: missing_from(&after, &before),
                leavers: missing_from(&before, &after),
            }
        })
        .collect())
}

/// Households that appear or disappear in one survey year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseholdChange {
    pub year: String,
    /// Occupied this year but not in the previous one.
    pub new: Vec<String>,
    /// Occupied in the previous year but not this one.
    pub defunct: Vec<String>,
}

/// New and defunct households for every year after the first. A household
/// exists in a year when at least one person lives in it.
pub fn household_changes<S: AsRef<str>>(
    residences: &[Residence],
    years: &[S],
) -> Result<Vec<HouseholdChange>> {
    check_columns(residences, years.len())?;
    let occupied = |k: usize| -> BTreeSet<&str> {
        residences.iter().filter_map(|r| r.households[k].as_deref()).collect()
    };
    let by_year: Vec<BTreeSet<&str>> = (0..years.len()).map(occupied).collect();

    Ok((1..years.len())
        .map(|k| {
            let (last, this) = (&by_year[k - 1], &by_year[k]);
            HouseholdChange {
                year: years[k].as_ref().to_string(),
                new: this.difference(last).map(|h| h.to_string()).collect(),
                defunct: last.difference(this).map(|h| h.to_string()).collect(),
            }
        })
        .collect())
}

fn check_columns(residences: &[Residence], n_years: usize) -> Result<()> {
    match residences.iter().find(|r| r.households.len() != n_years) {
        Some(bad) => Err(KinexError::InvalidInput(format!(
            "residences: person '{}' has {} household columns, expected {}",
            bad.id,
            bad.households.len(),
            n_years
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residence(id: &str, households: &[&str]) -> Residence {
        Residence {
            id: id.into(),
            households: households
                .iter()
                .map(|h| if *h == "0" { None } else { Some(h.to_string()) })
                .collect(),
        }
    }

    #[test]
    fn flows_count_each_person_once() {
        let people = [
            residence("p1", &["A", "B", "B", "C"]),
            residence("p2", &["A", "B", "0", "C"]),
            residence("p3", &["C", "C", "C", "C"]),
        ];
        let flows = migration_flows(&people);
        let find = |s: &str, t: &str| {
            flows
                .iter()
                .find(|f| f.source == s && f.target == t)
                .map(|f| f.weight)
        };
        assert_eq!(find("A", "B"), Some(2));
        assert_eq!(find("A", "C"), Some(2));
        assert_eq!(find("B", "C"), Some(2));
        assert_eq!(find("C", "C"), None);
        assert_eq!(flows.len(), 3);
        assert!(flows.windows(2).all(|w| w[0].weight >= w[1].weight));
    }

    #[test]
    fn turnover_between_years() {
        let people = [
            residence("p1", &["1", "1", "2"]),
            residence("p2", &["0", "1", "1"]),
            residence("p3", &["1", "2", "1"]),
        ];
        let t = household_turnover(&people, "1", &["1986", "1992", "1999"]).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].comers, vec!["p2"]);
        assert_eq!(t[0].leavers, vec!["p3"]);
        assert_eq!(t[1].to_year, "1999");
        assert_eq!(t[1].comers, vec!["p3"]);
        assert_eq!(t[1].leavers, vec!["p1"]);
        assert!(household_turnover(&people, "1", &["1986", "1992"]).is_err());
    }

    #[test]
    fn new_and_defunct_households() {
        let people = [
            residence("p1", &["1", "1", "3"]),
            residence("p2", &["2", "1", "3"]),
            residence("p3", &["0", "10", "1"]),
        ];
        let changes = household_changes(&people, &["1986", "1992", "1999"]).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].year, "1992");
        assert_eq!(changes[0].new, vec!["10"]);
        assert_eq!(changes[0].defunct, vec!["2"]);
        assert_eq!(changes[1].new, vec!["3"]);
        assert_eq!(changes[1].defunct, vec!["10"]);
        assert!(household_changes(&people, &["1986"]).is_err());
    }
}
