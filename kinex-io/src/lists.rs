//! Tab-separated node, edge and residence lists.
//!
//! These files carry no header row. Only the leading columns are read;
//! trailing attribute columns are ignored.
//!
//! - node list: `id  [attributes…]`
//! - edge list: `id1  id2  [type  attributes…]`
//! - residence list: `id  household_year1  household_year2 …`, where a
//!   household of `0` means the person was not in the community that year

use std::path::Path;

use ::csv::{ReaderBuilder, StringRecord};
use kinex_core::Result;

use crate::{open, parse_error};

/// An undirected link between two people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// Edge type column, if present (e.g. `undirected`).
    pub kind: Option<String>,
}

/// A person's household in each survey year; `None` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residence {
    pub id: String,
    pub households: Vec<Option<String>>,
}

/// Read the node IDs of a node list.
pub fn read_node_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    read_records(path, 1)?
        .into_iter()
        .map(|record| Ok(record[0].to_string()))
        .collect()
}

/// Read an edge list.
pub fn read_edge_list(path: impl AsRef<Path>) -> Result<Vec<Edge>> {
    let path = path.as_ref();
    read_records(path, 2)?
        .into_iter()
        .map(|record| {
            Ok(Edge {
                source: record[0].to_string(),
                target: record[1].to_string(),
                kind: record.get(2).filter(|k| !k.is_empty()).map(str::to_string),
            })
        })
        .collect()
}

/// Read a residence list with `n_years` household columns.
pub fn read_residences(path: impl AsRef<Path>, n_years: usize) -> Result<Vec<Residence>> {
    let path = path.as_ref();
    read_records(path, n_years + 1)?
        .into_iter()
        .map(|record| {
            let households = (1..=n_years)
                .map(|i| match &record[i] {
                    "0" | "" => None,
                    hh => Some(hh.to_string()),
                })
                .collect();
            Ok(Residence {
                id: record[0].to_string(),
                households,
            })
        })
        .collect()
}

fn read_records(path: &Path, min_fields: usize) -> Result<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(open(path)?);
    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| parse_error(path, e))?;
        if record.len() < min_fields || record[0].is_empty() {
            return Err(parse_error(
                path,
                format!("line {}: expected at least {min_fields} fields", line + 1),
            ));
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        write!(file, "{content}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn node_list_keeps_first_column() {
        let file = write("101\tM\t1950\n102\tF\t1955\n103\n");
        assert_eq!(read_node_list(file.path()).unwrap(), vec!["101", "102", "103"]);
    }

    #[test]
    fn edge_list_with_optional_type() {
        let file = write("101\t102\tundirected\tspouse\n102\t103\n");
        let edges = read_edge_list(file.path()).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].kind.as_deref(), Some("undirected"));
        assert_eq!(edges[1].target, "103");
        assert_eq!(edges[1].kind, None);
    }

    #[test]
    fn residences_treat_zero_as_absent() {
        let file = write("101\t1\t2\t0\t3.1\n102\t1\t1\t1\t1\n");
        let rows = read_residences(file.path(), 4).unwrap();
        assert_eq!(
            rows[0].households,
            vec![Some("1".into()), Some("2".into()), None, Some("3.1".into())]
        );
        assert!(rows[1].households.iter().all(|h| h.as_deref() == Some("1")));
    }

    #[test]
    fn short_lines_are_rejected() {
        let file = write("101\t102\n103\n");
        assert!(read_edge_list(file.path()).is_err());
        let file = write("101\t1\t2\n");
        assert!(read_residences(file.path(), 4).is_err());
    }
}
