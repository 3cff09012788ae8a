//! File loading for household kinship and exchange data.
//!
//! - **Relationship matrices** — labelled square CSV matrices ([`matrix`])
//! - **Study tables** — household-year and person tables with named
//!   columns ([`tables`])
//! - **Network lists** — tab-separated node, edge and residence lists
//!   ([`lists`])
//!
//! Every reader reports the offending path in its error message.

pub mod lists;
pub mod matrix;
pub mod tables;

use std::fs::File;
use std::path::Path;

use kinex_core::{KinexError, Result};

pub use lists::{read_edge_list, read_node_list, read_residences, Edge, Residence};
pub use matrix::{read_matrix, LabeledMatrix};
pub use tables::{read_household_years, read_people, HouseholdYear, Person};

pub(crate) fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        KinexError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

pub(crate) fn parse_error(path: &Path, err: impl std::fmt::Display) -> KinexError {
    KinexError::Parse(format!("{}: {}", path.display(), err))
}
