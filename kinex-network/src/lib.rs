//! Kinship network analysis.
//!
//! [`KinshipGraph`] holds people and their kinship links and answers
//! degree, household distance and whole-network summary queries.
//! [`migration`] tracks people moving between households across survey
//! years and households forming or dissolving.

pub mod graph;
pub mod migration;

pub use graph::{HouseholdDistance, HouseholdKinship, KinshipGraph, NetworkParams};
pub use migration::{
    household_changes, household_turnover, migration_flows, HouseholdChange, MigrationFlow,
    Turnover,
};
