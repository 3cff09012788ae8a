//! Household-year and person tables.

use std::path::Path;

use ::csv::ReaderBuilder;
use kinex_core::Result;
use serde::{de, Deserialize, Deserializer};

use crate::{open, parse_error};

/// One household observed in one survey year.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HouseholdYear {
    #[serde(rename = "Household ID")]
    pub household: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Size")]
    pub size: f64,
    /// Median kinship distance between household members.
    #[serde(rename = "Median Dist")]
    pub median_distance: f64,
    #[serde(rename = "Wealth", default)]
    pub wealth: Option<f64>,
}

/// One person with their kinship-network degree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Person {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Household")]
    pub household: String,
    #[serde(rename = "Degree")]
    pub degree: u32,
    #[serde(rename = "IsHouseholdHead", deserialize_with = "flag")]
    pub is_household_head: bool,
    #[serde(rename = "Gender")]
    pub gender: String,
}

/// Read the household-year table (`Household ID`, `Year`, `Size`,
/// `Median Dist`, optional `Wealth`).
pub fn read_household_years(path: impl AsRef<Path>) -> Result<Vec<HouseholdYear>> {
    read_rows(path.as_ref())
}

/// Read the person table (`ID`, `Household`, `Degree`, `IsHouseholdHead`,
/// `Gender`).
pub fn read_people(path: impl AsRef<Path>) -> Result<Vec<Person>> {
    read_rows(path.as_ref())
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(::csv::Trim::All)
        .from_reader(open(path)?);
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| parse_error(path, e))?;
    if rows.is_empty() {
        return Err(parse_error(path, "no data rows"));
    }
    Ok(rows)
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.as_str() {
        "TRUE" | "True" | "true" | "1" => Ok(true),
        "FALSE" | "False" | "false" | "0" => Ok(false),
        other => Err(de::Error::custom(format!("'{other}' is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinex_core::KinexError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        write!(file, "{content}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn household_years_with_and_without_wealth() {
        let file = write(
            "Household ID,Year,Size,Median Dist,Wealth\n\
             1,1986,5,2,1200\n\
             3.1,1992,3,1.5,\n",
        );
        let rows = read_household_years(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].household, "1");
        assert_eq!(rows[0].wealth, Some(1200.0));
        assert_eq!(rows[1].household, "3.1");
        assert_eq!(rows[1].median_distance, 1.5);
        assert_eq!(rows[1].wealth, None);

        let file = write("Household ID,Year,Size,Median Dist\n2,2010,4,3\n");
        let rows = read_household_years(file.path()).unwrap();
        assert_eq!(rows[0].year, 2010);
        assert_eq!(rows[0].wealth, None);
    }

    #[test]
    fn people_boolean_spellings() {
        let file = write(
            "ID,Household,Degree,IsHouseholdHead,Gender\n\
             p1,1,4,TRUE,M\n\
             p2,1,2,false,F\n\
             p3,2,0,1,F\n",
        );
        let people = read_people(file.path()).unwrap();
        let heads: Vec<bool> = people.iter().map(|p| p.is_household_head).collect();
        assert_eq!(heads, vec![true, false, true]);
        assert_eq!(people[2].degree, 0);
    }

    #[test]
    fn bad_rows_name_the_file() {
        let file = write("ID,Household,Degree,IsHouseholdHead,Gender\np1,1,4,maybe,M\n");
        let err = read_people(file.path()).unwrap_err();
        assert!(matches!(err, KinexError::Parse(_)));
        assert!(err.to_string().contains(&file.path().display().to_string()));

        let file = write("ID,Household,Degree\np1,1,4\n");
        assert!(read_people(file.path()).is_err());
        let file = write("ID,Household,Degree,IsHouseholdHead,Gender\n");
        assert!(read_people(file.path()).is_err());
    }
}
