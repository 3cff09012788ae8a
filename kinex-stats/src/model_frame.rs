//! Model frames, formulas and design matrices.
//!
//! A [`Frame`] holds named numeric and categorical columns of equal length.
//! A [`Formula`] names a response, a list of fixed-effect [`Term`]s and an
//! optional grouping column for a random intercept. [`Frame::design`] expands
//! terms into a dense design matrix using treatment contrasts (the first
//! level of each factor is the reference).

use std::fmt;

use kinex_core::{KinexError, Result};

// ── Factor ──────────────────────────────────────────────────────────────────

/// A categorical variable: sorted level labels plus one code per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    levels: Vec<String>,
    codes: Vec<usize>,
}

impl Factor {
    /// Build a factor from string labels.
    ///
    /// Levels are sorted numerically when every label parses as a number,
    /// lexicographically otherwise.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut levels: Vec<String> = labels.iter().map(|s| s.as_ref().to_string()).collect();
        let all_numeric = levels.iter().all(|l| l.trim().parse::<f64>().is_ok());
        if all_numeric {
            levels.sort_by(|a, b| {
                let x: f64 = a.trim().parse().unwrap_or(f64::NAN);
                let y: f64 = b.trim().parse().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            });
        } else {
            levels.sort();
        }
        levels.dedup();
        let codes = labels
            .iter()
            .map(|s| levels.iter().position(|l| l == s.as_ref()).unwrap_or(0))
            .collect();
        Self { levels, codes }
    }

    /// Build an ordered factor from numeric values; levels ascend numerically.
    pub fn ordered_from_f64(values: &[f64]) -> Result<Self> {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(KinexError::InvalidInput(format!(
                "factor: non-finite value {bad}"
            )));
        }
        let mut distinct: Vec<f64> = values.to_vec();
        distinct.sort_by(|a, b| a.total_cmp(b));
        distinct.dedup();
        let codes = values
            .iter()
            .map(|v| distinct.iter().position(|d| d == v).unwrap_or(0))
            .collect();
        let levels = distinct.iter().map(|v| format!("{v}")).collect();
        Ok(Self { levels, codes })
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

// ── Frame ───────────────────────────────────────────────────────────────────

/// A single column of a [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Factor(Factor),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Factor(f) => f.len(),
        }
    }
}

/// Named columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    n_rows: Option<usize>,
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a numeric column.
    pub fn with_numeric(self, name: &str, values: Vec<f64>) -> Result<Self> {
        self.with_column(name, Column::Numeric(values))
    }

    /// Add (or replace) a categorical column.
    pub fn with_factor(self, name: &str, factor: Factor) -> Result<Self> {
        self.with_column(name, Column::Factor(factor))
    }

    fn with_column(mut self, name: &str, column: Column) -> Result<Self> {
        let len = column.len();
        if let Some(n) = self.n_rows {
            if n != len {
                return Err(KinexError::InvalidInput(format!(
                    "frame: column '{name}' has {len} rows, expected {n}"
                )));
            }
        }
        self.n_rows = Some(len);
        self.columns.retain(|(existing, _)| existing != name);
        self.columns.push((name.to_string(), column));
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows.unwrap_or(0)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| KinexError::InvalidInput(format!("frame: no column named '{name}'")))
    }

    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Factor(_) => Err(KinexError::InvalidInput(format!(
                "frame: column '{name}' is categorical, expected numeric"
            ))),
        }
    }

    /// The column as a factor; numeric columns are converted level-by-value.
    pub fn factor(&self, name: &str) -> Result<Factor> {
        match self.column(name)? {
            Column::Factor(f) => Ok(f.clone()),
            Column::Numeric(v) => Factor::ordered_from_f64(v),
        }
    }

    /// Expand `terms` into a design matrix, with a leading column of ones when
    /// `intercept` is set.
    pub fn design(&self, terms: &[Term], intercept: bool) -> Result<DesignMatrix> {
        let n = self.n_rows();
        let mut columns: Vec<Vec<f64>> = Vec::new();
        let mut names: Vec<String> = Vec::new();

        if intercept {
            columns.push(vec![1.0; n]);
            names.push("(Intercept)".to_string());
        }

        for term in terms {
            match term {
                Term::Numeric(name) => {
                    columns.push(self.numeric(name)?.to_vec());
                    names.push(name.clone());
                }
                Term::Centered(name) => {
                    let values = self.numeric(name)?;
                    let mean = crate::descriptive::mean(values)?;
                    columns.push(values.iter().map(|v| v - mean).collect());
                    names.push(format!("{name}.c"));
                }
                Term::Factor(name) => {
                    let factor = self.factor(name)?;
                    for (level_idx, level) in factor.levels().iter().enumerate().skip(1) {
                        columns.push(
                            factor
                                .codes()
                                .iter()
                                .map(|&c| if c == level_idx { 1.0 } else { 0.0 })
                                .collect(),
                        );
                        names.push(format!("{name}{level}"));
                    }
                }
            }
        }

        let cols = columns.len();
        let mut data = vec![0.0; n * cols];
        for (j, column) in columns.iter().enumerate() {
            for (i, &v) in column.iter().enumerate() {
                data[i * cols + j] = v;
            }
        }

        Ok(DesignMatrix {
            rows: n,
            cols,
            data,
            column_names: names,
        })
    }
}

// ── Formula ─────────────────────────────────────────────────────────────────

/// A fixed-effect term of a model formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Numeric covariate entered as-is.
    Numeric(String),
    /// Numeric covariate with its mean subtracted.
    Centered(String),
    /// Categorical covariate with treatment contrasts.
    Factor(String),
}

impl Term {
    /// Column the term reads.
    pub fn name(&self) -> &str {
        match self {
            Term::Numeric(n) | Term::Centered(n) | Term::Factor(n) => n,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Numeric(n) => write!(f, "{n}"),
            Term::Centered(n) => write!(f, "center({n})"),
            Term::Factor(n) => write!(f, "factor({n})"),
        }
    }
}

/// Response, fixed-effect terms and optional random-intercept grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub response: String,
    pub terms: Vec<Term>,
    pub group: Option<String>,
}

impl Formula {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            terms: Vec::new(),
            group: None,
        }
    }

    pub fn term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    /// Add a random intercept per level of `column`.
    pub fn group(mut self, column: &str) -> Self {
        self.group = Some(column.to_string());
        self
    }

    /// The nested formula with every term reading `column` removed.
    pub fn without(&self, column: &str) -> Result<Self> {
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| t.name() != column)
            .cloned()
            .collect();
        if terms.len() == self.terms.len() {
            return Err(KinexError::InvalidInput(format!(
                "formula '{self}' has no term for '{column}'"
            )));
        }
        Ok(Self {
            terms,
            ..self.clone()
        })
    }

    /// The nested formula without its random intercept.
    pub fn without_group(&self) -> Result<Self> {
        if self.group.is_none() {
            return Err(KinexError::InvalidInput(format!(
                "formula '{self}' has no random intercept"
            )));
        }
        Ok(Self {
            group: None,
            ..self.clone()
        })
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ ", self.response)?;
        let mut parts: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        if let Some(g) = &self.group {
            parts.push(format!("(1 | {g})"));
        }
        if parts.is_empty() {
            parts.push("1".to_string());
        }
        write!(f, "{}", parts.join(" + "))
    }
}

// ── Design matrix ───────────────────────────────────────────────────────────

/// Dense row-major design matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
    pub column_names: Vec<String>,
}

impl DesignMatrix {
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// `X β` for every row.
    pub fn linear_predictor(&self, beta: &[f64]) -> Vec<f64> {
        (0..self.rows)
            .map(|i| self.row(i).iter().zip(beta).map(|(x, b)| x * b).sum())
            .collect()
    }
}
