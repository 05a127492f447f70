//! Columnar market data bound to an evaluator.
//!
//! Rows are bars in ascending time order, indexed `0..len`. Every column has
//! exactly `len` cells; missing observations are stored as `NaN`.

use crate::domain::error::TradelangError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: BTreeMap<String, Vec<f64>>,
    dates: Option<Vec<NaiveDate>>,
    len: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from named columns. All columns must share one length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TradelangError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut dataset = Self::new();
        for (name, values) in columns {
            dataset = dataset.with_column(name, values)?;
        }
        Ok(dataset)
    }

    /// Add (or replace) a column. The first column fixes the row count.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, TradelangError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TradelangError::Data {
                reason: "column name must not be empty".to_string(),
            });
        }
        let fixed = !self.columns.is_empty() || self.dates.is_some();
        if fixed && values.len() != self.len {
            return Err(TradelangError::Data {
                reason: format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    values.len(),
                    self.len
                ),
            });
        }
        self.len = values.len();
        self.columns.insert(name, values);
        Ok(self)
    }

    /// Attach one date label per row.
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self, TradelangError> {
        if !self.columns.is_empty() && dates.len() != self.len {
            return Err(TradelangError::Data {
                reason: format!("{} dates for {} rows", dates.len(), self.len),
            });
        }
        self.len = dates.len();
        self.dates = Some(dates);
        Ok(self)
    }

    /// Append one bar. `row` must name every existing column exactly once
    /// and nothing else.
    pub fn push_row(
        &mut self,
        date: Option<NaiveDate>,
        row: &[(&str, f64)],
    ) -> Result<(), TradelangError> {
        let names: BTreeSet<&str> = row.iter().map(|(name, _)| *name).collect();
        if names.len() != row.len()
            || names.len() != self.columns.len()
            || names.iter().any(|name| !self.columns.contains_key(*name))
        {
            return Err(TradelangError::Data {
                reason: format!(
                    "row must supply exactly the columns: {}",
                    self.column_names().collect::<Vec<_>>().join(", ")
                ),
            });
        }
        match (&mut self.dates, date) {
            (Some(dates), Some(d)) => dates.push(d),
            (None, None) => {}
            (Some(_), None) => {
                return Err(TradelangError::Data {
                    reason: "dataset is dated; row needs a date".to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(TradelangError::Data {
                    reason: "dataset is undated; row must not carry a date".to_string(),
                });
            }
        }
        for (name, value) in row {
            if let Some(column) = self.columns.get_mut(*name) {
                column.push(*value);
            }
        }
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Cell value, `None` if the column is absent or the row is out of range.
    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.columns.get(name).and_then(|c| c.get(index)).copied()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn date(&self, index: usize) -> Option<NaiveDate> {
        self.dates.as_ref().and_then(|d| d.get(index)).copied()
    }
}
