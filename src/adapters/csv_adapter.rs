//! CSV file data adapter.
//!
//! The header row names the columns. One column (default `date`) may hold
//! `%Y-%m-%d` labels; rows are then sorted by it. Every other column must be
//! numeric, with empty cells and `NaN` read as missing.

use crate::domain::dataset::Dataset;
use crate::domain::error::TradelangError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_DATE_COLUMN: &str = "date";

pub struct CsvAdapter {
    date_column: String,
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_COLUMN)
    }
}

impl CsvAdapter {
    pub fn new(date_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
        }
    }

    fn data_error(reason: String) -> TradelangError {
        TradelangError::Data { reason }
    }
}

fn parse_cell(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(f64::NAN);
    }
    raw.parse().ok()
}

impl DataPort for CsvAdapter {
    fn load(&self, source: &Path) -> Result<Dataset, TradelangError> {
        let content = fs::read_to_string(source).map_err(|e| {
            Self::data_error(format!("failed to read {}: {}", source.display(), e))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| Self::data_error(format!("CSV parse error: {}", e)))?
            .clone();

        let date_pos = headers.iter().position(|h| h == self.date_column);
        let mut value_columns: Vec<(usize, String)> = Vec::new();
        for (pos, name) in headers.iter().enumerate() {
            if Some(pos) == date_pos {
                continue;
            }
            if name.is_empty() {
                return Err(Self::data_error(format!(
                    "column {} has an empty header",
                    pos + 1
                )));
            }
            if value_columns.iter().any(|(_, n)| n == name) {
                return Err(Self::data_error(format!("duplicate column '{}'", name)));
            }
            value_columns.push((pos, name.to_string()));
        }

        let mut rows: Vec<(Option<NaiveDate>, Vec<f64>)> = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| Self::data_error(format!("CSV parse error: {}", e)))?;
            // header is line 1
            let line = i + 2;

            let date = match date_pos {
                Some(pos) => {
                    let raw = record.get(pos).unwrap_or("");
                    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                        Self::data_error(format!("row {}: invalid date '{}': {}", line, raw, e))
                    })?;
                    Some(date)
                }
                None => None,
            };

            let mut values = Vec::with_capacity(value_columns.len());
            for (pos, name) in &value_columns {
                let raw = record.get(*pos).unwrap_or("");
                let value = parse_cell(raw).ok_or_else(|| {
                    Self::data_error(format!(
                        "row {}, column '{}': invalid number '{}'",
                        line, name, raw
                    ))
                })?;
                values.push(value);
            }
            rows.push((date, values));
        }

        if date_pos.is_some() {
            rows.sort_by_key(|(date, _)| *date);
        }

        let mut dataset = Dataset::new();
        if date_pos.is_some() {
            dataset = dataset.with_dates(rows.iter().filter_map(|(date, _)| *date).collect())?;
        }
        for (j, (_, name)) in value_columns.iter().enumerate() {
            dataset = dataset.with_column(name.clone(), rows.iter().map(|(_, v)| v[j]).collect())?;
        }

        debug!(
            source = %source.display(),
            rows = dataset.len(),
            columns = value_columns.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_reads_columns_and_dates() {
        let (_dir, path) = write_csv(
            "date,open,close,volume\n\
             2024-01-15,100.0,105.0,50000\n\
             2024-01-16,105.0,110.0,60000\n",
        );
        let ds = CsvAdapter::default().load(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("close").unwrap(), &[105.0, 110.0]);
        assert_eq!(ds.value("volume", 1), Some(60000.0));
        assert_eq!(ds.date(0), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert!(!ds.has_column("date"));
    }

    #[test]
    fn load_sorts_by_date() {
        let (_dir, path) = write_csv(
            "date,close\n\
             2024-01-17,3\n\
             2024-01-15,1\n\
             2024-01-16,2\n",
        );
        let ds = CsvAdapter::default().load(&path).unwrap();
        assert_eq!(ds.column("close").unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(ds.date(2), NaiveDate::from_ymd_opt(2024, 1, 17));
    }

    #[test]
    fn empty_and_nan_cells_are_missing() {
        let (_dir, path) = write_csv("close,volume\n1.5,\nNaN,7\n");
        let ds = CsvAdapter::default().load(&path).unwrap();
        assert!(ds.value("volume", 0).unwrap().is_nan());
        assert!(ds.value("close", 1).unwrap().is_nan());
        assert_eq!(ds.date(0), None);
    }

    #[test]
    fn custom_date_column() {
        let (_dir, path) = write_csv("day,close\n2024-02-01,10\n");
        let ds = CsvAdapter::new("day").load(&path).unwrap();
        assert_eq!(ds.date(0), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(ds.column_names().collect::<Vec<_>>(), vec!["close"]);
    }

    #[test]
    fn non_numeric_cell_names_row_and_column() {
        let (_dir, path) = write_csv("date,close\n2024-01-15,1\n2024-01-16,abc\n");
        let err = CsvAdapter::default().load(&path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 3"), "{}", msg);
        assert!(msg.contains("'close'"), "{}", msg);
        assert_eq!(err.exit_status(), 3);
    }

    #[test]
    fn invalid_date_fails() {
        let (_dir, path) = write_csv("date,close\n15/01/2024,1\n");
        assert!(matches!(
            CsvAdapter::default().load(&path),
            Err(TradelangError::Data { .. })
        ));
    }

    #[test]
    fn missing_file_fails() {
        let result = CsvAdapter::default().load(Path::new("/nonexistent/bars.csv"));
        assert!(matches!(result, Err(TradelangError::Data { .. })));
    }

    #[test]
    fn duplicate_header_fails() {
        let (_dir, path) = write_csv("close,close\n1,2\n");
        assert!(CsvAdapter::default().load(&path).is_err());
    }
}
