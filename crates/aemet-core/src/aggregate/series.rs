//! The canonical per-station daily series.

use chrono::NaiveDate;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::storage::write_atomic;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One value of the series.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Missing => Ok(()),
        }
    }
}

/// One calendar day; `cells` is aligned with `CanonicalSeries::columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub date: NaiveDate,
    pub cells: Vec<Cell>,
}

impl SeriesRow {
    pub fn is_gap(&self) -> bool {
        self.cells.iter().all(Cell::is_missing)
    }
}

/// One row per day from the first to the last observed date, ascending,
/// with all-missing rows where the station reported nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSeries {
    pub station: String,
    pub date_field: String,
    /// Every observed field except the date, sorted by name.
    pub columns: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

impl CanonicalSeries {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last day covered.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.rows.first()?.date, self.rows.last()?.date))
    }

    pub fn gap_days(&self) -> usize {
        self.rows.iter().filter(|r| r.is_gap()).count()
    }

    pub fn get(&self, date: NaiveDate, column: &str) -> Option<&Cell> {
        let col = self.columns.iter().position(|c| c == column)?;
        let (first, _) = self.span()?;
        let idx = usize::try_from((date - first).num_days()).ok()?;
        self.rows.get(idx)?.cells.get(col)
    }

    /// CSV bytes: the date column, then one column per field. Missing values
    /// are empty cells.
    pub fn to_csv(&self) -> Result<Vec<u8>, SeriesError> {
        let mut w = csv::Writer::from_writer(Vec::new());
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(self.date_field.as_str());
        header.extend(self.columns.iter().map(String::as_str));
        w.write_record(&header)?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(row.cells.len() + 1);
            record.push(row.date.format("%Y-%m-%d").to_string());
            record.extend(row.cells.iter().map(Cell::to_string));
            w.write_record(&record)?;
        }
        w.into_inner().map_err(|e| SeriesError::Csv(e.into_error().into()))
    }

    /// Write the CSV atomically to `path`.
    pub fn write_csv(&self, path: &Path) -> Result<(), SeriesError> {
        let bytes = self.to_csv()?;
        write_atomic(path, &bytes).map_err(|source| SeriesError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
