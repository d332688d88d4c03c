//! CSV import for historical meter readings.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::SimError;
use crate::series::{Sample, TimeSeries};

/// Error reading a usage CSV.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Underlying CSV parse or I/O failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// A timestamp cell that is not RFC 3339.
    #[error("row {row}: \"{value}\" is not an RFC 3339 timestamp")]
    Timestamp { row: usize, value: String },
    /// A usage cell that is not a number.
    #[error("row {row}: \"{value}\" is not a number")]
    Value { row: usize, value: String },
    /// The parsed samples do not form a valid series.
    #[error(transparent)]
    Series(#[from] SimError),
}

/// Reads a usage series from a CSV file.
///
/// Expects a header row followed by `timestamp,usage_kwh` rows with RFC 3339
/// timestamps. Extra columns are ignored.
///
/// # Errors
///
/// Returns an [`ImportError`] for I/O or parse failures, or if the rows do
/// not form a non-empty strictly-increasing series.
pub fn read_usage_csv(path: &Path) -> Result<TimeSeries, ImportError> {
    let file = File::open(path).map_err(csv::Error::from)?;
    read_usage(file)
}

/// Reads a usage series from any reader; see [`read_usage_csv`].
///
/// # Errors
///
/// Same as [`read_usage_csv`].
pub fn read_usage(reader: impl Read) -> Result<TimeSeries, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let mut samples = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // +2: one for the header, one for 1-based numbering.
        let row = i + 2;
        let ts_cell = record.get(0).unwrap_or_default();
        let timestamp = DateTime::parse_from_rfc3339(ts_cell)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| ImportError::Timestamp {
                row,
                value: ts_cell.to_string(),
            })?;
        let value_cell = record.get(1).unwrap_or_default();
        let value: f64 = value_cell.trim().parse().map_err(|_| ImportError::Value {
            row,
            value: value_cell.to_string(),
        })?;
        samples.push(Sample { timestamp, value });
    }
    Ok(TimeSeries::new(samples)?)
}
