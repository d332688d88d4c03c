//! CSV export for simulation interval records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::engine::IntervalRecord;

/// Column header for CSV record export.
const HEADER: &str = "timestamp,duration_h,usage_kwh,price_per_kwh,\
                      requested_power_kw,achieved_power_kw,soc_kwh,grid_kwh,\
                      cost_without,cost_with";

/// Exports interval records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per interval. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[IntervalRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes interval records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[IntervalRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.timestamp.to_rfc3339(),
            format!("{:.4}", r.duration_h),
            format!("{:.4}", r.usage_kwh),
            format!("{:.4}", r.price_per_kwh),
            format!("{:.4}", r.requested_power_kw),
            format!("{:.4}", r.achieved_power_kw),
            format!("{:.4}", r.soc_kwh),
            format!("{:.4}", r.grid_kwh),
            format!("{:.4}", r.cost_without),
            format!("{:.4}", r.cost_with),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
