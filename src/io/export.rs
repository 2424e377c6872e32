//! CSV export of chart series and raw snapshot history.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::history::{ChartPoint, EnergySnapshot};

/// Leading columns of the chart export; one column per device id follows.
const CHART_HEADER: [&str; 3] = ["label", "timestamp", "total_kwh"];
/// Column layout of the raw history export.
const HISTORY_HEADER: [&str; 3] = ["timestamp", "device_id", "energy_kwh"];

/// Exports chart buckets to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_chart_csv(points: &[ChartPoint], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_chart_csv(points, io::BufWriter::new(file))
}

/// Writes chart buckets as CSV, one row per bucket.
///
/// Device columns are the sorted union of ids across all buckets; a device absent
/// from a bucket leaves its cell empty.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_chart_csv(points: &[ChartPoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let ids: BTreeSet<&str> = points
        .iter()
        .flat_map(|p| p.values.keys().map(String::as_str))
        .collect();
    wtr.write_record(CHART_HEADER.iter().copied().chain(ids.iter().copied()))?;

    for p in points {
        let mut row = vec![
            p.label.clone(),
            p.timestamp.to_string(),
            format!("{:.4}", p.total_kwh()),
        ];
        row.extend(
            ids.iter()
                .map(|id| p.values.get(*id).map_or_else(String::new, |v| format!("{v:.4}"))),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports raw snapshots to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_history_csv<'a>(
    snapshots: impl IntoIterator<Item = &'a EnergySnapshot>,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    write_history_csv(snapshots, io::BufWriter::new(file))
}

/// Writes snapshots in long format: one row per device per snapshot.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_history_csv<'a>(
    snapshots: impl IntoIterator<Item = &'a EnergySnapshot>,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HISTORY_HEADER)?;
    for s in snapshots {
        for (id, kwh) in &s.device_energies {
            wtr.write_record([s.timestamp.to_string(), id.clone(), format!("{kwh:.6}")])?;
        }
    }
    wtr.flush()?;
    Ok(())
}
