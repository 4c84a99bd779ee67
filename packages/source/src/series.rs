//! Survey series CSV loading, in the statistics API's long export format
//! (one row per area, period, and breakdown).

use std::io::Read;
use std::path::Path;

use civic_atlas_geography_models::RawSeriesRow;
use civic_atlas_source_models::SeriesFieldMapping;

use crate::{SourceError, column_index};

/// Reads series rows from CSV.
///
/// Empty or non-numeric values become missing rather than failing the
/// row. Rows without an area code are skipped.
///
/// # Errors
///
/// Returns [`SourceError`] if the CSV is malformed or lacks a configured
/// column.
pub fn read_series_rows<R: Read>(
    reader: R,
    fields: &SeriesFieldMapping,
) -> Result<Vec<RawSeriesRow>, SourceError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    let code_idx = column_index(&headers, &fields.area_code)?;
    let name_idx = column_index(&headers, &fields.area_name)?;
    let period_idx = column_index(&headers, &fields.time_period)?;
    let value_idx = column_index(&headers, &fields.value)?;

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();

        let area_code = field(code_idx);
        if area_code.is_empty() {
            log::debug!("Skipping series row without an area code");
            continue;
        }

        rows.push(RawSeriesRow {
            area_code: area_code.to_string(),
            area_name: field(name_idx).to_string(),
            period_label: field(period_idx).to_string(),
            value: field(value_idx).parse::<f64>().ok(),
        });
    }

    log::info!("Loaded {} series rows", rows.len());

    Ok(rows)
}

/// Reads series rows from a CSV file.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be opened or parsed.
pub fn load_series_rows(
    path: &Path,
    fields: &SeriesFieldMapping,
) -> Result<Vec<RawSeriesRow>, SourceError> {
    let file = std::fs::File::open(path)?;
    read_series_rows(file, fields)
}
