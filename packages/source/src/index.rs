//! Socioeconomic index CSV loading (e.g. IMD deciles per LSOA).
//!
//! Only the configured code and score columns are read. Scope filtering and
//! per-area averaging happen in the pipeline.

use std::io::Read;
use std::path::Path;

use civic_atlas_geography_models::RawIndexRow;
use civic_atlas_source_models::IndexFieldMapping;

use crate::{SourceError, column_index};

/// Reads index rows from CSV.
///
/// Rows with an empty code or a non-numeric score are skipped.
///
/// # Errors
///
/// Returns [`SourceError`] if the CSV is malformed or lacks a configured
/// column.
pub fn read_index_rows<R: Read>(
    reader: R,
    fields: &IndexFieldMapping,
) -> Result<Vec<RawIndexRow>, SourceError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    let code_idx = column_index(&headers, &fields.code)?;
    let score_idx = column_index(&headers, &fields.score)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record?;
        let code = record.get(code_idx).map(str::trim).unwrap_or_default();
        let score = record
            .get(score_idx)
            .and_then(|s| s.trim().parse::<f64>().ok());

        match score {
            Some(score) if !code.is_empty() => rows.push(RawIndexRow {
                area_code_raw: code.to_string(),
                score,
            }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} index rows without a code or numeric score");
    }
    log::info!("Loaded {} index rows", rows.len());

    Ok(rows)
}

/// Reads index rows from a CSV file.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be opened or parsed.
pub fn load_index_rows(
    path: &Path,
    fields: &IndexFieldMapping,
) -> Result<Vec<RawIndexRow>, SourceError> {
    let file = std::fs::File::open(path)?;
    read_index_rows(file, fields)
}
