#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Local-file loaders for the aggregation pipeline's inputs.
//!
//! Each loader reads one already-downloaded extract and maps it to the
//! plain geography types using the column names from a
//! [`StudyDefinition`](civic_atlas_source_models::StudyDefinition). Fetching
//! the extracts from remote APIs is left to the caller.

pub mod boundaries;
pub mod index;
pub mod points;
pub mod registry;
pub mod series;

use std::path::Path;

use civic_atlas_source_models::StudyDefinition;

/// Errors that can occur while loading source files.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Study TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file parsed but did not have the expected shape.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// No embedded study has this id.
    #[error("Unknown study '{id}'")]
    UnknownStudy {
        /// The requested id.
        id: String,
    },
}

/// Loads a study definition from a TOML file on disk.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or parsed.
pub fn load_study(path: &Path) -> Result<StudyDefinition, SourceError> {
    let contents = std::fs::read_to_string(path)?;
    let study: StudyDefinition = toml::from_str(&contents)?;
    log::info!("Loaded study '{}' from {}", study.id, path.display());
    Ok(study)
}

/// Finds the position of a named column in a CSV header row.
pub(crate) fn column_index(
    headers: &csv::StringRecord,
    column: &str,
) -> Result<usize, SourceError> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| SourceError::Conversion {
            message: format!("missing column '{column}'"),
        })
}
