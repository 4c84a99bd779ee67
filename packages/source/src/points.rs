//! Point feed loading: a JSON array of objects carrying coordinates, such
//! as a bike hire docking station listing.

use std::path::Path;

use civic_atlas_geography_models::{CoordinateReference, PointObservation, PointSet};
use civic_atlas_source_models::PointFieldMapping;

use crate::SourceError;

/// Reads a coordinate field that may be encoded as a number or a string.
fn coordinate(record: &serde_json::Value, field: &str) -> Option<f64> {
    let value = record.get(field)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|v: &f64| v.is_finite())
}

/// Parses a point feed.
///
/// Records without both coordinates are skipped.
///
/// # Errors
///
/// Returns [`SourceError`] if the text is not JSON or not a JSON array.
pub fn parse_points(json: &str, fields: &PointFieldMapping) -> Result<PointSet, SourceError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let records = value.as_array().ok_or_else(|| SourceError::Conversion {
        message: "point feed is not a JSON array".to_string(),
    })?;

    let points: Vec<PointObservation> = records
        .iter()
        .filter_map(|record| {
            let longitude = coordinate(record, &fields.longitude);
            let latitude = coordinate(record, &fields.latitude);
            let (Some(longitude), Some(latitude)) = (longitude, latitude) else {
                log::warn!("Skipping point record without usable coordinates");
                return None;
            };
            Some(PointObservation {
                longitude,
                latitude,
            })
        })
        .collect();

    log::info!("Loaded {} of {} point records", points.len(), records.len());

    Ok(PointSet {
        crs: CoordinateReference::Epsg(fields.epsg),
        points,
    })
}

/// Reads and parses a point feed file.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or parsed.
pub fn load_points(path: &Path, fields: &PointFieldMapping) -> Result<PointSet, SourceError> {
    let contents = std::fs::read_to_string(path)?;
    parse_points(&contents, fields)
}
