//! Area boundary loading from a `GeoJSON` `FeatureCollection`.
//!
//! Features outside the study scope are cut, and features missing a code,
//! name, or polygon geometry are skipped.

use std::path::Path;

use civic_atlas_geography_models::{Area, AreaSet, CoordinateReference, in_scope};
use civic_atlas_source_models::BoundaryFieldMapping;
use civic_atlas_spatial::geometry_to_multipolygon;
use geojson::{Feature, GeoJson};

use crate::SourceError;

/// Parses boundary features and keeps those whose code is in scope.
///
/// # Errors
///
/// Returns [`SourceError`] if the text is not `GeoJSON` or is not a
/// `FeatureCollection`.
pub fn parse_boundaries(
    geojson_str: &str,
    fields: &BoundaryFieldMapping,
    scope_prefix: &str,
) -> Result<AreaSet, SourceError> {
    let GeoJson::FeatureCollection(collection) = geojson_str.parse::<GeoJson>()? else {
        return Err(SourceError::Conversion {
            message: "boundary file is not a FeatureCollection".to_string(),
        });
    };

    let total = collection.features.len();
    let areas: Vec<Area> = collection
        .features
        .into_iter()
        .filter_map(|feature| normalize_feature(feature, fields))
        .filter(|area| in_scope(&area.code, scope_prefix))
        .collect();

    log::info!(
        "Loaded {} areas in scope '{scope_prefix}' from {total} boundary features",
        areas.len(),
    );

    Ok(AreaSet {
        crs: CoordinateReference::Epsg(fields.epsg),
        areas,
    })
}

/// Reads and parses a boundary file.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or parsed.
pub fn load_boundaries(
    path: &Path,
    fields: &BoundaryFieldMapping,
    scope_prefix: &str,
) -> Result<AreaSet, SourceError> {
    let contents = std::fs::read_to_string(path)?;
    parse_boundaries(&contents, fields, scope_prefix)
}

fn property_str<'a>(feature: &'a Feature, key: &str) -> Option<&'a str> {
    feature
        .property(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn normalize_feature(feature: Feature, fields: &BoundaryFieldMapping) -> Option<Area> {
    let Some(code) = property_str(&feature, &fields.code).map(str::to_string) else {
        log::warn!("Skipping boundary feature without '{}'", fields.code);
        return None;
    };
    let name = property_str(&feature, &fields.name)
        .map(str::to_string)
        .or_else(|| {
            log::warn!("Skipping boundary {code}: no '{}'", fields.name);
            None
        })?;
    let geometry = feature
        .geometry
        .and_then(geometry_to_multipolygon)
        .or_else(|| {
            log::warn!("Skipping boundary {code}: missing or non-polygon geometry");
            None
        })?;

    Some(Area {
        code,
        name,
        geometry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> BoundaryFieldMapping {
        BoundaryFieldMapping {
            code: "LAD23CD".to_string(),
            name: "LAD23NM".to_string(),
            epsg: 4326,
        }
    }

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"LAD23CD": "E09000001", "LAD23NM": "City of London"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"LAD23CD": "E08000001", "LAD23NM": "Bolton"},
                "geometry": {"type": "Polygon", "coordinates": [[[5,5],[6,5],[6,6],[5,6],[5,5]]]}
            },
            {
                "type": "Feature",
                "properties": {"LAD23CD": "E09000002"},
                "geometry": {"type": "Polygon", "coordinates": [[[2,2],[3,2],[3,3],[2,3],[2,2]]]}
            },
            {
                "type": "Feature",
                "properties": {"LAD23CD": "E09000003", "LAD23NM": "Barnet"},
                "geometry": null
            },
            {
                "type": "Feature",
                "properties": {"LAD23CD": "E09000004", "LAD23NM": "Bexley"},
                "geometry": {"type": "MultiPolygon", "coordinates": [[[[7,7],[8,7],[8,8],[7,8],[7,7]]]]}
            }
        ]
    }"#;

    #[test]
    fn cuts_to_scope_and_skips_incomplete_features() {
        let set = parse_boundaries(COLLECTION, &fields(), "E09").unwrap();

        let codes: Vec<&str> = set.areas.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["E09000001", "E09000004"]);
        assert_eq!(set.areas[0].name, "City of London");
        assert_eq!(set.crs, CoordinateReference::WGS84);
    }

    #[test]
    fn empty_prefix_keeps_everything_complete() {
        let set = parse_boundaries(COLLECTION, &fields(), "").unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn rejects_bare_geometry() {
        let geometry = r#"{"type":"Point","coordinates":[0,0]}"#;
        assert!(matches!(
            parse_boundaries(geometry, &fields(), "E09"),
            Err(SourceError::Conversion { .. })
        ));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            parse_boundaries("{", &fields(), "E09"),
            Err(SourceError::GeoJson(_))
        ));
    }
}
