//! `GeoJSON` export of the entity table for choropleth rendering.
//!
//! Each row becomes a feature carrying its boundary and every merged
//! column as a property. Code, name, index, and point count properties use
//! the study's own column labels so the front end can keep its existing
//! field names.

use civic_atlas_analytics_models::{EntityRow, EntityTable};
use civic_atlas_source_models::StudyDefinition;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};

fn optional_number(value: Option<f64>) -> JsonValue {
    value.map_or(JsonValue::Null, JsonValue::from)
}

fn row_properties(row: &EntityRow, study: &StudyDefinition) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert(study.boundaries.code.clone(), row.code.clone().into());
    properties.insert(study.boundaries.name.clone(), row.name.clone().into());
    properties.insert(study.index.label.clone(), optional_number(row.index_score));
    properties.insert(study.point_label.clone(), row.point_count.into());
    properties.insert("share_of_total".to_string(), row.share_of_total.into());
    properties.insert("cumulative_count".to_string(), row.cumulative_count.into());
    properties.insert("cumulative_share".to_string(), row.cumulative_share.into());
    for (column, value) in &row.metrics {
        properties.insert(column.clone(), optional_number(*value));
    }
    properties
}

/// Converts the entity table into a `FeatureCollection`, one feature per
/// row in table order.
#[must_use]
pub fn entity_table_to_feature_collection(
    table: &EntityTable,
    study: &StudyDefinition,
) -> FeatureCollection {
    let features = table
        .rows
        .iter()
        .map(|row| Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(&row.geometry))),
            id: None,
            properties: Some(row_properties(row, study)),
            foreign_members: None,
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use civic_atlas_source::registry::study_by_id;
    use geo::{LineString, MultiPolygon, Polygon};

    fn row(code: &str, index_score: Option<f64>, point_count: u64) -> EntityRow {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        EntityRow {
            code: code.to_string(),
            name: format!("Borough {code}"),
            geometry: MultiPolygon(vec![Polygon::new(ring, vec![])]),
            index_score,
            point_count,
            share_of_total: 0.0,
            cumulative_count: point_count,
            cumulative_share: 0.0,
            metrics: BTreeMap::from([("Year 6".to_string(), None)]),
        }
    }

    #[test]
    fn features_use_study_column_labels() {
        let study = study_by_id("london").unwrap();
        let table = EntityTable {
            rows: vec![row("E09000001", Some(7.5), 12), row("E09000002", None, 0)],
        };

        let collection = entity_table_to_feature_collection(&table, &study);
        assert_eq!(collection.features.len(), 2);

        let first = &collection.features[0];
        assert!(first.geometry.is_some());
        assert_eq!(first.property("LAD23CD"), Some(&JsonValue::from("E09000001")));
        assert_eq!(first.property("Bike Points"), Some(&JsonValue::from(12u64)));
        assert_eq!(
            first.property("Mean deprivation decile"),
            Some(&JsonValue::from(7.5))
        );

        let second = &collection.features[1];
        assert_eq!(
            second.property("Mean deprivation decile"),
            Some(&JsonValue::Null)
        );
        assert_eq!(second.property("Year 6"), Some(&JsonValue::Null));
    }
}
