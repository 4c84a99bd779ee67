#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Study definition types, deserialized from TOML.
//!
//! A study names the target geography (an area code prefix), the columns
//! each input file uses, the reporting periods to drop, and the catalogue
//! of health metrics to reshape. Every column name the loaders read comes
//! from here rather than from constants.

use civic_atlas_analytics_models::PipelineConfig;
use serde::{Deserialize, Serialize};

/// A complete study configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyDefinition {
    /// Unique study identifier (e.g., `"london"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Area code prefix selecting the target geography (e.g., `"E09"`).
    pub scope_prefix: String,
    /// Reporting periods known to be anomalous.
    #[serde(default)]
    pub excluded_periods: Vec<i32>,
    /// Display label for the point count column (e.g., "Bike Points").
    pub point_label: String,
    pub boundaries: BoundaryFieldMapping,
    #[serde(default)]
    pub points: PointFieldMapping,
    pub index: IndexFieldMapping,
    #[serde(default)]
    pub series: SeriesFieldMapping,
    /// Health metrics available for period matrices.
    #[serde(default)]
    pub metrics: Vec<MetricDefinition>,
}

impl StudyDefinition {
    /// Derives the pipeline configuration for this study.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            scope_prefix: self.scope_prefix.clone(),
            excluded_periods: self.excluded_periods.clone(),
        }
    }

    /// Finds a metric by its indicator id.
    #[must_use]
    pub fn metric(&self, indicator_id: u32) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.indicator_id == indicator_id)
    }
}

/// Property names of the boundary `GeoJSON` features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryFieldMapping {
    /// Property holding the area code (e.g., `"LAD23CD"`).
    pub code: String,
    /// Property holding the area name (e.g., `"LAD23NM"`).
    pub name: String,
    /// EPSG code of the boundary coordinates.
    #[serde(default = "default_epsg")]
    pub epsg: u32,
}

/// Field names of each object in the point feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointFieldMapping {
    #[serde(default = "default_longitude")]
    pub longitude: String,
    #[serde(default = "default_latitude")]
    pub latitude: String,
    #[serde(default = "default_epsg")]
    pub epsg: u32,
}

impl Default for PointFieldMapping {
    fn default() -> Self {
        Self {
            longitude: default_longitude(),
            latitude: default_latitude(),
            epsg: default_epsg(),
        }
    }
}

/// Column names of the socioeconomic index CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFieldMapping {
    /// Column holding the parent area code.
    pub code: String,
    /// Column holding the decile or score.
    pub score: String,
    /// Display label for the aggregated score.
    pub label: String,
}

/// Column names of the survey series CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFieldMapping {
    pub area_code: String,
    pub area_name: String,
    pub time_period: String,
    pub value: String,
}

impl Default for SeriesFieldMapping {
    fn default() -> Self {
        Self {
            area_code: "Area Code".to_string(),
            area_name: "Area Name".to_string(),
            time_period: "Time period".to_string(),
            value: "Value".to_string(),
        }
    }
}

/// One health metric in the study catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Display label, also used as the metric column name.
    pub label: String,
    /// Indicator id in the statistics API.
    pub indicator_id: u32,
}

const fn default_epsg() -> u32 {
    4326
}

fn default_longitude() -> String {
    "lon".to_string()
}

fn default_latitude() -> String {
    "lat".to_string()
}
