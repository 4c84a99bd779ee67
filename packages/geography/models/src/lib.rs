#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative area and civic observation types.
//!
//! These are the plain inputs of the aggregation pipeline: area polygons
//! loaded from a boundary file, located point observations, raw
//! socioeconomic index rows, and raw longitudinal survey rows. They carry
//! no behavior beyond small parsing helpers shared by the loaders and the
//! pipeline.

use std::fmt;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Coordinate reference system tag attached to a set of geometries.
///
/// The pipeline never reprojects; it only checks that two inputs agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoordinateReference {
    /// An EPSG code, e.g. 4326 for WGS84 or 27700 for British National Grid.
    Epsg(u32),
}

impl CoordinateReference {
    /// WGS84 longitude/latitude.
    pub const WGS84: Self = Self::Epsg(4326);
}

impl Default for CoordinateReference {
    fn default() -> Self {
        Self::WGS84
    }
}

impl fmt::Display for CoordinateReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epsg(code) => write!(f, "EPSG:{code}"),
        }
    }
}

/// An administrative polygon (e.g. a London borough).
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    /// Stable unique identifier (e.g. "E09000001").
    pub code: String,
    /// Human-readable name (e.g. "City of London").
    pub name: String,
    /// Boundary, in the coordinate reference of the owning [`AreaSet`].
    pub geometry: MultiPolygon<f64>,
}

/// A collection of areas sharing one coordinate reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AreaSet {
    /// Coordinate reference of every area geometry.
    pub crs: CoordinateReference,
    /// The areas, in load order.
    pub areas: Vec<Area>,
}

impl AreaSet {
    /// Creates a WGS84 area set.
    #[must_use]
    pub const fn wgs84(areas: Vec<Area>) -> Self {
        Self {
            crs: CoordinateReference::WGS84,
            areas,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

/// A located point, such as a bike hire docking station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointObservation {
    pub longitude: f64,
    pub latitude: f64,
}

/// A collection of points sharing one coordinate reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointSet {
    pub crs: CoordinateReference,
    pub points: Vec<PointObservation>,
}

impl PointSet {
    /// Creates a WGS84 point set.
    #[must_use]
    pub const fn wgs84(points: Vec<PointObservation>) -> Self {
        Self {
            crs: CoordinateReference::WGS84,
            points,
        }
    }
}

/// Number of points that fell inside one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaCount {
    pub code: String,
    pub name: String,
    pub count: u64,
}

/// A raw socioeconomic index row at a finer granularity than an area
/// (e.g. one IMD decile per LSOA, tagged with its parent district code).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndexRow {
    /// Parent area code as it appears in the source file.
    pub area_code_raw: String,
    /// Decile or score for this sub-record.
    pub score: f64,
}

/// Area-level socioeconomic score: the mean of its sub-records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    pub area_code: String,
    pub score: f64,
}

/// A raw longitudinal survey row as exported by the statistics API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSeriesRow {
    pub area_code: String,
    pub area_name: String,
    /// Reporting period label, either `"YYYY"` or `"YYYY/YY"`.
    pub period_label: String,
    pub value: Option<f64>,
}

/// One (area, period, value) observation with an ordinal period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub area_code: String,
    pub area_name: String,
    /// Start year of the reporting period.
    pub period: i32,
    /// Original label, kept for display.
    pub period_label: String,
    pub value: Option<f64>,
}

impl SeriesPoint {
    /// Converts a raw row, deriving the ordinal period from the label.
    ///
    /// Returns `None` if the label does not start with a four-digit year.
    #[must_use]
    pub fn from_raw(raw: RawSeriesRow) -> Option<Self> {
        let period = parse_period_start(&raw.period_label)?;
        Some(Self {
            area_code: raw.area_code,
            area_name: raw.area_name,
            period,
            period_label: raw.period_label,
            // NaN is treated the same as an empty cell
            value: raw.value.filter(|v| !v.is_nan()),
        })
    }
}

/// Derives the ordinal period from a label such as `"2006/07"` or `"2019"`:
/// the integer value of its first four characters.
#[must_use]
pub fn parse_period_start(label: &str) -> Option<i32> {
    let head = label.trim().get(..4)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}

/// Returns `true` if an area code belongs to the scope identified by
/// `prefix` (e.g. `"E09"` for London boroughs).
///
/// An empty prefix matches every code.
#[must_use]
pub fn in_scope(code: &str, prefix: &str) -> bool {
    code.starts_with(prefix)
}
