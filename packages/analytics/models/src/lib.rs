#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Output and configuration types of the civic aggregation pipeline.
//!
//! The entity table (one row per area, consumed by choropleth maps) and the
//! period matrix (one row per reporting period, consumed by range charts)
//! are plain values owned by the caller once produced.

use std::collections::BTreeMap;

use civic_atlas_geography_models::SeriesPoint;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Explicit configuration passed into both pipeline entry points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Area code prefix selecting the target geography (e.g. `"E09"`).
    /// Empty keeps every area.
    #[serde(default)]
    pub scope_prefix: String,
    /// Reporting periods dropped from every period matrix.
    #[serde(default)]
    pub excluded_periods: Vec<i32>,
}

impl PipelineConfig {
    /// Returns `true` if `period` must not appear in a period matrix.
    #[must_use]
    pub fn is_excluded(&self, period: i32) -> bool {
        self.excluded_periods.contains(&period)
    }
}

/// How a merged column is filled for areas missing from its source table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Count-like columns: absence means zero.
    FillZero,
    /// Score-like columns: absence stays missing.
    KeepMissing,
}

impl MissingValuePolicy {
    /// Applies the policy to a looked-up value.
    #[must_use]
    pub fn fill(self, value: Option<f64>) -> Option<f64> {
        match self {
            Self::FillZero => Some(value.unwrap_or(0.0)),
            Self::KeepMissing => value,
        }
    }
}

/// One value of an externally supplied per-area metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    pub area_code: String,
    pub value: Option<f64>,
}

/// An externally supplied per-area metric table to merge onto the entity
/// table. Must hold at most one value per area code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTable {
    /// Column name in the merged output.
    pub column: String,
    pub policy: MissingValuePolicy,
    pub values: Vec<MetricValue>,
}

/// A per-area point count with its rank-derived shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCount {
    pub code: String,
    pub name: String,
    pub count: u64,
    /// `count / total`, or 0 when the total is 0.
    pub share_of_total: f64,
    /// Running sum of `count` in descending-count order.
    pub cumulative_count: u64,
    /// `cumulative_count / total`, or 0 when the total is 0.
    pub cumulative_share: f64,
}

/// One area widened with every merged column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRow {
    pub code: String,
    pub name: String,
    #[serde(skip)]
    pub geometry: MultiPolygon<f64>,
    /// Mean socioeconomic score; `None` if the area had no index records.
    pub index_score: Option<f64>,
    pub point_count: u64,
    pub share_of_total: f64,
    pub cumulative_count: u64,
    pub cumulative_share: f64,
    /// Externally supplied metric columns, keyed by column name.
    pub metrics: BTreeMap<String, Option<f64>>,
}

/// The merged per-area table, in area load order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTable {
    pub rows: Vec<EntityRow>,
}

impl EntityTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds the row for an area code.
    #[must_use]
    pub fn row(&self, code: &str) -> Option<&EntityRow> {
        self.rows.iter().find(|row| row.code == code)
    }

    /// Rows in rank order: descending point count, ties by ascending
    /// cumulative count. Areas without points keep table order at the end.
    #[must_use]
    pub fn by_point_count(&self) -> Vec<&EntityRow> {
        let mut rows: Vec<&EntityRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            b.point_count
                .cmp(&a.point_count)
                .then(a.cumulative_count.cmp(&b.cumulative_count))
        });
        rows
    }

    /// Values of one metric column in row order, or `None` if no row
    /// carries that column.
    #[must_use]
    pub fn metric_column(&self, column: &str) -> Option<Vec<Option<f64>>> {
        if !self.rows.iter().any(|row| row.metrics.contains_key(column)) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| row.metrics.get(column).copied().flatten())
                .collect(),
        )
    }
}

/// Every in-scope observation at the latest reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestSnapshot {
    pub period: i32,
    pub rows: Vec<SeriesPoint>,
}

impl LatestSnapshot {
    /// Converts the snapshot into a score-like metric table keyed by area
    /// code, for merging current values onto the entity table.
    #[must_use]
    pub fn to_metric_table(&self, column: &str) -> MetricTable {
        MetricTable {
            column: column.to_string(),
            policy: MissingValuePolicy::KeepMissing,
            values: self
                .rows
                .iter()
                .map(|row| MetricValue {
                    area_code: row.area_code.clone(),
                    value: row.value,
                })
                .collect(),
        }
    }
}

/// One retained reporting period with its cross-sectional statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRow {
    pub period: i32,
    /// One cell per entry of [`PeriodMatrix::areas`].
    pub values: Vec<Option<f64>>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Wide matrix: one row per retained period, one column per area.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMatrix {
    /// Area names, in column order.
    pub areas: Vec<String>,
    /// Rows in ascending period order.
    pub rows: Vec<PeriodRow>,
}

impl PeriodMatrix {
    #[must_use]
    pub fn periods(&self) -> Vec<i32> {
        self.rows.iter().map(|row| row.period).collect()
    }

    #[must_use]
    pub fn row(&self, period: i32) -> Option<&PeriodRow> {
        self.rows.iter().find(|row| row.period == period)
    }

    /// First and last retained periods.
    #[must_use]
    pub fn period_range(&self) -> Option<(i32, i32)> {
        Some((self.rows.first()?.period, self.rows.last()?.period))
    }

    /// Non-missing `(period, value)` pairs for one area column.
    #[must_use]
    pub fn area_series(&self, area_name: &str) -> Option<Vec<(i32, f64)>> {
        let column = self.areas.iter().position(|name| name == area_name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| Some((row.period, row.values.get(column).copied().flatten()?)))
                .collect(),
        )
    }
}

/// Output of the period-matrix entry point for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub snapshot: LatestSnapshot,
    pub matrix: PeriodMatrix,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> PeriodMatrix {
        PeriodMatrix {
            areas: vec!["Camden".to_string(), "Hackney".to_string()],
            rows: vec![
                PeriodRow {
                    period: 2018,
                    values: vec![Some(1.0), None],
                    median: Some(1.0),
                    min: Some(1.0),
                    max: Some(1.0),
                },
                PeriodRow {
                    period: 2021,
                    values: vec![Some(2.0), Some(4.0)],
                    median: Some(3.0),
                    min: Some(2.0),
                    max: Some(4.0),
                },
            ],
        }
    }

    #[test]
    fn missing_value_policy_fill() {
        assert_eq!(MissingValuePolicy::FillZero.fill(None), Some(0.0));
        assert_eq!(MissingValuePolicy::FillZero.fill(Some(3.0)), Some(3.0));
        assert_eq!(MissingValuePolicy::KeepMissing.fill(None), None);
        assert_eq!(MissingValuePolicy::KeepMissing.fill(Some(3.0)), Some(3.0));
    }

    #[test]
    fn missing_value_policy_strings() {
        assert_eq!(MissingValuePolicy::FillZero.to_string(), "fill_zero");
        assert_eq!(
            "keep_missing".parse::<MissingValuePolicy>().unwrap(),
            MissingValuePolicy::KeepMissing
        );
    }

    #[test]
    fn pipeline_config_deserializes_with_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());

        let config: PipelineConfig =
            serde_json::from_str(r#"{"scopePrefix":"E09","excludedPeriods":[2020]}"#).unwrap();
        assert!(config.is_excluded(2020));
        assert!(!config.is_excluded(2019));
    }

    #[test]
    fn area_series_skips_missing_cells() {
        let m = matrix();
        assert_eq!(m.area_series("Hackney"), Some(vec![(2021, 4.0)]));
        assert_eq!(
            m.area_series("Camden"),
            Some(vec![(2018, 1.0), (2021, 2.0)])
        );
        assert_eq!(m.area_series("Islington"), None);
    }

    #[test]
    fn area_series_tolerates_short_rows() {
        let mut m = matrix();
        m.rows[0].values.truncate(1);
        assert_eq!(m.area_series("Hackney"), Some(vec![(2021, 4.0)]));
    }

    #[test]
    fn period_range_and_lookup() {
        let m = matrix();
        assert_eq!(m.period_range(), Some((2018, 2021)));
        assert_eq!(m.periods(), vec![2018, 2021]);
        assert!(m.row(2019).is_none());
        assert_eq!(PeriodMatrix::default().period_range(), None);
    }

    #[test]
    fn snapshot_becomes_score_like_metric() {
        let snapshot = LatestSnapshot {
            period: 2022,
            rows: vec![SeriesPoint {
                area_code: "E09000007".to_string(),
                area_name: "Camden".to_string(),
                period: 2022,
                period_label: "2022/23".to_string(),
                value: Some(21.5),
            }],
        };

        let table = snapshot.to_metric_table("Year 6 overweight");
        assert_eq!(table.column, "Year 6 overweight");
        assert_eq!(table.policy, MissingValuePolicy::KeepMissing);
        assert_eq!(table.values.len(), 1);
        assert_eq!(table.values[0].area_code, "E09000007");
        assert_eq!(table.values[0].value, Some(21.5));
    }
}
