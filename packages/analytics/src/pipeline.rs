//! The two public entry points of the aggregation pipeline.

use civic_atlas_analytics_models::{EntityTable, MetricTable, PeriodReport, PipelineConfig};
use civic_atlas_geography_models::{AreaSet, PointSet, RawIndexRow, RawSeriesRow};
use civic_atlas_spatial::count_points_by_area;

use crate::AnalyticsError;
use crate::index::aggregate_index;
use crate::merge::merge_entities;
use crate::rank::rank_counts;
use crate::reshape::reshape_series;

/// Builds the per-area entity table.
///
/// Counts points per area, ranks the counts, averages in-scope index rows
/// per area, then left-joins everything (plus `metrics`) onto `areas`.
/// The output has exactly one row per input area, in input order.
///
/// # Errors
///
/// * [`AnalyticsError::Spatial`] if areas and points use different
///   coordinate references.
/// * [`AnalyticsError::UpstreamDataEmpty`] if there are no areas.
/// * [`AnalyticsError::KeyCardinalityViolation`] if area codes or a metric
///   table's codes repeat.
/// * [`AnalyticsError::ColumnConflict`] if two metric tables share a column.
pub fn build_entity_table(
    areas: &AreaSet,
    points: &PointSet,
    index_rows: &[RawIndexRow],
    metrics: &[MetricTable],
    config: &PipelineConfig,
) -> Result<EntityTable, AnalyticsError> {
    if areas.is_empty() {
        return Err(AnalyticsError::empty("areas"));
    }

    let counts = count_points_by_area(areas, points)?;
    let ranked = rank_counts(&counts);
    let index = aggregate_index(index_rows, &config.scope_prefix);

    merge_entities(areas, &index, &ranked, metrics)
}

/// Builds the latest snapshot and the period matrix for one metric.
///
/// # Errors
///
/// * [`AnalyticsError::UpstreamDataEmpty`] if the series is empty, or empty
///   after scope filtering.
/// * [`AnalyticsError::KeyCardinalityViolation`] on a duplicate
///   (area, period) observation.
pub fn build_period_matrix(
    rows: &[RawSeriesRow],
    config: &PipelineConfig,
) -> Result<PeriodReport, AnalyticsError> {
    reshape_series(rows, config)
}
