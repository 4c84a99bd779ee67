//! Left-join fold of per-area tables onto the area set.
//!
//! The area set is the base: it defines the row set and order, and no join
//! may add or drop rows. Each joined table must be unique by area code.
//! Joins run in a fixed order: index scores, ranked point counts, then each
//! extra [`MetricTable`] in the order given.

use std::collections::{BTreeMap, BTreeSet};

use civic_atlas_analytics_models::{
    EntityRow, EntityTable, MetricTable, MissingValuePolicy, RankedCount,
};
use civic_atlas_geography_models::{AreaSet, IndexRecord};

use crate::AnalyticsError;

/// Column names owned by the entity row itself.
const RESERVED_COLUMNS: &[&str] = &[
    "code",
    "name",
    "index_score",
    "point_count",
    "share_of_total",
    "cumulative_count",
    "cumulative_share",
];

/// Builds a code-keyed lookup, failing on the first repeated code.
fn unique_lookup<'a, T>(
    table: &str,
    rows: &'a [T],
    key: impl Fn(&'a T) -> &'a str,
) -> Result<BTreeMap<&'a str, &'a T>, AnalyticsError> {
    let mut lookup = BTreeMap::new();
    for row in rows {
        let code = key(row);
        if lookup.insert(code, row).is_some() {
            return Err(AnalyticsError::duplicate(table, code));
        }
    }
    Ok(lookup)
}

/// Joins index scores and ranked counts onto the areas, then folds in
/// every extra metric table.
///
/// Index scores are score-like (missing stays `None`); point counts and
/// their derived shares are count-like (missing becomes 0).
///
/// # Errors
///
/// * [`AnalyticsError::UpstreamDataEmpty`] if there are no areas.
/// * [`AnalyticsError::KeyCardinalityViolation`] if the areas or any joined
///   table repeat a code.
/// * [`AnalyticsError::ColumnConflict`] if a metric table reuses a column
///   name.
pub fn merge_entities(
    areas: &AreaSet,
    index: &[IndexRecord],
    ranked: &[RankedCount],
    metrics: &[MetricTable],
) -> Result<EntityTable, AnalyticsError> {
    if areas.is_empty() {
        return Err(AnalyticsError::empty("areas"));
    }

    unique_lookup("areas", &areas.areas, |a| a.code.as_str())?;
    let scores = unique_lookup("index records", index, |r| r.area_code.as_str())?;
    let counts = unique_lookup("point counts", ranked, |r| r.code.as_str())?;

    let rows = areas
        .areas
        .iter()
        .map(|area| {
            let ranked = counts.get(area.code.as_str());
            EntityRow {
                code: area.code.clone(),
                name: area.name.clone(),
                geometry: area.geometry.clone(),
                index_score: MissingValuePolicy::KeepMissing
                    .fill(scores.get(area.code.as_str()).map(|r| r.score)),
                point_count: ranked.map_or(0, |r| r.count),
                share_of_total: ranked.map_or(0.0, |r| r.share_of_total),
                cumulative_count: ranked.map_or(0, |r| r.cumulative_count),
                cumulative_share: ranked.map_or(0.0, |r| r.cumulative_share),
                metrics: BTreeMap::new(),
            }
        })
        .collect();

    let mut table = EntityTable { rows };
    let mut columns: BTreeSet<&str> = RESERVED_COLUMNS.iter().copied().collect();

    for metric in metrics {
        if !columns.insert(metric.column.as_str()) {
            return Err(AnalyticsError::ColumnConflict {
                column: metric.column.clone(),
            });
        }
        join_metric(&mut table, metric)?;
    }

    log::info!(
        "Merged entity table: {} areas, {} with index scores, {} with points, {} extra columns",
        table.len(),
        table.rows.iter().filter(|r| r.index_score.is_some()).count(),
        table.rows.iter().filter(|r| r.point_count > 0).count(),
        metrics.len(),
    );

    Ok(table)
}

/// Left-joins one metric table onto every row under its missing-value
/// policy.
///
/// # Errors
///
/// Returns [`AnalyticsError::KeyCardinalityViolation`] if the metric table
/// repeats an area code.
pub fn join_metric(table: &mut EntityTable, metric: &MetricTable) -> Result<(), AnalyticsError> {
    let lookup = unique_lookup(&metric.column, &metric.values, |v| v.area_code.as_str())?;

    let mut matched = 0usize;
    for row in &mut table.rows {
        let value = lookup.get(row.code.as_str()).and_then(|v| v.value);
        if lookup.contains_key(row.code.as_str()) {
            matched += 1;
        }
        row.metrics
            .insert(metric.column.clone(), metric.policy.fill(value));
    }

    log::debug!(
        "Joined metric '{}' ({}): {matched}/{} areas matched, {} source rows unmatched",
        metric.column,
        metric.policy,
        table.rows.len(),
        metric.values.len().saturating_sub(matched),
    );

    Ok(())
}
