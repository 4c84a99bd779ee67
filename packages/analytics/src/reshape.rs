//! Long-to-wide reshaping of a single metric's survey series.
//!
//! Each step is a pure transform. [`reshape_series`] chains them: scope
//! filter, period parsing, latest snapshot, pivot, period exclusion, and
//! cross-sectional statistics.

use std::collections::{BTreeMap, BTreeSet};

use civic_atlas_analytics_models::{
    LatestSnapshot, PeriodMatrix, PeriodReport, PeriodRow, PipelineConfig,
};
use civic_atlas_geography_models::{RawSeriesRow, SeriesPoint, in_scope, parse_period_start};

use crate::AnalyticsError;
use crate::stats::summarize;

/// Keeps in-scope rows and derives their ordinal period.
///
/// Rows whose period label has no leading four-digit year are skipped.
#[must_use]
pub fn scoped_points(rows: &[RawSeriesRow], scope_prefix: &str) -> Vec<SeriesPoint> {
    let mut unparsed = 0usize;
    let points: Vec<SeriesPoint> = rows
        .iter()
        .filter(|row| in_scope(&row.area_code, scope_prefix))
        .filter_map(|row| {
            if parse_period_start(&row.period_label).is_none() {
                log::warn!(
                    "Skipping series row with unparseable period '{}'",
                    row.period_label
                );
                unparsed += 1;
                return None;
            }
            SeriesPoint::from_raw(row.clone())
        })
        .collect();

    log::debug!(
        "{} of {} series rows in scope '{scope_prefix}' ({unparsed} with bad periods)",
        points.len(),
        rows.len(),
    );

    points
}

/// All observations at the latest period present.
#[must_use]
pub fn latest_snapshot(points: &[SeriesPoint]) -> Option<LatestSnapshot> {
    let period = points.iter().map(|p| p.period).max()?;
    Some(LatestSnapshot {
        period,
        rows: points
            .iter()
            .filter(|p| p.period == period)
            .cloned()
            .collect(),
    })
}

/// Pivots to one row per period (ascending) and one column per area name
/// (ascending). Statistics are left unset.
///
/// # Errors
///
/// Returns [`AnalyticsError::KeyCardinalityViolation`] if two points share
/// an area name and period.
pub fn pivot(points: &[SeriesPoint]) -> Result<PeriodMatrix, AnalyticsError> {
    let areas: Vec<String> = points
        .iter()
        .map(|p| p.area_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let column: BTreeMap<&str, usize> = areas
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut cells: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
    let mut seen: BTreeSet<(&str, i32)> = BTreeSet::new();

    for point in points {
        if !seen.insert((point.area_name.as_str(), point.period)) {
            return Err(AnalyticsError::duplicate(
                "series",
                &format!("{} @ {}", point.area_name, point.period),
            ));
        }
        let row = cells
            .entry(point.period)
            .or_insert_with(|| vec![None; areas.len()]);
        row[column[point.area_name.as_str()]] = point.value;
    }

    let rows = cells
        .into_iter()
        .map(|(period, values)| PeriodRow {
            period,
            values,
            median: None,
            min: None,
            max: None,
        })
        .collect();

    Ok(PeriodMatrix { areas, rows })
}

/// Drops every row whose period is excluded, regardless of its contents.
#[must_use]
pub fn exclude_periods(mut matrix: PeriodMatrix, config: &PipelineConfig) -> PeriodMatrix {
    let before = matrix.rows.len();
    matrix.rows.retain(|row| !config.is_excluded(row.period));
    if matrix.rows.len() != before {
        log::info!(
            "Excluded {} period row(s) {:?}",
            before - matrix.rows.len(),
            config.excluded_periods,
        );
    }
    matrix
}

/// Fills median, min, and max for every row from its area cells.
#[must_use]
pub fn append_statistics(mut matrix: PeriodMatrix) -> PeriodMatrix {
    for row in &mut matrix.rows {
        let summary = summarize(&row.values);
        row.median = summary.map(|s| s.median);
        row.min = summary.map(|s| s.min);
        row.max = summary.map(|s| s.max);
    }
    matrix
}

/// Reshapes one metric's raw series into its latest snapshot and its
/// period matrix.
///
/// The snapshot is taken before period exclusion.
///
/// # Errors
///
/// * [`AnalyticsError::UpstreamDataEmpty`] if `rows` is empty or nothing is
///   left after scope filtering.
/// * [`AnalyticsError::KeyCardinalityViolation`] on a duplicate
///   (area, period) pair.
pub fn reshape_series(
    rows: &[RawSeriesRow],
    config: &PipelineConfig,
) -> Result<PeriodReport, AnalyticsError> {
    if rows.is_empty() {
        return Err(AnalyticsError::empty("series"));
    }

    let points = scoped_points(rows, &config.scope_prefix);
    let snapshot = latest_snapshot(&points).ok_or_else(|| {
        AnalyticsError::empty(&format!("series in scope '{}'", config.scope_prefix))
    })?;

    let matrix = append_statistics(exclude_periods(pivot(&points)?, config));

    log::info!(
        "Period matrix: {} periods x {} areas, latest period {}",
        matrix.rows.len(),
        matrix.areas.len(),
        snapshot.period,
    );

    Ok(PeriodReport { snapshot, matrix })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(code: &str, name: &str, label: &str, value: Option<f64>) -> RawSeriesRow {
        RawSeriesRow {
            area_code: code.to_string(),
            area_name: name.to_string(),
            period_label: label.to_string(),
            value,
        }
    }

    fn config(excluded: &[i32]) -> PipelineConfig {
        PipelineConfig {
            scope_prefix: "E09".to_string(),
            excluded_periods: excluded.to_vec(),
        }
    }

    #[test]
    fn excludes_anomalous_period() {
        let rows = vec![
            raw("E09000001", "X", "2019/20", Some(10.0)),
            raw("E09000001", "X", "2020/21", Some(999.0)),
            raw("E09000001", "X", "2021/22", Some(12.0)),
        ];

        let report = reshape_series(&rows, &config(&[2020])).unwrap();

        assert_eq!(report.matrix.periods(), vec![2019, 2021]);
        let first = report.matrix.row(2019).unwrap();
        assert_eq!(first.median, Some(10.0));
        assert_eq!(first.min, Some(10.0));
        assert_eq!(first.max, Some(10.0));
        let last = report.matrix.row(2021).unwrap();
        assert_eq!(last.median, Some(12.0));
    }

    #[test]
    fn exclusion_applies_regardless_of_data_volume() {
        let mut rows = vec![raw("E09000001", "A", "2019", Some(1.0))];
        for i in 0..20 {
            rows.push(raw(
                &format!("E090000{i:02}"),
                &format!("Area {i}"),
                "2020",
                Some(5.0),
            ));
        }

        let report = reshape_series(&rows, &config(&[2020])).unwrap();
        assert!(report.matrix.row(2020).is_none());
        assert_eq!(report.matrix.periods(), vec![2019]);
    }

    #[test]
    fn filters_rows_outside_scope() {
        let rows = vec![
            raw("E09000001", "City of London", "2018", Some(1.0)),
            raw("E08000001", "Bolton", "2018", Some(2.0)),
        ];

        let report = reshape_series(&rows, &config(&[])).unwrap();
        assert_eq!(report.matrix.areas, vec!["City of London".to_string()]);
        assert_eq!(report.snapshot.rows.len(), 1);
    }

    #[test]
    fn snapshot_takes_latest_period_before_exclusion() {
        let rows = vec![
            raw("E09000001", "A", "2019/20", Some(1.0)),
            raw("E09000002", "B", "2020/21", Some(2.0)),
            raw("E09000001", "A", "2020/21", Some(3.0)),
        ];

        let report = reshape_series(&rows, &config(&[2020])).unwrap();
        assert_eq!(report.snapshot.period, 2020);
        let names: Vec<&str> = report
            .snapshot
            .rows
            .iter()
            .map(|p| p.area_name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn pivot_orders_periods_and_areas() {
        let rows = vec![
            raw("E09000003", "Camden", "2012", Some(3.0)),
            raw("E09000001", "Barnet", "2010", Some(1.0)),
            raw("E09000001", "Barnet", "2012", Some(2.0)),
        ];
        let points = scoped_points(&rows, "E09");
        let matrix = pivot(&points).unwrap();

        assert_eq!(
            matrix.areas,
            vec!["Barnet".to_string(), "Camden".to_string()]
        );
        assert_eq!(matrix.periods(), vec![2010, 2012]);
        assert_eq!(matrix.rows[0].values, vec![Some(1.0), None]);
        assert_eq!(matrix.rows[1].values, vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn statistics_ignore_missing_cells() {
        let rows = vec![
            raw("E09000001", "A", "2015", Some(4.0)),
            raw("E09000002", "B", "2015", None),
            raw("E09000003", "C", "2015", Some(8.0)),
            raw("E09000001", "A", "2016", None),
        ];

        let report = reshape_series(&rows, &config(&[])).unwrap();
        let row = report.matrix.row(2015).unwrap();
        assert_eq!(row.median, Some(6.0));
        assert_eq!(row.min, Some(4.0));
        assert_eq!(row.max, Some(8.0));

        let empty = report.matrix.row(2016).unwrap();
        assert_eq!(empty.median, None);
        assert_eq!(empty.min, None);
        assert_eq!(empty.max, None);
    }

    #[test]
    fn min_median_max_are_ordered() {
        let rows: Vec<RawSeriesRow> = (0..9)
            .map(|i| {
                raw(
                    &format!("E0900000{i}"),
                    &format!("Area {i}"),
                    &format!("{}", 2010 + i % 3),
                    Some(f64::from(i * 7 % 5)),
                )
            })
            .collect();

        let report = reshape_series(&rows, &config(&[])).unwrap();
        for row in &report.matrix.rows {
            let (min, median, max) = (row.min.unwrap(), row.median.unwrap(), row.max.unwrap());
            assert!(min <= median && median <= max, "period {}", row.period);
        }
    }

    #[test]
    fn rejects_duplicate_area_period() {
        let rows = vec![
            raw("E09000001", "A", "2015/16", Some(1.0)),
            raw("E09000001", "A", "2015", Some(2.0)),
        ];

        let err = reshape_series(&rows, &config(&[])).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::KeyCardinalityViolation { ref key, .. } if key == "A @ 2015"
        ));
    }

    #[test]
    fn empty_input_is_upstream_failure() {
        let err = reshape_series(&[], &config(&[])).unwrap_err();
        assert!(matches!(err, AnalyticsError::UpstreamDataEmpty { .. }));
    }

    #[test]
    fn nothing_in_scope_is_upstream_failure() {
        let rows = vec![raw("W06000001", "Anglesey", "2019", Some(1.0))];
        let err = reshape_series(&rows, &config(&[])).unwrap_err();
        assert!(matches!(err, AnalyticsError::UpstreamDataEmpty { .. }));
    }

    #[test]
    fn skips_rows_with_unparseable_period() {
        let rows = vec![
            raw("E09000001", "A", "2014", Some(1.0)),
            raw("E09000001", "A", "n/a", Some(2.0)),
        ];
        let report = reshape_series(&rows, &config(&[])).unwrap();
        assert_eq!(report.matrix.periods(), vec![2014]);
    }
}
