//! Cross-sectional statistics over a row of possibly-missing cells.

/// Median, minimum, and maximum of one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSummary {
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Summarizes the non-missing cells of a row.
///
/// `None` and NaN cells are ignored. Returns `None` if no cell has a value.
/// The median of an even number of values is the mean of the middle two.
#[must_use]
pub fn summarize(cells: &[Option<f64>]) -> Option<RowSummary> {
    let mut values: Vec<f64> = cells
        .iter()
        .filter_map(|cell| cell.filter(|v| !v.is_nan()))
        .collect();
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        f64::midpoint(values[mid - 1], values[mid])
    } else {
        values[mid]
    };

    Some(RowSummary {
        median,
        min: values[0],
        max: values[values.len() - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_count_median() {
        let summary = summarize(&[Some(3.0), Some(1.0), Some(2.0)]).unwrap();
        assert_eq!(
            summary,
            RowSummary {
                median: 2.0,
                min: 1.0,
                max: 3.0,
            }
        );
    }

    #[test]
    fn even_count_median_is_midpoint() {
        let summary = summarize(&[Some(4.0), Some(1.0), Some(10.0), Some(2.0)]).unwrap();
        assert!((summary.median - 3.0).abs() < f64::EPSILON);
        assert!((summary.min - 1.0).abs() < f64::EPSILON);
        assert!((summary.max - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ignores_missing_cells() {
        let summary = summarize(&[None, Some(5.0), None, Some(f64::NAN)]).unwrap();
        assert_eq!(
            summary,
            RowSummary {
                median: 5.0,
                min: 5.0,
                max: 5.0,
            }
        );
    }

    #[test]
    fn all_missing_is_none() {
        assert_eq!(summarize(&[None, None]), None);
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn median_is_bounded_by_min_and_max() {
        let rows: &[&[Option<f64>]] = &[
            &[Some(-2.5), Some(7.0), None, Some(0.0)],
            &[Some(1.0)],
            &[Some(9.0), Some(9.0), Some(9.0)],
        ];
        for row in rows {
            let s = summarize(row).unwrap();
            assert!(s.min <= s.median && s.median <= s.max, "{s:?}");
        }
    }
}
