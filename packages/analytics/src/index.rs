//! Aggregation of fine-grained socioeconomic index rows to one mean score
//! per area.

use std::collections::BTreeMap;

use civic_atlas_geography_models::{IndexRecord, RawIndexRow, in_scope};

/// Keeps rows whose code is in scope and averages their scores per code.
///
/// Output is ordered by area code and holds exactly one record per code.
#[must_use]
pub fn aggregate_index(rows: &[RawIndexRow], scope_prefix: &str) -> Vec<IndexRecord> {
    let mut sums: BTreeMap<&str, (f64, u32)> = BTreeMap::new();
    let mut out_of_scope = 0usize;

    for row in rows {
        if !in_scope(&row.area_code_raw, scope_prefix) {
            out_of_scope += 1;
            continue;
        }
        if row.score.is_nan() {
            log::debug!("Skipping NaN index score for {}", row.area_code_raw);
            continue;
        }
        let entry = sums.entry(row.area_code_raw.as_str()).or_insert((0.0, 0));
        entry.0 += row.score;
        entry.1 += 1;
    }

    log::info!(
        "Aggregated {} index rows into {} areas ({out_of_scope} out of scope)",
        rows.len() - out_of_scope,
        sums.len(),
    );

    sums.into_iter()
        .map(|(code, (sum, n))| IndexRecord {
            area_code: code.to_string(),
            score: sum / f64::from(n),
        })
        .collect()
}
