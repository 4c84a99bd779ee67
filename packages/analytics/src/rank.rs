//! Rank-ordered share and cumulative-share computation over per-area
//! point counts.

use civic_atlas_analytics_models::RankedCount;
use civic_atlas_geography_models::AreaCount;

/// `part / total`, defined as 0 when the total is 0.
#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Orders areas by descending count and attaches share, running count,
/// and running share.
///
/// Ties keep their input order. The total is taken over every input row.
/// An empty input yields an empty output.
#[must_use]
pub fn rank_counts(counts: &[AreaCount]) -> Vec<RankedCount> {
    let total: u64 = counts.iter().map(|c| c.count).sum();

    let mut ordered: Vec<&AreaCount> = counts.iter().collect();
    // `sort_by` is stable, which is what keeps the tie-break deterministic
    ordered.sort_by(|a, b| b.count.cmp(&a.count));

    let mut cumulative_count = 0u64;
    ordered
        .into_iter()
        .map(|c| {
            cumulative_count += c.count;
            RankedCount {
                code: c.code.clone(),
                name: c.name.clone(),
                count: c.count,
                share_of_total: ratio(c.count, total),
                cumulative_count,
                cumulative_share: ratio(cumulative_count, total),
            }
        })
        .collect()
}
