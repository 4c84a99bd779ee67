//! Command runners: load extracts, invoke the pipeline, write output.

use std::io::Write;
use std::path::{Path, PathBuf};

use civic_atlas_analytics::{build_entity_table, build_period_matrix};
use civic_atlas_analytics_models::{MetricTable, PeriodReport};
use civic_atlas_source::{boundaries, index, load_study, points, registry, series};
use civic_atlas_source_models::StudyDefinition;
use serde::Serialize;

use crate::export::entity_table_to_feature_collection;

/// Paths feeding the entity-table command.
pub struct EntityInputs<'a> {
    pub boundaries: &'a Path,
    pub points: &'a Path,
    pub index: &'a Path,
    pub metric_series: &'a [(u32, PathBuf)],
}

/// Period-matrix output for one metric.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PeriodOutput<'a> {
    indicator_id: u32,
    label: &'a str,
    #[serde(flatten)]
    report: &'a PeriodReport,
}

/// Parses a `--metric-series` argument of the form `INDICATOR_ID=PATH`.
pub fn parse_metric_series(arg: &str) -> Result<(u32, PathBuf), String> {
    let (id, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected INDICATOR_ID=PATH, got '{arg}'"))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid indicator id '{id}': {e}"))?;
    if path.is_empty() {
        return Err(format!("missing path for indicator {id}"));
    }
    Ok((id, PathBuf::from(path)))
}

/// Picks the study from a TOML file if given, else from the registry.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the id is unknown.
pub fn resolve_study(
    id: &str,
    file: Option<&Path>,
) -> Result<StudyDefinition, Box<dyn std::error::Error>> {
    Ok(match file {
        Some(path) => load_study(path)?,
        None => registry::study_by_id(id)?,
    })
}

pub fn list_studies() {
    for study in registry::all_studies() {
        println!(
            "{}\t{}\t(scope {}, {} metrics)",
            study.id,
            study.name,
            study.scope_prefix,
            study.metrics.len()
        );
        for metric in &study.metrics {
            println!("  {}\t{}", metric.indicator_id, metric.label);
        }
    }
}

fn metric_label(study: &StudyDefinition, indicator_id: u32) -> Result<&str, String> {
    study
        .metric(indicator_id)
        .map(|m| m.label.as_str())
        .ok_or_else(|| format!("study '{}' has no metric {indicator_id}", study.id))
}

fn write_json<T: Serialize>(
    value: &T,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)?;
            log::info!("Wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, value)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

/// Builds the entity table and writes it as a `GeoJSON` `FeatureCollection`.
///
/// # Errors
///
/// Returns an error if any input fails to load, the pipeline rejects the
/// data, or the output cannot be written.
pub fn run_entities(
    study: &StudyDefinition,
    inputs: &EntityInputs<'_>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = study.pipeline_config();

    let areas =
        boundaries::load_boundaries(inputs.boundaries, &study.boundaries, &study.scope_prefix)?;
    let points = points::load_points(inputs.points, &study.points)?;
    let index_rows = index::load_index_rows(inputs.index, &study.index)?;

    let mut metrics: Vec<MetricTable> = Vec::with_capacity(inputs.metric_series.len());
    for (indicator_id, path) in inputs.metric_series {
        let label = metric_label(study, *indicator_id)?;
        let rows = series::load_series_rows(path, &study.series)?;
        let report = build_period_matrix(&rows, &config)?;
        metrics.push(report.snapshot.to_metric_table(label));
    }

    let table = build_entity_table(&areas, &points, &index_rows, &metrics, &config)?;
    let collection = entity_table_to_feature_collection(&table, study);

    write_json(&collection, output)
}

/// Builds one metric's snapshot and period matrix and writes them as JSON.
///
/// # Errors
///
/// Returns an error if the metric is not in the study, the series fails to
/// load, the pipeline rejects it, or the output cannot be written.
pub fn run_periods(
    study: &StudyDefinition,
    indicator_id: u32,
    series_path: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let label = metric_label(study, indicator_id)?;
    let rows = series::load_series_rows(series_path, &study.series)?;
    let report = build_period_matrix(&rows, &study.pipeline_config())?;

    if let Some((first, last)) = report.matrix.period_range() {
        log::info!("{label}: periods {first}..={last}");
    }

    write_json(
        &PeriodOutput {
            indicator_id,
            label,
            report: &report,
        },
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metric_series_argument() {
        assert_eq!(
            parse_metric_series("20602=data/y6.csv").unwrap(),
            (20602, PathBuf::from("data/y6.csv"))
        );
    }

    #[test]
    fn rejects_malformed_metric_series_argument() {
        assert!(parse_metric_series("data/y6.csv").is_err());
        assert!(parse_metric_series("abc=data/y6.csv").is_err());
        assert!(parse_metric_series("20602=").is_err());
    }

    #[test]
    fn resolves_embedded_study() {
        let study = resolve_study("london", None).unwrap();
        assert_eq!(study.id, "london");
        assert!(resolve_study("nowhere", None).is_err());
    }

    #[test]
    fn metric_label_requires_catalogue_entry() {
        let study = resolve_study("london", None).unwrap();
        assert_eq!(
            metric_label(&study, 20601).unwrap(),
            "Proportion of overweight Reception children"
        );
        assert!(metric_label(&study, 1).is_err());
    }
}
