//! Study registry: loads all study definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/studies/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a study means creating a
//! TOML file and adding it to the list below.

use civic_atlas_source_models::StudyDefinition;

use crate::SourceError;

/// TOML configs embedded at compile time.
const STUDY_TOMLS: &[(&str, &str)] = &[("london", include_str!("../studies/london.toml"))];

/// Total number of configured studies (used in tests).
#[cfg(test)]
const EXPECTED_STUDY_COUNT: usize = 1;

/// Returns all configured study definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_studies() -> Vec<StudyDefinition> {
    STUDY_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::from_str(toml_str).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up an embedded study by id.
///
/// # Errors
///
/// Returns [`SourceError::UnknownStudy`] if no study has this id.
pub fn study_by_id(id: &str) -> Result<StudyDefinition, SourceError> {
    all_studies()
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| SourceError::UnknownStudy { id: id.to_string() })
}
