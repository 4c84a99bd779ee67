#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation pipeline for civic datasets.
//!
//! Two independent branches, each a pure function of in-memory inputs:
//!
//! - [`pipeline::build_entity_table`]: point-in-polygon counting, ranking,
//!   and a left-join fold of index scores and extra metrics onto the area
//!   set. Feeds choropleth maps and ranked bar charts.
//! - [`pipeline::build_period_matrix`]: scope filtering, latest-snapshot
//!   extraction, long-to-wide pivoting, period exclusion, and
//!   cross-sectional median/min/max. Feeds range charts.
//!
//! Nothing here performs I/O or holds shared state, so independent
//! invocations may run on separate threads.

pub mod index;
pub mod merge;
pub mod pipeline;
pub mod rank;
pub mod reshape;
pub mod stats;

use civic_atlas_spatial::SpatialError;
use thiserror::Error;

pub use pipeline::{build_entity_table, build_period_matrix};

/// Errors that can occur during aggregation.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A source produced no rows where at least one was required.
    #[error("No data from {source_name}")]
    UpstreamDataEmpty {
        /// Which input was empty.
        source_name: String,
    },

    /// A table expected to be unique-keyed contains a duplicate key.
    #[error("Duplicate key '{key}' in {table}")]
    KeyCardinalityViolation {
        /// Table that held the duplicate.
        table: String,
        /// The repeated key.
        key: String,
    },

    /// A metric table would overwrite an existing entity column.
    #[error("Column '{column}' is already present in the entity table")]
    ColumnConflict {
        /// The conflicting column name.
        column: String,
    },

    /// Point assignment failed.
    #[error("Spatial error: {0}")]
    Spatial(#[from] SpatialError),
}

impl AnalyticsError {
    pub(crate) fn empty(source_name: &str) -> Self {
        Self::UpstreamDataEmpty {
            source_name: source_name.to_string(),
        }
    }

    pub(crate) fn duplicate(table: &str, key: &str) -> Self {
        Self::KeyCardinalityViolation {
            table: table.to_string(),
            key: key.to_string(),
        }
    }
}
