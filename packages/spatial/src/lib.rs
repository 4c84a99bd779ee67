#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for area attribution.
//!
//! Builds an R-tree over area polygons and assigns point observations to
//! the area that contains them. Containment uses [`geo::Contains`], which
//! only accepts points in a polygon's interior: a point lying exactly on a
//! boundary (including an edge shared by two areas) is assigned to no area.

use std::collections::BTreeMap;

use civic_atlas_geography_models::{
    AreaCount, AreaSet, CoordinateReference, PointObservation, PointSet,
};
use geo::{Contains, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

/// Errors that can occur while assigning points to areas.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Areas and points were supplied in different coordinate references.
    #[error("Coordinate mismatch: areas are in {areas}, points are in {points}")]
    CoordinateMismatch {
        /// Reference of the area geometries.
        areas: CoordinateReference,
        /// Reference of the point observations.
        points: CoordinateReference,
    },
}

/// An area polygon stored in the R-tree, pointing back at its position in
/// the source [`AreaSet`].
struct AreaEntry {
    position: usize,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for AreaEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over one [`AreaSet`].
pub struct SpatialIndex<'a> {
    areas: &'a AreaSet,
    tree: RTree<AreaEntry>,
}

impl<'a> SpatialIndex<'a> {
    /// Bulk-loads every area polygon into an R-tree.
    #[must_use]
    pub fn build(areas: &'a AreaSet) -> Self {
        let entries = areas
            .areas
            .iter()
            .enumerate()
            .map(|(position, area)| AreaEntry {
                position,
                envelope: compute_envelope(&area.geometry),
                polygon: area.geometry.clone(),
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        log::debug!("Built spatial index over {} areas", tree.size());

        Self { areas, tree }
    }

    /// Looks up the position of the area containing a point.
    ///
    /// If polygons overlap, the area loaded first wins.
    fn lookup_position(&self, lng: f64, lat: f64) -> Option<usize> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&point))
            .map(|entry| entry.position)
            .min()
    }

    /// Looks up the code of the area containing a point.
    #[must_use]
    pub fn lookup_area(&self, lng: f64, lat: f64) -> Option<&str> {
        self.lookup_position(lng, lat)
            .map(|position| self.areas.areas[position].code.as_str())
    }

    /// Counts the points falling inside each area.
    ///
    /// Points outside every area are dropped. Areas that receive no point
    /// are absent from the result. Rows are ordered by ascending area code.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::CoordinateMismatch`] if the point set is not
    /// in the same coordinate reference as the areas.
    pub fn count_points(&self, points: &PointSet) -> Result<Vec<AreaCount>, SpatialError> {
        if points.crs != self.areas.crs {
            return Err(SpatialError::CoordinateMismatch {
                areas: self.areas.crs,
                points: points.crs,
            });
        }

        let mut counts: BTreeMap<&str, (&str, u64)> = BTreeMap::new();
        let mut unassigned = 0usize;

        for PointObservation {
            longitude,
            latitude,
        } in &points.points
        {
            let Some(position) = self.lookup_position(*longitude, *latitude) else {
                unassigned += 1;
                continue;
            };
            let area = &self.areas.areas[position];
            counts
                .entry(area.code.as_str())
                .or_insert((area.name.as_str(), 0))
                .1 += 1;
        }

        log::info!(
            "Assigned {} points to {} areas ({unassigned} outside every area)",
            points.points.len() - unassigned,
            counts.len(),
        );

        Ok(counts
            .into_iter()
            .map(|(code, (name, count))| AreaCount {
                code: code.to_string(),
                name: name.to_string(),
                count,
            })
            .collect())
    }
}

/// Counts points per area without keeping the index around.
///
/// # Errors
///
/// Returns [`SpatialError::CoordinateMismatch`] if the two inputs use
/// different coordinate references.
pub fn count_points_by_area(
    areas: &AreaSet,
    points: &PointSet,
) -> Result<Vec<AreaCount>, SpatialError> {
    SpatialIndex::build(areas).count_points(points)
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
#[must_use]
pub fn geometry_to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
