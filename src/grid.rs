use anyhow::{Context, Result};
use geo::{BoundingRect, Contains, MultiPolygon, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::{io::Read, path::Path};

use crate::bounding_box::BoundingBox;

/// A point of the flat sampling grid.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct GridPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GridPoint {
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Reads the sampling grid from a CSV file with (at least) `lat` and `lon`
/// columns. Other columns are ignored.
pub async fn read_grid(path: &Path) -> Result<Vec<GridPoint>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed opening grid file {}", path.display()))?;

    read_grid_from(csv::Reader::from_reader(raw.as_slice()))
        .with_context(|| format!("failed reading grid file {}", path.display()))
}

pub(crate) fn read_grid_from<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<GridPoint>> {
    reader
        .deserialize()
        .collect::<Result<Vec<GridPoint>, _>>()
        .context("malformed grid record")
}

/// Keeps the points inside `bbox` (edges included), preserving their order.
pub fn within_bounding_box(points: &[GridPoint], bbox: &BoundingBox) -> Vec<GridPoint> {
    points.iter().filter(|p| bbox.contains(p)).copied().collect()
}

struct IndexedPolygon {
    polygon: Polygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A boundary prepared for many containment queries.
///
/// Polygons are indexed by their envelopes so a point is only tested
/// against the polygons whose bounding box covers it.
pub struct PreparedBoundary {
    tree: RTree<IndexedPolygon>,
}

impl PreparedBoundary {
    pub fn new(shape: &MultiPolygon<f64>) -> Self {
        let polygons = shape
            .iter()
            .filter_map(|polygon| {
                let rect = polygon.bounding_rect()?;
                let envelope = AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                );

                Some(IndexedPolygon {
                    polygon: polygon.clone(),
                    envelope,
                })
            })
            .collect();

        PreparedBoundary {
            tree: RTree::bulk_load(polygons),
        }
    }

    /// True if at least one polygon contains the point. Points on a polygon
    /// boundary are not contained.
    pub fn contains(&self, point: &GridPoint) -> bool {
        let p = point.to_point();

        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([p.x(), p.y()]))
            .any(|candidate| candidate.polygon.contains(&p))
    }
}

/// Restricts the grid to the points inside the boundary, sorted by
/// (lat, lon) ascending.
pub fn country_shape_grid(points: &[GridPoint], shape: &MultiPolygon<f64>) -> Vec<GridPoint> {
    let prepared = PreparedBoundary::new(shape);

    let mut hits: Vec<GridPoint> = points
        .iter()
        .filter(|p| prepared.contains(p))
        .copied()
        .collect();

    hits.sort_by(|a, b| a.lat.total_cmp(&b.lat).then(a.lon.total_cmp(&b.lon)));
    hits
}
