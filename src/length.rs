//! Great-circle road length inside a tile.

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{BooleanOps, HaversineLength, Intersects, Line, LineString, MultiLineString, Polygon};
use std::panic::{self, AssertUnwindSafe};

use crate::roads::{GeometryError, RoadSegment};

/// How a road meets a tile.
#[derive(Clone, Debug, PartialEq)]
pub enum Intersection {
    Disjoint,

    /// The road only touches the tile boundary in isolated points.
    Touch,

    Line(LineString<f64>),

    /// Clipping split the road into several disjoint lines.
    Pieces(MultiLineString<f64>),
}

impl Intersection {
    pub fn km_length(&self) -> f64 {
        match self {
            Intersection::Disjoint | Intersection::Touch => 0_f64,
            Intersection::Line(line) => linestring_to_km_length(line),
            Intersection::Pieces(pieces) => pieces.iter().map(linestring_to_km_length).sum(),
        }
    }
}

/// Sum of the haversine distances between consecutive vertices, in km.
/// Lines with fewer than two vertices have zero length.
pub fn linestring_to_km_length(line: &LineString<f64>) -> f64 {
    line.haversine_length() / 1000_f64
}

/// Runs a clipping operation, turning a panic of the sweep line into `None`.
fn catch_clip_panic<T>(clip: impl FnOnce() -> T) -> Option<T> {
    panic::catch_unwind(AssertUnwindSafe(clip)).ok()
}

/// Parts of `line` running along an edge of `tile`, which clipping drops.
fn boundary_parts(tile: &Polygon<f64>, line: &LineString<f64>) -> Vec<Line<f64>> {
    std::iter::once(tile.exterior())
        .chain(tile.interiors().iter())
        .flat_map(|ring| ring.lines())
        .flat_map(move |edge| {
            line.lines()
                .filter_map(move |segment| match line_intersection(segment, edge) {
                    Some(LineIntersection::Collinear { intersection })
                        if intersection.start != intersection.end =>
                    {
                        Some(intersection)
                    }
                    _ => None,
                })
        })
        .collect()
}

fn overlaps_any(part: &Line<f64>, pieces: &MultiLineString<f64>) -> bool {
    pieces.iter().flat_map(|piece| piece.lines()).any(|segment| {
        matches!(
            line_intersection(*part, segment),
            Some(LineIntersection::Collinear { intersection }) if intersection.start != intersection.end
        )
    })
}

/// Clips the road `segment` to `tile`. Parts lying on the tile boundary
/// count as inside.
///
/// Fails with [`GeometryError::Clip`] if the clipping algorithm cannot
/// handle the way.
pub fn intersect(tile: &Polygon<f64>, segment: &RoadSegment) -> Result<Intersection, GeometryError> {
    let line = &segment.geometry;
    if !tile.intersects(line) {
        return Ok(Intersection::Disjoint);
    }

    let lines = MultiLineString::new(vec![line.clone()]);
    let mut pieces = catch_clip_panic(|| tile.clip(&lines, false))
        .ok_or(GeometryError::Clip { id: segment.way_id })?;
    pieces
        .0
        .retain(|piece| piece.lines().any(|part| part.start != part.end));

    let on_boundary: Vec<LineString<f64>> = boundary_parts(tile, line)
        .into_iter()
        .filter(|part| !overlaps_any(part, &pieces))
        .map(|part| LineString::new(vec![part.start, part.end]))
        .collect();
    pieces.0.extend(on_boundary);

    Ok(match pieces.0.len() {
        0 => Intersection::Touch,
        1 => Intersection::Line(pieces.0.remove(0)),
        _ => Intersection::Pieces(pieces),
    })
}

/// Total length (km) of the parts of `segments` lying inside `tile`.
pub fn length_of_road_in_tile(
    segments: &[RoadSegment],
    tile: &Polygon<f64>,
) -> Result<f64, GeometryError> {
    segments.iter().try_fold(0_f64, |total, segment| {
        let length = intersect(tile, segment)?.km_length();

        if length.is_finite() {
            Ok(total + length)
        } else {
            Err(GeometryError::NonFiniteLength {
                id: segment.way_id,
            })
        }
    })
}
