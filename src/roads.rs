use geo::{Coord, LineString};
use thiserror::Error;

use crate::overpass::{OverpassResponse, Way};

/// Geometry problems that make a tile unmeasurable.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("way {id} has {count} vertices, a line needs at least 2")]
    TooFewVertices { id: i64, count: usize },

    #[error("way {id} has a non-finite vertex")]
    NonFiniteVertex { id: i64 },

    #[error("length of way {id} inside the tile is not finite")]
    NonFiniteLength { id: i64 },

    #[error("way {id} could not be clipped to the tile")]
    Clip { id: i64 },
}

/// A road of one tile's response, as a line in (lon, lat) order.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadSegment {
    pub way_id: i64,
    pub geometry: LineString<f64>,
}

/// Builds the line through a way's vertices, keeping their order.
pub fn way_to_line(way: &Way) -> Result<LineString<f64>, GeometryError> {
    if way.geometry.len() < 2 {
        return Err(GeometryError::TooFewVertices {
            id: way.id,
            count: way.geometry.len(),
        });
    }

    way.geometry
        .iter()
        .map(|v| {
            if v.lat.is_finite() && v.lon.is_finite() {
                Ok(Coord { x: v.lon, y: v.lat })
            } else {
                Err(GeometryError::NonFiniteVertex { id: way.id })
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

/// Converts every element of a response into a road segment, in response
/// order.
pub fn segments_from_response(
    response: &OverpassResponse,
) -> Result<Vec<RoadSegment>, GeometryError> {
    response
        .elements
        .iter()
        .map(|way| {
            Ok(RoadSegment {
                way_id: way.id,
                geometry: way_to_line(way)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overpass::LatLon;

    fn way(id: i64, vertices: &[(f64, f64)]) -> Way {
        Way {
            id,
            geometry: vertices
                .iter()
                .map(|&(lon, lat)| LatLon { lat, lon })
                .collect(),
        }
    }

    #[test]
    fn keeps_vertex_order_as_lon_lat() {
        let line = way_to_line(&way(1, &[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)])).unwrap();

        let coords: Vec<(f64, f64)> = line.coords().map(|c| (c.x, c.y)).collect();
        assert_eq!(coords, vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
    }

    #[test]
    fn latitude_becomes_y() {
        let line = way_to_line(&Way {
            id: 3,
            geometry: vec![LatLon { lat: 10.0, lon: 20.0 }, LatLon { lat: 11.0, lon: 21.0 }],
        })
        .unwrap();

        assert_eq!(line.0[0], Coord { x: 20.0, y: 10.0 });
    }

    #[test]
    fn single_vertex_is_rejected() {
        assert_eq!(
            way_to_line(&way(9, &[(1.0, 1.0)])),
            Err(GeometryError::TooFewVertices { id: 9, count: 1 })
        );
        assert_eq!(
            way_to_line(&way(10, &[])),
            Err(GeometryError::TooFewVertices { id: 10, count: 0 })
        );
    }

    #[test]
    fn nan_vertex_is_rejected() {
        assert_eq!(
            way_to_line(&way(4, &[(0.0, 0.0), (f64::NAN, 1.0)])),
            Err(GeometryError::NonFiniteVertex { id: 4 })
        );
    }

    #[test]
    fn response_conversion_keeps_order() {
        let response = OverpassResponse {
            elements: vec![
                way(5, &[(0.0, 0.0), (1.0, 0.0)]),
                way(2, &[(0.0, 1.0), (1.0, 1.0)]),
            ],
            remark: None,
        };

        let segments = segments_from_response(&response).unwrap();
        let ids: Vec<i64> = segments.iter().map(|s| s.way_id).collect();
        assert_eq!(ids, vec![5, 2]);
    }

    #[test]
    fn one_bad_way_fails_the_response() {
        let response = OverpassResponse {
            elements: vec![way(5, &[(0.0, 0.0), (1.0, 0.0)]), way(6, &[(0.0, 1.0)])],
            remark: None,
        };

        assert!(segments_from_response(&response).is_err());
    }
}
