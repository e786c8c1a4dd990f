use geo::{BoundingRect, Coord, MultiPolygon, Polygon, Rect};

use crate::grid::GridPoint;

/// An axis-aligned bounding box consisting of south, west, north and east
/// boundaries given in degrees.
///
/// # Example
/// ```rust
/// # use osm_road_length::BoundingBox;
/// let doha_qatar = BoundingBox::new(25.25, 51.45, 25.35, 51.60);
/// assert!(doha_qatar.south < doha_qatar.north);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Create a new bounding box from coordinates in degrees, in the order
    /// Overpass expects them (south, west, north, east).
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        BoundingBox {
            south,
            west,
            north,
            east,
        }
    }

    /// The box of side `delta` degrees centred on the given coordinate.
    pub fn around(lat: f64, lon: f64, delta: f64) -> Self {
        let half = delta / 2_f64;

        Self::new(lat - half, lon - half, lat + half, lon + half)
    }

    /// The minimal box enclosing all polygons of `shape`, or `None` if it has
    /// no coordinates.
    pub fn of_shape(shape: &MultiPolygon<f64>) -> Option<Self> {
        shape.bounding_rect().map(Self::from)
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, point: &GridPoint) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }

    /// The box as a closed, counter-clockwise polygon in (lon, lat) order.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::from(*self).to_polygon()
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self::new(rect.min().y, rect.min().x, rect.max().y, rect.max().x)
    }
}

impl From<BoundingBox> for Rect<f64> {
    fn from(bbox: BoundingBox) -> Self {
        Rect::new(
            Coord {
                x: bbox.west,
                y: bbox.south,
            },
            Coord {
                x: bbox.east,
                y: bbox.north,
            },
        )
    }
}
