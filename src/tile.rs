use geo::Polygon;

use crate::bounding_box::BoundingBox;
use crate::grid::GridPoint;

/// Default tile width (in degrees).
pub const DEFAULT_DELTA: f64 = 0.01;

/// A square sampling tile of side `delta` degrees centred on a grid point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    pub lat: f64,
    pub lon: f64,
    pub delta: f64,
}

impl Tile {
    pub fn new(lat: f64, lon: f64, delta: f64) -> Self {
        Self { lat, lon, delta }
    }

    pub fn centred_on(point: &GridPoint, delta: f64) -> Self {
        Self::new(point.lat, point.lon, delta)
    }

    /// The area to query roads for. Identical to the tile square.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.lat, self.lon, self.delta)
    }

    /// The tile square roads are clipped against, in (lon, lat) order.
    pub fn polygon(&self) -> Polygon<f64> {
        self.bounding_box().to_polygon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Contains, Point};

    #[test]
    fn polygon_is_square_of_side_delta() {
        let tile = Tile::new(0.0, 0.0, DEFAULT_DELTA);
        let square = tile.polygon();

        approx::assert_relative_eq!(square.unsigned_area(), 0.0001, epsilon = 1e-15);
        assert!(square.contains(&Point::new(0.0049, -0.0049)));
        assert!(!square.contains(&Point::new(0.0051, 0.0)));
    }

    #[test]
    fn polygon_uses_lon_as_x() {
        let tile = Tile::new(45.0, 7.0, 1.0);
        assert!(tile.polygon().contains(&Point::new(7.2, 45.4)));
        assert!(!tile.polygon().contains(&Point::new(45.4, 7.2)));
    }
}
