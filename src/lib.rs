//! Compute the length of the OpenStreetMap road network inside every tile of
//! a country's sampling grid.
//!
//! For a country, the sampling grid is restricted to the points inside the
//! country's boundary. Around every remaining point the roads of a square
//! tile are downloaded from an [Overpass API](https://wiki.openstreetmap.org/wiki/Overpass_API)
//! instance, clipped to the tile and measured along great circles. The result
//! is one CSV table per country.
//!
//! **Mind the load you cause.** A large country has tens of thousands of
//! tiles, each a separate Overpass query.
//!
//! # Usage
//!
//! The crate ships a CLI, `road-length`, with a helpful `--help`. It is also
//! available as a library.
//!
//! # CLI Example
//!
//! ```bash
//! road-length \
//!   --country QA \
//!   --grid ./LandmassIntermediateResSparseGrid10.csv \
//!   --boundaries ./ne_10m_admin_0_countries.geojson \
//!   --output ./road_length
//! ```
//!
//! # Library Example
//! ```rust,no_run
//! use osm_road_length::{run, Config};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut config = Config::new(
//!     "QA",
//!     "./LandmassIntermediateResSparseGrid10.csv",
//!     "./ne_10m_admin_0_countries.geojson",
//!     "./road_length",
//! );
//! config.fetch_rate = 4;
//!
//! run(&config).await.expect("failed computing road length");
//! # }
//! ```

mod boundary;
mod bounding_box;
mod config;
mod grid;
mod length;
pub mod logger;
mod output;
mod overpass;
mod query;
mod roads;
mod run;
mod tile;

pub use boundary::{CountryBoundaries, CountryBoundary, UNASSIGNED_CODE};
pub use bounding_box::BoundingBox;
pub use config::Config;
pub use grid::{country_shape_grid, read_grid, within_bounding_box, GridPoint, PreparedBoundary};
pub use length::{intersect, length_of_road_in_tile, linestring_to_km_length, Intersection};
pub use output::{output_path, write_rows, FailureKind, ResultRow, RoadLength};
pub use overpass::{
    parse_response, FetchError, LatLon, OverpassClient, OverpassResponse, RoadSource, Way,
    DEFAULT_ENDPOINT,
};
pub use query::{QueryFormat, DEFAULT_QUERY_TIMEOUT, HIGHWAY_CLASSES};
pub use roads::{segments_from_response, way_to_line, GeometryError, RoadSegment};
pub use run::{country_grid, measure_grid, measure_tile, run, run_with, CountryGrid, Inputs, RunSummary};
pub use tile::{Tile, DEFAULT_DELTA};
