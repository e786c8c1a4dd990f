use anyhow::{Context, Result};
use maplit::hashmap;
use std::{fmt, time::Duration};
use strfmt::strfmt;

use crate::bounding_box::BoundingBox;

/// Road classes (values of the OSM `highway` key) counted as road.
pub const HIGHWAY_CLASSES: &[&str] = &[
    "motorway",
    "trunk",
    "primary",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
    "motorway_link",
    "trunk_link",
    "primary_link",
    "secondary_link",
    "tertiary_link",
    "living_street",
    "service",
    "pedestrian",
    "track",
    "path",
    "road",
];

/// Server-side timeout used when none is configured.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(1600);

const TILE_QUERY: &str = "[out:json][timeout:{timeout}];\n\
way({south},{west},{north},{east})[\"highway\"~\"{highways}\"];\n\
out ids geom;";

/// Overpass QL query template for the ways inside a bounding box.
pub struct QueryFormat {
    timeout: Duration,
    format_str: String,
}

impl QueryFormat {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            format_str: TILE_QUERY.to_owned(),
        }
    }

    pub fn tile_query(&self, bbox: &BoundingBox) -> Result<String> {
        let vars = hashmap! {
            "timeout".to_owned() => self.timeout.as_secs().to_string(),
            "south".to_owned() => bbox.south.to_string(),
            "west".to_owned() => bbox.west.to_string(),
            "north".to_owned() => bbox.north.to_string(),
            "east".to_owned() => bbox.east.to_string(),
            "highways".to_owned() => HIGHWAY_CLASSES.join("|"),
        };

        strfmt(&self.format_str, &vars).context("failed formatting Overpass query")
    }
}

impl Default for QueryFormat {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_TIMEOUT)
    }
}

impl fmt::Debug for QueryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFormat")
            .field("timeout", &self.timeout)
            .finish()
    }
}
