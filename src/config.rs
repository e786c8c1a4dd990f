use std::{path::PathBuf, time::Duration};

use crate::overpass::DEFAULT_ENDPOINT;
use crate::query::DEFAULT_QUERY_TIMEOUT;
use crate::tile::DEFAULT_DELTA;

/// Road length computation configuration for one country.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Two-letter ISO code of the country to process.
    pub country_code: String,

    /// Tile width (in degrees).
    pub delta: f64,

    /// CSV sampling grid with `lat` and `lon` columns.
    pub grid_path: PathBuf,

    /// GeoJSON country boundaries with `ISO_A2` and `NAME_EN` properties.
    pub boundaries_path: PathBuf,

    /// The folder to write the result table to.
    pub output_folder: PathBuf,

    /// Overpass API interpreter endpoint.
    pub endpoint: String,

    /// Timeout the Overpass server enforces on each query.
    pub query_timeout: Duration,

    /// Client-side timeout for a single request.
    ///
    /// Pass the zero duration to disable the timeout.
    pub timeout: Duration,

    /// Maximum number of tiles fetched in parallel.
    pub fetch_rate: u8,

    /// How many times to retry a failed request.
    pub request_retries_amount: u8,

    /// Whether to draw a progress bar.
    pub show_progress: bool,
}

impl Config {
    /// A configuration with the default tile width, endpoint and timeouts,
    /// processing one tile at a time without retries.
    pub fn new(
        country_code: impl Into<String>,
        grid_path: impl Into<PathBuf>,
        boundaries_path: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
    ) -> Self {
        Config {
            country_code: country_code.into(),
            delta: DEFAULT_DELTA,
            grid_path: grid_path.into(),
            boundaries_path: boundaries_path.into(),
            output_folder: output_folder.into(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            timeout: Duration::from_secs(0),
            fetch_rate: 1,
            request_retries_amount: 0,
            show_progress: true,
        }
    }

    /// The same configuration for another country.
    pub fn for_country(&self, country_code: impl Into<String>) -> Self {
        Config {
            country_code: country_code.into(),
            ..self.clone()
        }
    }
}
