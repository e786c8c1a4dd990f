use anyhow::{bail, Context, Result};
use futures::{prelude::*, stream};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tokio::fs;

use crate::boundary::{CountryBoundaries, CountryBoundary};
use crate::bounding_box::BoundingBox;
use crate::config::Config;
use crate::grid::{self, GridPoint};
use crate::length::length_of_road_in_tile;
use crate::output::{self, FailureKind, ResultRow, RoadLength};
use crate::overpass::{FetchError, OverpassClient, RoadSource};
use crate::query::QueryFormat;
use crate::roads::segments_from_response;
use crate::tile::Tile;

const PROGRESS_LOG_INTERVAL: usize = 100;

/// The grid and boundary datasets, loaded once and shared between countries.
pub struct Inputs {
    pub grid: Vec<GridPoint>,
    pub boundaries: CountryBoundaries,
}

impl Inputs {
    pub async fn load(cfg: &Config) -> Result<Self> {
        let grid = grid::read_grid(&cfg.grid_path).await?;
        let boundaries = CountryBoundaries::load(&cfg.boundaries_path).await?;

        Ok(Inputs { grid, boundaries })
    }
}

/// The grid points of one country.
#[derive(Clone, Debug)]
pub struct CountryGrid {
    pub boundary: CountryBoundary,
    pub points: Vec<GridPoint>,
}

/// Outcome of a completed country run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub country_code: String,
    pub country_name: String,
    pub tiles: usize,
    pub failures: usize,
    pub output_path: PathBuf,
}

/// Selects the boundary of `code` and restricts the grid to it.
///
/// Fails if the dataset has no boundary for `code`.
pub fn country_grid(inputs: &Inputs, code: &str) -> Result<CountryGrid> {
    let boundary = match inputs.boundaries.find(code) {
        Some(boundary) => boundary,
        None => bail!("no country boundary with ISO_A2 code {:?}", code),
    };

    let points = match BoundingBox::of_shape(&boundary.shape) {
        Some(bbox) => {
            let box_grid = grid::within_bounding_box(&inputs.grid, &bbox);
            grid::country_shape_grid(&box_grid, &boundary.shape)
        }
        None => Vec::new(),
    };

    Ok(CountryGrid { boundary, points })
}

/// Fetches and measures the roads of a single tile. Failures are logged
/// and reported as a failed length, never as an error.
pub async fn measure_tile<S: RoadSource + ?Sized>(source: &S, tile: Tile) -> RoadLength {
    let bbox = tile.bounding_box();

    let response = match source.roads_in(&bbox).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                FetchError::Unparseable { body } => log::warn!("{}", body),
                FetchError::Remark(remark) => {
                    log::warn!("API request encountered runtime error.");
                    log::warn!("{}", remark);
                }
                other => log::warn!("{}", other),
            }
            log::warn!("Network request failed for tile ({}, {})", tile.lat, tile.lon);

            return RoadLength::Failed(FailureKind::Api);
        }
    };

    let measured = segments_from_response(&response)
        .and_then(|segments| length_of_road_in_tile(&segments, &tile.polygon()));

    match measured {
        Ok(km) => RoadLength::Km(km),
        Err(e) => {
            log::warn!("Measuring tile ({}, {}) failed: {}", tile.lat, tile.lon, e);
            RoadLength::Failed(FailureKind::Geometry)
        }
    }
}

/// Measures every point's tile, with at most `fetch_rate` tiles in flight.
/// The result has the same order as `points`.
pub async fn measure_grid<S: RoadSource + ?Sized>(
    source: &S,
    points: &[GridPoint],
    delta: f64,
    fetch_rate: u8,
    progress: &ProgressBar,
) -> Vec<RoadLength> {
    let total = points.len();

    stream::iter(points.iter().enumerate())
        .map(|(index, point)| {
            if index % PROGRESS_LOG_INTERVAL == 0 {
                log::info!("Processing grid tile {} out of {}", index, total);
            }

            measure_tile(source, Tile::centred_on(point, delta))
        })
        .buffered(fetch_rate.max(1) as usize)
        .inspect(|_| progress.inc(1))
        .collect()
        .await
}

fn progress_bar(cfg: &Config, len: usize) -> ProgressBar {
    if !cfg.show_progress {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:60.cyan/blue} {pos:>7}/{len:7} ETA: {eta} {msg}")
            .progress_chars("##-"),
    );
    pb.set_message(&cfg.country_code);

    pb
}

/// Computes and writes the road length table of `cfg.country_code` using
/// already loaded inputs and the given road source.
///
/// Creates the output folder if required and overwrites an existing table.
pub async fn run_with<S: RoadSource + ?Sized>(
    cfg: &Config,
    inputs: &Inputs,
    source: &S,
) -> Result<RunSummary> {
    let output_folder = cfg.output_folder.as_path();
    if output_folder.exists() && !output_folder.is_dir() {
        bail!("output {} must be a directory", output_folder.display());
    }

    let country = country_grid(inputs, &cfg.country_code)?;
    let points = &country.points;
    log::info!("Subgrid has {} tiles", points.len());

    let pb = progress_bar(cfg, points.len());
    let lengths = measure_grid(source, points, cfg.delta, cfg.fetch_rate, &pb).await;
    pb.finish_and_clear();

    let rows: Vec<ResultRow> = points
        .iter()
        .zip(lengths)
        .map(|(point, road_length_km)| ResultRow {
            lat: point.lat,
            lon: point.lon,
            road_length_km,
            country_code: country.boundary.code.clone(),
        })
        .collect();

    fs::create_dir_all(output_folder)
        .await
        .context("failed to create output directory")?;
    let output_path = output::output_path(output_folder, &country.boundary.code);
    output::write_rows(&output_path, &rows)?;

    let failures = rows.iter().filter(|r| r.road_length_km.is_failure()).count();
    log::info!(
        "Processing road length for country_code={} ({}) is complete!",
        country.boundary.code,
        country.boundary.name
    );
    log::info!(
        "{} coordinate points out of {} were not calculated due to failed API requests or unmeasurable roads",
        failures,
        rows.len()
    );

    Ok(RunSummary {
        country_code: country.boundary.code.clone(),
        country_name: country.boundary.name.clone(),
        tiles: rows.len(),
        failures,
        output_path,
    })
}

/// Computes the per-tile road length of `cfg.country_code` and writes it to
/// `cfg.output_folder`.
///
/// # Example
/// ```rust,no_run
/// use osm_road_length::{run, Config};
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = Config::new("QA", "grid.csv", "countries.geojson", "./road_length");
///
/// let summary = run(&config).await.expect("failed computing road length");
/// println!("{} of {} tiles failed", summary.failures, summary.tiles);
/// # }
/// ```
pub async fn run(cfg: &Config) -> Result<RunSummary> {
    let inputs = Inputs::load(cfg).await?;
    let client = OverpassClient::new(
        cfg.endpoint.clone(),
        QueryFormat::new(cfg.query_timeout),
        cfg.timeout,
        cfg.request_retries_amount,
    )?;

    run_with(cfg, &inputs, &client).await
}
