use clap::{
    app_from_crate, crate_authors, crate_description, crate_name, crate_version,
    AppSettings, Arg, ArgMatches,
};
use std::{path::PathBuf, time::Duration};

use crate::validators::*;
use osm_road_length::{logger::DEFAULT_LOG_FILE, Config, DEFAULT_ENDPOINT};

const COUNTRY_ARG: &str = "country";
const ALL_COUNTRIES_ARG: &str = "all";
const DELTA_ARG: &str = "delta";
const GRID_ARG: &str = "grid";
const BOUNDARIES_ARG: &str = "boundaries";
const OUTPUT_DIR_ARG: &str = "output_dir";
const URL_ARG: &str = "url";
const TIMEOUT_ARG: &str = "timeout";
const QUERY_TIMEOUT_ARG: &str = "query_timeout";
const PARALLEL_FETCHES_ARG: &str = "num_parallel";
const REQUEST_RETRIES_ARG: &str = "num_retries";
const LOG_FILE_ARG: &str = "log_file";
const CLEAR_LOG_ARG: &str = "clear_log";
const QUIET_ARG: &str = "quiet";
const DRY_RUN_ARG: &str = "dry_run";

pub struct Args {
    pub countries: Vec<String>,
    pub all_countries: bool,
    pub delta: f64,
    pub grid: PathBuf,
    pub boundaries: PathBuf,
    pub output_dir: PathBuf,
    pub url: String,
    pub timeout: Duration,
    pub query_timeout: Duration,
    pub parallel_fetches: u8,
    pub retries: u8,
    pub log_file: PathBuf,
    pub clear_log: bool,
    pub quiet: bool,
    pub dry_run: bool,
}

impl Args {
    pub fn parse() -> Self {
        let matches = get_matches();

        let countries = matches
            .values_of(COUNTRY_ARG)
            .map(|codes| codes.map(|c| c.to_ascii_uppercase()).collect())
            .unwrap_or_default();

        Self {
            countries,
            all_countries: matches.is_present(ALL_COUNTRIES_ARG),
            delta: matches.value_of(DELTA_ARG).unwrap().parse().unwrap(),
            grid: PathBuf::from(matches.value_of(GRID_ARG).unwrap()),
            boundaries: PathBuf::from(matches.value_of(BOUNDARIES_ARG).unwrap()),
            output_dir: PathBuf::from(matches.value_of(OUTPUT_DIR_ARG).unwrap()),
            url: matches.value_of(URL_ARG).unwrap().to_owned(),
            timeout: Duration::from_secs(
                matches.value_of(TIMEOUT_ARG).unwrap().parse().unwrap(),
            ),
            query_timeout: Duration::from_secs(
                matches.value_of(QUERY_TIMEOUT_ARG).unwrap().parse().unwrap(),
            ),
            parallel_fetches: matches
                .value_of(PARALLEL_FETCHES_ARG)
                .unwrap()
                .parse()
                .unwrap(),
            retries: matches
                .value_of(REQUEST_RETRIES_ARG)
                .unwrap()
                .parse()
                .unwrap(),
            log_file: PathBuf::from(matches.value_of(LOG_FILE_ARG).unwrap()),
            clear_log: matches.is_present(CLEAR_LOG_ARG),
            quiet: matches.is_present(QUIET_ARG),
            dry_run: matches.is_present(DRY_RUN_ARG),
        }
    }

    /// The run configuration for one country.
    pub fn config_for(&self, country_code: &str) -> Config {
        Config {
            country_code: country_code.to_owned(),
            delta: self.delta,
            grid_path: self.grid.clone(),
            boundaries_path: self.boundaries.clone(),
            output_folder: self.output_dir.clone(),
            endpoint: self.url.clone(),
            query_timeout: self.query_timeout,
            timeout: self.timeout,
            fetch_rate: self.parallel_fetches,
            request_retries_amount: self.retries,
            show_progress: !self.quiet,
        }
    }
}

fn get_matches() -> ArgMatches<'static> {
    app_from_crate!()
        .setting(AppSettings::GlobalVersion)
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name(COUNTRY_ARG)
                .help("Two-letter ISO code of a country to process. May be given several times or as a comma-separated list.")
                .required_unless(ALL_COUNTRIES_ARG)
                .validator(is_country_code)
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .use_delimiter(true)
                .short("c")
                .long("country"),
        )
        .arg(
            Arg::with_name(ALL_COUNTRIES_ARG)
                .help("Process every country of the boundary dataset")
                .conflicts_with(COUNTRY_ARG)
                .takes_value(false)
                .long("all"),
        )
        .arg(
            Arg::with_name(DELTA_ARG)
                .help("Width of a tile (in degrees)")
                .validator(is_tile_width)
                .default_value("0.01")
                .takes_value(true)
                .short("d")
                .long("delta"),
        )
        .arg(
            Arg::with_name(GRID_ARG)
                .help("CSV file of the sampling grid with `lat` and `lon` columns")
                .required(true)
                .takes_value(true)
                .short("g")
                .long("grid"),
        )
        .arg(
            Arg::with_name(BOUNDARIES_ARG)
                .help("GeoJSON feature collection of country boundaries with `ISO_A2` and `NAME_EN` properties")
                .required(true)
                .takes_value(true)
                .short("b")
                .long("boundaries"),
        )
        .arg(
            Arg::with_name(OUTPUT_DIR_ARG)
                .help("The folder to write the per-country tables to")
                .default_value("output")
                .takes_value(true)
                .short("o")
                .long("output"),
        )
        .arg(
            Arg::with_name(URL_ARG)
                .help("The Overpass API interpreter endpoint")
                .default_value(DEFAULT_ENDPOINT)
                .takes_value(true)
                .short("u")
                .long("url"),
        )
        .arg(
            Arg::with_name(TIMEOUT_ARG)
                .help("The client-side timeout (in seconds) for fetching a single tile. Pass 0 for no timeout.")
                .validator(is_numeric_min(0))
                .default_value("0")
                .takes_value(true)
                .short("t")
                .long("timeout"),
        )
        .arg(
            Arg::with_name(QUERY_TIMEOUT_ARG)
                .help("The timeout (in seconds) the Overpass server enforces on a single query")
                .validator(is_numeric_min(1))
                .default_value("1600")
                .takes_value(true)
                .long("query-timeout"),
        )
        .arg(
            Arg::with_name(PARALLEL_FETCHES_ARG)
                .help("The amount of tiles fetched in parallel.")
                .validator(is_u8_min(1))
                .default_value("1")
                .takes_value(true)
                .short("r")
                .long("rate"),
        )
        .arg(
            Arg::with_name(REQUEST_RETRIES_ARG)
                .help("The amount of times to retry a failed HTTP request.")
                .validator(is_u8_min(0))
                .default_value("0")
                .takes_value(true)
                .long("retries"),
        )
        .arg(
            Arg::with_name(LOG_FILE_ARG)
                .help("The file progress and failures are logged to")
                .default_value(DEFAULT_LOG_FILE)
                .takes_value(true)
                .short("l")
                .long("log"),
        )
        .arg(
            Arg::with_name(CLEAR_LOG_ARG)
                .help("Clear the log file before starting")
                .takes_value(false)
                .long("clear-log"),
        )
        .arg(
            Arg::with_name(QUIET_ARG)
                .help("Don't draw a progress bar")
                .takes_value(false)
                .short("q")
                .long("quiet"),
        )
        .arg(
            Arg::with_name(DRY_RUN_ARG)
                .help("Don't actually fetch anything, just determine how many tiles would be fetched.")
                .takes_value(false)
                .long("dry-run"),
        )
        .get_matches()
}
