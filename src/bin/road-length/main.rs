mod args;
mod validators;

use anyhow::Result;
use args::Args;
use osm_road_length::{
    country_grid,
    logger::{self, LogMode},
    run_with, Inputs, OverpassClient, QueryFormat,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_mode = if args.clear_log {
        LogMode::Clear
    } else {
        LogMode::Append
    };
    logger::init(&args.log_file, log_mode)?;
    if args.clear_log {
        log::info!("START");
    }

    let base = args.config_for("");
    let inputs = Inputs::load(&base).await?;
    let codes = if args.all_countries {
        inputs.boundaries.codes()
    } else {
        args.countries.clone()
    };

    if args.dry_run {
        let mut tile_count = 0;
        for code in &codes {
            let country = country_grid(&inputs, code)?;
            eprintln!(
                "{} ({}): {} tiles",
                country.boundary.code,
                country.boundary.name,
                country.points.len()
            );
            tile_count += country.points.len();
        }

        eprintln!("would query {} tiles", tile_count);
        return Ok(());
    }

    let client = OverpassClient::new(
        args.url.clone(),
        QueryFormat::new(args.query_timeout),
        args.timeout,
        args.retries,
    )?;

    for code in &codes {
        log::info!("Process beginning for country_code={}.", code);
        run_with(&base.for_country(code.as_str()), &inputs, &client).await?;
    }

    Ok(())
}
