// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Parse arguments, load config, run one search and export it

mod config;
mod errors;
mod models;
mod services;

use chrono::Local;
use clap::Parser;
use config::Config;
use errors::PlacesError;
use models::{CategoryTable, MccGroup, SearchQuery};
use services::{ClientOptions, GooglePlacesClient, Pipeline, TokioSleeper, XlsxExporter};
use std::path::PathBuf;
use std::process::ExitCode;

/// Collect businesses near a location and export them with MCC categories
#[derive(Debug, Parser)]
#[command(name = "merchant-places", version, about)]
struct Cli {
    /// Address or "lat,lng" to search around
    location: String,

    /// Search radius in meters
    #[arg(long, default_value_t = 5000, allow_hyphen_values = true)]
    radius: i64,

    /// Output spreadsheet path (default: <OUTPUT_DIR>/places_<timestamp>.xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Restrict results to one Google place type (e.g. "restaurant")
    #[arg(long = "type", conflicts_with = "group")]
    place_type: Option<String>,

    /// Search every place type of an MCC group (retail, food, services,
    /// entertainment, travel, financial, religious, arts)
    #[arg(long)]
    group: Option<MccGroup>,

    /// Override the maximum number of result pages
    #[arg(long)]
    max_pages: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Parse arguments and load configuration (.env included)
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(max_pages) = cli.max_pages {
        config.max_pages = max_pages;
    }

    // 2. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();
    config.log_warnings();

    match run(cli, config).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<PathBuf, PlacesError> {
    // Fails before any network call when the API key is missing
    config.validate()?;

    let categories = CategoryTable::standard();
    let place_types: Vec<String> = match cli.group {
        Some(group) => categories
            .types_in_group(group)
            .into_iter()
            .map(str::to_string)
            .collect(),
        None => cli.place_type.into_iter().collect(),
    };

    let query = SearchQuery::new(&cli.location, cli.radius).with_place_types(place_types);
    query.checked_radius()?;

    let output = match cli.output {
        Some(path) => path,
        None => default_output_path(&config)?,
    };

    log::info!("Starting merchant-places search for '{}'", query.location);
    if let Some(group) = cli.group {
        log::info!(
            "Group {} expands to {} place types",
            group,
            query.place_types.len()
        );
    }

    let client = GooglePlacesClient::new(
        config.google_places_api_key.clone(),
        ClientOptions::from_config(&config),
    )?;
    let pipeline = Pipeline::new(
        &client,
        &categories,
        TokioSleeper,
        config.pipeline_settings(),
    );

    let stats = pipeline
        .run(&query, &XlsxExporter::default(), &output)
        .await?;

    log::info!(
        "{} searches, {} HTTP calls of {} allowed, {} retries, {} places exported",
        stats.searches,
        client.requests_made(),
        config.max_requests,
        stats.retries,
        stats.places_recorded
    );
    if let Ok(json) = serde_json::to_string(&stats) {
        log::debug!("Run stats: {}", json);
    }

    Ok(output)
}

/// Timestamped file inside the configured output directory, created if missing
fn default_output_path(config: &Config) -> Result<PathBuf, PlacesError> {
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| PlacesError::io(&config.output_dir, e))?;

    let filename = format!("places_{}.xlsx", Local::now().format("%Y%m%d_%H%M%S"));
    Ok(config.output_dir.join(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["merchant-places", "Madrid, Spain"]).unwrap();
        assert_eq!(cli.location, "Madrid, Spain");
        assert_eq!(cli.radius, 5000);
        assert!(cli.output.is_none());
        assert!(cli.place_type.is_none());
        assert!(cli.group.is_none());
    }

    #[test]
    fn test_cli_group() {
        let cli = Cli::try_parse_from(["merchant-places", "Madrid", "--group", "food"]).unwrap();
        assert_eq!(cli.group, Some(MccGroup::Food));

        assert!(Cli::try_parse_from(["merchant-places", "Madrid", "--group", "groceries"]).is_err());
        assert!(Cli::try_parse_from([
            "merchant-places",
            "Madrid",
            "--group",
            "food",
            "--type",
            "bar"
        ])
        .is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "merchant-places",
            "40.4168,-3.7038",
            "--radius",
            "1200",
            "-o",
            "out/places.xlsx",
            "--type",
            "cafe",
            "--max-pages",
            "1",
        ])
        .unwrap();

        assert_eq!(cli.radius, 1200);
        assert_eq!(cli.output, Some(PathBuf::from("out/places.xlsx")));
        assert_eq!(cli.place_type.as_deref(), Some("cafe"));
        assert_eq!(cli.max_pages, Some(1));
    }

    #[test]
    fn test_negative_radius_reaches_validation() {
        let cli = Cli::try_parse_from(["merchant-places", "Madrid", "--radius", "-5"]).unwrap();
        assert_eq!(cli.radius, -5);

        let err = SearchQuery::new(&cli.location, cli.radius)
            .checked_radius()
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let cli = Cli::try_parse_from(["merchant-places", "Madrid"]).unwrap();
        let config = Config::from_vars(|_| None);

        let err = run(cli, config).await.unwrap_err();
        assert!(matches!(err, PlacesError::Auth(_)));
    }

    #[test]
    fn test_default_output_path_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_vars(|_| None);
        config.output_dir = dir.path().join("nested");

        let path = default_output_path(&config).unwrap();

        assert!(config.output_dir.is_dir());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("places_"));
        assert!(name.ends_with(".xlsx"));
    }
}
