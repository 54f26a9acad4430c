use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fare_core::{
    Config, Coordinate, ProviderId, Resolved, ServiceError, TravelMode, estimate_fare, fare,
    formula_for,
    provider::{geocoder_from_config, route_estimator_from_config, weather_fetcher_from_config},
    quote_trip,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "fare", version, about = "Taxi fare, route and weather lookups")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "geoapify", "google" or "openweather".
        provider: String,
    },

    /// Resolve an address to coordinates (or its city).
    Geocode {
        /// Free-text address.
        address: String,

        /// Print the city the address is in instead of coordinates.
        #[arg(long)]
        city: bool,
    },

    /// Distance and travel time between two points.
    Route {
        #[arg(allow_negative_numbers = true)]
        from_lon: f64,
        #[arg(allow_negative_numbers = true)]
        from_lat: f64,
        #[arg(allow_negative_numbers = true)]
        to_lon: f64,
        #[arg(allow_negative_numbers = true)]
        to_lat: f64,

        /// driving, bicycling, walking or transit; defaults to the configured mode.
        #[arg(long)]
        mode: Option<String>,
    },

    /// Estimate a taxi fare for a known distance, offline.
    Estimate {
        /// Route distance in kilometers.
        #[arg(allow_negative_numbers = true)]
        distance_km: f64,

        /// City the trip starts in, e.g. "Taipei". Unknown cities use the default rate.
        city: String,
    },

    /// Geocode two addresses, route between them and estimate the fare.
    Quote {
        origin: String,
        destination: String,

        #[arg(long)]
        mode: Option<String>,
    },

    /// Fetch current weather for a point and store the raw snapshot.
    Weather {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,

        /// Where to write the snapshot; defaults to the configured `weather_file`.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List cities with a dedicated fare formula.
    Cities {
        /// Print the fare table as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::debug!(command = ?self.command, "dispatching");

        match self.command {
            Command::Configure { provider } => configure(&provider)?,
            Command::Geocode { address, city } => {
                let config = Config::load()?;
                let geocoder = geocoder_from_config(&config)?;

                let resolved = geocoder
                    .resolve(&address, city)
                    .await
                    .map_err(report_lookup_error)?;

                match resolved {
                    Resolved::Coordinate(c) => println!("{} {}", c.lon, c.lat),
                    Resolved::City(name) => println!("{name}"),
                }
            }
            Command::Route {
                from_lon,
                from_lat,
                to_lon,
                to_lat,
                mode,
            } => {
                let config = Config::load()?;
                let mode = resolve_mode(mode.as_deref(), &config)?;
                let router = route_estimator_from_config(&config)?;

                let route = router
                    .estimate_route(
                        Coordinate::new(from_lon, from_lat),
                        Coordinate::new(to_lon, to_lat),
                        mode,
                    )
                    .await?;

                println!("Distance: {:.2} km", route.distance_km);
                println!("Duration: {}", format_duration(route.duration_secs));
            }
            Command::Estimate { distance_km, city } => {
                println!("{:.2}", estimate_fare(distance_km, &city));
            }
            Command::Quote {
                origin,
                destination,
                mode,
            } => {
                let config = Config::load()?;
                let mode = resolve_mode(mode.as_deref(), &config)?;
                let geocoder = geocoder_from_config(&config)?;
                let router = route_estimator_from_config(&config)?;

                let quote =
                    quote_trip(geocoder.as_ref(), router.as_ref(), &origin, &destination, mode)
                        .await
                        .map_err(report_lookup_error)?;

                println!("From:     {origin} {}", quote.origin);
                println!("To:       {destination} {}", quote.destination);
                println!("City:     {}", quote.city.as_deref().unwrap_or("(unknown, default rate)"));
                println!("Mode:     {}", quote.mode);
                println!("Distance: {:.2} km", quote.route.distance_km);
                println!("Duration: {}", format_duration(quote.route.duration_secs));
                println!("Fare:     {:.0}", quote.fare);
            }
            Command::Weather { lat, lon, out } => {
                let mut config = Config::load()?;
                if out.is_some() {
                    config.weather_file = out;
                }
                let fetcher = weather_fetcher_from_config(&config)?;

                let snapshot = fetcher.fetch_weather(lat, lon).await?;
                let pretty = serde_json::to_string_pretty(snapshot.as_json())
                    .context("Failed to format weather snapshot")?;

                println!("{pretty}");
                eprintln!("Saved to {}", config.weather_file().display());
            }
            Command::Cities { json: true } => {
                let sheet = serde_json::to_string_pretty(&fare_sheet())
                    .context("Failed to format fare table")?;
                println!("{sheet}");
            }
            Command::Cities { json: false } => {
                for city in fare::known_cities() {
                    let f = formula_for(city);
                    println!(
                        "{city:<16} base {:>5} for {:>4} m, +{} per {} m",
                        f.base, f.threshold_m, f.increment_fare, f.increment_m
                    );
                }
                let f = &fare::DEFAULT_FORMULA;
                println!(
                    "{:<16} base {:>5} for {:>4} m, +{} per {} m",
                    "(other)", f.base, f.threshold_m, f.increment_fare, f.increment_m
                );
            }
        }

        Ok(())
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    let api_key = inquire::Password::new(&format!("{} API key for {id}:", id.purpose()))
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        anyhow::bail!("API key for '{id}' must not be empty");
    }

    let mut config = Config::load()?;
    config.upsert_provider_api_key(id, api_key);
    config.save()?;

    println!(
        "Saved {id} credentials to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

/// Adds a hint to a geocoder miss; other errors pass through unchanged.
fn report_lookup_error(err: ServiceError) -> anyhow::Error {
    if err.is_no_match() {
        anyhow::anyhow!("{err}. Check the spelling or add the city name.")
    } else {
        err.into()
    }
}

/// Every known city with its formula, then the fallback under `"city": null`.
fn fare_sheet() -> serde_json::Value {
    let mut rows: Vec<_> = fare::known_cities()
        .map(|city| serde_json::json!({ "city": city, "formula": formula_for(city) }))
        .collect();
    rows.push(serde_json::json!({ "city": null, "formula": fare::DEFAULT_FORMULA }));
    serde_json::Value::Array(rows)
}

fn resolve_mode(flag: Option<&str>, config: &Config) -> anyhow::Result<TravelMode> {
    match flag {
        Some(mode) => TravelMode::try_from(mode),
        None => config.default_mode(),
    }
}

fn format_duration(secs: f64) -> String {
    let total = secs.round() as u64;
    let (hours, minutes) = (total / 3600, (total % 3600) / 60);
    if hours > 0 {
        format!("{hours} h {minutes} min")
    } else {
        format!("{minutes} min")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_route_with_mode() {
        let cli = Cli::try_parse_from([
            "fare", "route", "121.56", "25.03", "121.46", "25.01", "--mode", "walking",
        ])
        .unwrap();

        match cli.command {
            Command::Route { from_lon, mode, .. } => {
                assert_eq!(from_lon, 121.56);
                assert_eq!(mode.as_deref(), Some("walking"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn route_accepts_negative_coordinates() {
        let cli =
            Cli::try_parse_from(["fare", "route", "-122.33", "47.6", "-122.2", "47.61"]).unwrap();
        assert!(matches!(cli.command, Command::Route { from_lon, .. } if from_lon == -122.33));
    }

    #[test]
    fn parses_estimate() {
        let cli = Cli::try_parse_from(["fare", "estimate", "1.25", "New Taipei"]).unwrap();
        match cli.command {
            Command::Estimate { distance_km, city } => {
                assert_eq!(estimate_fare(distance_km, &city), 85.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn estimate_accepts_negative_distance() {
        let cli = Cli::try_parse_from(["fare", "estimate", "-0.5", "Taipei"]).unwrap();
        match cli.command {
            Command::Estimate { distance_km, city } => {
                assert_eq!(distance_km, -0.5);
                assert_eq!(estimate_fare(distance_km, &city), 41.25);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_match_gets_a_friendly_message() {
        let err = report_lookup_error(ServiceError::NoMatch {
            address: "Atlantis".into(),
        });

        let message = err.to_string();
        assert!(message.contains("No match found for address 'Atlantis'"), "{message}");
        assert!(message.contains("Check the spelling"));
    }

    #[test]
    fn other_lookup_errors_pass_through() {
        let err = report_lookup_error(ServiceError::Rejected {
            service: "google",
            status: "REQUEST_DENIED".into(),
        });

        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Rejected { .. })
        ));
    }

    #[test]
    fn parses_cities_json_flag() {
        let cli = Cli::try_parse_from(["fare", "cities", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Cities { json: true }));

        let cli = Cli::try_parse_from(["fare", "cities"]).unwrap();
        assert!(matches!(cli.command, Command::Cities { json: false }));
    }

    #[test]
    fn fare_sheet_lists_cities_then_default() {
        let sheet = fare_sheet();
        let rows = sheet.as_array().unwrap();
        assert_eq!(rows.len(), fare::known_cities().count() + 1);

        assert_eq!(rows[0]["city"], "Keelong");
        assert_eq!(rows[0]["formula"]["base"], 85.0);

        let fallback = rows.last().unwrap();
        assert!(fallback["city"].is_null());
        assert_eq!(fallback["formula"]["base"], 90.0);
        assert_eq!(fallback["formula"]["increment_fare"], 5.0);
    }

    #[test]
    fn explicit_mode_wins_over_config() {
        let mut config = Config::default();
        config.set_default_mode(TravelMode::Transit);

        assert_eq!(resolve_mode(Some("bicycling"), &config).unwrap(), TravelMode::Bicycling);
        assert_eq!(resolve_mode(None, &config).unwrap(), TravelMode::Transit);
        assert!(resolve_mode(Some("rocket"), &config).is_err());
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(600.0), "10 min");
        assert_eq!(format_duration(3725.0), "1 h 2 min");
    }
}
