//! Locate command handler
//!
//! Resolves the current location and prints it.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::url::UrlFormatter;
use crate::format::{available_formats, get_formatter, OutputFormatter};
use crate::geo::resolver::DefaultGeolocator;
use clap::Args;

/// Locate command arguments
#[derive(Args)]
pub struct LocateArgs {
    /// Resolve from the IP address only (no device, no geocoding)
    #[arg(long)]
    pub ip: bool,

    /// Fail instead of falling back to IP lookup
    #[arg(long, conflicts_with = "ip")]
    pub no_fallback: bool,

    /// Ask the device for its most accurate fix
    #[arg(long)]
    pub high_accuracy: bool,

    /// Device request timeout in milliseconds (0 = no timeout)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Oldest acceptable device fix in milliseconds (0 = any age)
    #[arg(long)]
    pub max_age_ms: Option<u64>,

    /// Pretend the device is at this latitude
    #[arg(long, requires = "lng", conflicts_with = "position_file", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Pretend the device is at this longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Read the device fix from this file
    #[arg(long)]
    pub position_file: Option<String>,

    /// Output format
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Map provider for the url format
    #[arg(long)]
    pub provider: Option<String>,

    /// Write output to file
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// List available formats
    #[arg(short = 'F', long = "list-formats")]
    pub list_formats: bool,
}

/// Fold command-line overrides into the loaded config
fn apply_overrides(config: &mut Config, args: &LocateArgs) {
    if args.no_fallback {
        config.resolve.allow_ip_fallback = false;
    }
    if args.high_accuracy {
        config.resolve.enable_high_accuracy = true;
    }
    if let Some(ms) = args.timeout_ms {
        config.resolve.timeout_ms = ms;
    }
    if let Some(ms) = args.max_age_ms {
        config.resolve.maximum_age_ms = ms;
    }
    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        config.device.source = "fixed".to_string();
        config.device.latitude = Some(lat);
        config.device.longitude = Some(lng);
    }
    if let Some(path) = &args.position_file {
        config.device.source = "file".to_string();
        config.device.position_file = path.clone();
    }
    if let Some(format) = &args.format {
        config.output.format = format.clone();
    }
}

/// Run the locate command
pub async fn run(args: LocateArgs) -> Result<()> {
    if args.list_formats {
        list_formats();
        return Ok(());
    }

    let mut config = Config::load()?;
    apply_overrides(&mut config, &args);

    let formatter: Box<dyn OutputFormatter> = match &args.provider {
        Some(provider) if config.output.format.eq_ignore_ascii_case("url") => {
            Box::new(UrlFormatter::with_provider(provider.clone()))
        }
        _ => get_formatter(&config.output.format).ok_or_else(|| {
            Error::Config(format!("Unknown format: {}", config.output.format))
        })?,
    };

    let geolocator = DefaultGeolocator::from_config(&config)?;

    let location = if args.ip {
        geolocator.resolve_by_ip().await?
    } else {
        geolocator
            .resolve(config.resolve.allow_ip_fallback, &config.position_options())
            .await
            .map_err(|e| {
                if let Error::DeviceLocation(reason) = &e {
                    if reason.is_permission_denied() {
                        eprintln!("Location permission denied; retry without --no-fallback to use IP lookup");
                    }
                }
                e
            })?
    };

    let output = formatter.format(&location, &config)?;

    if let Some(path) = args.output {
        std::fs::write(&path, &output)?;
        eprintln!("Output written to {}", path);
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// Print available output formats
fn list_formats() {
    println!("Available output formats:");
    for format in available_formats() {
        println!("  {:6} - {}", format.name, format.description);
    }
}
