//! Human-readable text output formatter

use crate::config::Config;
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::geo::LocationResult;
use chrono::{TimeZone, Utc};

/// Text formatter - outputs human-readable summary
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable text"
    }

    fn format(&self, location: &LocationResult, _config: &Config) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("Source: {}\n", location.source()));

        match location.coordinates() {
            Some(coords) => {
                output.push_str(&format!(
                    "Coordinates: ({:.6}, {:.6})",
                    coords.latitude, coords.longitude
                ));
                if let Some(accuracy) = coords.accuracy {
                    output.push_str(&format!(" ±{}m", accuracy));
                }
                output.push('\n');
            }
            None => output.push_str("Coordinates: unknown\n"),
        }

        if let Some(time) = Utc.timestamp_millis_opt(location.timestamp()).single() {
            output.push_str(&format!("Time: {}\n", time.to_rfc3339()));
        }

        if let (Some(formatted), Some(address)) = (location.formatted_address(), location.address()) {
            output.push_str(&format!("\nAddress: {}\n", formatted));
            let fields = [
                ("Street", format!("{} {}", address.street_number, address.street)),
                ("Neighborhood", address.neighborhood.clone()),
                ("Town", address.town.clone()),
                ("City", address.city.clone()),
                ("Region", address.region.clone()),
                ("Postal code", address.postal_code.clone()),
                ("Country", format!("{} {}", address.country, address.country_code)),
            ];
            for (label, value) in fields {
                let value = value.trim();
                if !value.is_empty() {
                    output.push_str(&format!("  {}: {}\n", label, value));
                }
            }
        }

        if let Some(ip) = location.ip() {
            let place = [&ip.city, &ip.region, &ip.country]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if !place.is_empty() {
                output.push_str(&format!("\nIP location: {}\n", place));
            }
            if let Some(addr) = &ip.ip {
                output.push_str(&format!("IP: {}\n", addr));
            }
        }

        Ok(output)
    }
}
