//! JSON output formatter

use crate::config::Config;
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::geo::LocationResult;

/// JSON formatter - outputs the full location record, pretty-printed
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Full location record as JSON"
    }

    fn format(&self, location: &LocationResult, _config: &Config) -> Result<String> {
        Ok(serde_json::to_string_pretty(location)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{AddressDetail, Coordinates, Enrichment};

    #[test]
    fn test_json_format() {
        let mut location = LocationResult::from_device(Coordinates::new(40.7128, -74.0060));
        location.enrich(Enrichment {
            formatted_address: "New York, NY, USA".to_string(),
            address: AddressDetail {
                city: "New York".to_string(),
                region: "NY".to_string(),
                ..Default::default()
            },
        });

        let output = JsonFormatter.format(&location, &Config::default()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["source"], "device");
        assert_eq!(parsed["coordinates"]["latitude"], 40.7128);
        assert_eq!(parsed["address"]["region"], "NY");
        assert!(parsed.get("timestamp").is_some());
    }

    #[test]
    fn test_json_parses_back() {
        let location = LocationResult::from_device(Coordinates::new(1.5, 2.5));
        let output = JsonFormatter.format(&location, &Config::default()).unwrap();
        let parsed: LocationResult = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, location);
    }
}
