//! URL output formatter

use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::OutputFormatter;
use crate::geo::LocationResult;

/// URL formatter - outputs a map link for the resolved coordinates
#[derive(Debug, Default)]
pub struct UrlFormatter {
    /// Provider override; the config default is used when unset
    pub provider: Option<String>,
}

impl UrlFormatter {
    pub fn with_provider(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
        }
    }
}

impl OutputFormatter for UrlFormatter {
    fn name(&self) -> &str {
        "url"
    }

    fn description(&self) -> &str {
        "Map URL for the resolved coordinates"
    }

    fn format(&self, location: &LocationResult, config: &Config) -> Result<String> {
        let coords = location
            .coordinates()
            .ok_or_else(|| Error::Config("Location has no coordinates to link to".to_string()))?;

        config.format_url(self.provider.as_deref(), coords.latitude, coords.longitude)
    }
}
