//! Output formatters
//!
//! Trait-based rendering of a resolved [`LocationResult`].

pub mod json;
pub mod text;
pub mod url;

use crate::config::Config;
use crate::error::Result;
use crate::geo::LocationResult;
use serde::{Deserialize, Serialize};

/// Information about an output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format name
    pub name: String,
    /// Format description
    pub description: String,
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Get the format name
    fn name(&self) -> &str;

    /// Get the format description
    fn description(&self) -> &str;

    /// Render the location
    ///
    /// # Arguments
    /// * `location` - The resolved location
    /// * `config` - Application config (for url providers, etc.)
    fn format(&self, location: &LocationResult, config: &Config) -> Result<String>;
}

/// Get a formatter by name
pub fn get_formatter(name: &str) -> Option<Box<dyn OutputFormatter>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonFormatter)),
        "text" => Some(Box::new(text::TextFormatter)),
        "url" => Some(Box::new(url::UrlFormatter::default())),
        _ => None,
    }
}

/// List all available formatters
pub fn available_formats() -> Vec<FormatInfo> {
    [
        Box::new(json::JsonFormatter) as Box<dyn OutputFormatter>,
        Box::new(text::TextFormatter),
        Box::new(url::UrlFormatter::default()),
    ]
    .iter()
    .map(|f| FormatInfo {
        name: f.name().to_string(),
        description: f.description().to_string(),
    })
    .collect()
}
