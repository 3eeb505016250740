//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/geolocator/config.toml

pub mod defaults;

use crate::constants::api::{GEOCODE_URL, IP_API_URL, MAPS_LOADER_URL, MAPS_MODULE_URL};
use crate::constants::maps::MAPS_VERSION;
use crate::error::{Error, Result};
use crate::geo::device::PositionOptions;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote provider endpoints
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Device location capability
    #[serde(default)]
    pub device: DeviceConfig,

    /// Resolution behaviour
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Map link settings
    #[serde(default)]
    pub url: UrlConfig,

    /// API keys for various services
    #[serde(default)]
    pub api_keys: ApiKeysConfig,
}

/// Remote provider endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// IP lookup endpoint
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Mapping library loader script
    #[serde(default = "default_maps_loader_url")]
    pub maps_loader_url: String,

    /// Mapping library maps module
    #[serde(default = "default_maps_module_url")]
    pub maps_module_url: String,

    /// Maps module version to request
    #[serde(default = "default_maps_version")]
    pub maps_version: String,

    /// Reverse geocoding endpoint
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
}

/// Device location capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// "none", "fixed" or "file"
    #[serde(default = "default_device_source")]
    pub source: String,

    /// Latitude for the fixed device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Longitude for the fixed device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Accuracy in meters for the fixed device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    /// Fix file written by a location daemon
    #[serde(default)]
    pub position_file: String,
}

/// Resolution behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Fall back to IP lookup when the device can't answer
    #[serde(default = "default_allow_ip_fallback")]
    pub allow_ip_fallback: bool,

    /// Ask the device for its most accurate fix
    #[serde(default)]
    pub enable_high_accuracy: bool,

    /// Device request timeout in milliseconds
    ///
    /// 0 disables the timeout. This differs from the browser geolocation
    /// API, where a zero timeout fails immediately.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Oldest acceptable device fix in milliseconds
    ///
    /// 0 accepts a fix of any age. This differs from the browser geolocation
    /// API, where a zero maximum age demands a fresh fix.
    #[serde(default = "default_maximum_age_ms")]
    pub maximum_age_ms: u64,

    /// "degrade" or "strict"
    #[serde(default = "default_enrichment_failure")]
    pub enrichment_failure: String,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format
    #[serde(default = "default_format")]
    pub format: String,
}

/// Map link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlConfig {
    /// Default URL provider
    #[serde(default = "default_url_provider")]
    pub default: String,

    /// URL provider templates
    #[serde(default = "default_url_providers")]
    pub providers: HashMap<String, String>,
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiKeysConfig {
    /// Google Maps / Geocoding API key
    #[serde(default)]
    pub google: String,
}

// Default value functions for serde
fn default_ip_lookup_url() -> String {
    IP_API_URL.to_string()
}
fn default_maps_loader_url() -> String {
    MAPS_LOADER_URL.to_string()
}
fn default_maps_module_url() -> String {
    MAPS_MODULE_URL.to_string()
}
fn default_maps_version() -> String {
    MAPS_VERSION.to_string()
}
fn default_geocode_url() -> String {
    GEOCODE_URL.to_string()
}
fn default_device_source() -> String {
    DEFAULT_DEVICE_SOURCE.to_string()
}
fn default_allow_ip_fallback() -> bool {
    DEFAULT_ALLOW_IP_FALLBACK
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_maximum_age_ms() -> u64 {
    DEFAULT_MAXIMUM_AGE_MS
}
fn default_enrichment_failure() -> String {
    DEFAULT_ENRICHMENT_FAILURE.to_string()
}
fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}
fn default_url_provider() -> String {
    DEFAULT_URL_PROVIDER.to_string()
}
fn default_url_providers() -> HashMap<String, String> {
    let mut providers = HashMap::new();
    providers.insert(
        "google".to_string(),
        "https://www.google.com/maps/@{lat},{lng},15z".to_string(),
    );
    providers.insert(
        "openstreetmap".to_string(),
        "https://www.openstreetmap.org/#map=18/{lat}/{lng}".to_string(),
    );
    providers.insert(
        "apple".to_string(),
        "https://maps.apple.com/?ll={lat},{lng}".to_string(),
    );
    providers
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            ip_lookup_url: default_ip_lookup_url(),
            maps_loader_url: default_maps_loader_url(),
            maps_module_url: default_maps_module_url(),
            maps_version: default_maps_version(),
            geocode_url: default_geocode_url(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            source: default_device_source(),
            latitude: None,
            longitude: None,
            accuracy: None,
            position_file: String::new(),
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            allow_ip_fallback: default_allow_ip_fallback(),
            enable_high_accuracy: false,
            timeout_ms: default_timeout_ms(),
            maximum_age_ms: default_maximum_age_ms(),
            enrichment_failure: default_enrichment_failure(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            default: default_url_provider(),
            providers: default_url_providers(),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_optional_f64(key: &str, value: &str) -> Result<Option<f64>> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse_value(key, value).map(Some)
    }
}

fn optional_to_string(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key". Unset optional values read as "".
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["providers", "ip_lookup_url"] => Some(self.providers.ip_lookup_url.clone()),
            ["providers", "maps_loader_url"] => Some(self.providers.maps_loader_url.clone()),
            ["providers", "maps_module_url"] => Some(self.providers.maps_module_url.clone()),
            ["providers", "maps_version"] => Some(self.providers.maps_version.clone()),
            ["providers", "geocode_url"] => Some(self.providers.geocode_url.clone()),

            ["device", "source"] => Some(self.device.source.clone()),
            ["device", "latitude"] => Some(optional_to_string(self.device.latitude)),
            ["device", "longitude"] => Some(optional_to_string(self.device.longitude)),
            ["device", "accuracy"] => Some(optional_to_string(self.device.accuracy)),
            ["device", "position_file"] => Some(self.device.position_file.clone()),

            ["resolve", "allow_ip_fallback"] => Some(self.resolve.allow_ip_fallback.to_string()),
            ["resolve", "enable_high_accuracy"] => {
                Some(self.resolve.enable_high_accuracy.to_string())
            }
            ["resolve", "timeout_ms"] => Some(self.resolve.timeout_ms.to_string()),
            ["resolve", "maximum_age_ms"] => Some(self.resolve.maximum_age_ms.to_string()),
            ["resolve", "enrichment_failure"] => Some(self.resolve.enrichment_failure.clone()),

            ["output", "format"] => Some(self.output.format.clone()),

            ["url", "default"] => Some(self.url.default.clone()),

            ["api_keys", "google"] => Some(self.api_keys.google.clone()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Returns error if key is invalid or value type is wrong. An empty value
    /// clears an optional coordinate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["providers", "ip_lookup_url"] => self.providers.ip_lookup_url = value.to_string(),
            ["providers", "maps_loader_url"] => self.providers.maps_loader_url = value.to_string(),
            ["providers", "maps_module_url"] => self.providers.maps_module_url = value.to_string(),
            ["providers", "maps_version"] => self.providers.maps_version = value.to_string(),
            ["providers", "geocode_url"] => self.providers.geocode_url = value.to_string(),

            ["device", "source"] => match value {
                "none" | "fixed" | "file" => self.device.source = value.to_string(),
                _ => {
                    return Err(Error::Config(format!(
                        "Invalid device source: {} (expected none, fixed or file)",
                        value
                    )))
                }
            },
            ["device", "latitude"] => self.device.latitude = parse_optional_f64(key, value)?,
            ["device", "longitude"] => self.device.longitude = parse_optional_f64(key, value)?,
            ["device", "accuracy"] => self.device.accuracy = parse_optional_f64(key, value)?,
            ["device", "position_file"] => self.device.position_file = value.to_string(),

            ["resolve", "allow_ip_fallback"] => {
                self.resolve.allow_ip_fallback = parse_value(key, value)?
            }
            ["resolve", "enable_high_accuracy"] => {
                self.resolve.enable_high_accuracy = parse_value(key, value)?
            }
            ["resolve", "timeout_ms"] => self.resolve.timeout_ms = parse_value(key, value)?,
            ["resolve", "maximum_age_ms"] => self.resolve.maximum_age_ms = parse_value(key, value)?,
            ["resolve", "enrichment_failure"] => {
                let policy: crate::geo::enrich::EnrichmentPolicy =
                    value.parse().map_err(Error::Config)?;
                self.resolve.enrichment_failure = policy.to_string();
            }

            ["output", "format"] => self.output.format = value.to_string(),

            ["url", "default"] => self.url.default = value.to_string(),

            ["api_keys", "google"] => self.api_keys.google = value.to_string(),

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "providers.ip_lookup_url",
            "providers.maps_loader_url",
            "providers.maps_module_url",
            "providers.maps_version",
            "providers.geocode_url",
            "device.source",
            "device.latitude",
            "device.longitude",
            "device.accuracy",
            "device.position_file",
            "resolve.allow_ip_fallback",
            "resolve.enable_high_accuracy",
            "resolve.timeout_ms",
            "resolve.maximum_age_ms",
            "resolve.enrichment_failure",
            "output.format",
            "url.default",
            "api_keys.google",
        ]
    }

    /// Device request options from the `[resolve]` section
    ///
    /// A zero `timeout_ms` or `maximum_age_ms` becomes `None` (no limit).
    pub fn position_options(&self) -> PositionOptions {
        let millis = |ms: u64| (ms > 0).then(|| Duration::from_millis(ms));
        PositionOptions {
            enable_high_accuracy: self.resolve.enable_high_accuracy,
            timeout: millis(self.resolve.timeout_ms),
            maximum_age: millis(self.resolve.maximum_age_ms),
        }
    }

    /// Format a map URL using the specified provider
    ///
    /// Replaces {lat} and {lng} placeholders with actual values
    pub fn format_url(&self, provider: Option<&str>, lat: f64, lng: f64) -> Result<String> {
        let provider_name = provider.unwrap_or(&self.url.default);

        let template = self
            .url
            .providers
            .get(provider_name)
            .ok_or_else(|| Error::Config(format!("Unknown URL provider: {}", provider_name)))?;

        Ok(template
            .replace("{lat}", &lat.to_string())
            .replace("{lng}", &lng.to_string()))
    }
}
