//! Error types for geolocator

use crate::geo::device::PositionError;
use thiserror::Error;

/// Main error type for geolocator operations
#[derive(Error, Debug)]
pub enum Error {
    /// A remote resource could not be loaded. The URL has its query string stripped.
    #[error("Could not load source at {url}")]
    LoadFailure { url: String },

    #[error("Device location error: {0}")]
    DeviceLocation(#[from] PositionError),

    #[error("IP lookup failed: {0}")]
    IpLookup(String),

    #[error("Reverse geocoding returned status {status}{}", detail_suffix(.message))]
    Enrichment {
        status: String,
        message: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True if this error came from the device location capability
    pub fn is_device_location_error(&self) -> bool {
        matches!(self, Error::DeviceLocation(_))
    }
}

/// Classify an error as a device location error
///
/// Callers use this to branch on permission denial (or any other device
/// failure) separately from transport errors.
pub fn is_device_location_error(err: &Error) -> bool {
    err.is_device_location_error()
}

fn detail_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

/// Result type alias for geolocator operations
pub type Result<T> = std::result::Result<T, Error>;
