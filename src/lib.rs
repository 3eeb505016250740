//! geolocator: where is this user?
//!
//! Resolves a location through a chain of providers and normalizes the answer
//! into one [`LocationResult`].
//!
//! ## Pipeline
//!
//! - Device position, falling back to IP lookup when the device is missing
//!   or refuses
//! - Lazy, one-time bootstrap of the mapping library
//! - Reverse geocoding of device fixes into a canonical [`AddressDetail`]
//! - IP-only resolution that never geocodes
//!
//! ## Quick Start
//!
//! ```no_run
//! use geolocator::{Config, DefaultGeolocator};
//!
//! # async fn example() -> geolocator::Result<()> {
//! let config = Config::default();
//! let geolocator = DefaultGeolocator::from_config(&config)?;
//!
//! let location = geolocator
//!     .resolve(true, &config.position_options())
//!     .await?;
//! println!("{:?} via {}", location.coordinates(), location.source());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod geo;

// Re-export commonly used types
pub use config::Config;
pub use error::{is_device_location_error, Error, Result};
pub use geo::device::{DeviceLocator, PositionError, PositionOptions};
pub use geo::enrich::EnrichmentPolicy;
pub use geo::resolver::{DefaultGeolocator, Geolocator};
pub use geo::{AddressDetail, Coordinates, LocationResult, LocationSource};
