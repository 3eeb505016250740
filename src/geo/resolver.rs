//! Resolution facade
//!
//! The two public entry points: [`Geolocator::resolve`] (device with IP
//! fallback, then reverse geocoding) and [`Geolocator::resolve_by_ip`].
//! Each call owns its own future, so overlapping resolutions never deliver
//! into each other's callers; only the [`current_location`] snapshot is
//! shared, and the last resolution to finish wins it.
//!
//! [`current_location`]: Geolocator::current_location

use crate::config::Config;
use crate::error::{Error, Result};
use crate::geo::acquire::{Acquired, Acquirer};
use crate::geo::bootstrap::{MapsBootstrap, MapsEndpoints};
use crate::geo::device::{
    ConfiguredDevice, DeviceLocator, FixedDevice, NoDevice, PositionFile, PositionOptions,
};
use crate::geo::enrich::{Enricher, EnrichmentPolicy};
use crate::geo::google::{GeocodingProvider, GoogleGeocoder};
use crate::geo::ip_location::IpLocator;
use crate::geo::loader::{HttpLoader, ResourceLoader};
use crate::geo::normalize::normalize;
use crate::geo::{Coordinates, CurrentLocation, LocationResult};
use std::sync::Arc;
use tracing::{info, warn};

/// The concrete stack built from configuration
pub type DefaultGeolocator = Geolocator<ConfiguredDevice, HttpLoader, GoogleGeocoder>;

/// Location resolver
#[derive(Debug)]
pub struct Geolocator<D, L, G> {
    bootstrap: Arc<MapsBootstrap<L>>,
    acquirer: Acquirer<D, L>,
    ip: Arc<IpLocator<L>>,
    enricher: Enricher<L, G>,
    policy: EnrichmentPolicy,
    current: CurrentLocation,
}

impl<D, L, G> Geolocator<D, L, G>
where
    D: DeviceLocator,
    L: ResourceLoader,
    G: GeocodingProvider,
{
    /// Wire the pipeline around one shared loader
    pub fn new(
        device: D,
        loader: Arc<L>,
        geocoder: G,
        maps: MapsEndpoints,
        ip_endpoint: impl Into<String>,
    ) -> Self {
        let current = CurrentLocation::new();
        let bootstrap = Arc::new(MapsBootstrap::new(loader.clone(), maps));
        let ip = Arc::new(IpLocator::with_endpoint(loader, ip_endpoint, current.clone()));

        Self {
            acquirer: Acquirer::new(device, ip.clone(), current.clone()),
            enricher: Enricher::new(bootstrap.clone(), geocoder),
            bootstrap,
            ip,
            policy: EnrichmentPolicy::default(),
            current,
        }
    }

    /// Choose what happens when reverse geocoding fails
    pub fn with_policy(mut self, policy: EnrichmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> EnrichmentPolicy {
        self.policy
    }

    pub fn bootstrap(&self) -> &MapsBootstrap<L> {
        &self.bootstrap
    }

    pub fn device(&self) -> &D {
        self.acquirer.device()
    }

    /// Most recent location, or `None` before any resolution or while one
    /// is being acquired
    pub async fn current_location(&self) -> Option<LocationResult> {
        self.current.get().await
    }

    /// Resolve via the device, falling back to IP lookup
    ///
    /// Bootstraps the mapping library first; a bootstrap failure ends the
    /// resolution. Device fixes are reverse geocoded before being returned.
    pub async fn resolve(&self, allow_ip_fallback: bool, options: &PositionOptions) -> Result<LocationResult> {
        self.bootstrap.ensure_loaded().await?;

        let location = match self.acquirer.acquire(allow_ip_fallback, options).await? {
            Acquired::Ip(location) => location,
            Acquired::Device(location) => {
                let enriched = self.enrich(location).await?;
                self.current.publish(enriched.clone()).await;
                enriched
            }
        };

        info!("resolved location via {}", location.source());
        Ok(location)
    }

    /// Resolve via IP lookup only; never bootstraps or geocodes
    pub async fn resolve_by_ip(&self) -> Result<LocationResult> {
        let location = self.ip.locate().await?;
        info!("resolved location via {}", location.source());
        Ok(location)
    }

    /// Callback form of [`resolve`](Self::resolve); exactly one of the two
    /// callbacks is invoked
    pub async fn resolve_with<S, E>(
        &self,
        allow_ip_fallback: bool,
        options: &PositionOptions,
        on_success: S,
        on_error: E,
    ) where
        S: FnOnce(LocationResult),
        E: FnOnce(Error),
    {
        match self.resolve(allow_ip_fallback, options).await {
            Ok(location) => on_success(location),
            Err(e) => on_error(e),
        }
    }

    /// Callback form of [`resolve_by_ip`](Self::resolve_by_ip)
    pub async fn resolve_by_ip_with<S, E>(&self, on_success: S, on_error: E)
    where
        S: FnOnce(LocationResult),
        E: FnOnce(Error),
    {
        match self.resolve_by_ip().await {
            Ok(location) => on_success(location),
            Err(e) => on_error(e),
        }
    }

    async fn enrich(&self, mut location: LocationResult) -> Result<LocationResult> {
        let Some(coords) = location.coordinates().copied() else {
            return Ok(location);
        };

        match self.enricher.enrich(&coords).await {
            Ok(results) => {
                if let Some(enrichment) = normalize(&results) {
                    location.enrich(enrichment);
                }
                Ok(location)
            }
            Err(e) => match self.policy {
                EnrichmentPolicy::Degrade => {
                    warn!("reverse geocoding failed, returning coordinates only: {}", e);
                    Ok(location)
                }
                EnrichmentPolicy::Strict => Err(e),
            },
        }
    }
}

impl DefaultGeolocator {
    /// Build the HTTP-backed resolver described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = Some(config.api_keys.google.clone()).filter(|k| !k.is_empty());

        let maps = MapsEndpoints {
            loader_url: config.providers.maps_loader_url.clone(),
            module_url: config.providers.maps_module_url.clone(),
            version: config.providers.maps_version.clone(),
            api_key: api_key.clone(),
        };
        let geocoder = GoogleGeocoder::with_endpoint(config.providers.geocode_url.clone(), api_key)?;
        let device = device_from_config(config)?;

        let policy = config
            .resolve
            .enrichment_failure
            .parse::<EnrichmentPolicy>()
            .map_err(Error::Config)?;

        Ok(Geolocator::new(
            device,
            Arc::new(HttpLoader::new()),
            geocoder,
            maps,
            config.providers.ip_lookup_url.clone(),
        )
        .with_policy(policy))
    }
}

/// Select the device capability named in `[device]`
pub fn device_from_config(config: &Config) -> Result<ConfiguredDevice> {
    let device = &config.device;
    match device.source.as_str() {
        "none" => Ok(ConfiguredDevice::None(NoDevice)),
        "fixed" => match (device.latitude, device.longitude) {
            (Some(lat), Some(lng)) => {
                let mut coords = Coordinates::new(lat, lng);
                coords.accuracy = device.accuracy;
                Ok(ConfiguredDevice::Fixed(FixedDevice::new(coords)))
            }
            _ => Err(Error::Config(
                "device.source = \"fixed\" needs device.latitude and device.longitude".to_string(),
            )),
        },
        "file" => {
            if device.position_file.is_empty() {
                return Err(Error::Config(
                    "device.source = \"file\" needs device.position_file".to_string(),
                ));
            }
            Ok(ConfiguredDevice::File(PositionFile::new(&device.position_file)))
        }
        other => Err(Error::Config(format!("Unknown device source: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_from_default_config() {
        let config = Config::default();
        let device = device_from_config(&config).unwrap();
        assert!(matches!(device, ConfiguredDevice::None(_)));
    }

    #[test]
    fn test_fixed_device_requires_coordinates() {
        let mut config = Config::default();
        config.device.source = "fixed".to_string();
        assert!(device_from_config(&config).is_err());

        config.device.latitude = Some(40.7128);
        config.device.longitude = Some(-74.0060);
        config.device.accuracy = Some(25.0);
        let device = device_from_config(&config).unwrap();
        assert!(matches!(device, ConfiguredDevice::Fixed(_)));
    }

    #[test]
    fn test_file_device_requires_path() {
        let mut config = Config::default();
        config.device.source = "file".to_string();
        assert!(device_from_config(&config).is_err());

        config.device.position_file = "/run/location/fix.json".to_string();
        assert!(matches!(device_from_config(&config).unwrap(), ConfiguredDevice::File(_)));
    }

    #[test]
    fn test_unknown_device_source() {
        let mut config = Config::default();
        config.device.source = "gps".to_string();
        assert!(matches!(device_from_config(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config_reads_policy() {
        let mut config = Config::default();
        config.resolve.enrichment_failure = "strict".to_string();
        let geolocator = DefaultGeolocator::from_config(&config).unwrap();
        assert_eq!(geolocator.policy(), EnrichmentPolicy::Strict);

        config.resolve.enrichment_failure = "sometimes".to_string();
        assert!(DefaultGeolocator::from_config(&config).is_err());
    }
}
