//! Reverse-geocoding enrichment
//!
//! Turns device coordinates into the provider's raw address results, making
//! sure the mapping library is bootstrapped first.

use crate::error::{Error, Result};
use crate::geo::bootstrap::MapsBootstrap;
use crate::geo::google::{GeocodeResult, GeocodingProvider};
use crate::geo::loader::ResourceLoader;
use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// What a resolution does when reverse geocoding fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentPolicy {
    /// Deliver the device location without an address
    #[default]
    Degrade,
    /// Fail the resolution with the enrichment error
    Strict,
}

impl FromStr for EnrichmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "degrade" => Ok(EnrichmentPolicy::Degrade),
            "strict" => Ok(EnrichmentPolicy::Strict),
            _ => Err(format!("Unknown enrichment policy: {} (expected degrade or strict)", s)),
        }
    }
}

impl std::fmt::Display for EnrichmentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentPolicy::Degrade => write!(f, "degrade"),
            EnrichmentPolicy::Strict => write!(f, "strict"),
        }
    }
}

/// Reverse geocoder bound to a bootstrapped mapping provider
#[derive(Debug)]
pub struct Enricher<L, G> {
    bootstrap: Arc<MapsBootstrap<L>>,
    geocoder: G,
}

impl<L: ResourceLoader, G: GeocodingProvider> Enricher<L, G> {
    pub fn new(bootstrap: Arc<MapsBootstrap<L>>, geocoder: G) -> Self {
        Self { bootstrap, geocoder }
    }

    /// Reverse geocode `coords`
    ///
    /// Exactly one geocode request per call. A status other than `OK` is
    /// returned as [`Error::Enrichment`].
    pub async fn enrich(&self, coords: &Coordinates) -> Result<Vec<GeocodeResult>> {
        self.bootstrap.ensure_loaded().await?;

        let reply = self.geocoder.reverse_geocode(coords).await?;
        debug!(
            "reverse geocode status {} with {} results",
            reply.status,
            reply.results.len()
        );

        if !reply.is_ok() {
            return Err(Error::Enrichment {
                status: reply.status,
                message: reply.error_message,
            });
        }

        Ok(reply.results)
    }
}
