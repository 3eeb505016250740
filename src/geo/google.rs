//! Google geocoding backend
//!
//! Reverse geocoding through the Geocoding REST API. The reply carries a
//! status code and the provider-shaped address components consumed by
//! [`crate::geo::normalize`].

use crate::constants::api::GEOCODE_URL;
use crate::constants::maps::STATUS_OK;
use crate::error::{Error, Result};
use crate::geo::Coordinates;
use serde::Deserialize;
use std::future::Future;

const USER_AGENT: &str = concat!("geolocator/", env!("CARGO_PKG_VERSION"));

/// One address component as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawAddressComponent {
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    /// Category tags, most specific first
    #[serde(default)]
    pub types: Vec<String>,
}

/// One candidate result from the provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub address_components: Vec<RawAddressComponent>,
}

/// A reverse-geocode reply
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocodeReply {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl GeocodeReply {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Trait for reverse geocoding providers
pub trait GeocodingProvider: Send + Sync {
    /// Issue a single reverse-geocode request for `coords`
    fn reverse_geocode(&self, coords: &Coordinates) -> impl Future<Output = Result<GeocodeReply>> + Send;
}

/// Google Geocoding API backend
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    /// Create a new geocoder against the public endpoint
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_endpoint(GEOCODE_URL, api_key)
    }

    /// Create a geocoder against a specific endpoint
    pub fn with_endpoint(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Format coordinates as the `latlng` query value
    fn latlng(coords: &Coordinates) -> String {
        format!("{},{}", coords.latitude, coords.longitude)
    }
}

impl GeocodingProvider for GoogleGeocoder {
    async fn reverse_geocode(&self, coords: &Coordinates) -> Result<GeocodeReply> {
        let mut query = vec![("latlng", Self::latlng(coords))];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Enrichment {
                status: "REQUEST_FAILED".to_string(),
                message: Some(e.to_string()),
            })?;

        if !response.status().is_success() {
            return Err(Error::Enrichment {
                status: format!("HTTP_{}", response.status().as_u16()),
                message: None,
            });
        }

        let reply: GeocodeReply = response.json().await?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlng_format() {
        let coords = Coordinates::new(40.7128, -74.006);
        assert_eq!(GoogleGeocoder::latlng(&coords), "40.7128,-74.006");
    }

    #[test]
    fn test_empty_key_is_dropped() {
        let geocoder = GoogleGeocoder::new(Some(String::new())).unwrap();
        assert!(geocoder.api_key.is_none());
    }

    #[test]
    fn test_reply_deserialization() {
        let json = serde_json::json!({
            "status": "OK",
            "results": [{
                "formatted_address": "742 Evergreen Terrace, Springfield, USA",
                "address_components": [
                    {"long_name": "742", "short_name": "742", "types": ["street_number"]},
                    {"long_name": "Springfield", "short_name": "Springfield", "types": ["locality", "political"]}
                ]
            }]
        });

        let reply: GeocodeReply = serde_json::from_value(json).unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.results.len(), 1);
        assert_eq!(reply.results[0].address_components[1].types[0], "locality");
        assert!(reply.error_message.is_none());
    }

    #[test]
    fn test_reply_not_ok() {
        let json = serde_json::json!({
            "status": "REQUEST_DENIED",
            "results": [],
            "error_message": "You must use an API key to authenticate each request."
        });
        let reply: GeocodeReply = serde_json::from_value(json).unwrap();
        assert!(!reply.is_ok());
        assert!(reply.error_message.is_some());
    }
}
