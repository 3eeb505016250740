//! Location resolution
//!
//! Device position, IP lookup and reverse geocoding, normalized into one
//! [`LocationResult`].

pub mod acquire;
pub mod bootstrap;
pub mod device;
pub mod enrich;
pub mod google;
pub mod ip_location;
pub mod loader;
pub mod normalize;
pub mod resolver;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Which acquirer produced the coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Device,
    Ip,
}

impl std::fmt::Display for LocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationSource::Device => write!(f, "device"),
            LocationSource::Ip => write!(f, "ip"),
        }
    }
}

/// A geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Coordinates {
    /// Create new coordinates without an accuracy estimate
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }

    /// Attach an accuracy radius in meters
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
}

/// Canonical normalized address
///
/// Every field defaults to an empty string when the provider omitted the
/// matching component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDetail {
    pub street: String,
    pub neighborhood: String,
    pub town: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub country_code: String,
    pub postal_code: String,
    pub street_number: String,
}

/// Address data attached by reverse geocoding
///
/// The only way to set an address on a [`LocationResult`], so the formatted
/// address and the structured address always travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub formatted_address: String,
    pub address: AddressDetail,
}

/// Non-coordinate fields reported by the IP lookup service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// The canonical location record
///
/// Deserialization rejects a record carrying only one of `formattedAddress`
/// and `address`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LocationRecord")]
pub struct LocationResult {
    source: LocationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coordinates: Option<Coordinates>,
    timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<AddressDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip: Option<IpDetails>,
}

/// Wire shape of [`LocationResult`], validated on the way in
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationRecord {
    source: LocationSource,
    #[serde(default)]
    coordinates: Option<Coordinates>,
    timestamp: i64,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    address: Option<AddressDetail>,
    #[serde(default)]
    ip: Option<IpDetails>,
}

impl TryFrom<LocationRecord> for LocationResult {
    type Error = String;

    fn try_from(record: LocationRecord) -> std::result::Result<Self, Self::Error> {
        if record.formatted_address.is_some() != record.address.is_some() {
            return Err("formattedAddress and address must be set together".to_string());
        }

        Ok(Self {
            source: record.source,
            coordinates: record.coordinates,
            timestamp: record.timestamp,
            formatted_address: record.formatted_address,
            address: record.address,
            ip: record.ip,
        })
    }
}

impl LocationResult {
    /// Result produced from a device fix, stamped with our own clock
    pub fn from_device(coordinates: Coordinates) -> Self {
        Self {
            source: LocationSource::Device,
            coordinates: Some(coordinates),
            timestamp: now_millis(),
            formatted_address: None,
            address: None,
            ip: None,
        }
    }

    /// Result produced by the IP lookup service
    pub fn from_ip(coordinates: Option<Coordinates>, details: IpDetails) -> Self {
        Self {
            source: LocationSource::Ip,
            coordinates,
            timestamp: now_millis(),
            formatted_address: None,
            address: None,
            ip: Some(details),
        }
    }

    /// Attach reverse-geocoded address data
    pub fn enrich(&mut self, enrichment: Enrichment) {
        self.formatted_address = Some(enrichment.formatted_address);
        self.address = Some(enrichment.address);
    }

    pub fn source(&self) -> LocationSource {
        self.source
    }

    pub fn coordinates(&self) -> Option<&Coordinates> {
        self.coordinates.as_ref()
    }

    /// Epoch milliseconds at which this result was produced
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn formatted_address(&self) -> Option<&str> {
        self.formatted_address.as_deref()
    }

    pub fn address(&self) -> Option<&AddressDetail> {
        self.address.as_ref()
    }

    pub fn ip(&self) -> Option<&IpDetails> {
        self.ip.as_ref()
    }

    /// True once reverse geocoding has attached an address
    pub fn is_enriched(&self) -> bool {
        self.address.is_some()
    }
}

/// The single most recent location, shared by every stage of a resolution
///
/// Reset when an acquisition starts and overwritten when one completes; the
/// last writer wins and no history is kept.
#[derive(Debug, Clone, Default)]
pub struct CurrentLocation {
    inner: Arc<RwLock<Option<LocationResult>>>,
}

impl CurrentLocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current location
    pub async fn get(&self) -> Option<LocationResult> {
        self.inner.read().await.clone()
    }

    pub async fn reset(&self) {
        *self.inner.write().await = None;
    }

    pub async fn publish(&self, location: LocationResult) {
        *self.inner.write().await = Some(location);
    }
}

/// Current wall-clock time in epoch milliseconds
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
