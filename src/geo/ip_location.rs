//! IP-based geolocation
//!
//! The terminal fallback of a resolution. The lookup endpoint answers with a
//! location object for the caller's IP, either as plain JSON (ip-api.com) or
//! as a `Geo = {...};` script assignment (geoiplookup). No geocoding is ever
//! done on these results.

use crate::constants::api::IP_API_URL;
use crate::error::{Error, Result};
use crate::geo::loader::ResourceLoader;
use crate::geo::{Coordinates, CurrentLocation, IpDetails, LocationResult};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{debug, info};

const NO_LOCATION: &str = "Could not get location.";

/// IP location service
#[derive(Debug)]
pub struct IpLocator<L> {
    loader: Arc<L>,
    endpoint: String,
    current: CurrentLocation,
}

/// The location object published by the lookup service
///
/// Every field is read leniently: a value of an unexpected type is coerced
/// or dropped, never fatal.
#[derive(Debug, Default, Deserialize)]
struct IpPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    region: Option<String>,
    #[serde(default, rename = "regionName", deserialize_with = "lenient_string")]
    region_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    country: Option<String>,
    #[serde(default, rename = "countryCode", deserialize_with = "lenient_string")]
    country_code: Option<String>,
    #[serde(
        default,
        rename = "query",
        alias = "IP",
        alias = "ip",
        deserialize_with = "lenient_string"
    )]
    ip: Option<String>,
}

impl IpPayload {
    /// Only an explicit `fail` status counts as a failed lookup
    fn succeeded(&self) -> bool {
        self.status
            .as_deref()
            .map_or(true, |s| !s.eq_ignore_ascii_case("fail"))
    }

    fn into_location(self) -> LocationResult {
        let coordinates = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };

        let details = IpDetails {
            ip: self.ip,
            city: self.city,
            region: self.region_name.or(self.region),
            country: self.country,
            country_code: self.country_code,
        };

        LocationResult::from_ip(coordinates, details)
    }
}

/// Accepts numbers and numeric strings ("39.04")
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts strings, numbers and booleans as text; anything else reads as unset
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Pull the location object out of a response body
///
/// Returns `None` when the body never populated an object.
fn extract_object(body: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let body = body.trim();
    let object = if body.starts_with('{') {
        body
    } else {
        let (_, rhs) = body.split_once('=')?;
        rhs.trim()
    };
    let object = object.trim_end_matches(';').trim();

    match serde_json::from_str::<serde_json::Value>(object).ok()? {
        serde_json::Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    }
}

/// Interpret a lookup response as a location
fn parse_payload(body: &str) -> Result<LocationResult> {
    let object = extract_object(body).ok_or_else(|| Error::IpLookup(NO_LOCATION.to_string()))?;

    let payload: IpPayload = serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| Error::IpLookup(format!("Malformed location object: {}", e)))?;

    if !payload.succeeded() {
        let message = payload.message.unwrap_or_else(|| NO_LOCATION.to_string());
        return Err(Error::IpLookup(message));
    }

    Ok(payload.into_location())
}

impl<L: ResourceLoader> IpLocator<L> {
    /// Create an IP locator against the default endpoint
    pub fn new(loader: Arc<L>, current: CurrentLocation) -> Self {
        Self::with_endpoint(loader, IP_API_URL, current)
    }

    /// Create an IP locator against a specific endpoint
    pub fn with_endpoint(loader: Arc<L>, endpoint: impl Into<String>, current: CurrentLocation) -> Self {
        Self {
            loader,
            endpoint: endpoint.into(),
            current,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get current location based on IP address
    pub async fn locate(&self) -> Result<LocationResult> {
        let resource = self.loader.load(&self.endpoint, true).await?;

        self.current.reset().await;
        debug!("IP lookup answered {} bytes", resource.body.len());

        let location = parse_payload(&resource.body)?;
        info!(
            "IP location resolved: {:?}",
            location.coordinates().map(|c| (c.latitude, c.longitude))
        );

        self.current.publish(location.clone()).await;
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LocationSource;

    #[test]
    fn test_parse_ip_api_success() {
        let body = r#"{"status":"success","country":"United States","countryCode":"US",
            "region":"CA","regionName":"California","city":"Mountain View",
            "lat":37.4192,"lon":-122.0574,"query":"8.8.8.8"}"#;

        let location = parse_payload(body).unwrap();
        assert_eq!(location.source(), LocationSource::Ip);
        let coords = location.coordinates().unwrap();
        assert!((coords.latitude - 37.4192).abs() < 1e-9);

        let ip = location.ip().unwrap();
        assert_eq!(ip.city.as_deref(), Some("Mountain View"));
        assert_eq!(ip.region.as_deref(), Some("California"));
        assert_eq!(ip.country_code.as_deref(), Some("US"));
        assert_eq!(ip.ip.as_deref(), Some("8.8.8.8"));
        assert!(location.address().is_none());
        assert!(location.formatted_address().is_none());
    }

    #[test]
    fn test_parse_ip_api_failure_carries_message() {
        let body = r#"{"status":"fail","message":"private range","query":"10.0.0.1"}"#;
        match parse_payload(body) {
            Err(Error::IpLookup(msg)) => assert_eq!(msg, "private range"),
            other => panic!("expected IpLookup error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_script_assignment() {
        let body = r#"Geo = {"city":"Ashburn","country":"US","region":"VA","IP":"203.0.113.7","lat":"39.0469","lon":"-77.4903"};"#;

        let location = parse_payload(body).unwrap();
        let coords = location.coordinates().unwrap();
        assert!((coords.longitude - (-77.4903)).abs() < 1e-9);
        assert_eq!(location.ip().unwrap().region.as_deref(), Some("VA"));
        assert_eq!(location.ip().unwrap().ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_parse_without_coordinates() {
        let location = parse_payload(r#"{"country":"DE"}"#).unwrap();
        assert!(location.coordinates().is_none());
        assert_eq!(location.ip().unwrap().country.as_deref(), Some("DE"));
    }

    #[test]
    fn test_parse_mixed_value_types() {
        let body = r#"{"city":"Ashburn","country":1,"countryCode":null,"region":["VA"],
            "status":200,"lat":"39.0","lon":-77.4,"IP":true}"#;

        let location = parse_payload(body).unwrap();
        let coords = location.coordinates().unwrap();
        assert!((coords.latitude - 39.0).abs() < 1e-9);
        assert!((coords.longitude - (-77.4)).abs() < 1e-9);

        let ip = location.ip().unwrap();
        assert_eq!(ip.city.as_deref(), Some("Ashburn"));
        assert_eq!(ip.country.as_deref(), Some("1"));
        assert_eq!(ip.country_code, None);
        assert_eq!(ip.region, None);
        assert_eq!(ip.ip.as_deref(), Some("true"));
    }

    #[test]
    fn test_parse_duplicate_keys_is_ip_lookup_error() {
        let body = r#"{"query":"198.51.100.1","ip":"198.51.100.2","city":"Lyon"}"#;
        assert!(matches!(parse_payload(body), Err(Error::IpLookup(_))));
    }

    #[test]
    fn test_parse_unpopulated() {
        for body in ["", "  ", "Geo = undefined;", "{}", "[]", "callback()"] {
            match parse_payload(body) {
                Err(Error::IpLookup(msg)) => assert_eq!(msg, NO_LOCATION),
                other => panic!("expected IpLookup error for {:?}, got {:?}", body, other),
            }
        }
    }
}
