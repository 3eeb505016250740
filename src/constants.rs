//! Centralized constants for the geolocator crate
//!
//! Provider endpoints and versions shared by the config defaults and the
//! geo modules.

/// External API endpoints
pub mod api {
    /// Generic loader bootstrap script for the mapping library
    pub const MAPS_LOADER_URL: &str = "https://www.google.com/jsapi";

    /// Maps module, requested once the loader is present
    pub const MAPS_MODULE_URL: &str = "https://maps.googleapis.com/maps/api/js";

    /// Google Geocoding REST endpoint (reverse geocoding)
    pub const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

    /// IP geolocation API (free, no key required)
    pub const IP_API_URL: &str = "http://ip-api.com/json";
}

/// Mapping library settings
pub mod maps {
    /// Maps module version requested from the loader
    pub const MAPS_VERSION: &str = "3.23";

    /// Geocoder status meaning the result list is usable
    pub const STATUS_OK: &str = "OK";
}
