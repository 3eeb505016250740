//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Default device capability ("none", "fixed" or "file")
pub const DEFAULT_DEVICE_SOURCE: &str = "none";

/// Fall back to IP lookup when the device can't answer
pub const DEFAULT_ALLOW_IP_FALLBACK: bool = true;

/// Default device request timeout in milliseconds (0 = no timeout, unlike the browser API)
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default maximum age of a cached device fix in milliseconds (0 = any age, unlike the browser API)
pub const DEFAULT_MAXIMUM_AGE_MS: u64 = 0;

/// Default behaviour when reverse geocoding fails
pub const DEFAULT_ENRICHMENT_FAILURE: &str = "degrade";

/// Default output format
pub const DEFAULT_FORMAT: &str = "json";

/// Default URL provider
pub const DEFAULT_URL_PROVIDER: &str = "google";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "geolocator";
