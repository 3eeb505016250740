//! Device location capability
//!
//! The collaborator that asks the host for a position fix. It may be absent,
//! deny permission, time out, or have nothing to report.

use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Options passed through to the device on each request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOptions {
    /// Ask for the most accurate fix the device can give
    #[serde(default)]
    pub enable_high_accuracy: bool,
    /// Give up after this long; `None` waits indefinitely
    #[serde(default)]
    pub timeout: Option<Duration>,
    /// Accept a cached fix no older than this; `None` accepts any age
    #[serde(default)]
    pub maximum_age: Option<Duration>,
}

/// A fix as reported by the device, with the device's own timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub coords: Coordinates,
    /// Epoch milliseconds according to the device clock
    pub timestamp: i64,
}

/// Why the device could not produce a fix
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    #[error("user denied geolocation permission")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("geolocation request timed out")]
    Timeout,

    #[error("geolocation is not supported")]
    Unsupported,
}

impl PositionError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, PositionError::PermissionDenied)
    }
}

/// Trait for device location capabilities
pub trait DeviceLocator: Send + Sync {
    /// Whether the capability exists in this environment at all
    fn is_available(&self) -> bool;

    /// Request a single position fix
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = std::result::Result<RawPosition, PositionError>> + Send;
}

/// No device capability
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

impl DeviceLocator for NoDevice {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> std::result::Result<RawPosition, PositionError> {
        Err(PositionError::Unsupported)
    }
}

/// A device pinned to configured coordinates
#[derive(Debug, Clone, Copy)]
pub struct FixedDevice {
    coords: Coordinates,
}

impl FixedDevice {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

impl DeviceLocator for FixedDevice {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> std::result::Result<RawPosition, PositionError> {
        Ok(RawPosition {
            coords: self.coords,
            timestamp: crate::geo::now_millis(),
        })
    }
}

/// Reads the latest fix from a JSON file kept up to date by a location daemon
///
/// File format: `{"coords": {"latitude": .., "longitude": .., "accuracy": ..}, "timestamp": ..}`
#[derive(Debug, Clone)]
pub struct PositionFile {
    path: PathBuf,
}

impl PositionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_fix(&self) -> std::result::Result<RawPosition, PositionError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                PositionError::PermissionDenied
            } else {
                PositionError::PositionUnavailable
            }
        })?;

        serde_json::from_str(&content).map_err(|_| PositionError::PositionUnavailable)
    }
}

impl DeviceLocator for PositionFile {
    fn is_available(&self) -> bool {
        self.path.exists()
    }

    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> std::result::Result<RawPosition, PositionError> {
        let position = match options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_fix())
                .await
                .map_err(|_| PositionError::Timeout)??,
            None => self.read_fix().await?,
        };

        if let Some(max_age) = options.maximum_age {
            let age_ms = crate::geo::now_millis().saturating_sub(position.timestamp);
            if age_ms > max_age.as_millis() as i64 {
                return Err(PositionError::PositionUnavailable);
            }
        }

        Ok(position)
    }
}

/// Device capability selected from configuration
#[derive(Debug, Clone)]
pub enum ConfiguredDevice {
    None(NoDevice),
    Fixed(FixedDevice),
    File(PositionFile),
}

impl DeviceLocator for ConfiguredDevice {
    fn is_available(&self) -> bool {
        match self {
            ConfiguredDevice::None(d) => d.is_available(),
            ConfiguredDevice::Fixed(d) => d.is_available(),
            ConfiguredDevice::File(d) => d.is_available(),
        }
    }

    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> std::result::Result<RawPosition, PositionError> {
        match self {
            ConfiguredDevice::None(d) => d.current_position(options).await,
            ConfiguredDevice::Fixed(d) => d.current_position(options).await,
            ConfiguredDevice::File(d) => d.current_position(options).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fix(dir: &TempDir, timestamp: i64) -> PathBuf {
        let path = dir.path().join("position.json");
        let fix = serde_json::json!({
            "coords": {"latitude": 51.5074, "longitude": -0.1278, "accuracy": 12.0},
            "timestamp": timestamp
        });
        std::fs::write(&path, fix.to_string()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_no_device() {
        let device = NoDevice;
        assert!(!device.is_available());
        let err = device.current_position(&PositionOptions::default()).await.unwrap_err();
        assert_eq!(err, PositionError::Unsupported);
    }

    #[tokio::test]
    async fn test_fixed_device() {
        let device = FixedDevice::new(Coordinates::new(40.7128, -74.0060));
        assert!(device.is_available());
        let position = device.current_position(&PositionOptions::default()).await.unwrap();
        assert_eq!(position.coords.latitude, 40.7128);
    }

    #[tokio::test]
    async fn test_position_file() {
        let dir = TempDir::new().unwrap();
        let path = write_fix(&dir, crate::geo::now_millis());
        let device = PositionFile::new(path);

        assert!(device.is_available());
        let position = device.current_position(&PositionOptions::default()).await.unwrap();
        assert_eq!(position.coords.longitude, -0.1278);
        assert_eq!(position.coords.accuracy, Some(12.0));
    }

    #[tokio::test]
    async fn test_position_file_stale_fix() {
        let dir = TempDir::new().unwrap();
        let path = write_fix(&dir, crate::geo::now_millis() - 60_000);
        let device = PositionFile::new(path);

        let options = PositionOptions {
            maximum_age: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let err = device.current_position(&options).await.unwrap_err();
        assert_eq!(err, PositionError::PositionUnavailable);

        // Without a staleness limit the same fix is accepted
        assert!(device.current_position(&PositionOptions::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_position_file_missing() {
        let dir = TempDir::new().unwrap();
        let device = PositionFile::new(dir.path().join("missing.json"));
        assert!(!device.is_available());
        let err = device.current_position(&PositionOptions::default()).await.unwrap_err();
        assert_eq!(err, PositionError::PositionUnavailable);
    }

    #[tokio::test]
    async fn test_position_file_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("position.json");
        std::fs::write(&path, "not json").unwrap();
        let err = PositionFile::new(path)
            .current_position(&PositionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, PositionError::PositionUnavailable);
    }

    #[test]
    fn test_permission_denied_predicate() {
        assert!(PositionError::PermissionDenied.is_permission_denied());
        assert!(!PositionError::Timeout.is_permission_denied());
    }
}
