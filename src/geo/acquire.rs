//! Device location acquisition
//!
//! Asks the device for a fix and falls back to the IP locator when the
//! capability is missing or the request fails.

use crate::error::{Error, Result};
use crate::geo::device::{DeviceLocator, PositionError, PositionOptions};
use crate::geo::ip_location::IpLocator;
use crate::geo::loader::ResourceLoader;
use crate::geo::{CurrentLocation, LocationResult};
use std::sync::Arc;
use tracing::debug;

/// Acquisition states, in the order a request moves through them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    Requesting,
    Resolved,
    Unsupported,
    FallbackToIp,
}

/// Where an acquisition ended up
#[derive(Debug, Clone, PartialEq)]
pub enum Acquired {
    /// Device fix, not yet enriched
    Device(LocationResult),
    /// IP lookup result; never enriched
    Ip(LocationResult),
}

impl Acquired {
    pub fn into_location(self) -> LocationResult {
        match self {
            Acquired::Device(location) | Acquired::Ip(location) => location,
        }
    }
}

/// Device acquirer with IP fallback
#[derive(Debug)]
pub struct Acquirer<D, L> {
    device: D,
    ip: Arc<IpLocator<L>>,
    current: CurrentLocation,
}

impl<D: DeviceLocator, L: ResourceLoader> Acquirer<D, L> {
    pub fn new(device: D, ip: Arc<IpLocator<L>>, current: CurrentLocation) -> Self {
        Self { device, ip, current }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Acquire a location
    ///
    /// The device is asked at most once. When it is missing or fails and
    /// `allow_ip_fallback` is set, the IP locator answers instead and the
    /// device's reason is dropped; otherwise the device error is returned.
    pub async fn acquire(&self, allow_ip_fallback: bool, options: &PositionOptions) -> Result<Acquired> {
        self.current.reset().await;
        debug!(state = ?AcquisitionState::Idle, "acquisition started");

        if !self.device.is_available() {
            debug!(state = ?AcquisitionState::Unsupported, "no device location capability");
            return self.fall_back(allow_ip_fallback, PositionError::Unsupported).await;
        }

        debug!(state = ?AcquisitionState::Requesting, ?options, "requesting device position");
        match self.device.current_position(options).await {
            Ok(position) => {
                // The device clock is not trusted; from_device stamps our own time.
                let location = LocationResult::from_device(position.coords);
                debug!(state = ?AcquisitionState::Resolved, "device position acquired");
                self.current.publish(location.clone()).await;
                Ok(Acquired::Device(location))
            }
            Err(reason) => self.fall_back(allow_ip_fallback, reason).await,
        }
    }

    async fn fall_back(&self, allow_ip_fallback: bool, reason: PositionError) -> Result<Acquired> {
        if !allow_ip_fallback {
            return Err(Error::DeviceLocation(reason));
        }

        debug!(state = ?AcquisitionState::FallbackToIp, %reason, "falling back to IP lookup");
        self.ip.locate().await.map(Acquired::Ip)
    }
}
