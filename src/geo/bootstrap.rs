//! Mapping provider bootstrap
//!
//! Makes sure the mapping library is initialized before any geocoding call.
//! The loader script and the maps module are each fetched at most once per
//! process; once both are in, `ensure_loaded` costs nothing.

use crate::constants::api::{MAPS_LOADER_URL, MAPS_MODULE_URL};
use crate::constants::maps::MAPS_VERSION;
use crate::error::Result;
use crate::geo::loader::ResourceLoader;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// How far the mapping library has been initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Nothing loaded yet
    Cold,
    /// Generic loader present, maps module missing
    LoaderReady,
    /// Maps module initialized
    MapsReady,
}

/// Where to fetch the mapping library from
#[derive(Debug, Clone)]
pub struct MapsEndpoints {
    pub loader_url: String,
    pub module_url: String,
    pub version: String,
    pub api_key: Option<String>,
}

impl Default for MapsEndpoints {
    fn default() -> Self {
        Self {
            loader_url: MAPS_LOADER_URL.to_string(),
            module_url: MAPS_MODULE_URL.to_string(),
            version: MAPS_VERSION.to_string(),
            api_key: None,
        }
    }
}

impl MapsEndpoints {
    /// URL requesting the maps module at the pinned version
    pub fn module_request_url(&self) -> String {
        match self.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => format!("{}?v={}&key={}", self.module_url, self.version, key),
            None => format!("{}?v={}", self.module_url, self.version),
        }
    }
}

/// Idempotent loader for the mapping library
#[derive(Debug)]
pub struct MapsBootstrap<L> {
    loader: Arc<L>,
    endpoints: MapsEndpoints,
    state: Mutex<BootstrapState>,
}

impl<L: ResourceLoader> MapsBootstrap<L> {
    pub fn new(loader: Arc<L>, endpoints: MapsEndpoints) -> Self {
        Self::with_state(loader, endpoints, BootstrapState::Cold)
    }

    /// Start from a known state, e.g. when the loader is already present
    pub fn with_state(loader: Arc<L>, endpoints: MapsEndpoints, state: BootstrapState) -> Self {
        Self {
            loader,
            endpoints,
            state: Mutex::new(state),
        }
    }

    pub async fn state(&self) -> BootstrapState {
        *self.state.lock().await
    }

    /// Ensure the maps module is initialized
    ///
    /// Concurrent callers wait on the same lock, so a cold start performs a
    /// single loader fetch and a single module fetch. A failure leaves the
    /// state where it stopped; the next call picks up from there.
    pub async fn ensure_loaded(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        if *state == BootstrapState::MapsReady {
            return Ok(());
        }

        if *state == BootstrapState::Cold {
            debug!("loading maps loader from {}", self.endpoints.loader_url);
            self.loader.load(&self.endpoints.loader_url, false).await?;
            *state = BootstrapState::LoaderReady;
        }

        debug!("requesting maps module v{}", self.endpoints.version);
        self.loader
            .load(&self.endpoints.module_request_url(), false)
            .await?;
        *state = BootstrapState::MapsReady;
        info!("maps module v{} ready", self.endpoints.version);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::geo::loader::LoadedResource;
    use std::sync::Mutex as StdMutex;

    /// Records every URL it is asked to load, yielding once per load so
    /// concurrent callers interleave
    #[derive(Default)]
    struct RecordingLoader {
        urls: StdMutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingLoader {
        fn urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    impl ResourceLoader for RecordingLoader {
        async fn load(&self, url: &str, _auto_remove: bool) -> Result<LoadedResource> {
            tokio::task::yield_now().await;
            self.urls.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(Error::LoadFailure { url: url.to_string() });
            }
            Ok(LoadedResource {
                url: url.to_string(),
                body: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_cold_start_loads_loader_then_module() {
        let loader = Arc::new(RecordingLoader::default());
        let bootstrap = MapsBootstrap::new(loader.clone(), MapsEndpoints::default());

        bootstrap.ensure_loaded().await.unwrap();

        assert_eq!(
            loader.urls(),
            vec![
                "https://www.google.com/jsapi".to_string(),
                "https://maps.googleapis.com/maps/api/js?v=3.23".to_string(),
            ]
        );
        assert_eq!(bootstrap.state().await, BootstrapState::MapsReady);
    }

    #[tokio::test]
    async fn test_second_call_is_free() {
        let loader = Arc::new(RecordingLoader::default());
        let bootstrap = MapsBootstrap::new(loader.clone(), MapsEndpoints::default());

        bootstrap.ensure_loaded().await.unwrap();
        bootstrap.ensure_loaded().await.unwrap();

        assert_eq!(loader.urls().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_cold_start_loads_once() {
        let loader = Arc::new(RecordingLoader::default());
        let bootstrap = MapsBootstrap::new(loader.clone(), MapsEndpoints::default());

        let (first, second) = tokio::join!(bootstrap.ensure_loaded(), bootstrap.ensure_loaded());
        first.unwrap();
        second.unwrap();

        assert_eq!(
            loader.urls(),
            vec![
                "https://www.google.com/jsapi".to_string(),
                "https://maps.googleapis.com/maps/api/js?v=3.23".to_string(),
            ]
        );
        assert_eq!(bootstrap.state().await, BootstrapState::MapsReady);
    }

    #[tokio::test]
    async fn test_loader_present_requests_module_only() {
        let loader = Arc::new(RecordingLoader::default());
        let bootstrap = MapsBootstrap::with_state(
            loader.clone(),
            MapsEndpoints::default(),
            BootstrapState::LoaderReady,
        );

        bootstrap.ensure_loaded().await.unwrap();

        assert_eq!(loader.urls(), vec!["https://maps.googleapis.com/maps/api/js?v=3.23".to_string()]);
    }

    #[tokio::test]
    async fn test_already_ready_makes_no_request() {
        let loader = Arc::new(RecordingLoader::default());
        let bootstrap = MapsBootstrap::with_state(
            loader.clone(),
            MapsEndpoints::default(),
            BootstrapState::MapsReady,
        );

        bootstrap.ensure_loaded().await.unwrap();
        assert!(loader.urls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_propagates_and_keeps_state() {
        let loader = Arc::new(RecordingLoader {
            fail: true,
            ..Default::default()
        });
        let bootstrap = MapsBootstrap::new(loader.clone(), MapsEndpoints::default());

        let err = bootstrap.ensure_loaded().await.unwrap_err();
        assert!(matches!(err, Error::LoadFailure { .. }));
        assert_eq!(bootstrap.state().await, BootstrapState::Cold);
        assert_eq!(loader.urls().len(), 1);
    }

    #[test]
    fn test_module_request_url_with_key() {
        let endpoints = MapsEndpoints {
            api_key: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(
            endpoints.module_request_url(),
            "https://maps.googleapis.com/maps/api/js?v=3.23&key=abc"
        );

        let empty_key = MapsEndpoints {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(!empty_key.module_request_url().contains("key="));
    }
}
