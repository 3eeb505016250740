//! External resource loading
//!
//! Fetches a remote resource once per call. Hosts signal completion in two
//! different ways (a polled ready state, or a direct load event); both are
//! adapted onto a single [`LoadEvent`] and a [`Completion`] latch makes sure
//! only one of them counts.

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Ready-state values reported by hosts that poll for completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Uninitialized,
    Loading,
    Loaded,
    Interactive,
    Complete,
}

/// A raw completion signal from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    ReadyStateChange(ReadyState),
    Load,
    Error,
}

/// The unified "resource finished loading" event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    Finished,
    Failed,
}

/// Maps one host signalling convention onto [`LoadEvent`]
pub trait CompletionAdapter: Send + Sync {
    fn adapt(&self, signal: HostSignal) -> Option<LoadEvent>;
}

/// Polling convention: finished once the state reaches `Loaded` or `Complete`
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadyStateAdapter;

impl CompletionAdapter for ReadyStateAdapter {
    fn adapt(&self, signal: HostSignal) -> Option<LoadEvent> {
        match signal {
            HostSignal::ReadyStateChange(ReadyState::Loaded | ReadyState::Complete) => {
                Some(LoadEvent::Finished)
            }
            HostSignal::Error => Some(LoadEvent::Failed),
            _ => None,
        }
    }
}

/// Direct convention: finished on the load event
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadEventAdapter;

impl CompletionAdapter for LoadEventAdapter {
    fn adapt(&self, signal: HostSignal) -> Option<LoadEvent> {
        match signal {
            HostSignal::Load => Some(LoadEvent::Finished),
            HostSignal::Error => Some(LoadEvent::Failed),
            HostSignal::ReadyStateChange(_) => None,
        }
    }
}

/// Converges any number of host signals into at most one [`LoadEvent`]
pub struct Completion {
    adapters: Vec<Box<dyn CompletionAdapter>>,
    settled: bool,
}

impl Completion {
    /// Latch listening to the given conventions
    pub fn new(adapters: Vec<Box<dyn CompletionAdapter>>) -> Self {
        Self {
            adapters,
            settled: false,
        }
    }

    /// Feed a host signal; returns the event the first time one settles
    pub fn observe(&mut self, signal: HostSignal) -> Option<LoadEvent> {
        if self.settled {
            return None;
        }
        let event = self.adapters.iter().find_map(|a| a.adapt(signal))?;
        self.settled = true;
        Some(event)
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

impl Default for Completion {
    /// Listens to both conventions
    fn default() -> Self {
        Self::new(vec![Box::new(ReadyStateAdapter), Box::new(LoadEventAdapter)])
    }
}

/// A successfully loaded resource
#[derive(Debug, Clone)]
pub struct LoadedResource {
    pub url: String,
    pub body: String,
}

/// Loads remote resources by URL
///
/// Completion is the returned future resolving; there are no global hooks.
pub trait ResourceLoader: Send + Sync {
    /// Load `url`. With `auto_remove`, the loading unit is detached before
    /// the result is handed back; a failed load is always detached.
    fn load(&self, url: &str, auto_remove: bool) -> impl Future<Output = Result<LoadedResource>> + Send;
}

/// An in-flight or retained loading unit
#[derive(Debug, Clone)]
struct AttachedUnit {
    id: u64,
    url: String,
}

/// HTTP-backed resource loader
#[derive(Debug)]
pub struct HttpLoader {
    client: reqwest::Client,
    attached: Mutex<Vec<AttachedUnit>>,
    next_id: AtomicU64,
}

impl HttpLoader {
    /// Create a new loader with a default HTTP client
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a loader around an existing HTTP client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            attached: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of loading units currently attached
    pub fn attached_count(&self) -> usize {
        self.attached.lock().map(|units| units.len()).unwrap_or(0)
    }

    /// URLs of the units currently attached, oldest first
    pub fn attached_urls(&self) -> Vec<String> {
        self.attached
            .lock()
            .map(|units| units.iter().map(|u| u.url.clone()).collect())
            .unwrap_or_default()
    }

    fn attach(&self, url: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut units) = self.attached.lock() {
            units.push(AttachedUnit {
                id,
                url: url.to_string(),
            });
        }
        id
    }

    fn detach(&self, id: u64) {
        if let Ok(mut units) = self.attached.lock() {
            units.retain(|u| u.id != id);
        }
    }

    /// Run the transfer, emitting host signals into `completion`
    async fn transfer(&self, url: &str, completion: &mut Completion) -> Option<(LoadEvent, String)> {
        let mut settle = |signal: HostSignal| completion.observe(signal);

        let response = match self.client.get(url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!("{} returned status {}", url, r.status());
                return settle(HostSignal::Error).map(|e| (e, String::new()));
            }
            Err(e) => {
                debug!("request to {} failed: {}", url, e);
                return settle(HostSignal::Error).map(|e| (e, String::new()));
            }
        };
        settle(HostSignal::ReadyStateChange(ReadyState::Loading));

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("reading {} failed: {}", url, e);
                return settle(HostSignal::Error).map(|e| (e, String::new()));
            }
        };

        // Both conventions fire; the latch keeps the first.
        let ready = settle(HostSignal::ReadyStateChange(ReadyState::Complete));
        let load = settle(HostSignal::Load);
        ready.or(load).map(|e| (e, body))
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader for HttpLoader {
    async fn load(&self, url: &str, auto_remove: bool) -> Result<LoadedResource> {
        let id = self.attach(url);
        debug!(url = strip_query(url), auto_remove, "loading resource");

        let mut completion = Completion::default();
        let outcome = self.transfer(url, &mut completion).await;

        match outcome {
            Some((LoadEvent::Finished, body)) => {
                if auto_remove {
                    self.detach(id);
                }
                Ok(LoadedResource {
                    url: url.to_string(),
                    body,
                })
            }
            _ => {
                // Failed units are never retained.
                self.detach(id);
                Err(Error::LoadFailure {
                    url: strip_query(url).to_string(),
                })
            }
        }
    }
}

/// Drop everything from the first `?` onwards
pub fn strip_query(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}
