// MetadataCache: the entry point the rendering layer holds.
// Callers `prefetch(url)` for every citation they display and read back with
// `get_metadata(url)`; `subscribe()` tells them when to re-read.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::coalescer::{CoalescePolicy, UpdateCoalescer};
use crate::config::MetadataConfig;
use crate::entry::MetadataEntry;
use crate::error::Result;
use crate::fetcher::{HttpPageFetcher, PageFetcher};
use crate::guard::{Admission, FetchGuard, FlightTicket};
use crate::resolver::MetadataResolver;
use crate::store::MetadataStore;

struct CacheInner {
    store: Arc<MetadataStore>,
    guard: Arc<FetchGuard>,
    resolver: MetadataResolver,
    coalescer: UpdateCoalescer,
}

/// Shared handle over the store, fetch guard, resolver and coalescer.
/// Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct MetadataCache {
    inner: Arc<CacheInner>,
}

impl MetadataCache {
    pub fn new(fetcher: Arc<dyn PageFetcher>, policy: CoalescePolicy) -> Self {
        let inner = CacheInner {
            store: Arc::new(MetadataStore::new()),
            guard: Arc::new(FetchGuard::new()),
            resolver: MetadataResolver::new(fetcher),
            coalescer: UpdateCoalescer::new(policy),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Cache backed by the reqwest fetcher.
    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        let fetcher = HttpPageFetcher::from_config(config)?;
        Ok(Self::new(Arc::new(fetcher), config.coalesce))
    }

    /// Start resolving `url` in the background. No-op if it is already
    /// resolved or in flight, or if there is no tokio runtime to run it on.
    pub fn prefetch(&self, url: &str) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(url, "metadata: prefetch outside a tokio runtime, skipping");
            return;
        };
        match self.inner.guard.admit(url, &self.inner.store) {
            Admission::Leader(ticket) => {
                self.write(url, MetadataEntry::loading());
                let cache = self.clone();
                runtime.spawn(async move {
                    cache.run(ticket).await;
                });
            }
            Admission::Joined(_) | Admission::Cached(_) => {
                debug!(url, "metadata: prefetch skipped");
            }
        }
    }

    /// Latest known state for `url`. May lag behind the last write until the
    /// next coalesced signal; never blocks on the network.
    pub fn get_metadata(&self, url: &str) -> Option<MetadataEntry> {
        self.inner.store.get(url)
    }

    /// Resolve `url` and wait for the terminal entry, joining an in-flight
    /// resolution if there is one.
    ///
    /// On a tokio runtime the pipeline runs in its own task, so dropping this
    /// future (timeout, `select!`) does not stop it from reaching a terminal write.
    pub async fn resolve(&self, url: &str) -> MetadataEntry {
        match self.inner.guard.admit(url, &self.inner.store) {
            Admission::Cached(entry) => entry,
            Admission::Leader(ticket) => {
                self.write(url, MetadataEntry::loading());
                let Ok(runtime) = Handle::try_current() else {
                    return self.run(ticket).await;
                };
                let cache = self.clone();
                match runtime.spawn(async move { cache.run(ticket).await }).await {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(url, error = %e, "metadata: resolution task did not finish");
                        self.abandoned(url)
                    }
                }
            }
            Admission::Joined(flight) => match flight.wait().await {
                Some(entry) => entry,
                None => {
                    warn!(url, "metadata: joined resolution ended without a result");
                    self.abandoned(url)
                }
            },
        }
    }

    /// Drop the stored entry for `url` so the next prefetch resolves it again.
    /// Returns false if there was nothing to drop or a resolution is running.
    pub fn invalidate(&self, url: &str) -> bool {
        let removed = self.inner.guard.invalidate(url, &self.inner.store);
        if removed {
            debug!(url, "metadata: invalidated");
            self.inner.coalescer.notify();
        }
        removed
    }

    /// Receiver that changes whenever the coalescer decides consumers should re-read.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.coalescer.subscribe()
    }

    pub fn is_in_flight(&self, url: &str) -> bool {
        self.inner.guard.is_in_flight(url)
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    pub fn coalescer(&self) -> &UpdateCoalescer {
        &self.inner.coalescer
    }

    // The terminal write lands before the ticket releases the URL, so a
    // later admit always finds the entry in the store.
    async fn run(&self, ticket: FlightTicket) -> MetadataEntry {
        let url = ticket.url().to_string();
        let entry = self.inner.resolver.resolve(&url).await;
        self.write(&url, entry.clone());
        ticket.complete(entry.clone());
        entry
    }

    // Whatever the store holds now if it is terminal; otherwise a failed entry
    // that is returned but not stored, so the next request resolves again.
    fn abandoned(&self, url: &str) -> MetadataEntry {
        self.get_metadata(url)
            .filter(MetadataEntry::is_terminal)
            .unwrap_or_else(|| MetadataEntry::failed(url.to_string()))
    }

    fn write(&self, url: &str, entry: MetadataEntry) {
        self.inner.store.set(url, entry);
        self.inner.coalescer.notify();
    }
}
