// Single-flight admission for URL resolutions.
//
// One leader per URL runs the pipeline; concurrent callers join its flight and
// receive the same outcome. URLs already present in the store are never
// re-admitted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::debug;

use crate::entry::MetadataEntry;
use crate::store::MetadataStore;

type Outcome = Option<MetadataEntry>;

#[derive(Debug, Default)]
pub struct FetchGuard {
    in_flight: Mutex<HashMap<String, watch::Sender<Outcome>>>,
}

/// Result of asking the guard whether a resolution may start.
#[derive(Debug)]
pub enum Admission {
    /// Already resolved (or failed); read the entry, do not fetch.
    Cached(MetadataEntry),
    /// Another task is resolving this URL.
    Joined(Flight),
    /// The caller owns the resolution and must complete the ticket.
    Leader(FlightTicket),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Leader(_))
    }
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the in-flight map and the store under one lock and decide who runs.
    pub fn admit(self: &Arc<Self>, url: &str, store: &Arc<MetadataStore>) -> Admission {
        let mut in_flight = self.lock();

        if let Some(tx) = in_flight.get(url) {
            return Admission::Joined(Flight { rx: tx.subscribe() });
        }
        if let Some(entry) = store.get(url) {
            return Admission::Cached(entry);
        }

        let (tx, _) = watch::channel(None);
        in_flight.insert(url.to_string(), tx);
        debug!(url, "fetch guard: admitted");

        Admission::Leader(FlightTicket {
            url: url.to_string(),
            guard: Arc::clone(self),
            store: Arc::clone(store),
            finished: false,
        })
    }

    /// Drop `url` from the in-flight set. Safe to call for unknown URLs.
    pub fn release(&self, url: &str) {
        self.lock().remove(url);
    }

    pub fn is_in_flight(&self, url: &str) -> bool {
        self.lock().contains_key(url)
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().len()
    }

    /// Remove a stored entry unless a resolution for it is running.
    pub fn invalidate(&self, url: &str, store: &MetadataStore) -> bool {
        let in_flight = self.lock();
        if in_flight.contains_key(url) {
            return false;
        }
        store.remove(url).is_some()
    }

    fn finish(&self, url: &str, outcome: Outcome) {
        let tx = self.lock().remove(url);
        if let Some(tx) = tx {
            tx.send_replace(outcome);
        }
    }

    // Clears a leftover `loading` placeholder under the guard lock, so no admit
    // can observe the URL as neither in flight nor resolved-but-loading.
    fn abandon(&self, url: &str, store: &MetadataStore) {
        let tx = {
            let mut in_flight = self.lock();
            if store.get(url).is_some_and(|entry| entry.loading) {
                store.remove(url);
            }
            in_flight.remove(url)
        };
        drop(tx);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, watch::Sender<Outcome>>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle held by a caller that joined someone else's resolution.
#[derive(Debug)]
pub struct Flight {
    rx: watch::Receiver<Outcome>,
}

impl Flight {
    /// Wait for the leader's terminal entry. `None` if the leader went away
    /// without completing.
    pub async fn wait(mut self) -> Option<MetadataEntry> {
        loop {
            let current = self.rx.borrow_and_update().clone();
            if current.is_some() {
                return current;
            }
            if self.rx.changed().await.is_err() {
                return None;
            }
        }
    }
}

/// Ownership of one in-flight resolution. Completing or dropping it releases
/// the URL, so every exit path (including a panic) frees the slot. Dropping it
/// uncompleted also removes the `loading` placeholder so the URL can be
/// resolved again.
#[derive(Debug)]
pub struct FlightTicket {
    url: String,
    guard: Arc<FetchGuard>,
    store: Arc<MetadataStore>,
    finished: bool,
}

impl FlightTicket {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Publish the terminal entry to joined callers and release the URL.
    pub fn complete(mut self, entry: MetadataEntry) {
        self.guard.finish(&self.url, Some(entry));
        self.finished = true;
    }
}

impl Drop for FlightTicket {
    fn drop(&mut self) {
        if !self.finished {
            debug!(url = self.url.as_str(), "fetch guard: ticket dropped before completion");
            self.guard.abandon(&self.url, &self.store);
        }
    }
}
