//! source-metadata — resolves titles and favicons for URLs cited as sources.
//!
//! One [`MetadataCache`] is built at startup and shared by handle. Renderers
//! call [`MetadataCache::prefetch`] for each citation they show, read back with
//! [`MetadataCache::get_metadata`], and re-read when [`MetadataCache::subscribe`]
//! fires.

pub mod cache;
pub mod coalescer;
pub mod config;
pub mod entry;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod guard;
pub mod resolver;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::MetadataCache;
pub use coalescer::{CoalescePolicy, UpdateCoalescer};
pub use config::MetadataConfig;
pub use entry::{Favicon, Glyph, MetadataEntry};
pub use error::{MetadataError, Result};
pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use guard::{Admission, FetchGuard, Flight, FlightTicket};
pub use resolver::MetadataResolver;
pub use store::MetadataStore;
