// Resolution pipeline: scheme check → fetch → title → favicon, with fallbacks.
//
// Infallible by construction. Every failure becomes a terminal entry:
// - non-HTTP scheme: document entry, no network
// - transport failure: hostname title, no favicon, error=false
// - bad status / body / URL: hostname title, no favicon, error=true

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::entry::MetadataEntry;
use crate::error::Result;
use crate::extract::{extract_page_meta, hostname, resolve_favicon};
use crate::fetcher::PageFetcher;

pub struct MetadataResolver {
    fetcher: Arc<dyn PageFetcher>,
}

impl MetadataResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Produce the terminal entry for `url`.
    pub async fn resolve(&self, url: &str) -> MetadataEntry {
        if !is_http_url(url) {
            info!(url, "metadata: non-http source, using document glyph");
            return MetadataEntry::document(url);
        }

        let source = match Url::parse(url) {
            Ok(parsed) if parsed.host_str().is_some() => parsed,
            Ok(_) => {
                warn!(url, "metadata: url has no host");
                return MetadataEntry::failed(url.to_string());
            }
            Err(e) => {
                warn!(url, error = %e, "metadata: unparseable url");
                return MetadataEntry::failed(url.to_string());
            }
        };
        let fallback_title = hostname(&source).unwrap_or_else(|| url.to_string());

        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) if e.is_soft() => {
                info!(url, fetcher = self.fetcher.name(), error = %e, "metadata: fetch unreachable, falling back to hostname");
                return MetadataEntry::degraded(fallback_title);
            }
            Err(e) => {
                warn!(url, fetcher = self.fetcher.name(), error = %e, "metadata: fetch failed");
                return MetadataEntry::failed(fallback_title);
            }
        };

        match build_entry(&source, &html, &fallback_title) {
            Ok(entry) => {
                info!(url, title = entry.title.as_deref(), "metadata: resolved");
                entry
            }
            Err(e) => {
                warn!(url, error = %e, "metadata: extraction failed");
                MetadataEntry::failed(fallback_title)
            }
        }
    }
}

fn build_entry(source: &Url, html: &str, fallback_title: &str) -> Result<MetadataEntry> {
    let meta = extract_page_meta(html);
    let favicon = resolve_favicon(source, meta.icon_href.as_deref())?;
    let title = meta.title.unwrap_or_else(|| fallback_title.to_string());
    Ok(MetadataEntry::resolved(title, favicon))
}

/// True for URLs starting with `http://` or `https://`, case-insensitively.
pub fn is_http_url(url: &str) -> bool {
    let has_prefix = |prefix: &str| {
        url.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    has_prefix("http://") || has_prefix("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_schemes_are_detected() {
        assert!(is_http_url("https://example.com"));
        assert!(is_http_url("http://example.com/a"));
        assert!(is_http_url("HTTPS://EXAMPLE.COM"));
    }

    #[test]
    fn other_references_are_not_http() {
        assert!(!is_http_url("report.pdf"));
        assert!(!is_http_url("file:///tmp/notes.md"));
        assert!(!is_http_url("ftp://example.com/file"));
        assert!(!is_http_url("httpx://example.com"));
        assert!(!is_http_url(""));
        assert!(!is_http_url("ht"));
    }

    #[test]
    fn multibyte_prefix_does_not_panic() {
        assert!(!is_http_url("héllo wörld"));
    }

    #[test]
    fn build_entry_falls_back_to_hostname_and_favicon_ico() {
        let source = Url::parse("https://example.com/post").unwrap();
        let entry = build_entry(&source, "<p>no head</p>", "example.com").unwrap();
        assert_eq!(entry, MetadataEntry::resolved(
            "example.com".into(),
            "https://example.com/favicon.ico".into()
        ));
    }
}
