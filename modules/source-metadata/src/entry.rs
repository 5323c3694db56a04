use serde::{Deserialize, Serialize};

/// Icon to show next to a cited source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum Favicon {
    /// Absolute URL of the page's icon.
    Url(String),
    /// Local document reference; render a generic document glyph.
    Document,
}

/// What the rendering layer should draw for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph<'a> {
    Favicon(&'a str),
    Document,
    Link,
}

/// Everything known about one cited URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub title: Option<String>,
    pub favicon: Option<Favicon>,
    pub loading: bool,
    pub error: bool,
}

impl MetadataEntry {
    /// Placeholder written the moment a resolution is admitted.
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// Non-HTTP source such as an uploaded file. Never touches the network.
    pub fn document(url: &str) -> Self {
        Self {
            title: Some(url.to_string()),
            favicon: Some(Favicon::Document),
            loading: false,
            error: false,
        }
    }

    pub fn resolved(title: String, favicon: String) -> Self {
        Self {
            title: Some(title),
            favicon: Some(Favicon::Url(favicon)),
            loading: false,
            error: false,
        }
    }

    /// Transport-level failure: usable, just without an icon.
    pub fn degraded(title: String) -> Self {
        Self {
            title: Some(title),
            favicon: None,
            loading: false,
            error: false,
        }
    }

    pub fn failed(title: String) -> Self {
        Self {
            title: Some(title),
            favicon: None,
            loading: false,
            error: true,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.loading
    }

    pub fn glyph(&self) -> Glyph<'_> {
        if self.error {
            return Glyph::Link;
        }
        match &self.favicon {
            Some(Favicon::Url(url)) => Glyph::Favicon(url),
            Some(Favicon::Document) => Glyph::Document,
            None => Glyph::Link,
        }
    }
}
