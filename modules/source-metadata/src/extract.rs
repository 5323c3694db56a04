// Title and icon extraction from fetched HTML.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static ICON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="icon"]"#).expect("valid selector"));
static SHORTCUT_ICON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="shortcut icon"]"#).expect("valid selector"));

/// Icon hrefs with these schemes are already usable as-is.
const KEPT_SCHEMES: [&str; 3] = ["http", "https", "data"];

/// Title and raw icon href read from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub icon_href: Option<String>,
}

/// Parse `html` and read the `<title>` text and the preferred icon link.
///
/// `rel="icon"` wins over `rel="shortcut icon"`. Empty titles and hrefs count as missing.
pub fn extract_page_meta(html: &str) -> PageMeta {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let icon_href = [&*ICON, &*SHORTCUT_ICON].into_iter().find_map(|selector| {
        document
            .select(selector)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(String::from)
    });

    PageMeta { title, icon_href }
}

/// Absolute favicon URL for `source`: the page's own icon if it declared one,
/// otherwise `<origin>/favicon.ico`. Relative hrefs resolve against the origin.
pub fn resolve_favicon(source: &Url, icon_href: Option<&str>) -> Result<String> {
    let origin = origin_url(source)?;
    let href = icon_href.unwrap_or("/favicon.ico");

    match Url::parse(href) {
        Ok(absolute) if KEPT_SCHEMES.contains(&absolute.scheme()) => Ok(absolute.to_string()),
        // Scheme-looking relative paths such as `localhost:8080/i.png`
        Ok(_) => Ok(origin.join(&format!("./{href}"))?.to_string()),
        Err(_) => Ok(origin.join(href)?.to_string()),
    }
}

/// The URL's host, used as a fallback title.
pub fn hostname(source: &Url) -> Option<String> {
    source.host_str().map(String::from)
}

fn origin_url(source: &Url) -> Result<Url> {
    Ok(Url::parse(&source.origin().ascii_serialization())?)
}
