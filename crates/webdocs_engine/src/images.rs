use scraper::{Html, Selector};
use url::Url;
use webdocs_logging::docs_debug;

/// Path marker of the Next.js image optimizer (`/_next/image?url=<encoded>&w=..&q=..`).
pub const PROXY_PATH_PREFIX: &str = "/_next/image";
const PROXY_TARGET_PARAM: &str = "url";

/// One `<img>` found in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// The `src` attribute exactly as written in the markup.
    pub as_seen: String,
    /// `as_seen` made absolute against the page URL.
    pub absolute: String,
    /// The origin URL once any optimizer proxy has been unwrapped.
    pub canonical: String,
}

impl ImageReference {
    /// Every distinct textual form under which this image may appear in converted text.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = vec![self.as_seen.as_str()];
        for key in [self.absolute.as_str(), self.canonical.as_str()] {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

pub fn is_proxy_url(url: &str) -> bool {
    url.contains(PROXY_PATH_PREFIX)
}

/// Unwrap an optimizer proxy URL to the target carried in its `url` query parameter.
///
/// Works on relative (`/_next/image?...`) as well as absolute proxy URLs. Anything
/// that is not a proxy URL, or a proxy URL without a target, is returned unchanged.
pub fn resolve_proxy(url: &str) -> String {
    proxy_target(url).unwrap_or_else(|| url.to_string())
}

fn proxy_target(url: &str) -> Option<String> {
    if !is_proxy_url(url) {
        return None;
    }
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == PROXY_TARGET_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Collect every `<img src>` in document order.
///
/// Images without a usable `src` (missing, blank, `data:` URIs, or not resolvable
/// against `base_url`) are skipped.
pub fn scan_images(document: &Html, base_url: &Url) -> Vec<ImageReference> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .filter_map(|src| image_reference(src, base_url))
        .inspect(|reference| {
            docs_debug!(
                "image {} -> {}",
                reference.as_seen,
                reference.canonical
            );
        })
        .collect()
}

fn image_reference(src: &str, base_url: &Url) -> Option<ImageReference> {
    let as_seen = src.trim();
    if as_seen.is_empty() || as_seen.to_ascii_lowercase().starts_with("data:") {
        return None;
    }
    let absolute = absolutize(as_seen, base_url)?;
    let canonical = match proxy_target(absolute.as_str()) {
        Some(target) if is_http_url(&target) => target,
        // A relative proxy target points at the same origin as the proxy itself.
        Some(target) => absolute.join(&target).ok()?.to_string(),
        None => absolute.to_string(),
    };
    Some(ImageReference {
        as_seen: as_seen.to_string(),
        absolute: absolute.to_string(),
        canonical,
    })
}

fn is_http_url(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn absolutize(reference: &str, base: &Url) -> Option<Url> {
    if is_http_url(reference) {
        return Url::parse(reference).ok();
    }
    base.join(reference).ok()
}
