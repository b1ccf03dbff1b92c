use md5::{Digest, Md5};
use url::Url;

/// Local file name for an image: the URL's last path segment when it carries an
/// extension, otherwise `image_{short_hash(url)}.png`.
///
/// The synthesized name always uses `.png`, whatever the actual image format is.
pub fn image_filename(canonical_url: &str) -> String {
    last_segment(canonical_url)
        .filter(|segment| has_extension(segment))
        .unwrap_or_else(|| format!("image_{}.png", short_hash(canonical_url)))
}

fn last_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
        return None;
    }
    Some(segment.to_string())
}

fn has_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

/// First 8 hex characters of the MD5 of `input`.
pub fn short_hash(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
