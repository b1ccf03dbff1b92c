use std::collections::BTreeMap;

/// Image URL (in any form seen in the page) -> path relative to the documents root.
pub type ImageMap = BTreeMap<String, String>;

/// Replace every literal occurrence of a mapped URL with its local path.
///
/// The text is scanned once from left to right. At each position the keys are
/// tried longest first, so a URL that is a substring of another mapped URL never
/// clips the longer one, and text that was just substituted is never matched again.
pub fn rewrite_image_urls(text: &str, image_map: &ImageMap) -> String {
    let mut keys: Vec<(&str, &str)> = image_map
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, path)| (key.as_str(), path.as_str()))
        .collect();
    if keys.is_empty() {
        return text.to_string();
    }
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        match keys.iter().find(|(key, _)| rest.starts_with(key)) {
            Some((key, path)) => {
                out.push_str(path);
                rest = &rest[key.len()..];
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    out
}
