use std::sync::OnceLock;

use regex::Regex;

pub const FALLBACK_DESCRIPTION: &str = "Documentation retrieved from web.";
const MAX_DESCRIPTION_CHARS: usize = 200;
const TRUNCATED_DESCRIPTION_CHARS: usize = 197;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    pub title: String,
    pub url: String,
    pub retrieved: String,
    /// Left empty for manual curation.
    pub tags: Vec<String>,
    pub description: String,
}

impl Frontmatter {
    /// YAML-style header block followed by the blank line that separates it from the body.
    pub fn render(&self) -> String {
        format!(
            "---\ntitle: {title}\nurl: {url}\nretrieved: {retrieved}\ntags: [{tags}]\ndescription: {description}\n---\n\n",
            title = self.title,
            url = self.url,
            retrieved = self.retrieved,
            tags = self.tags.join(", "),
            description = self.description,
        )
    }
}

pub fn build_frontmatter(title: &str, source_url: &str, retrieved: &str, body: &str) -> Frontmatter {
    Frontmatter {
        title: title.to_string(),
        url: source_url.to_string(),
        retrieved: retrieved.to_string(),
        tags: Vec::new(),
        description: describe(body),
    }
}

pub fn build_markdown_document(frontmatter: &Frontmatter, body_markdown: &str) -> String {
    format!("{}{}", frontmatter.render(), body_markdown)
}

fn first_paragraph_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)\n\n(.+?)(?:\n\n|\z)").ok())
        .as_ref()
}

fn is_markup_char(c: char) -> bool {
    matches!(c, '#' | '*' | '`' | '[' | ']' | '(' | ')')
}

/// One-line summary: the first paragraph after the first blank line, with
/// Markdown markers stripped and capped at 200 characters.
pub fn describe(body: &str) -> String {
    let paragraph = first_paragraph_pattern()
        .and_then(|re| re.captures(body))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim());

    let Some(paragraph) = paragraph else {
        return FALLBACK_DESCRIPTION.to_string();
    };

    let cleaned: String = paragraph
        .chars()
        .filter(|c| !is_markup_char(*c))
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return FALLBACK_DESCRIPTION.to_string();
    }

    if cleaned.chars().count() > MAX_DESCRIPTION_CHARS {
        let truncated: String = cleaned.chars().take(TRUNCATED_DESCRIPTION_CHARS).collect();
        format!("{truncated}{ELLIPSIS}")
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{build_frontmatter, describe, FALLBACK_DESCRIPTION};
    use pretty_assertions::assert_eq;

    #[test]
    fn description_is_first_paragraph_after_blank_line() {
        let body = "# Title\n\nFirst **bold** paragraph with [a link](https://x.y).\n\nSecond.";
        assert_eq!(describe(body), "First bold paragraph with a linkhttps://x.y.");
    }

    #[test]
    fn long_paragraph_is_truncated_with_ellipsis() {
        let paragraph = "a".repeat(250);
        let description = describe(&format!("Heading\n\n{paragraph}\n\nmore"));
        assert_eq!(description.chars().count(), 200);
        assert_eq!(description, format!("{}...", "a".repeat(197)));
    }

    #[test]
    fn paragraph_of_exactly_200_chars_is_kept() {
        let paragraph = "b".repeat(200);
        assert_eq!(describe(&format!("x\n\n{paragraph}")), paragraph);
    }

    #[test]
    fn missing_paragraph_uses_fallback() {
        assert_eq!(describe("single block without blank line"), FALLBACK_DESCRIPTION);
        assert_eq!(describe("heading\n\n**\n\n"), FALLBACK_DESCRIPTION);
    }

    #[test]
    fn rendered_header_has_fixed_field_order() {
        let fm = build_frontmatter(
            "Hello World",
            "https://example.com/hello",
            "2024-05-06",
            "intro\n\nBody text.",
        );
        assert_eq!(
            fm.render(),
            "---\ntitle: Hello World\nurl: https://example.com/hello\nretrieved: 2024-05-06\ntags: []\ndescription: Body text.\n---\n\n"
        );
    }
}
