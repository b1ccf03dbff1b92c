const FALLBACK_SLUG: &str = "untitled";

/// Kebab-case slug: lowercase alphanumerics separated by single hyphens.
///
/// Whitespace, hyphens and underscores separate words; every other
/// non-alphanumeric character is dropped without splitting the word
/// (`"Don't Panic"` becomes `dont-panic`). A title without any alphanumeric
/// character yields `untitled`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn title_becomes_kebab_case() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Building   Effective -- Agents  "), "building-effective-agents");
    }

    #[test]
    fn punctuation_is_dropped_without_splitting() {
        assert_eq!(slugify("Don't Panic!"), "dont-panic");
        assert_eq!(slugify("Rust: 1.0 (release)"), "rust-10-release");
    }

    #[test]
    fn underscores_act_as_separators() {
        assert_eq!(slugify("snake_case_title"), "snake-case-title");
    }

    #[test]
    fn empty_result_falls_back() {
        assert_eq!(slugify("!!!"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn slugify_is_idempotent() {
        for title in [
            "Hello World",
            "--Leading and trailing--",
            "Ünïcödé Títle",
            "İstanbul",
            "a_b-c d",
            "???",
        ] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "not idempotent for {title:?}");
            assert!(!once.starts_with('-') && !once.ends_with('-'));
            assert!(!once.contains("--"));
            assert!(once.chars().all(|c| c == '-' || (c.is_alphanumeric() && !c.is_uppercase())));
        }
    }
}
