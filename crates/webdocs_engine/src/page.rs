use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::images::{scan_images, ImageReference};
use crate::slug::slugify;

pub const UNTITLED: &str = "Untitled";

/// A fetched page for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub slug: String,
    pub html: String,
}

impl Document {
    pub fn new(url: impl Into<String>, title: impl Into<String>, html: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            url: url.into(),
            slug: slugify(&title),
            title,
            html: html.into(),
        }
    }
}

/// Parse `html` once, pulling out the title and every image reference.
///
/// The parsed tree does not outlive this call, so the result can be held across
/// `.await` points.
pub fn parse_page(url: &Url, html: String) -> (Document, Vec<ImageReference>) {
    let dom = Html::parse_document(&html);
    let title = extract_title(&dom);
    let references = scan_images(&dom, url);
    (Document::new(url.as_str(), title, html), references)
}

/// Title by priority: first `<h1>`, first `<article>`, `og:title`, `<title>`, then "Untitled".
///
/// Whitespace is collapsed to single spaces; empty candidates fall through.
pub fn extract_title(dom: &Html) -> String {
    first_text(dom, "h1")
        .or_else(|| first_text(dom, "article"))
        .or_else(|| first_attr(dom, r#"meta[property="og:title"]"#, "content"))
        .or_else(|| first_text(dom, "title"))
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn first_element<'a>(dom: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    dom.select(&selector).next()
}

fn first_text(dom: &Html, selector: &str) -> Option<String> {
    first_element(dom, selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

fn first_attr(dom: &Html, selector: &str, attr: &str) -> Option<String> {
    first_element(dom, selector)
        .and_then(|element| element.value().attr(attr))
        .map(collapse_whitespace)
        .filter(|text| !text.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
