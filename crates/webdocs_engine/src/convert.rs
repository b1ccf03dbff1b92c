use std::collections::HashMap;
use std::sync::OnceLock;

use html2md::common::get_tag_attr;
use html2md::{Handle, NodeData, StructuredPrinter, TagHandler, TagHandlerFactory};
use regex::Regex;

/// Turns HTML into Markdown.
///
/// Implementations must keep `[text](href)` links and `![alt](src)` images with the
/// attribute values exactly as written, and must not wrap long lines: image
/// rewriting matches on those literal strings.
pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl Converter for Html2MdConverter {
    fn to_markdown(&self, html: &str) -> String {
        html2md::parse_html_custom(&sanitize_markup(html), &tag_handlers())
    }
}

fn tag_handlers() -> HashMap<String, Box<dyn TagHandlerFactory>> {
    let mut handlers: HashMap<String, Box<dyn TagHandlerFactory>> = HashMap::new();
    handlers.insert("img".to_string(), Box::new(ImageHandler::default));
    for level in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        handlers.insert(level.to_string(), Box::new(AtxHeadingHandler::default));
    }
    for tag in ["head", "title"] {
        handlers.insert(tag.to_string(), Box::new(SkipHandler::default));
    }
    handlers
}

/// Always `![alt](src)`, with `src` as decoded from the attribute, also when
/// `width`, `height` or `align` are present.
#[derive(Default)]
struct ImageHandler;

impl TagHandler for ImageHandler {
    fn handle(&mut self, tag: &Handle, printer: &mut StructuredPrinter) {
        let Some(src) = get_tag_attr(tag, "src") else {
            return;
        };
        let alt = get_tag_attr(tag, "alt").unwrap_or_default();
        printer.append_str(&format!("![{alt}]({src})"));
    }

    fn after_handle(&mut self, _printer: &mut StructuredPrinter) {}
}

/// `# Heading` instead of setext underlines.
#[derive(Default)]
struct AtxHeadingHandler;

impl TagHandler for AtxHeadingHandler {
    fn handle(&mut self, tag: &Handle, printer: &mut StructuredPrinter) {
        let level = match tag.data {
            NodeData::Element { ref name, .. } => name
                .local
                .to_string()
                .trim_start_matches('h')
                .parse::<usize>()
                .unwrap_or(1),
            _ => 1,
        };
        printer.append_str("\n\n");
        printer.append_str(&"#".repeat(level));
        printer.append_str(" ");
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        printer.append_str("\n\n");
    }
}

/// Drops the element together with everything inside it.
#[derive(Default)]
struct SkipHandler;

impl TagHandler for SkipHandler {
    fn handle(&mut self, _tag: &Handle, _printer: &mut StructuredPrinter) {}

    fn after_handle(&mut self, _printer: &mut StructuredPrinter) {}

    fn skip_descendants(&self) -> bool {
        true
    }
}

const NON_CONTENT_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

fn non_content_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        NON_CONTENT_TAGS
            .iter()
            .filter_map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).ok())
            .collect()
    })
}

/// Drop script-like blocks whose raw text would otherwise end up in the body.
pub fn sanitize_markup(html: &str) -> String {
    non_content_patterns()
        .iter()
        .fold(html.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
}
