use std::path::PathBuf;
use std::sync::Arc;

use url::Url;
use webdocs_logging::{docs_info, docs_warn};

use crate::convert::{Converter, Html2MdConverter};
use crate::decode::decode_html;
use crate::download::ImageDownloader;
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::frontmatter::{build_frontmatter, build_markdown_document, Frontmatter};
use crate::page::parse_page;
use crate::persist::AtomicFileWriter;
use crate::rewrite::rewrite_image_urls;
use crate::{FailureKind, FetchError, RetrieveError};

pub type DateFn = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct RetrieverConfig {
    /// Documents land here; images under `images/{slug}/` beneath it.
    pub docs_root: PathBuf,
    pub document_extension: String,
    pub fetch: FetchSettings,
    /// Date stamped into `retrieved:` (`YYYY-MM-DD`).
    pub retrieved_date: DateFn,
}

impl RetrieverConfig {
    pub fn default_with_root(docs_root: PathBuf) -> Self {
        Self {
            docs_root,
            document_extension: "md".to_string(),
            fetch: FetchSettings::default(),
            retrieved_date: Arc::new(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
        }
    }
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self::default_with_root(PathBuf::from("blogs"))
    }
}

impl std::fmt::Debug for RetrieverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieverConfig")
            .field("docs_root", &self.docs_root)
            .field("document_extension", &self.document_extension)
            .field("fetch", &self.fetch)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedDocument {
    pub slug: String,
    pub frontmatter: Frontmatter,
    pub body: String,
    pub document_path: PathBuf,
    pub images_dir: PathBuf,
    /// Distinct local files referenced by the body.
    pub images_saved: usize,
}

/// Runs fetch -> image download -> convert -> rewrite -> write for one URL.
pub struct Retriever {
    config: RetrieverConfig,
    fetcher: ReqwestFetcher,
    downloader: ImageDownloader,
    converter: Box<dyn Converter>,
}

impl Retriever {
    pub fn new(config: RetrieverConfig) -> Result<Self, RetrieveError> {
        let fetcher = ReqwestFetcher::new(config.fetch.clone()).map_err(RetrieveError::Client)?;
        let downloader = ImageDownloader::new(
            fetcher.client().clone(),
            config.docs_root.clone(),
            config.fetch.max_image_bytes,
        );
        Ok(Self {
            config,
            fetcher,
            downloader,
            converter: Box::new(Html2MdConverter),
        })
    }

    pub fn with_converter(mut self, converter: Box<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub async fn retrieve(&self, url: &str) -> Result<RetrievedDocument, RetrieveError> {
        docs_info!("Fetching content from: {}", url);
        let base_url = Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let output = self.fetcher.fetch(url).await?;
        let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref());
        if decoded.had_replacements {
            docs_warn!(
                "Page {} contained bytes invalid for {}; they were replaced",
                url,
                decoded.encoding_label
            );
        }

        // Relative sources resolve against the address that was actually served.
        let page_url = Url::parse(&output.metadata.final_url).unwrap_or(base_url);
        let (document, references) = parse_page(&page_url, decoded.html);
        docs_info!("Title: {}", document.title);
        docs_info!("Slug: {}", document.slug);
        docs_info!("Found {} image references", references.len());

        let image_map = self.downloader.process_all(&references, &document.slug).await;

        let markdown = self.converter.to_markdown(&document.html);
        let body = rewrite_image_urls(&markdown, &image_map);

        let retrieved = (self.config.retrieved_date)();
        let frontmatter = build_frontmatter(&document.title, url, &retrieved, &body);
        let content = build_markdown_document(&frontmatter, &body);

        let filename = format!("{}.{}", document.slug, self.config.document_extension);
        let writer = AtomicFileWriter::new(self.config.docs_root.clone());
        let document_path = writer.write(&filename, &content)?;
        docs_info!("Saved: {:?}", document_path);

        let mut saved: Vec<&String> = image_map.values().collect();
        saved.sort();
        saved.dedup();

        Ok(RetrievedDocument {
            images_dir: self.downloader.image_dir(&document.slug),
            images_saved: saved.len(),
            slug: document.slug,
            frontmatter,
            body,
            document_path,
        })
    }
}
