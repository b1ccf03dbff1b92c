//! Webdocs engine: single-page retrieval, image relocation and Markdown export.
mod convert;
mod decode;
mod download;
mod fetch;
mod filename;
mod frontmatter;
mod images;
mod page;
mod persist;
mod repair;
mod retrieve;
mod rewrite;
mod slug;
mod types;

pub use convert::{sanitize_markup, Converter, Html2MdConverter};
pub use decode::{decode_html, DecodedHtml};
pub use download::{image_dir, relative_image_path, DownloadError, ImageDownloader, IMAGES_DIR};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_USER_AGENT};
pub use filename::{image_filename, short_hash};
pub use frontmatter::{
    build_frontmatter, build_markdown_document, describe, Frontmatter, FALLBACK_DESCRIPTION,
};
pub use images::{is_proxy_url, resolve_proxy, scan_images, ImageReference, PROXY_PATH_PREFIX};
pub use page::{extract_title, parse_page, Document, UNTITLED};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use repair::{
    cdn_token, find_proxy_image_refs, repair_document, ProxyImageRef, RepairError,
    RepairOutcome, RepairReport, RepairedReference,
};
pub use retrieve::{DateFn, RetrievedDocument, Retriever, RetrieverConfig};
pub use rewrite::{rewrite_image_urls, ImageMap};
pub use slug::slugify;
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, RetrieveError};
