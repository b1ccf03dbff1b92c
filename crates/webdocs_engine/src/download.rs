use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use webdocs_logging::{docs_debug, docs_info, docs_warn};

use crate::filename::image_filename;
use crate::images::ImageReference;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::rewrite::ImageMap;

/// Directory (relative to the documents root) that holds per-slug image folders.
pub const IMAGES_DIR: &str = "images";

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("invalid image url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("http status {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },
    #[error("image {url} exceeds {max_bytes} bytes")]
    TooLarge { url: String, max_bytes: u64 },
    #[error("storage error: {0}")]
    Storage(#[from] PersistError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Relative path, as written into documents, of an image file for `slug`.
pub fn relative_image_path(slug: &str, filename: &str) -> String {
    format!("{IMAGES_DIR}/{slug}/{filename}")
}

/// Downloads images into `{docs_root}/images/{slug}/`.
pub struct ImageDownloader {
    client: reqwest::Client,
    docs_root: PathBuf,
    max_bytes: u64,
}

impl ImageDownloader {
    pub fn new(client: reqwest::Client, docs_root: PathBuf, max_bytes: u64) -> Self {
        Self {
            client,
            docs_root,
            max_bytes,
        }
    }

    pub fn image_dir(&self, slug: &str) -> PathBuf {
        image_dir(&self.docs_root, slug)
    }

    /// Fetch one image and store it; returns the path relative to the documents root.
    ///
    /// The body is streamed into a temp file next to the target and only renamed into
    /// place once complete, so a failed download never leaves a file behind.
    pub async fn download(&self, canonical_url: &str, slug: &str) -> Result<String, DownloadError> {
        let parsed =
            reqwest::Url::parse(canonical_url).map_err(|err| DownloadError::InvalidUrl {
                url: canonical_url.to_string(),
                message: err.to_string(),
            })?;
        let filename = image_filename(canonical_url);
        let writer = AtomicFileWriter::new(self.image_dir(slug));
        let (file, staged) = writer.stage()?.into_parts();

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|err| network_error(canonical_url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: canonical_url.to_string(),
                status: status.as_u16(),
            });
        }
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(self.too_large(canonical_url));
        }

        let mut file = tokio::fs::File::from_std(file);
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| network_error(canonical_url, err))?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(self.too_large(canonical_url));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let target = writer.commit(staged, &filename)?;
        docs_debug!("saved {} ({} bytes) to {:?}", canonical_url, written, target);
        Ok(relative_image_path(slug, &filename))
    }

    /// Download every reference in order and build the URL -> local path map.
    ///
    /// Each success contributes all of its key forms (as seen, absolute, canonical),
    /// all pointing at the same path. Failures are logged and left out. A canonical
    /// URL that appears more than once is only requested once.
    pub async fn process_all(&self, references: &[ImageReference], slug: &str) -> ImageMap {
        let mut map = ImageMap::new();
        let mut attempted: HashMap<&str, Option<String>> = HashMap::new();

        for reference in references {
            let cached = attempted.get(reference.canonical.as_str()).cloned();
            let outcome = match cached {
                Some(previous) => previous,
                None => {
                    let outcome = match self.download(&reference.canonical, slug).await {
                        Ok(path) => Some(path),
                        Err(err) => {
                            docs_warn!("Failed to download image {}: {}", reference.canonical, err);
                            None
                        }
                    };
                    attempted.insert(reference.canonical.as_str(), outcome.clone());
                    outcome
                }
            };

            if let Some(path) = outcome {
                for key in reference.keys() {
                    map.insert(key.to_string(), path.clone());
                }
            }
        }

        let succeeded = attempted.values().filter(|o| o.is_some()).count();
        docs_info!(
            "Downloaded {} of {} images for {}",
            succeeded,
            attempted.len(),
            slug
        );
        map
    }

    fn too_large(&self, url: &str) -> DownloadError {
        DownloadError::TooLarge {
            url: url.to_string(),
            max_bytes: self.max_bytes,
        }
    }
}

pub fn image_dir(docs_root: &Path, slug: &str) -> PathBuf {
    docs_root.join(IMAGES_DIR).join(slug)
}

fn network_error(url: &str, err: reqwest::Error) -> DownloadError {
    DownloadError::Network {
        url: url.to_string(),
        message: err.to_string(),
    }
}
