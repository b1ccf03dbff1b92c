//! Offline relinking of optimizer-proxy image references in an existing document.
//!
//! Local files are handed out in name order to the proxy references in document
//! order; each file is used at most once. A token is derived from every canonical
//! URL and reported, but it does not take part in choosing the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use url::Url;
use webdocs_logging::docs_debug;

use crate::download::{image_dir, relative_image_path};
use crate::images::resolve_proxy;
use crate::persist::{AtomicFileWriter, PersistError};

const CANDIDATE_PREFIX: &str = "image_";
const CANDIDATE_SUFFIX: &str = ".png";

#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("cannot read document {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot list image directory {path:?}: {source}")]
    ListImages { path: PathBuf, source: io::Error },
    #[error("document path {0:?} has no file name")]
    InvalidPath(PathBuf),
    #[error("cannot write document: {0}")]
    Write(#[from] PersistError),
}

/// A `![alt](/_next/image?url=...)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyImageRef {
    pub alt: String,
    pub proxy_url: String,
}

impl ProxyImageRef {
    fn markdown(&self, target: &str) -> String {
        format!("![{}]({})", self.alt, target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedReference {
    pub reference: ProxyImageRef,
    pub canonical_url: String,
    pub token: Option<String>,
    /// Path relative to the document's directory, when a file was left to assign.
    pub replacement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    NoReferences,
    MissingImageDir(PathBuf),
    Repaired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    pub outcome: RepairOutcome,
    pub found: usize,
    pub fixed: usize,
    pub available_files: usize,
    pub references: Vec<RepairedReference>,
}

impl RepairReport {
    fn without_changes(outcome: RepairOutcome, found: usize) -> Self {
        Self {
            outcome,
            found,
            fixed: 0,
            available_files: 0,
            references: Vec::new(),
        }
    }

    /// True when local files ran out before every reference got one.
    pub fn exhausted(&self) -> bool {
        self.outcome == RepairOutcome::Repaired && self.fixed < self.found
    }
}

fn proxy_image_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"!\[(.*?)\]\((/_next/image\?url=[^)]+)\)").ok())
        .as_ref()
}

/// All proxy-style markdown images in document order, duplicates included.
pub fn find_proxy_image_refs(content: &str) -> Vec<ProxyImageRef> {
    let Some(pattern) = proxy_image_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(content)
        .map(|caps| ProxyImageRef {
            alt: caps[1].to_string(),
            proxy_url: caps[2].to_string(),
        })
        .collect()
}

/// Leading hyphen-delimited part of the last path segment that contains a hyphen,
/// e.g. `952fb04cb836` for `.../952fb04cb836-1200x630.png`.
pub fn cdn_token(canonical_url: &str) -> Option<String> {
    let path = match Url::parse(canonical_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => canonical_url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.rsplit('/')
        .find(|segment| segment.contains('-'))
        .and_then(|segment| segment.split('-').next())
        .map(str::to_string)
}

/// Rewrite proxy image references in `document` to files under `images/{slug}/`.
///
/// Missing image directory and documents without proxy references are reported
/// through [`RepairOutcome`] and leave the file untouched.
pub fn repair_document(document: &Path, slug: &str) -> Result<RepairReport, RepairError> {
    let content = fs::read_to_string(document).map_err(|source| RepairError::Read {
        path: document.to_path_buf(),
        source,
    })?;

    let refs = find_proxy_image_refs(&content);
    if refs.is_empty() {
        docs_debug!("No proxy image references found in {:?}", document);
        return Ok(RepairReport::without_changes(RepairOutcome::NoReferences, 0));
    }
    docs_debug!("Found {} proxy image references in {:?}", refs.len(), document);

    let doc_dir = match document.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let images = image_dir(doc_dir, slug);
    if !images.is_dir() {
        docs_debug!("Images directory not found: {:?}", images);
        return Ok(RepairReport::without_changes(
            RepairOutcome::MissingImageDir(images),
            refs.len(),
        ));
    }

    let candidates = list_candidates(&images)?;
    docs_debug!("Found {} downloaded images in {:?}", candidates.len(), images);

    let mut unclaimed = candidates.iter();
    let mut references = Vec::with_capacity(refs.len());
    let mut updated = content.clone();

    for reference in refs {
        let canonical_url = resolve_proxy(&reference.proxy_url);
        let token = cdn_token(&canonical_url);
        docs_debug!(
            "{} -> {} (token {:?})",
            reference.proxy_url,
            canonical_url,
            token
        );

        let replacement = unclaimed
            .next()
            .map(|filename| relative_image_path(slug, filename));
        match &replacement {
            Some(path) => {
                let old_ref = reference.markdown(&reference.proxy_url);
                updated = updated.replace(&old_ref, &reference.markdown(path));
                docs_debug!("mapped to {}", path);
            }
            None => docs_debug!("No image left for {}", reference.proxy_url),
        }

        references.push(RepairedReference {
            reference,
            canonical_url,
            token,
            replacement,
        });
    }

    if updated != content {
        let filename = document
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| RepairError::InvalidPath(document.to_path_buf()))?;
        AtomicFileWriter::new(doc_dir.to_path_buf()).write(filename, &updated)?;
    }

    let fixed = references.iter().filter(|r| r.replacement.is_some()).count();
    docs_debug!("Fixed {} image references in {:?}", fixed, document);

    Ok(RepairReport {
        outcome: RepairOutcome::Repaired,
        found: references.len(),
        fixed,
        available_files: candidates.len(),
        references,
    })
}

fn list_candidates(dir: &Path) -> Result<Vec<String>, RepairError> {
    let entries = fs::read_dir(dir).map_err(|source| RepairError::ListImages {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with(CANDIDATE_PREFIX) && name.ends_with(CANDIDATE_SUFFIX))
        .collect();
    names.sort();
    Ok(names)
}
