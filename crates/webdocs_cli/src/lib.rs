//! Shared pieces of the `fetch_web_docs` and `fix_image_refs` command line tools.
use std::fmt::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use webdocs_engine::{RepairOutcome, RepairReport, RetrievedDocument};
use webdocs_logging::{init, level_for_verbosity, LogDestination};

#[derive(Debug, Clone, Args)]
pub struct LoggingArgs {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Also append log output to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl LoggingArgs {
    pub fn init(&self) {
        let destination = match &self.log_file {
            Some(path) => LogDestination::TerminalAndFile(path.clone()),
            None => LogDestination::Terminal,
        };
        init(destination, level_for_verbosity(self.verbose));
    }
}

pub fn retrieve_summary(result: &RetrievedDocument) -> String {
    format!(
        "Saved: {}\nTitle: {}\nImages: {} saved to {}\n",
        result.document_path.display(),
        result.frontmatter.title,
        result.images_saved,
        result.images_dir.display(),
    )
}

pub fn repair_summary(document: &Path, report: &RepairReport) -> String {
    let mut out = String::new();
    match &report.outcome {
        RepairOutcome::NoReferences => {
            out.push_str("No proxy image URLs found.\n");
            let _ = writeln!(out, "Fixed 0 image references in {}", document.display());
            return out;
        }
        RepairOutcome::MissingImageDir(dir) => {
            let _ = writeln!(out, "Found {} proxy image URLs to fix.", report.found);
            let _ = writeln!(out, "Images directory not found: {}", dir.display());
            return out;
        }
        RepairOutcome::Repaired => {}
    }

    let _ = writeln!(out, "Found {} proxy image URLs to fix.", report.found);
    let _ = writeln!(out, "Found {} downloaded images.", report.available_files);
    for entry in &report.references {
        let _ = writeln!(out, "\nProcessing: {}", entry.reference.proxy_url);
        let _ = writeln!(out, "  Actual URL: {}", entry.canonical_url);
        let _ = writeln!(out, "  CDN token: {}", entry.token.as_deref().unwrap_or("-"));
        match &entry.replacement {
            Some(path) => {
                let _ = writeln!(out, "  Mapped to: {path}");
            }
            None => out.push_str("  Warning: No matching image found!\n"),
        }
    }
    if report.exhausted() {
        let _ = writeln!(
            out,
            "\nWarning: ran out of local images; {} references left unresolved.",
            report.found - report.fixed
        );
    }
    let _ = writeln!(
        out,
        "\nFixed {} of {} image references in {}",
        report.fixed,
        report.found,
        document.display()
    );
    out
}
