use std::path::PathBuf;

use clap::Parser;
use webdocs_cli::{repair_summary, LoggingArgs};
use webdocs_engine::repair_document;

/// Relink optimizer-proxy image references in a saved document to local image files.
///
/// Best effort: problems are printed, the exit status is always success.
#[derive(Debug, Parser)]
#[command(name = "fix_image_refs", version)]
struct Cli {
    /// Markdown document to rewrite in place.
    document: PathBuf,
    /// Slug whose `images/<slug>/` directory (next to the document) holds the files.
    slug: String,
    #[command(flatten)]
    logging: LoggingArgs,
}

fn main() {
    let cli = Cli::parse();
    cli.logging.init();

    match repair_document(&cli.document, &cli.slug) {
        Ok(report) => print!("{}", repair_summary(&cli.document, &report)),
        Err(err) => eprintln!("Error: {err}"),
    }
}
