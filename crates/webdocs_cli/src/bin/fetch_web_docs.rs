use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use webdocs_cli::{retrieve_summary, LoggingArgs};
use webdocs_engine::{Retriever, RetrieverConfig};
use webdocs_logging::docs_error;

/// Fetch a web page, download its images and save it as Markdown with frontmatter.
#[derive(Debug, Parser)]
#[command(name = "fetch_web_docs", version)]
struct Cli {
    /// Page to retrieve.
    url: String,
    /// Documents root; images go to `<ROOT>/images/<slug>/`.
    #[arg(long, default_value = "blogs")]
    root: PathBuf,
    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    #[command(flatten)]
    logging: LoggingArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.logging.init();

    match run(&cli).await {
        Ok(summary) => {
            print!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            docs_error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<String> {
    let mut config = RetrieverConfig::default_with_root(cli.root.clone());
    config.fetch.request_timeout = Duration::from_secs(cli.timeout_secs);

    let retriever = Retriever::new(config).context("failed to set up retriever")?;
    let result = retriever
        .retrieve(&cli.url)
        .await
        .with_context(|| format!("failed to retrieve {}", cli.url))?;
    Ok(retrieve_summary(&result))
}
