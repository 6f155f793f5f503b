//! sturdywcdl main entry point
//!
//! This is the command-line interface for the sturdy webcomic downloader.

use anyhow::{bail, Context};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use sturdywcdl::config::{load_config_with_hash, validate, Config, SeriesEntry};
use sturdywcdl::crawler::{download, BatchSummary, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PAGES};
use sturdywcdl::RequestContext;
use tracing_subscriber::EnvFilter;

/// sturdywcdl: a sturdy webcomic downloader
///
/// Follows a webcomic page by page, downloads the image on every page, and
/// collects the images into a PDF. Pages whose image cannot be downloaded get
/// an "image missing" page instead, so the PDF always lines up with the comic.
#[derive(Parser, Debug)]
#[command(name = "sturdywcdl")]
#[command(version)]
#[command(about = "A sturdy webcomic downloader", long_about = None)]
#[command(after_help = "Examples:\n  \
    sturdywcdl https://comics.com/webcomic/page1 '#imagepanel' 'a.nextbuttonclass' comic.pdf\n  \
    sturdywcdl https://comics.com/1 '#image' '#next' out.pdf --headers 'authorization' '0qbb83g0ay23guawf9l' 'gdpr' 'consented'\n  \
    sturdywcdl --config batch.toml")]
struct Cli {
    /// URL of the first page of the webcomic
    #[arg(value_name = "FIRST_PAGE_URL", required_unless_present = "config")]
    first_page_url: Option<String>,

    /// CSS selector for the <img> element; its src attribute is downloaded
    #[arg(value_name = "IMAGE_SELECTOR", required_unless_present = "config")]
    image_selector: Option<String>,

    /// CSS selector for the <a> element linking to the next page
    #[arg(value_name = "NEXT_SELECTOR", required_unless_present = "config")]
    next_selector: Option<String>,

    /// Path of the PDF to write
    #[arg(value_name = "OUTPUT_FILE", required_unless_present = "config")]
    output_file: Option<PathBuf>,

    /// Limits the number of pages that will be downloaded
    #[arg(long, alias = "maxPages", default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: usize,

    /// Key value pairs sent as headers with every request (--headers 'key' 'value' ...)
    #[arg(long, num_args = 1.., value_name = "KEY VALUE")]
    headers: Vec<String>,

    /// Also save the raw downloaded images in this directory
    #[arg(long, alias = "imageOutputDir", value_name = "DIR")]
    image_output_dir: Option<PathBuf>,

    /// Attempts per page and per image before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: usize,

    /// Download every series listed in a TOML batch file instead
    #[arg(long, value_name = "CONFIG", conflicts_with_all = ["first_page_url", "headers", "image_output_dir"])]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => single_series_config(&cli)?,
    };

    tracing::info!("===== running! =====");
    let summary = download(&config).await?;
    tracing::info!("===== done! =====");

    print_summary(&summary);

    if summary.failed() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sturdywcdl=info,warn"),
            1 => EnvFilter::new("sturdywcdl=debug,info"),
            2 => EnvFilter::new("sturdywcdl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the configuration for the positional-argument form
fn single_series_config(cli: &Cli) -> anyhow::Result<Config> {
    let (Some(first_page_url), Some(image_selector), Some(next_selector), Some(output_file)) = (
        &cli.first_page_url,
        &cli.image_selector,
        &cli.next_selector,
        &cli.output_file,
    ) else {
        bail!("FIRST_PAGE_URL, IMAGE_SELECTOR, NEXT_SELECTOR and OUTPUT_FILE are required");
    };

    // Rejects odd counts and malformed names before anything is downloaded
    RequestContext::from_flat_args(&cli.headers)?;
    let headers: BTreeMap<String, String> = cli
        .headers
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();

    let name = output_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "webcomic".to_string());

    let mut config = Config::single(SeriesEntry {
        name,
        first_page_url: first_page_url.clone(),
        image_selector: image_selector.clone(),
        next_selector: next_selector.clone(),
        output_file: output_file.clone(),
        image_output_dir: cli.image_output_dir.clone(),
        max_pages: None,
        headers,
    });
    config.download.max_pages = cli.max_pages;
    config.download.max_attempts = cli.max_attempts;

    validate(&config)?;
    Ok(config)
}

/// Prints one line per series
fn print_summary(summary: &BatchSummary) {
    println!();
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(report) => println!(
                "✓ {}: {} pages ({} placeholders), {} -> {}",
                outcome.name,
                report.pages,
                report.placeholders,
                report.termination,
                outcome.output_file.display()
            ),
            Err(e) => println!("✗ {}: {}", outcome.name, e),
        }
    }
    println!(
        "\n{} pages in {:.1}s",
        summary.total_pages(),
        summary.elapsed.as_secs_f64()
    );
}
