//! CLI parsing and orchestration. Parses args, runs the resumable crawl,
//! prints the flag summary, and maps errors to exit codes.

use crate::archive::{self, ArchiveError, DEFAULT_ARCHIVE_FILE_NAME};
use crate::config;
use crate::scraper::{
    self, CrawlError, CrawlOptions, CrawlReport, PoliteClient, ScrapeError, DEFAULT_MIN_CHARS,
};
use clap::Parser;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Scrape(#[from] ScrapeError),

    #[error("{0}")]
    Archive(#[from] ArchiveError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Scrape(_) => 2,
            CliRunError::Archive(_) => 3,
        }
    }
}

impl From<CrawlError> for CliRunError {
    fn from(e: CrawlError) -> Self {
        match e {
            CrawlError::Scrape(e) => CliRunError::Scrape(e),
            CrawlError::Archive(e) => CliRunError::Archive(e),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "chapscrape")]
#[command(about = "Crawl new chapters from a novel contents page into a plain-text archive")]
#[command(
    after_help = "Config file keys (archive_path, user_agent, min_chars, delay_base_ms, delay_jitter_ms, timeout_secs) are read from ./chapscrape.toml or the user config directory. CLI flags override config."
)]
pub struct Args {
    /// Contents page URL listing chapter headings and links.
    pub url: String,

    /// Archive file path. A directory resolves to store_content.txt within it. Default: current directory.
    #[arg(short, long)]
    pub archive: Option<PathBuf>,

    /// Minimum script-character count for a chapter to be archived (default 200).
    #[arg(long)]
    pub min_chars: Option<usize>,

    /// Base delay between requests in milliseconds (overrides config; default 1100).
    #[arg(long)]
    pub delay_base_ms: Option<u64>,

    /// Upper bound of the random jitter added to the delay, in milliseconds (overrides config; default 1400).
    #[arg(long)]
    pub delay_jitter_ms: Option<u64>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Suppress progress output (errors and flags only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Print verbose error chain.
    #[arg(long)]
    pub verbose: bool,

    /// Read the checkpoint and list pending chapters without fetching bodies or writing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Resolve the archive argument: a directory gets the default file name.
fn resolve_archive_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(DEFAULT_ARCHIVE_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Ensure the archive's parent directory exists before crawling anything.
fn validate_archive_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write archive: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let archive_arg: PathBuf = args
        .archive
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.archive_path.clone()))
        .unwrap_or_else(|| PathBuf::from("."));
    let archive_path = resolve_archive_path(&archive_arg);
    validate_archive_path(&archive_path)?;

    let min_chars = args
        .min_chars
        .or_else(|| config.as_ref().and_then(|c| c.min_chars))
        .unwrap_or(DEFAULT_MIN_CHARS);

    let mut builder = PoliteClient::builder();
    if let Some(ms) = args
        .delay_base_ms
        .or_else(|| config.as_ref().and_then(|c| c.delay_base_ms))
    {
        builder = builder.delay_base_ms(ms);
    }
    if let Some(ms) = args
        .delay_jitter_ms
        .or_else(|| config.as_ref().and_then(|c| c.delay_jitter_ms))
    {
        builder = builder.delay_jitter_ms(ms);
    }
    if let Some(secs) = args
        .timeout
        .or_else(|| config.as_ref().and_then(|c| c.timeout_secs))
    {
        builder = builder.timeout_secs(secs);
    }
    if let Some(ua) = args
        .user_agent
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.user_agent.clone()))
    {
        builder = builder.user_agent(ua);
    }
    let mut client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    if args.dry_run {
        let checkpoint = archive::last_heading(&archive_path)?;
        match &checkpoint {
            Some(h) => eprintln!("Checkpoint: {}", h),
            None => eprintln!("Checkpoint: none (fresh archive)"),
        }
        let pending = scraper::discover(&mut client, &args.url, checkpoint.as_deref())?;
        eprintln!("Pending chapters: {}", pending.len());
        for entry in &pending {
            eprintln!("  {}", entry.heading);
        }
        eprintln!("Archive: {}", archive_path.display());
        return Ok(());
    }

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |done: u32, total: u32, heading: &str| {
        if total == 0 {
            return;
        }
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new(total as u64);
            bar.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
                    .unwrap()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                    .progress_chars("█▉▊▋▌▍▎▏ "),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_position(done as u64);
        pb.set_message(format!("Archiving: {}", heading));
    };
    let progress: Option<&dyn Fn(u32, u32, &str)> =
        if args.quiet { None } else { Some(&progress_cb) };

    let checkpoint_cb = |checkpoint: Option<&str>| match checkpoint {
        Some(h) => eprintln!("Resuming after: {}", h),
        None => eprintln!("No checkpoint found; starting a fresh crawl."),
    };
    let on_checkpoint: Option<&dyn Fn(Option<&str>)> =
        if args.quiet { None } else { Some(&checkpoint_cb) };

    let options = CrawlOptions {
        min_chars,
        on_checkpoint,
        progress,
    };
    let report = scraper::crawl(&args.url, &archive_path, &mut client, &options)?;

    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    print_summary(&report, &archive_path, args.quiet);
    Ok(())
}

/// Final operator summary: what was archived and which chapters were flagged.
/// Flags print even under --quiet; they need operator intervention.
fn print_summary(report: &CrawlReport, archive_path: &Path, quiet: bool) {
    if !quiet {
        if report.archived.is_empty() {
            eprintln!("Archive is already up to date: {}", archive_path.display());
        } else {
            eprintln!(
                "Archived {} new chapter(s) to {}",
                report.archived.len(),
                archive_path.display()
            );
        }
    }
    if report.flagged.is_empty() {
        if !quiet {
            eprintln!("No chapter fell below the minimum character count.");
        }
    } else {
        eprintln!(
            "{} chapter(s) fell below the minimum character count:",
            report.flagged.len()
        );
        for flag in &report.flagged {
            eprintln!("  {} {}", flag.heading, flag.link);
        }
    }
}
