//! chapscrape: CLI crawler that appends web novel chapters to a resumable plain-text archive.

pub mod archive;
pub mod classify;
pub mod cli;
pub mod config;
pub mod model;
pub mod scraper;

// Re-exports for CLI and consumers.
pub use archive::{append_record, format_record, last_heading, ArchiveError};
pub use classify::character_count;
pub use model::{Chapter, ChapterRef, FlaggedChapter};
pub use scraper::{
    crawl, discover, fetch_chapter, ChapterOutcome, CrawlError, CrawlOptions, CrawlReport,
    PageSource, PoliteClient, PoliteClientBuilder, ScrapeError,
};
