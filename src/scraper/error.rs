//! Shared error type for crawling. Hard errors abort the run; short bodies
//! are soft flags and never appear here.

use thiserror::Error;

/// Crawl error for URL handling, HTTP, and page-structure lookups.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    /// An expected page element was absent: the chapter-list container, the
    /// checkpoint entry, its parent list item, or a chapter's content node.
    /// The layout is assumed stable, so this means the site changed, the
    /// page failed to render, or the checkpoint heading drifted.
    #[error("Could not find {what} at {url}.")]
    StructureNotFound { what: String, url: String },
}
