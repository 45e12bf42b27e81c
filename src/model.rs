//! Data model for a crawl run.
//!
//! The archive file is the only durable state; everything here is transient
//! per-run data derived from it and from the live site.

/// One not-yet-archived entry from the contents page: absolute chapter URL
/// plus its visible heading. Discovery order equals on-page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    pub heading: String,
    pub link: String,
}

/// A fetched chapter whose body passed the minimum-content check.
/// `body` is the raw text extracted from the content node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub heading: String,
    pub body: String,
}

/// A chapter whose body fell below the minimum-content threshold.
/// Reported to the operator at the end of the run, never archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedChapter {
    pub heading: String,
    pub link: String,
}
