//! Per-chapter fetching: extract the content body, count its script
//! characters, and either hand back an archive-ready chapter or flag it.

use crate::classify::character_count;
use crate::model::{Chapter, ChapterRef, FlaggedChapter};
use crate::scraper::{parse_selector, PageSource, ScrapeError};
use scraper::Html;

const CONTENT_SELECTOR: &str = ".content";

/// Outcome for one chapter link. A short body is a soft signal for the
/// operator, not an error; nothing is written for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterOutcome {
    Complete(Chapter),
    TooShort(FlaggedChapter),
}

/// Fetch one chapter page and classify its body against `min_chars`.
pub fn fetch_chapter(
    fetcher: &mut dyn PageSource,
    entry: &ChapterRef,
    min_chars: usize,
) -> Result<ChapterOutcome, ScrapeError> {
    let html = fetcher.page_source(&entry.link)?;
    let body = extract_body(&html, &entry.link)?;
    if character_count(&body) < min_chars {
        Ok(ChapterOutcome::TooShort(FlaggedChapter {
            heading: entry.heading.clone(),
            link: entry.link.clone(),
        }))
    } else {
        Ok(ChapterOutcome::Complete(Chapter {
            heading: entry.heading.clone(),
            body,
        }))
    }
}

/// Extract the text of the first content node on a chapter page.
pub(crate) fn extract_body(html: &str, url: &str) -> Result<String, ScrapeError> {
    let doc = Html::parse_document(html);
    let content_sel = parse_selector(CONTENT_SELECTOR)?;
    let node = doc
        .select(&content_sel)
        .next()
        .ok_or_else(|| ScrapeError::StructureNotFound {
            what: format!("content node {:?}", CONTENT_SELECTOR),
            url: url.to_string(),
        })?;
    Ok(node.text().collect())
}
