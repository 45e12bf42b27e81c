//! Crawling: the rendering-driver seam, polite client, heading discovery,
//! chapter fetching, and the orchestrated resumable run.

mod chapter;
mod client;
mod contents;
mod error;

pub use chapter::{fetch_chapter, ChapterOutcome};
pub use client::{PoliteClient, PoliteClientBuilder};
pub use contents::discover;
pub use error::ScrapeError;

use crate::archive::{self, ArchiveError};
use crate::model::FlaggedChapter;
use scraper::Selector;
use std::path::Path;
use thiserror::Error;

/// Minimum script-character count for a chapter body to be archived.
pub const DEFAULT_MIN_CHARS: usize = 200;

/// Rendering-driver seam: anything that can turn a URL into the page markup
/// a reader would see.
///
/// The bundled implementation is [PoliteClient], which fetches the served
/// HTML; a site that builds its chapter list client-side needs an
/// implementation backed by a scripted browser instead.
pub trait PageSource {
    fn page_source(&mut self, url: &str) -> Result<String, ScrapeError>;
}

/// Parse a CSS selector or return an error (avoids panics from Selector::parse).
pub(crate) fn parse_selector(sel: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(sel).map_err(|e| ScrapeError::Selector {
        selector: sel.to_string(),
        message: e.to_string(),
    })
}

/// Hard errors from a crawl run: page scraping or archive access.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("{0}")]
    Scrape(#[from] ScrapeError),

    #[error("{0}")]
    Archive(#[from] ArchiveError),
}

/// Options for a crawl run: flag threshold and observer callbacks.
pub struct CrawlOptions<'a> {
    /// Minimum script-character count for a chapter body (default 200).
    pub min_chars: usize,
    /// Called once with the recovered checkpoint, before discovery.
    pub on_checkpoint: Option<&'a dyn Fn(Option<&str>)>,
    /// Called after each processed chapter with (done, total, heading).
    pub progress: Option<&'a dyn Fn(u32, u32, &str)>,
}

impl Default for CrawlOptions<'_> {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            on_checkpoint: None,
            progress: None,
        }
    }
}

/// What a completed run did.
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Checkpoint recovered from the archive at the start of the run.
    pub checkpoint: Option<String>,
    /// Headings appended this run, in archive order.
    pub archived: Vec<String>,
    /// Chapters whose body fell below the threshold, in discovery order.
    pub flagged: Vec<FlaggedChapter>,
}

/// One resumable run: read the checkpoint, discover the entries after it,
/// then fetch and append chapter by chapter.
///
/// Each validated chapter is appended before the next fetch begins, so an
/// interrupted run keeps everything persisted so far and the next run
/// resumes behind the last stored chapter. Flagged chapters are collected,
/// never written, and never abort the run.
pub fn crawl(
    contents_url: &str,
    archive_path: &Path,
    fetcher: &mut dyn PageSource,
    options: &CrawlOptions<'_>,
) -> Result<CrawlReport, CrawlError> {
    let checkpoint = archive::last_heading(archive_path)?;
    if let Some(ref cb) = options.on_checkpoint {
        cb(checkpoint.as_deref());
    }

    let pending = contents::discover(fetcher, contents_url, checkpoint.as_deref())?;
    let total = pending.len() as u32;

    let mut report = CrawlReport {
        checkpoint,
        ..CrawlReport::default()
    };
    for (done, entry) in pending.iter().enumerate() {
        match chapter::fetch_chapter(fetcher, entry, options.min_chars)? {
            ChapterOutcome::Complete(chapter) => {
                archive::append_record(archive_path, &chapter)?;
                report.archived.push(chapter.heading);
            }
            ChapterOutcome::TooShort(flag) => report.flagged.push(flag),
        }
        if let Some(ref p) = options.progress {
            p(done as u32 + 1, total, &entry.heading);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive;
    use crate::model::Chapter;
    use std::collections::HashMap;
    use std::path::PathBuf;

    const CONTENTS_URL: &str = "https://www.example.com/book/1/";

    /// In-memory page source over a URL map; records every request so tests
    /// can assert what was (and was not) fetched.
    struct StubPages {
        pages: HashMap<String, String>,
        requests: Vec<String>,
    }

    impl StubPages {
        fn new(pages: Vec<(String, String)>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                requests: Vec::new(),
            }
        }
    }

    impl PageSource for StubPages {
        fn page_source(&mut self, url: &str) -> Result<String, ScrapeError> {
            self.requests.push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::HttpStatus {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    fn chapter_url(n: u32) -> String {
        format!("https://www.example.com/book/1/{}.html", 100 + n)
    }

    fn contents_page(headings: &[&str]) -> String {
        let items: String = headings
            .iter()
            .enumerate()
            .map(|(i, heading)| {
                format!(
                    "<li><a href=\"//www.example.com/book/1/{}.html\">{}</a></li>",
                    101 + i,
                    heading
                )
            })
            .collect();
        format!(
            "<html><body><div class=\"chapter-list\"><ul>{}</ul></div></body></html>",
            items
        )
    }

    fn chapter_page(script_chars: usize) -> String {
        format!(
            "<html><body><div class=\"content\">{}</div></body></html>",
            "哈".repeat(script_chars)
        )
    }

    fn temp_archive(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("chapscrape_crawl_{}", name));
        std::fs::remove_file(&path).ok();
        path
    }

    fn site(headings: &[&str], chapter_chars: &[usize]) -> StubPages {
        let mut pages = vec![(CONTENTS_URL.to_string(), contents_page(headings))];
        for (i, chars) in chapter_chars.iter().enumerate() {
            pages.push((chapter_url(i as u32 + 1), chapter_page(*chars)));
        }
        StubPages::new(pages)
    }

    #[test]
    fn fresh_run_archives_all_chapters_in_order() -> Result<(), CrawlError> {
        let path = temp_archive("fresh.txt");
        let mut stub = site(&["第一章", "第二章", "第三章"], &[250, 250, 250]);
        let report = crawl(CONTENTS_URL, &path, &mut stub, &CrawlOptions::default())?;

        assert_eq!(report.checkpoint, None);
        assert_eq!(report.archived, vec!["第一章", "第二章", "第三章"]);
        assert!(report.flagged.is_empty());
        assert_eq!(
            stub.requests,
            vec![
                CONTENTS_URL.to_string(),
                chapter_url(1),
                chapter_url(2),
                chapter_url(3),
            ]
        );
        let checkpoint = archive::last_heading(&path)?;
        std::fs::remove_file(&path).ok();
        assert_eq!(checkpoint.as_deref(), Some("第三章"));
        Ok(())
    }

    #[test]
    fn resume_fetches_only_entries_after_checkpoint() -> Result<(), CrawlError> {
        let path = temp_archive("resume.txt");
        for heading in ["第一章", "第二章"] {
            archive::append_record(
                &path,
                &Chapter {
                    heading: heading.to_string(),
                    body: "已存正文".to_string(),
                },
            )?;
        }
        // Pages for the first two chapters are deliberately absent: touching
        // them would 404 and fail the test.
        let mut stub = StubPages::new(vec![
            (
                CONTENTS_URL.to_string(),
                contents_page(&["第一章", "第二章", "第三章", "第四章"]),
            ),
            (chapter_url(3), chapter_page(250)),
            (chapter_url(4), chapter_page(250)),
        ]);
        let report = crawl(CONTENTS_URL, &path, &mut stub, &CrawlOptions::default())?;

        assert_eq!(report.checkpoint.as_deref(), Some("第二章"));
        assert_eq!(report.archived, vec!["第三章", "第四章"]);
        let checkpoint = archive::last_heading(&path)?;
        std::fs::remove_file(&path).ok();
        assert_eq!(checkpoint.as_deref(), Some("第四章"));
        Ok(())
    }

    #[test]
    fn rerun_against_unchanged_site_archives_nothing() -> Result<(), CrawlError> {
        let path = temp_archive("rerun.txt");
        let mut stub = site(&["第一章", "第二章"], &[250, 250]);
        crawl(CONTENTS_URL, &path, &mut stub, &CrawlOptions::default())?;

        let mut stub = site(&["第一章", "第二章"], &[250, 250]);
        let report = crawl(CONTENTS_URL, &path, &mut stub, &CrawlOptions::default())?;
        std::fs::remove_file(&path).ok();

        assert_eq!(report.checkpoint.as_deref(), Some("第二章"));
        assert!(report.archived.is_empty());
        assert!(report.flagged.is_empty());
        assert_eq!(stub.requests, vec![CONTENTS_URL.to_string()]);
        Ok(())
    }

    #[test]
    fn short_chapter_is_flagged_and_not_archived() -> Result<(), CrawlError> {
        let path = temp_archive("flagged.txt");
        let mut stub = site(&["第一章", "第二章", "第三章"], &[250, 250, 50]);
        let report = crawl(CONTENTS_URL, &path, &mut stub, &CrawlOptions::default())?;

        assert_eq!(report.archived, vec!["第一章", "第二章"]);
        assert_eq!(report.flagged.len(), 1);
        assert_eq!(report.flagged[0].heading, "第三章");
        assert_eq!(report.flagged[0].link, chapter_url(3));
        let content = std::fs::read_to_string(&path).unwrap();
        let checkpoint = archive::last_heading(&path)?;
        std::fs::remove_file(&path).ok();
        assert!(!content.contains("第三章"));
        assert_eq!(checkpoint.as_deref(), Some("第二章"));
        Ok(())
    }

    #[test]
    fn first_chapter_short_leaves_archive_absent_checkpoint() -> Result<(), CrawlError> {
        let path = temp_archive("first_short.txt");
        let mut stub = site(&["第一章"], &[50]);
        let report = crawl(CONTENTS_URL, &path, &mut stub, &CrawlOptions::default())?;

        assert!(report.archived.is_empty());
        assert_eq!(report.flagged.len(), 1);
        let checkpoint = archive::last_heading(&path)?;
        std::fs::remove_file(&path).ok();
        assert_eq!(checkpoint, None);
        Ok(())
    }

    #[test]
    fn exact_threshold_is_archived() -> Result<(), CrawlError> {
        let path = temp_archive("boundary.txt");
        let mut stub = site(&["第一章", "第二章"], &[200, 199]);
        let report = crawl(CONTENTS_URL, &path, &mut stub, &CrawlOptions::default())?;
        std::fs::remove_file(&path).ok();

        assert_eq!(report.archived, vec!["第一章"]);
        assert_eq!(report.flagged.len(), 1);
        assert_eq!(report.flagged[0].heading, "第二章");
        Ok(())
    }

    #[test]
    fn vanished_checkpoint_aborts_without_touching_archive() -> Result<(), CrawlError> {
        let path = temp_archive("drift.txt");
        archive::append_record(
            &path,
            &Chapter {
                heading: "改名前的章节".to_string(),
                body: "正文".to_string(),
            },
        )?;
        let before = std::fs::read_to_string(&path).unwrap();

        let mut stub = site(&["第一章", "第二章"], &[250, 250]);
        let result = crawl(CONTENTS_URL, &path, &mut stub, &CrawlOptions::default());
        let after = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(CrawlError::Scrape(ScrapeError::StructureNotFound { .. }))
        ));
        assert_eq!(before, after);
        // Discovery failed before any chapter fetch.
        assert_eq!(stub.requests, vec![CONTENTS_URL.to_string()]);
        Ok(())
    }

    #[test]
    fn corrupt_archive_aborts_before_any_request() {
        let path = temp_archive("corrupt.txt");
        std::fs::write(&path, "not a record").unwrap();
        let mut stub = site(&["第一章"], &[250]);
        let result = crawl(CONTENTS_URL, &path, &mut stub, &CrawlOptions::default());
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(CrawlError::Archive(ArchiveError::Corrupt { .. }))
        ));
        assert!(stub.requests.is_empty());
    }

    #[test]
    fn custom_threshold_is_respected() -> Result<(), CrawlError> {
        let path = temp_archive("threshold.txt");
        let mut stub = site(&["第一章"], &[50]);
        let options = CrawlOptions {
            min_chars: 10,
            ..CrawlOptions::default()
        };
        let report = crawl(CONTENTS_URL, &path, &mut stub, &options)?;
        std::fs::remove_file(&path).ok();

        assert_eq!(report.archived, vec!["第一章"]);
        assert!(report.flagged.is_empty());
        Ok(())
    }

    #[test]
    fn progress_reports_every_processed_chapter() -> Result<(), CrawlError> {
        use std::cell::RefCell;

        let path = temp_archive("progress.txt");
        let mut stub = site(&["第一章", "第二章"], &[250, 50]);
        let seen: RefCell<Vec<(u32, u32, String)>> = RefCell::new(Vec::new());
        let progress_cb = |done: u32, total: u32, heading: &str| {
            seen.borrow_mut().push((done, total, heading.to_string()));
        };
        let options = CrawlOptions {
            progress: Some(&progress_cb),
            ..CrawlOptions::default()
        };
        crawl(CONTENTS_URL, &path, &mut stub, &options)?;
        std::fs::remove_file(&path).ok();

        assert_eq!(
            seen.into_inner(),
            vec![
                (1, 2, "第一章".to_string()),
                (2, 2, "第二章".to_string()),
            ]
        );
        Ok(())
    }
}
