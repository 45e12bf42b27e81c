//! Heading discovery on the contents page.
//!
//! Returns the ordered, not-yet-archived chapter entries. Document order on
//! the contents page is narrative chapter order and propagates unchanged
//! through fetching and archiving.

use crate::model::ChapterRef;
use crate::scraper::{parse_selector, PageSource, ScrapeError};
use reqwest::Url;
use scraper::{ElementRef, Html};

const CHAPTER_LIST_SELECTOR: &str = ".chapter-list";

/// Load the contents page and return the chapter entries after `checkpoint`
/// (all of them when `checkpoint` is `None`).
pub fn discover(
    fetcher: &mut dyn PageSource,
    contents_url: &str,
    checkpoint: Option<&str>,
) -> Result<Vec<ChapterRef>, ScrapeError> {
    let html = fetcher.page_source(contents_url)?;
    parse_contents(&html, contents_url, checkpoint)
}

/// Parse the rendered contents page.
///
/// With a checkpoint, the entry whose link text equals it exactly must be
/// present; its absence signals heading drift (site retitled a chapter) or
/// archive corruption.
pub(crate) fn parse_contents(
    html: &str,
    contents_url: &str,
    checkpoint: Option<&str>,
) -> Result<Vec<ChapterRef>, ScrapeError> {
    let doc = Html::parse_document(html);
    let list_sel = parse_selector(CHAPTER_LIST_SELECTOR)?;
    let li_sel = parse_selector("li")?;
    let a_sel = parse_selector("a")?;

    let container =
        doc.select(&list_sel)
            .next()
            .ok_or_else(|| ScrapeError::StructureNotFound {
                what: format!("chapter list container {:?}", CHAPTER_LIST_SELECTOR),
                url: contents_url.to_string(),
            })?;

    let entries: Vec<ElementRef> = match checkpoint {
        None => container.select(&li_sel).collect(),
        Some(heading) => {
            let target = container
                .select(&a_sel)
                .find(|a| element_text(a) == heading)
                .ok_or_else(|| ScrapeError::StructureNotFound {
                    what: format!("contents entry titled {:?}", heading),
                    url: contents_url.to_string(),
                })?;
            let item = target
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "li")
                .ok_or_else(|| ScrapeError::StructureNotFound {
                    what: format!("parent list item of entry {:?}", heading),
                    url: contents_url.to_string(),
                })?;
            item.next_siblings().filter_map(ElementRef::wrap).collect()
        }
    };

    let base = Url::parse(contents_url).map_err(|e| ScrapeError::InvalidUrl {
        input: contents_url.to_string(),
        reason: e.to_string(),
    })?;

    let mut refs = Vec::with_capacity(entries.len());
    for entry in entries {
        // Entries without a link are volume headers or separators.
        let link = match entry.select(&a_sel).next() {
            Some(a) => a,
            None => continue,
        };
        let href = match link.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        // The site serves protocol-relative hrefs; joining against the
        // contents URL also covers path-relative and absolute forms.
        let resolved = base.join(href).map_err(|e| ScrapeError::InvalidUrl {
            input: href.to_string(),
            reason: e.to_string(),
        })?;
        refs.push(ChapterRef {
            heading: element_text(&link),
            link: resolved.to_string(),
        });
    }
    Ok(refs)
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
