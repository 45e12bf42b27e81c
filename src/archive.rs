//! Append-only plain-text chapter archive.
//!
//! Each record is the heading boxed between two rule lines, a blank line,
//! then the body and two blank lines. The heading of the last record doubles
//! as the resumption checkpoint, so reading the archive needs nothing more
//! than splitting on the rule token.

use crate::model::Chapter;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Record delimiter. Fixed width, vanishingly unlikely in chapter prose.
pub const RULE: &str = "~~~~~~~~~~~~~~~~~~~~~~~~~~~~~";

/// File name used when the configured archive path is a directory.
pub const DEFAULT_ARCHIVE_FILE_NAME: &str = "store_content.txt";

/// Errors from reading or appending the archive file.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The file has content but no well-formed record boundary. Never
    /// treated as an empty archive: that would re-fetch and duplicate
    /// every chapter already stored.
    #[error("Archive {path} is malformed: no well-formed record boundary found.")]
    Corrupt { path: PathBuf },

    #[error("Failed to access archive {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Recover the heading of the most recently archived chapter.
///
/// Returns `Ok(None)` when the archive does not exist or is empty (fresh
/// crawl). A non-empty archive must split into at least three segments on
/// the rule token (the final heading sits between two rules); anything less
/// is [ArchiveError::Corrupt].
pub fn last_heading(path: &Path) -> Result<Option<String>, ArchiveError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ArchiveError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    if content.is_empty() {
        return Ok(None);
    }
    let segments: Vec<&str> = content.split(RULE).collect();
    if segments.len() < 3 {
        return Err(ArchiveError::Corrupt {
            path: path.to_path_buf(),
        });
    }
    Ok(Some(segments[segments.len() - 2].trim().to_string()))
}

/// Serialize one chapter as an archive record.
pub fn format_record(chapter: &Chapter) -> String {
    format!(
        "{}\n{}\n{}\n\n{}\n\n\n",
        RULE, chapter.heading, RULE, chapter.body
    )
}

/// Append one chapter record to the archive, creating the file if needed.
///
/// Each call is a separate durable write: the orchestrator appends chapter
/// by chapter, so an interrupted run keeps everything written so far and
/// [last_heading] reflects exactly the last persisted chapter.
pub fn append_record(path: &Path, chapter: &Chapter) -> Result<(), ArchiveError> {
    let io_err = |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(format_record(chapter).as_bytes())
        .map_err(io_err)?;
    file.flush().map_err(io_err)?;
    Ok(())
}
