use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use lopdf::{Document, ObjectId};
use serde::{Deserialize, Serialize};

use super::loader::{ensure_file, load_pdf};
use super::pages::{page_ids, rebuild_page_tree, write_pdf};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SplitMode {
    EveryN { n: u32 },
    OnePerPage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPreviewItem {
    pub output_name: String,
    pub page_range: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPreview {
    pub source_name: String,
    pub page_count: u32,
    pub parts: Vec<SplitPreviewItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitOutcome {
    pub pages: u32,
    pub files: Vec<PathBuf>,
}

impl fmt::Display for SplitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.files.len() as u32 == self.pages {
            write!(f, "Split {} pages.", self.pages)
        } else {
            write!(f, "Split {} pages into {} files.", self.pages, self.files.len())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeOutcome {
    pub start: u32,
    pub end: u32,
    pub pages: u32,
    pub output: PathBuf,
}

impl fmt::Display for RangeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Range saved!")
    }
}

/// 1-based inclusive `(start, end)` chunks covering `page_count` pages.
pub fn calculate_chunks(mode: SplitMode, page_count: u32) -> Vec<(u32, u32)> {
    match mode {
        SplitMode::OnePerPage => (1..=page_count).map(|p| (p, p)).collect(),
        SplitMode::EveryN { n } => {
            let n = n.max(1);
            let mut ranges = Vec::new();
            let mut start = 1u32;
            while start <= page_count {
                let end = start.saturating_add(n - 1).min(page_count);
                ranges.push((start, end));
                start = end + 1;
            }
            ranges
        }
    }
}

/// How output files of a split are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Naming {
    /// `Page_{n}.pdf`, used when every page goes to its own folder.
    PageNumber,
    /// `{stem}_part{i}.pdf`, safe to write next to the source.
    SourcePart,
}

fn part_name(naming: Naming, stem: &str, index: usize, start: u32) -> String {
    match naming {
        Naming::PageNumber => format!("Page_{}.pdf", start),
        Naming::SourcePart => format!("{}_part{}.pdf", stem, index + 1),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

/// Copy of `doc` holding only `keep`, in that order.
fn subset(doc: &Document, keep: &[ObjectId]) -> AppResult<Document> {
    let mut part = doc.clone();
    rebuild_page_tree(&mut part, keep)?;
    Ok(part)
}

pub fn split_preview<P: AsRef<Path>>(path: P, mode: SplitMode) -> AppResult<SplitPreview> {
    let path = path.as_ref();
    let doc = load_pdf(path)?;
    let page_count = doc.get_pages().len() as u32;
    if page_count == 0 {
        return Err(AppError::Validation("PDF has no pages.".to_string()));
    }

    let stem = file_stem(path);
    let parts = calculate_chunks(mode, page_count)
        .into_iter()
        .enumerate()
        .map(|(i, (s, e))| SplitPreviewItem {
            output_name: part_name(Naming::SourcePart, &stem, i, s),
            page_range: if s == e {
                s.to_string()
            } else {
                format!("{}\u{2013}{}", s, e)
            },
        })
        .collect();

    Ok(SplitPreview {
        source_name: path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document.pdf")
            .to_string(),
        page_count,
        parts,
    })
}

/// Split into chunks written to `output_dir`, or next to the source when
/// `output_dir` is `None`. The directory must already exist.
pub fn split_pdf<P: AsRef<Path>>(
    path: P,
    output_dir: Option<&Path>,
    mode: SplitMode,
) -> AppResult<SplitOutcome> {
    let path = path.as_ref();
    let out_dir = match output_dir {
        Some(d) => d.to_path_buf(),
        None => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    if !out_dir.is_dir() {
        return Err(AppError::Path(format!(
            "Output path is not a directory: {}",
            out_dir.display()
        )));
    }
    write_chunks(path, &out_dir, mode, Naming::SourcePart)
}

/// Write every page to its own `Page_{n}.pdf` inside `output_folder`,
/// creating the folder when needed.
pub fn split_all<P: AsRef<Path>, Q: AsRef<Path>>(
    path: P,
    output_folder: Q,
) -> AppResult<SplitOutcome> {
    let path = path.as_ref();
    ensure_file(path)?;
    let output_folder = output_folder.as_ref();
    fs::create_dir_all(output_folder)?;
    write_chunks(path, output_folder, SplitMode::OnePerPage, Naming::PageNumber)
}

fn write_chunks(
    path: &Path,
    out_dir: &Path,
    mode: SplitMode,
    naming: Naming,
) -> AppResult<SplitOutcome> {
    let doc = load_pdf(path)?;
    let ids = page_ids(&doc);
    if ids.is_empty() {
        return Err(AppError::Validation("PDF has no pages.".to_string()));
    }

    let stem = file_stem(path);
    let mut files = Vec::new();
    for (i, (start, end)) in calculate_chunks(mode, ids.len() as u32).into_iter().enumerate() {
        let keep = &ids[(start - 1) as usize..end as usize];
        let mut part = subset(&doc, keep)?;
        let out_path = out_dir.join(part_name(naming, &stem, i, start));
        write_pdf(&mut part, &out_path)?;
        files.push(out_path);
    }

    let outcome = SplitOutcome {
        pages: ids.len() as u32,
        files,
    };
    info!("split {} into {} files", path.display(), outcome.files.len());
    Ok(outcome)
}

/// Save pages `start..=end` (1-based) to `output`. Pages past the end of the
/// document are skipped; a range that selects nothing is rejected.
pub fn extract_range<P: AsRef<Path>, Q: AsRef<Path>>(
    path: P,
    output: Q,
    start: u32,
    end: u32,
) -> AppResult<RangeOutcome> {
    if start < 1 {
        return Err(AppError::Validation("Start page must be at least 1.".to_string()));
    }
    if start > end {
        return Err(AppError::Validation(format!(
            "Start page {} is after end page {}.",
            start, end
        )));
    }

    let path = path.as_ref();
    let doc = load_pdf(path)?;
    let ids = page_ids(&doc);
    let keep: Vec<ObjectId> = ids
        .iter()
        .enumerate()
        .filter(|(i, _)| (start - 1..end).contains(&(*i as u32)))
        .map(|(_, &id)| id)
        .collect();
    if keep.is_empty() {
        return Err(AppError::Validation(format!(
            "Pages {}-{} are outside the document ({} pages).",
            start,
            end,
            ids.len()
        )));
    }

    let output = output.as_ref();
    let mut part = subset(&doc, &keep)?;
    write_pdf(&mut part, output)?;
    info!(
        "extracted pages {}-{} of {} to {}",
        start,
        end,
        path.display(),
        output.display()
    );

    Ok(RangeOutcome {
        start,
        end,
        pages: keep.len() as u32,
        output: output.to_path_buf(),
    })
}
