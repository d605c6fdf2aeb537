use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};
use lopdf::{Document, ObjectId};
use serde::{Deserialize, Serialize};

use super::loader::load_pdf;
use super::pages::{materialize_inherited, page_ids, rebuild_page_tree, write_pdf};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub files: u32,
    pub pages: u32,
    pub output: PathBuf,
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Success! Merged {} pages total.", self.pages)
    }
}

/// How pages of several inputs are ordered in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    /// All of file 1, then all of file 2, ...
    Concatenate,
    /// Page 1 of every file, then page 2 of every file, ...
    Interleave,
}

/// Every page of every file, in list order.
pub fn merge_pdfs<P: AsRef<Path>>(
    files: &[P],
    output: impl AsRef<Path>,
) -> AppResult<MergeOutcome> {
    combine(files, output.as_ref(), Order::Concatenate)
}

/// Alternate pages across the inputs. Shorter files simply run out.
pub fn mix_pdfs<P: AsRef<Path>>(
    files: &[P],
    output: impl AsRef<Path>,
) -> AppResult<MergeOutcome> {
    combine(files, output.as_ref(), Order::Interleave)
}

fn combine<P: AsRef<Path>>(files: &[P], output: &Path, order: Order) -> AppResult<MergeOutcome> {
    let Some((first, rest)) = files.split_first() else {
        return Err(AppError::Validation("No files to merge.".to_string()));
    };

    let mut merged = load_pdf(first)?;
    let mut per_file: Vec<Vec<ObjectId>> = vec![page_ids(&merged)];

    for path in rest {
        let mut doc = load_pdf(path)?;
        let ids = page_ids(&doc);
        // Inherited attributes must be pinned before the donor's page tree
        // is discarded.
        for &id in &ids {
            materialize_inherited(&mut doc, id)?;
        }
        per_file.push(absorb(&mut merged, doc));
        debug!("queued {} pages from {}", ids.len(), path.as_ref().display());
    }

    let ordered = arrange(&per_file, order);
    if ordered.is_empty() {
        return Err(AppError::Validation("The selected files contain no pages.".to_string()));
    }
    rebuild_page_tree(&mut merged, &ordered)?;
    write_pdf(&mut merged, output)?;

    let outcome = MergeOutcome {
        files: files.len() as u32,
        pages: ordered.len() as u32,
        output: output.to_path_buf(),
    };
    info!(
        "merged {} files ({} pages) into {}",
        outcome.files,
        outcome.pages,
        output.display()
    );
    Ok(outcome)
}

/// Move every object of `donor` into `target`, shifting ids past the ones
/// `target` already uses. Returns the donor's pages under their new ids.
fn absorb(target: &mut Document, mut donor: Document) -> Vec<ObjectId> {
    donor.renumber_objects_with(target.max_id + 1);
    target.max_id = target.max_id.max(donor.max_id);
    let ids = page_ids(&donor);
    target.objects.extend(donor.objects);
    ids
}

fn arrange(per_file: &[Vec<ObjectId>], order: Order) -> Vec<ObjectId> {
    match order {
        Order::Concatenate => per_file.iter().flatten().copied().collect(),
        Order::Interleave => {
            let longest = per_file.iter().map(Vec::len).max().unwrap_or(0);
            (0..longest)
                .flat_map(|i| per_file.iter().filter_map(move |pages| pages.get(i).copied()))
                .collect()
        }
    }
}
