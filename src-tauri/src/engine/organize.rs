//! Page organizer: soft-delete and rotate flags kept alongside an open file,
//! only turned into a new PDF on `apply`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::info;
use lopdf::ObjectId;
use serde::{Deserialize, Serialize};

use super::loader::load_pdf;
use super::pages::{normalize_rotation, page_ids, rebuild_page_tree, rotate_page, write_pdf};
use crate::error::{AppError, AppResult};

/// Edit flags for one page. `rotation` is the pending clockwise turn, kept in
/// `0..360`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEdit {
    pub rotation: i64,
    pub deleted: bool,
    pub selected: bool,
}

/// Index `i` of `pages` is page `i + 1` of `source` as it was when opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizer {
    pub source: PathBuf,
    pub pages: Vec<PageEdit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeOutcome {
    pub kept: u32,
    pub removed: u32,
    pub rotated: u32,
    pub output: PathBuf,
}

impl fmt::Display for OrganizeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Saved {} pages ({} removed).", self.kept, self.removed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotateOutcome {
    pub rotated: u32,
    pub output: PathBuf,
}

impl fmt::Display for RotateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rotated {} pages.", self.rotated)
    }
}

impl Organizer {
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let doc = load_pdf(path)?;
        Ok(Self::with_page_count(path, doc.get_pages().len()))
    }

    pub fn with_page_count(source: impl Into<PathBuf>, pages: usize) -> Self {
        Self {
            source: source.into(),
            pages: vec![PageEdit::default(); pages],
        }
    }

    fn page_mut(&mut self, index: usize) -> AppResult<&mut PageEdit> {
        let len = self.pages.len();
        self.pages.get_mut(index).ok_or_else(|| {
            AppError::Validation(format!(
                "Page index {} is out of range ({} pages).",
                index, len
            ))
        })
    }

    pub fn toggle_select(&mut self, index: usize) -> AppResult<bool> {
        let page = self.page_mut(index)?;
        page.selected = !page.selected;
        Ok(page.selected)
    }

    /// Selects every page that has not been deleted.
    pub fn select_all(&mut self) {
        for page in &mut self.pages {
            page.selected = !page.deleted;
        }
    }

    pub fn clear_selection(&mut self) {
        for page in &mut self.pages {
            page.selected = false;
        }
    }

    pub fn selected(&self) -> Vec<usize> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.selected)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn rotate(&mut self, index: usize, delta: i32) -> AppResult<i64> {
        let page = self.page_mut(index)?;
        page.rotation = normalize_rotation(page.rotation, delta)?;
        Ok(page.rotation)
    }

    /// Returns how many pages were rotated.
    pub fn rotate_selected(&mut self, delta: i32) -> AppResult<usize> {
        let selected = self.selected();
        for &i in &selected {
            self.rotate(i, delta)?;
        }
        Ok(selected.len())
    }

    pub fn delete(&mut self, index: usize) -> AppResult<()> {
        let page = self.page_mut(index)?;
        page.deleted = true;
        page.selected = false;
        Ok(())
    }

    /// Soft-deletes the selection. Returns how many pages were deleted.
    pub fn delete_selected(&mut self) -> usize {
        let mut count = 0;
        for page in self.pages.iter_mut().filter(|p| p.selected) {
            page.deleted = true;
            page.selected = false;
            count += 1;
        }
        count
    }

    pub fn restore(&mut self, index: usize) -> AppResult<()> {
        self.page_mut(index)?.deleted = false;
        Ok(())
    }

    /// 1-based numbers of the pages that will be written.
    pub fn kept_pages(&self) -> Vec<u32> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.deleted)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    /// Write the organized document to `output`.
    pub fn apply<P: AsRef<Path>>(&self, output: P) -> AppResult<OrganizeOutcome> {
        let kept = self.kept_pages();
        if kept.is_empty() {
            return Err(AppError::Validation("Every page is marked for deletion.".to_string()));
        }

        let mut doc = load_pdf(&self.source)?;
        let ids = page_ids(&doc);
        if ids.len() != self.pages.len() {
            return Err(AppError::Validation(format!(
                "{} changed on disk: expected {} pages, found {}.",
                self.source.display(),
                self.pages.len(),
                ids.len()
            )));
        }

        let mut rotated = 0;
        let mut keep: Vec<ObjectId> = Vec::with_capacity(kept.len());
        for (edit, &id) in self.pages.iter().zip(&ids) {
            if edit.deleted {
                continue;
            }
            if edit.rotation != 0 {
                rotate_page(&mut doc, id, edit.rotation as i32)?;
                rotated += 1;
            }
            keep.push(id);
        }

        let output = output.as_ref();
        rebuild_page_tree(&mut doc, &keep)?;
        write_pdf(&mut doc, output)?;

        let outcome = OrganizeOutcome {
            kept: keep.len() as u32,
            removed: (ids.len() - keep.len()) as u32,
            rotated,
            output: output.to_path_buf(),
        };
        info!(
            "organized {}: kept {}, removed {}, rotated {}",
            self.source.display(),
            outcome.kept,
            outcome.removed,
            outcome.rotated
        );
        Ok(outcome)
    }
}

/// Rotate pages by number (1-based) and save to `output`. Unknown page
/// numbers are ignored.
pub fn rotate_pages<P: AsRef<Path>, Q: AsRef<Path>>(
    path: P,
    output: Q,
    rotations: &BTreeMap<u32, i32>,
) -> AppResult<RotateOutcome> {
    let mut doc = load_pdf(path)?;
    let mut rotated = 0;
    for (page_number, page_id) in doc.get_pages() {
        if let Some(&delta) = rotations.get(&page_number) {
            rotate_page(&mut doc, page_id, delta)?;
            rotated += 1;
        }
    }
    let output = output.as_ref();
    write_pdf(&mut doc, output)?;
    Ok(RotateOutcome {
        rotated,
        output: output.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organizer(pages: usize) -> Organizer {
        Organizer::with_page_count("doc.pdf", pages)
    }

    #[test]
    fn rotation_accumulates_and_wraps() {
        let mut org = organizer(2);
        org.rotate(0, 90).unwrap();
        org.rotate(0, 270).unwrap();
        assert_eq!(org.pages[0].rotation, 0);
        assert_eq!(org.rotate(1, -90).unwrap(), 270);
    }

    #[test]
    fn rotate_selected_only_touches_selection() {
        let mut org = organizer(3);
        org.toggle_select(0).unwrap();
        org.toggle_select(2).unwrap();
        assert_eq!(org.rotate_selected(180).unwrap(), 2);
        let rotations: Vec<i64> = org.pages.iter().map(|p| p.rotation).collect();
        assert_eq!(rotations, vec![180, 0, 180]);
    }

    #[test]
    fn delete_selected_is_soft() {
        let mut org = organizer(4);
        org.toggle_select(1).unwrap();
        org.toggle_select(3).unwrap();
        assert_eq!(org.delete_selected(), 2);
        assert_eq!(org.kept_pages(), vec![1, 3]);
        assert!(org.selected().is_empty());

        org.restore(3).unwrap();
        assert_eq!(org.kept_pages(), vec![1, 3, 4]);
        assert_eq!(org.pages.len(), 4);
    }

    #[test]
    fn select_all_skips_deleted() {
        let mut org = organizer(3);
        org.delete(1).unwrap();
        org.select_all();
        assert_eq!(org.selected(), vec![0, 2]);
        org.clear_selection();
        assert!(org.selected().is_empty());
    }

    #[test]
    fn out_of_range_index() {
        let mut org = organizer(1);
        assert!(matches!(org.toggle_select(1), Err(AppError::Validation(_))));
        assert!(matches!(org.rotate(5, 90), Err(AppError::Validation(_))));
    }

    #[test]
    fn apply_refuses_to_delete_everything() {
        let mut org = organizer(2);
        org.select_all();
        org.delete_selected();
        let err = org.apply("out.pdf").unwrap_err();
        assert!(err.to_string().contains("Every page"));
    }
}
