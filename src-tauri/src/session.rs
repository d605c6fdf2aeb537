//! What the user currently has open: the document, the visible panel, the
//! merge queue and any organizer edits in progress.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::Organizer;
use crate::error::{AppError, AppResult};

pub const APP_NAME: &str = "PixelCat-PDF";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    #[default]
    Viewer,
    Splitter,
    Merger,
    Organizer,
    Security,
    Text,
    Properties,
}

/// Ordered list of files waiting to be merged. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeQueue {
    files: Vec<PathBuf>,
}

impl MergeQueue {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn add<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(paths.into_iter().map(Into::into));
    }

    pub fn remove(&mut self, index: usize) -> AppResult<PathBuf> {
        if index >= self.files.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.files.remove(index))
    }

    /// Swap the entry with its neighbour. Moving past either end is a no-op.
    pub fn move_entry(&mut self, index: usize, up: bool) -> AppResult<()> {
        if index >= self.files.len() {
            return Err(self.out_of_range(index));
        }
        match (up, index) {
            (true, 0) => {}
            (true, i) => self.files.swap(i, i - 1),
            (false, i) if i + 1 < self.files.len() => self.files.swap(i, i + 1),
            (false, _) => {}
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    fn out_of_range(&self, index: usize) -> AppError {
        AppError::Validation(format!(
            "Queue position {} is out of range ({} files).",
            index,
            self.files.len()
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub title: String,
    pub path: Option<PathBuf>,
    pub zoom: f32,
    pub panel: Panel,
}

#[derive(Debug, Default)]
pub struct Session {
    current_pdf: Option<PathBuf>,
    pub zoom: f32,
    pub panel: Panel,
    pub merge_queue: MergeQueue,
    pub organizer: Option<Organizer>,
    generation: u64,
}

impl Session {
    pub fn new(zoom: f32) -> Self {
        Self {
            zoom,
            ..Self::default()
        }
    }

    /// Switch to a new document. Organizer edits belong to the old one and
    /// are discarded.
    pub fn open(&mut self, path: impl Into<PathBuf>) {
        self.current_pdf = Some(path.into());
        self.organizer = None;
    }

    pub fn current_pdf(&self) -> AppResult<&Path> {
        self.current_pdf.as_deref().ok_or(AppError::NoDocument)
    }

    pub fn organizer_mut(&mut self) -> AppResult<&mut Organizer> {
        self.organizer.as_mut().ok_or_else(|| {
            AppError::Validation("Open the organizer first.".to_string())
        })
    }

    /// `PixelCat-PDF | file.pdf`, or just the app name with nothing open.
    pub fn title(&self) -> String {
        match self
            .current_pdf
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy())
        {
            Some(name) => format!("{} | {}", APP_NAME, name),
            None => APP_NAME.to_string(),
        }
    }

    /// Claim the next render generation. Anything older is stale.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            title: self.title(),
            path: self.current_pdf.clone(),
            zoom: self.zoom,
            panel: self.panel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_tracks_open_file() {
        let mut session = Session::new(1.2);
        assert_eq!(session.title(), "PixelCat-PDF");
        session.open("/tmp/cats/whiskers.pdf");
        assert_eq!(session.title(), "PixelCat-PDF | whiskers.pdf");
    }

    #[test]
    fn nothing_open_is_an_error() {
        let session = Session::new(1.2);
        assert!(matches!(session.current_pdf(), Err(AppError::NoDocument)));
    }

    #[test]
    fn opening_drops_organizer() {
        let mut session = Session::new(1.2);
        session.open("a.pdf");
        session.organizer = Some(Organizer::with_page_count("a.pdf", 3));
        session.open("b.pdf");
        assert!(session.organizer.is_none());
        assert!(session.organizer_mut().is_err());
    }

    #[test]
    fn generations_increase() {
        let mut session = Session::new(1.2);
        let first = session.next_generation();
        let second = session.next_generation();
        assert!(second > first);
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
    }

    #[test]
    fn queue_keeps_order_and_moves() {
        let mut queue = MergeQueue::default();
        queue.add(["a.pdf", "b.pdf", "c.pdf"]);
        queue.move_entry(2, true).unwrap();
        assert_eq!(
            queue.files(),
            &[PathBuf::from("a.pdf"), PathBuf::from("c.pdf"), PathBuf::from("b.pdf")]
        );
        queue.move_entry(0, true).unwrap();
        queue.move_entry(2, false).unwrap();
        assert_eq!(queue.files()[0], PathBuf::from("a.pdf"));
        assert_eq!(queue.remove(1).unwrap(), PathBuf::from("c.pdf"));
        assert_eq!(queue.len(), 2);
        assert!(queue.remove(5).is_err());
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn queue_allows_duplicates() {
        let mut queue = MergeQueue::default();
        queue.add(["a.pdf", "a.pdf"]);
        assert_eq!(queue.len(), 2);
    }
}
