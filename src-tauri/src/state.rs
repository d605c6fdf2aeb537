//! Shared application state behind the desktop commands.
//!
//! Locks are held only long enough to read or update the session; document
//! work always runs on a cloned path with no lock held.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::{clamp_zoom, Appearance, Settings};
use crate::engine::{
    self, DocumentInfo, ExtractedText, Organizer, PageLayout, PdfProperties, SplitMode,
    SplitPreview,
};
use crate::error::AppResult;
use crate::render::{PdfiumRasterizer, Rasterizer, RenderRequest};
use crate::session::{Panel, Session, SessionView};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenedDocument {
    pub title: String,
    pub info: DocumentInfo,
}

/// Organizer edits plus the page geometry the grid needs to draw them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerView {
    pub organizer: Organizer,
    pub layouts: Vec<PageLayout>,
}

pub struct AppState {
    session: Mutex<Session>,
    settings: Mutex<Settings>,
    settings_path: Option<PathBuf>,
    rasterizer: Arc<dyn Rasterizer>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        settings_path: Option<PathBuf>,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> Self {
        Self {
            session: Mutex::new(Session::new(settings.zoom)),
            settings: Mutex::new(settings),
            settings_path,
            rasterizer,
        }
    }

    /// State rendering through PDFium, configured from `settings`.
    pub fn with_pdfium(settings: Settings, settings_path: Option<PathBuf>) -> Self {
        let rasterizer = Arc::new(PdfiumRasterizer::new(settings.pdfium_dir.clone()));
        Self::new(settings, settings_path, rasterizer)
    }

    fn current_pdf(&self) -> AppResult<PathBuf> {
        Ok(self.session.lock().current_pdf()?.to_path_buf())
    }

    // --- Document & view ---

    pub fn open_pdf(&self, path: &Path) -> AppResult<OpenedDocument> {
        let info = engine::get_info(path)?;
        let mut session = self.session.lock();
        session.open(path);
        info!("opened {} ({})", path.display(), info);
        Ok(OpenedDocument {
            title: session.title(),
            info,
        })
    }

    pub fn view(&self) -> SessionView {
        self.session.lock().view()
    }

    pub fn show_panel(&self, panel: Panel) -> SessionView {
        let mut session = self.session.lock();
        session.panel = panel;
        session.view()
    }

    pub fn properties(&self) -> AppResult<PdfProperties> {
        engine::get_properties(self.current_pdf()?)
    }

    // --- Rendering ---

    /// Claim a generation for a new render of the current document.
    /// `zoom` defaults to the session zoom and is clamped to the slider range.
    pub fn begin_render(&self, zoom: Option<f32>) -> AppResult<RenderRequest> {
        let mut session = self.session.lock();
        let path = session.current_pdf()?.to_path_buf();
        if let Some(z) = zoom {
            session.zoom = clamp_zoom(z);
        }
        Ok(RenderRequest {
            generation: session.next_generation(),
            path,
            zoom: session.zoom,
        })
    }

    pub fn is_current_render(&self, generation: u64) -> bool {
        self.session.lock().is_current(generation)
    }

    pub fn rasterizer(&self) -> Arc<dyn Rasterizer> {
        Arc::clone(&self.rasterizer)
    }

    // --- Split ---

    pub fn split_all(&self, output_folder: &Path) -> AppResult<String> {
        Ok(engine::split_all(self.current_pdf()?, output_folder)?.to_string())
    }

    pub fn extract_range(&self, output: &Path, start: u32, end: u32) -> AppResult<String> {
        Ok(engine::extract_range(self.current_pdf()?, output, start, end)?.to_string())
    }

    pub fn split_preview(&self, mode: SplitMode) -> AppResult<SplitPreview> {
        engine::split_preview(self.current_pdf()?, mode)
    }

    pub fn split_pdf(&self, output_dir: Option<&Path>, mode: SplitMode) -> AppResult<String> {
        Ok(engine::split_pdf(self.current_pdf()?, output_dir, mode)?.to_string())
    }

    // --- Merge ---

    pub fn merge_queue(&self) -> Vec<PathBuf> {
        self.session.lock().merge_queue.files().to_vec()
    }

    pub fn merge_add(&self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut session = self.session.lock();
        session.merge_queue.add(paths);
        session.merge_queue.files().to_vec()
    }

    pub fn merge_remove(&self, index: usize) -> AppResult<Vec<PathBuf>> {
        let mut session = self.session.lock();
        session.merge_queue.remove(index)?;
        Ok(session.merge_queue.files().to_vec())
    }

    pub fn merge_move(&self, index: usize, up: bool) -> AppResult<Vec<PathBuf>> {
        let mut session = self.session.lock();
        session.merge_queue.move_entry(index, up)?;
        Ok(session.merge_queue.files().to_vec())
    }

    pub fn merge_clear(&self) {
        self.session.lock().merge_queue.clear();
    }

    pub fn merge_run(&self, output: &Path) -> AppResult<String> {
        Ok(engine::merge_pdfs(&self.merge_queue(), output)?.to_string())
    }

    pub fn mix_run(&self, output: &Path) -> AppResult<String> {
        Ok(engine::mix_pdfs(&self.merge_queue(), output)?.to_string())
    }

    // --- Organizer ---

    pub fn organizer_open(&self) -> AppResult<OrganizerView> {
        let path = self.current_pdf()?;
        let organizer = Organizer::open(&path)?;
        let layouts = engine::page_layouts(&path)?;
        self.session.lock().organizer = Some(organizer.clone());
        Ok(OrganizerView { organizer, layouts })
    }

    /// Run `edit` against the open organizer and return its new state.
    pub fn organizer_edit<F>(&self, edit: F) -> AppResult<Organizer>
    where
        F: FnOnce(&mut Organizer) -> AppResult<()>,
    {
        let mut session = self.session.lock();
        let organizer = session.organizer_mut()?;
        edit(organizer)?;
        Ok(organizer.clone())
    }

    pub fn organizer_apply(&self, output: &Path) -> AppResult<String> {
        let organizer = self.organizer_edit(|_| Ok(()))?;
        Ok(organizer.apply(output)?.to_string())
    }

    pub fn rotate_pages(&self, output: &Path, rotations: &BTreeMap<u32, i32>) -> AppResult<String> {
        Ok(engine::rotate_pages(self.current_pdf()?, output, rotations)?.to_string())
    }

    // --- Security & text ---

    pub fn protect(
        &self,
        output: &Path,
        password: &str,
        owner_password: Option<&str>,
    ) -> AppResult<String> {
        let outcome = engine::protect_pdf(self.current_pdf()?, output, password, owner_password)?;
        Ok(outcome.to_string())
    }

    pub fn extract_text(&self) -> AppResult<ExtractedText> {
        engine::extract_text(self.current_pdf()?)
    }

    pub fn save_text(&self, output: &Path) -> AppResult<String> {
        Ok(engine::save_text(self.current_pdf()?, output)?.to_string())
    }

    // --- Settings ---

    pub fn settings(&self) -> Settings {
        self.settings.lock().clone()
    }

    pub fn set_zoom(&self, zoom: f32) -> AppResult<f32> {
        let zoom = {
            let mut settings = self.settings.lock();
            let zoom = settings.set_zoom(zoom);
            self.persist(&settings)?;
            zoom
        };
        self.session.lock().zoom = zoom;
        Ok(zoom)
    }

    pub fn set_appearance(&self, appearance: Appearance) -> AppResult<Settings> {
        let mut settings = self.settings.lock();
        settings.appearance = appearance;
        self.persist(&settings)?;
        Ok(settings.clone())
    }

    fn persist(&self, settings: &Settings) -> AppResult<()> {
        match &self.settings_path {
            Some(path) => settings.save(path).map_err(|e| {
                warn!("could not save settings to {}: {}", path.display(), e);
                e
            }),
            None => Ok(()),
        }
    }
}
