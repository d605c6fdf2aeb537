//! Tauri command surface. Everything here is a thin adapter over [`AppState`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::{debug, warn};
use tauri::{AppHandle, Emitter, Manager, Runtime, State};

use crate::config::{Appearance, Settings};
use crate::engine::{ExtractedText, Organizer, PdfProperties, SplitMode, SplitPreview};
use crate::error::AppResult;
use crate::render::{spawn_render, RenderBatch, RenderFailure, RenderSink};
use crate::session::{Panel, SessionView};
use crate::state::{AppState, OpenedDocument, OrganizerView};

pub const RENDER_FINISHED: &str = "render-finished";
pub const RENDER_FAILED: &str = "render-failed";

/// Forwards worker results to the webview, dropping any that a newer
/// request has superseded.
struct WebviewSink<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> WebviewSink<R> {
    fn is_current(&self, generation: u64) -> bool {
        self.app.state::<AppState>().is_current_render(generation)
    }
}

impl<R: Runtime> RenderSink for WebviewSink<R> {
    fn deliver(&self, batch: RenderBatch) {
        if !self.is_current(batch.generation) {
            debug!("dropping stale render generation {}", batch.generation);
            return;
        }
        let generation = batch.generation;
        if let Err(e) = self.app.emit(RENDER_FINISHED, batch) {
            warn!("could not deliver render generation {}: {}", generation, e);
        }
    }

    fn fail(&self, failure: RenderFailure) {
        if self.is_current(failure.generation) {
            let generation = failure.generation;
            if let Err(e) = self.app.emit(RENDER_FAILED, failure) {
                warn!("could not report failed render generation {}: {}", generation, e);
            }
        }
    }
}

// --- Document & view ---

#[tauri::command]
pub fn open_pdf<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, AppState>,
    path: PathBuf,
) -> AppResult<OpenedDocument> {
    let opened = state.open_pdf(&path)?;
    if let Some(window) = app.get_webview_window("main") {
        if let Err(e) = window.set_title(&opened.title) {
            warn!("could not set window title: {}", e);
        }
    }
    Ok(opened)
}

#[tauri::command]
pub fn current_document(state: State<'_, AppState>) -> SessionView {
    state.view()
}

#[tauri::command]
pub fn show_panel(state: State<'_, AppState>, panel: Panel) -> SessionView {
    state.show_panel(panel)
}

#[tauri::command]
pub fn pdf_properties(state: State<'_, AppState>) -> AppResult<PdfProperties> {
    state.properties()
}

/// Kick off a render on a worker thread and return its generation at once.
#[tauri::command]
pub fn render_pages<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, AppState>,
    zoom: Option<f32>,
) -> AppResult<u64> {
    let request = state.begin_render(zoom)?;
    let generation = request.generation;
    spawn_render(request, state.rasterizer(), WebviewSink { app })?;
    Ok(generation)
}

// --- Split ---

#[tauri::command]
pub fn split_all(state: State<'_, AppState>, output_folder: PathBuf) -> AppResult<String> {
    state.split_all(&output_folder)
}

#[tauri::command]
pub fn extract_range(
    state: State<'_, AppState>,
    output: PathBuf,
    start: u32,
    end: u32,
) -> AppResult<String> {
    state.extract_range(&output, start, end)
}

#[tauri::command]
pub fn split_preview(state: State<'_, AppState>, mode: SplitMode) -> AppResult<SplitPreview> {
    state.split_preview(mode)
}

#[tauri::command]
pub fn split_pdf(
    state: State<'_, AppState>,
    output_dir: Option<PathBuf>,
    mode: SplitMode,
) -> AppResult<String> {
    state.split_pdf(output_dir.as_deref(), mode)
}

// --- Merge ---

#[tauri::command]
pub fn merge_queue(state: State<'_, AppState>) -> Vec<PathBuf> {
    state.merge_queue()
}

#[tauri::command]
pub fn merge_add(state: State<'_, AppState>, paths: Vec<PathBuf>) -> Vec<PathBuf> {
    state.merge_add(paths)
}

#[tauri::command]
pub fn merge_remove(state: State<'_, AppState>, index: usize) -> AppResult<Vec<PathBuf>> {
    state.merge_remove(index)
}

#[tauri::command]
pub fn merge_move(state: State<'_, AppState>, index: usize, up: bool) -> AppResult<Vec<PathBuf>> {
    state.merge_move(index, up)
}

#[tauri::command]
pub fn merge_clear(state: State<'_, AppState>) {
    state.merge_clear()
}

#[tauri::command]
pub fn merge_run(state: State<'_, AppState>, output: PathBuf) -> AppResult<String> {
    state.merge_run(&output)
}

#[tauri::command]
pub fn mix_run(state: State<'_, AppState>, output: PathBuf) -> AppResult<String> {
    state.mix_run(&output)
}

// --- Organizer ---

#[tauri::command]
pub fn organizer_open(state: State<'_, AppState>) -> AppResult<OrganizerView> {
    state.organizer_open()
}

#[tauri::command]
pub fn organizer_toggle(state: State<'_, AppState>, index: usize) -> AppResult<Organizer> {
    state.organizer_edit(|org| org.toggle_select(index).map(|_| ()))
}

#[tauri::command]
pub fn organizer_select_all(state: State<'_, AppState>) -> AppResult<Organizer> {
    state.organizer_edit(|org| {
        org.select_all();
        Ok(())
    })
}

#[tauri::command]
pub fn organizer_clear(state: State<'_, AppState>) -> AppResult<Organizer> {
    state.organizer_edit(|org| {
        org.clear_selection();
        Ok(())
    })
}

#[tauri::command]
pub fn organizer_rotate(state: State<'_, AppState>, delta: i32) -> AppResult<Organizer> {
    state.organizer_edit(|org| org.rotate_selected(delta).map(|_| ()))
}

#[tauri::command]
pub fn organizer_delete(state: State<'_, AppState>) -> AppResult<Organizer> {
    state.organizer_edit(|org| {
        org.delete_selected();
        Ok(())
    })
}

#[tauri::command]
pub fn organizer_restore(state: State<'_, AppState>, index: usize) -> AppResult<Organizer> {
    state.organizer_edit(|org| org.restore(index))
}

#[tauri::command]
pub fn organizer_apply(state: State<'_, AppState>, output: PathBuf) -> AppResult<String> {
    state.organizer_apply(&output)
}

#[tauri::command]
pub fn rotate_pages(
    state: State<'_, AppState>,
    output: PathBuf,
    rotations: BTreeMap<u32, i32>,
) -> AppResult<String> {
    state.rotate_pages(&output, &rotations)
}

// --- Security & text ---

#[tauri::command]
pub fn protect_pdf(
    state: State<'_, AppState>,
    output: PathBuf,
    password: String,
    owner_password: Option<String>,
) -> AppResult<String> {
    state.protect(&output, &password, owner_password.as_deref())
}

#[tauri::command]
pub fn extract_text(state: State<'_, AppState>) -> AppResult<ExtractedText> {
    state.extract_text()
}

#[tauri::command]
pub fn save_text(state: State<'_, AppState>, output: PathBuf) -> AppResult<String> {
    state.save_text(&output)
}

// --- Settings ---

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Settings {
    state.settings()
}

#[tauri::command]
pub fn set_zoom(state: State<'_, AppState>, zoom: f32) -> AppResult<f32> {
    state.set_zoom(zoom)
}

#[tauri::command]
pub fn set_appearance(state: State<'_, AppState>, appearance: Appearance) -> AppResult<Settings> {
    state.set_appearance(appearance)
}
