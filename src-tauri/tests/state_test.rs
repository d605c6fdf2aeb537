//! Drives `AppState` the way the desktop commands do, with a stand-in
//! rasterizer so no PDFium library is needed.

mod common;

use std::path::Path;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use pixelcat_pdf_lib::config::{Appearance, Settings, MAX_ZOOM};
use pixelcat_pdf_lib::engine::SplitMode;
use pixelcat_pdf_lib::render::{render_document, Rasterizer};
use pixelcat_pdf_lib::session::Panel;
use pixelcat_pdf_lib::state::AppState;
use pixelcat_pdf_lib::{AppError, AppResult};

use common::{page_count, page_texts, rotations, write_pdf};

struct BlankPages;

impl Rasterizer for BlankPages {
    fn rasterize(&self, path: &Path, zoom: f32) -> AppResult<Vec<RgbaImage>> {
        let pages = lopdf::Document::load(path)?.get_pages().len();
        let side = (20.0 * zoom) as u32;
        Ok(vec![RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 255])); pages])
    }
}

fn state_in(dir: &Path) -> AppState {
    AppState::new(
        Settings::default(),
        Some(dir.join("config").join("settings.json")),
        Arc::new(BlankPages),
    )
}

#[test]
fn nothing_open_reports_no_document() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(dir.path());

    assert!(matches!(state.begin_render(None), Err(AppError::NoDocument)));
    assert!(matches!(state.extract_text(), Err(AppError::NoDocument)));
    assert!(matches!(state.organizer_open(), Err(AppError::NoDocument)));
    assert_eq!(state.view().title, "PixelCat-PDF");
}

#[test]
fn open_sets_title_and_panel_survives() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "kitten.pdf", "Page", 3);
    let state = state_in(dir.path());

    state.show_panel(Panel::Splitter);
    let opened = state.open_pdf(&input).unwrap();
    assert_eq!(opened.title, "PixelCat-PDF | kitten.pdf");
    assert_eq!(opened.info.pages, 3);

    let view = state.view();
    assert_eq!(view.panel, Panel::Splitter);
    assert_eq!(view.path.as_deref(), Some(input.as_path()));
}

#[test]
fn opening_a_broken_file_keeps_previous_document() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_pdf(dir.path(), "good.pdf", "Page", 1);
    let bad = dir.path().join("bad.pdf");
    std::fs::write(&bad, b"not a pdf at all").unwrap();
    let state = state_in(dir.path());

    state.open_pdf(&good).unwrap();
    assert!(state.open_pdf(&bad).is_err());
    assert_eq!(state.view().title, "PixelCat-PDF | good.pdf");
}

#[test]
fn newer_render_supersedes_older() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "doc.pdf", "Page", 2);
    let state = state_in(dir.path());
    state.open_pdf(&input).unwrap();

    let first = state.begin_render(None).unwrap();
    let second = state.begin_render(Some(9.0)).unwrap();
    assert!(!state.is_current_render(first.generation));
    assert!(state.is_current_render(second.generation));
    assert_eq!(second.zoom, MAX_ZOOM);

    let batch = render_document(&second, state.rasterizer().as_ref()).unwrap();
    assert_eq!(batch.pages.len(), 2);
    assert_eq!(batch.pages[0].width, 40);
}

#[test]
fn split_and_range_report_status() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "doc.pdf", "Page", 4);
    let state = state_in(dir.path());
    state.open_pdf(&input).unwrap();

    let status = state.split_all(&dir.path().join("parts")).unwrap();
    assert_eq!(status, "Split 4 pages.");

    let status = state.split_pdf(None, SplitMode::EveryN { n: 3 }).unwrap();
    assert_eq!(status, "Split 4 pages into 2 files.");

    let range = dir.path().join("range.pdf");
    assert_eq!(state.extract_range(&range, 2, 3).unwrap(), "Range saved!");
    assert_eq!(page_texts(&range), ["Page 2", "Page 3"]);
}

#[test]
fn merge_queue_runs_in_queue_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "A", 1);
    let b = write_pdf(dir.path(), "b.pdf", "B", 2);
    let output = dir.path().join("merged.pdf");
    let state = state_in(dir.path());

    state.merge_add(vec![a.clone(), b.clone()]);
    let queue = state.merge_move(1, true).unwrap();
    assert_eq!(queue, [b.clone(), a.clone()]);

    let status = state.merge_run(&output).unwrap();
    assert_eq!(status, "Success! Merged 3 pages total.");
    assert_eq!(page_texts(&output), ["B 1", "B 2", "A 1"]);

    state.merge_clear();
    let err = state.merge_run(&output).unwrap_err();
    assert!(err.to_string().ends_with("No files to merge."));
}

#[test]
fn organizer_edits_apply_to_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "doc.pdf", "Page", 3);
    let output = dir.path().join("organized.pdf");
    let state = state_in(dir.path());
    state.open_pdf(&input).unwrap();

    assert!(state.organizer_edit(|_| Ok(())).is_err());

    let view = state.organizer_open().unwrap();
    assert_eq!(view.layouts.len(), 3);

    state.organizer_edit(|org| org.delete(0)).unwrap();
    let org = state
        .organizer_edit(|org| {
            org.toggle_select(2)?;
            org.rotate_selected(180).map(|_| ())
        })
        .unwrap();
    assert_eq!(org.kept_pages(), [2, 3]);

    let status = state.organizer_apply(&output).unwrap();
    assert_eq!(status, "Saved 2 pages (1 removed).");
    assert_eq!(rotations(&output), [0, 180]);
    assert_eq!(page_count(&input), 3);
}

#[test]
fn reopening_discards_organizer_edits() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "doc.pdf", "Page", 2);
    let state = state_in(dir.path());
    state.open_pdf(&input).unwrap();
    state.organizer_open().unwrap();

    state.open_pdf(&input).unwrap();
    assert!(state.organizer_edit(|_| Ok(())).is_err());
}

#[test]
fn protect_and_text_statuses() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "doc.pdf", "Page", 2);
    let state = state_in(dir.path());
    state.open_pdf(&input).unwrap();

    let locked = dir.path().join("locked.pdf");
    assert_eq!(
        state.protect(&locked, "purr", None).unwrap(),
        "PDF Password Protected!"
    );
    assert!(matches!(
        state.protect(&locked, "", None),
        Err(AppError::Validation(_))
    ));

    let text = state.extract_text().unwrap();
    assert_eq!(text.pages.len(), 2);
    assert!(text.pages[1].contains("Page 2"));

    let out = dir.path().join("doc.txt");
    assert_eq!(state.save_text(&out).unwrap(), "Extracted text from 2 pages.");
    assert!(std::fs::read_to_string(&out).unwrap().contains("Page 1"));
}

#[test]
fn settings_persist_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(dir.path());
    let path = dir.path().join("config").join("settings.json");

    assert_eq!(state.set_zoom(0.1).unwrap(), 0.5);
    state.set_appearance(Appearance::Light).unwrap();

    let saved = Settings::load(&path);
    assert_eq!(saved.zoom, 0.5);
    assert_eq!(saved.appearance, Appearance::Light);
    assert_eq!(state.view().zoom, 0.5);
}
