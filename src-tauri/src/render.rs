//! Page rasterization off the UI thread.
//!
//! Every render request gets its own worker thread. Results go back through
//! a [`RenderSink`], which the desktop shell implements by emitting an event
//! to the webview. Requests are never cancelled; each carries a generation
//! number so that late results from an older request can be recognized and
//! dropped.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use base64::Engine as _;
use image::{ImageFormat, RgbaImage};
use log::{debug, info, warn};
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::clamp_zoom;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub generation: u64,
    pub path: PathBuf,
    pub zoom: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    /// `data:image/png;base64,...`, ready for an `<img src>`.
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderBatch {
    pub generation: u64,
    pub zoom: f32,
    pub pages: Vec<RenderedPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFailure {
    pub generation: u64,
    pub message: String,
}

/// Turns every page of a document into pixels.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, path: &Path, zoom: f32) -> AppResult<Vec<RgbaImage>>;
}

/// Receives the outcome of a render request on the worker thread.
pub trait RenderSink: Send + 'static {
    fn deliver(&self, batch: RenderBatch);
    fn fail(&self, failure: RenderFailure);
}

/// Rasterizer backed by a PDFium shared library loaded at runtime.
///
/// The library is looked up in `library_dir` (if set), then next to the
/// executable, then wherever the system loader finds it. It is bound per
/// request and released when the request finishes.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> AppResult<Pdfium> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf));

        for dir in self.library_dir.iter().chain(exe_dir.iter()) {
            let candidate = Pdfium::pdfium_platform_library_name_at_path(dir);
            match Pdfium::bind_to_library(&candidate) {
                Ok(bindings) => return Ok(Pdfium::new(bindings)),
                Err(e) => debug!("no PDFium in {}: {}", dir.display(), e),
            }
        }
        Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|e| AppError::Render(format!("PDFium library not found: {}", e)))
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, path: &Path, zoom: f32) -> AppResult<Vec<RgbaImage>> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| AppError::Render(format!("{}: {}", path.display(), e)))?;
        let config = PdfRenderConfig::new().scale_page_by_factor(zoom);

        let mut images = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| AppError::Render(format!("page {}: {}", index + 1, e)))?;
            let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
            let image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(
                || AppError::Render(format!("page {}: bitmap size mismatch", index + 1)),
            )?;
            images.push(image);
        }
        Ok(images)
    }
}

/// PNG-encode an image as a data URL.
pub fn to_data_url(image: &RgbaImage) -> AppResult<String> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

/// Render synchronously. Used by the worker; handy on its own in tests.
pub fn render_document(
    request: &RenderRequest,
    rasterizer: &dyn Rasterizer,
) -> AppResult<RenderBatch> {
    let zoom = clamp_zoom(request.zoom);
    let images = rasterizer.rasterize(&request.path, zoom)?;
    let pages = images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            Ok(RenderedPage {
                index: index as u32,
                width: image.width(),
                height: image.height(),
                data_url: to_data_url(image)?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(RenderBatch {
        generation: request.generation,
        zoom,
        pages,
    })
}

/// Start a worker thread for `request`. Exactly one of `deliver` / `fail` is
/// called on `sink` before the thread exits.
pub fn spawn_render<S: RenderSink>(
    request: RenderRequest,
    rasterizer: Arc<dyn Rasterizer>,
    sink: S,
) -> AppResult<thread::JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(format!("render-{}", request.generation))
        .spawn(move || match render_document(&request, rasterizer.as_ref()) {
            Ok(batch) => {
                info!(
                    "rendered {} pages of {} (generation {})",
                    batch.pages.len(),
                    request.path.display(),
                    batch.generation
                );
                sink.deliver(batch);
            }
            Err(e) => {
                warn!("render of {} failed: {}", request.path.display(), e);
                sink.fail(RenderFailure {
                    generation: request.generation,
                    message: e.to_string(),
                });
            }
        })?;
    Ok(handle)
}
