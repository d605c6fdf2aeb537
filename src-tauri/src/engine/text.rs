use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::loader::load_pdf;
use crate::error::{AppError, AppResult};

/// Separates pages in saved text files.
const PAGE_BREAK: &str = "\n\u{000C}\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Text of each page, in page order.
    pub pages: Vec<String>,
    /// Pages whose text could not be decoded (1-based).
    pub failed_pages: Vec<u32>,
}

impl ExtractedText {
    pub fn joined(&self) -> String {
        self.pages.join(PAGE_BREAK)
    }

    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextOutcome {
    pub pages: u32,
    pub characters: usize,
    pub output: PathBuf,
}

impl fmt::Display for TextOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extracted text from {} pages.", self.pages)
    }
}

/// Text of every page. A page the library cannot decode yields an empty
/// string rather than failing the whole document.
pub fn extract_text<P: AsRef<Path>>(path: P) -> AppResult<ExtractedText> {
    let path = path.as_ref();
    let doc = load_pdf(path)?;
    let mut extracted = ExtractedText {
        pages: Vec::new(),
        failed_pages: Vec::new(),
    };
    for page_number in doc.get_pages().into_keys() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => extracted.pages.push(text.trim_end().to_string()),
            Err(e) => {
                warn!("{}: no text for page {}: {}", path.display(), page_number, e);
                extracted.pages.push(String::new());
                extracted.failed_pages.push(page_number);
            }
        }
    }
    Ok(extracted)
}

/// Extract the text of `path` into a UTF-8 file at `output`.
pub fn save_text<P: AsRef<Path>, Q: AsRef<Path>>(path: P, output: Q) -> AppResult<TextOutcome> {
    let extracted = extract_text(&path)?;
    if extracted.pages.is_empty() {
        return Err(AppError::Validation("PDF has no pages.".to_string()));
    }
    let text = extracted.joined();
    let output = output.as_ref();
    fs::write(output, &text)?;
    info!(
        "extracted {} characters from {} into {}",
        text.len(),
        path.as_ref().display(),
        output.display()
    );
    Ok(TextOutcome {
        pages: extracted.pages.len() as u32,
        characters: text.chars().count(),
        output: output.to_path_buf(),
    })
}
