//! Builds small PDFs on disk for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::Document;
use pixelcat_pdf_lib::engine::fixtures::write_sample;

/// Write a letter-sized PDF whose pages read "{label} 1", "{label} 2", ...
pub fn write_pdf(dir: &Path, name: &str, label: &str, pages: usize) -> PathBuf {
    write_sample(dir, name, label, pages).unwrap()
}

pub fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

/// Trimmed text of each page, in order.
pub fn page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .keys()
        .map(|&n| doc.extract_text(&[n]).unwrap_or_default().trim().to_string())
        .collect()
}

/// `/Rotate` of each page, 0 when absent.
pub fn rotations(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            doc.get_dictionary(id)
                .unwrap()
                .get(b"Rotate")
                .and_then(|o| o.as_i64())
                .unwrap_or(0)
        })
        .collect()
}
