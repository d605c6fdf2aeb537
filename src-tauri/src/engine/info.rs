use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use lopdf::{Dictionary, Document, Object};
use serde::{Deserialize, Serialize};

use super::loader::load_pdf;
use super::pages::{page_rotation, page_size};
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub pages: u32,
}

impl fmt::Display for DocumentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pages", self.pages)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfProperties {
    pub version: String,
    pub page_count: u32,
    pub page_size: String,
    pub encrypted: bool,
    pub producer: String,
    pub creator: String,
    pub created: String,
    pub modified: String,
    pub metadata: BTreeMap<String, String>,
    pub fonts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
    pub rotation: i64,
    pub is_landscape: bool,
}

pub fn get_info<P: AsRef<Path>>(path: P) -> AppResult<DocumentInfo> {
    let doc = load_pdf(path)?;
    Ok(DocumentInfo {
        pages: doc.get_pages().len() as u32,
    })
}

/// Size, rotation and orientation of every page. A page counts as landscape
/// when it is displayed wider than tall, after its `/Rotate` is applied.
pub fn page_layouts<P: AsRef<Path>>(path: P) -> AppResult<Vec<PageLayout>> {
    let doc = load_pdf(path)?;
    Ok(layouts_of(&doc))
}

pub(crate) fn layouts_of(doc: &Document) -> Vec<PageLayout> {
    doc.get_pages()
        .iter()
        .map(|(&page_number, &page_id)| {
            let (width, height) = page_size(doc, page_id);
            let rotation = page_rotation(doc, page_id);
            let quarter_turned = rotation % 180 == 90;
            let is_landscape = if quarter_turned {
                height > width
            } else {
                width > height
            };
            PageLayout {
                page_number,
                width,
                height,
                rotation,
                is_landscape,
            }
        })
        .collect()
}

pub fn get_properties<P: AsRef<Path>>(path: P) -> AppResult<PdfProperties> {
    let doc = load_pdf(path)?;
    let pages = doc.get_pages();

    let page_size = match pages.values().next() {
        Some(&page_id) => {
            let (w, h) = page_size(&doc, page_id);
            format!("{:.1} x {:.1} pts", w, h)
        }
        None => "Unknown".to_string(),
    };

    let mut props = PdfProperties {
        version: doc.version.clone(),
        page_count: pages.len() as u32,
        page_size,
        encrypted: doc.trailer.has(b"Encrypt"),
        producer: String::new(),
        creator: String::new(),
        created: String::new(),
        modified: String::new(),
        metadata: BTreeMap::new(),
        fonts: font_names(&doc),
    };

    if let Some(info) = info_dictionary(&doc) {
        for (key, value) in info.iter() {
            let value = decode_pdf_text(value);
            if value.is_empty() {
                continue;
            }
            match key.as_slice() {
                b"CreationDate" => props.created = value,
                b"ModDate" => props.modified = value,
                b"Producer" => props.producer = value,
                b"Creator" => props.creator = value,
                _ => {
                    props
                        .metadata
                        .insert(String::from_utf8_lossy(key).into_owned(), value);
                }
            }
        }
    }

    Ok(props)
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn font_names(doc: &Document) -> Vec<String> {
    let names: BTreeSet<String> = doc
        .objects
        .values()
        .filter_map(|obj| obj.as_dict().ok())
        .filter(|dict| dict.get(b"Type").and_then(Object::as_name).ok() == Some(b"Font".as_slice()))
        .filter_map(|dict| dict.get(b"BaseFont").and_then(Object::as_name).ok())
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect();
    names.into_iter().collect()
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, otherwise
/// treat bytes as Latin-1.
pub fn decode_pdf_text(obj: &Object) -> String {
    match obj {
        Object::String(bytes, _) => {
            if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
                let utf16: Vec<u16> = rest
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16_lossy(&utf16)
            } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
                String::from_utf8_lossy(rest).into_owned()
            } else {
                bytes.iter().map(|&b| b as char).collect()
            }
        }
        Object::Name(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        _ => String::new(),
    }
}
