//! Opening documents with the read/write library.

use std::fs;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};
use lopdf::Document;
use memmap2::Mmap;

use crate::error::{AppError, AppResult};

/// Open a PDF from disk.
///
/// Parses straight from a memory map. When that fails, the tail of the file is
/// searched for the last `startxref` offset and the document is re-parsed with
/// a clean trailer appended in memory; if that also fails the original error
/// is returned. Password-protected files are refused.
pub fn load_pdf<P: AsRef<Path>>(path: P) -> AppResult<Document> {
    let path = path.as_ref();
    ensure_file(path)?;
    let file = fs::File::open(path)?;
    // The map is only read while this function runs. Another process
    // truncating the file underneath us is accepted for a desktop tool.
    let mmap = unsafe { Mmap::map(&file)? };

    let doc = match Document::load_mem(&mmap) {
        Ok(doc) => {
            debug!("loaded {} ({} bytes)", path.display(), mmap.len());
            doc
        }
        Err(err) => {
            let Some(offset) = find_start_xref(&mmap) else {
                return Err(AppError::Pdf(err));
            };
            warn!(
                "{} failed to parse ({}), retrying with a rebuilt trailer at offset {}",
                path.display(),
                err,
                offset
            );
            let patch = format!("\n\nstartxref\n{}\n%%EOF", offset).into_bytes();
            let repaired = (&mmap[..]).chain(patch.as_slice());
            Document::load_from(repaired).map_err(|_| AppError::Pdf(err))?
        }
    };
    ensure_readable(&doc)?;
    Ok(doc)
}

/// An encrypted file that did not open with the empty user password comes
/// back with its objects still encrypted and no pages.
fn ensure_readable(doc: &Document) -> AppResult<()> {
    if doc.trailer.has(b"Encrypt") && doc.encryption_state.is_none() {
        return Err(AppError::Validation("PDF is password protected.".to_string()));
    }
    Ok(())
}

pub(crate) fn ensure_file(path: &Path) -> AppResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AppError::Path(format!("Not a file: {}", path.display())))
    }
}

/// Offset named by the last `startxref` that precedes the final `%%EOF`.
pub fn find_start_xref(data: &[u8]) -> Option<u64> {
    const EOF_MARKER: &[u8] = b"%%EOF";
    const STARTXREF: &[u8] = b"startxref";
    const LOOKBACK: usize = 128;

    let eof_pos = data.windows(EOF_MARKER.len()).rposition(|w| w == EOF_MARKER)?;
    let zone_start = eof_pos.saturating_sub(LOOKBACK);
    let zone = &data[zone_start..eof_pos];
    let marker = zone.windows(STARTXREF.len()).rposition(|w| w == STARTXREF)?;

    let digits: String = data[zone_start + marker + STARTXREF.len()..eof_pos]
        .iter()
        .filter(|b| b.is_ascii_digit())
        .map(|&b| b as char)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{sample_document, write_sample};
    use crate::engine::security::protect_pdf;

    #[test]
    fn finds_last_startxref() {
        let data = b"%PDF-1.4\n...\nstartxref\n12\n%%EOF\nmore\nstartxref\n4567\n%%EOF\n";
        assert_eq!(find_start_xref(data), Some(4567));
    }

    #[test]
    fn startxref_without_whitespace() {
        let data = b"trailer<<>>startxref 991%%EOF";
        assert_eq!(find_start_xref(data), Some(991));
    }

    #[test]
    fn no_eof_marker() {
        assert_eq!(find_start_xref(b"%PDF-1.7\nstartxref\n10\n"), None);
    }

    #[test]
    fn startxref_too_far_from_eof() {
        let mut data = b"startxref\n10\n".to_vec();
        data.extend(std::iter::repeat(b' ').take(200));
        data.extend_from_slice(b"%%EOF");
        assert_eq!(find_start_xref(&data), None);
    }

    #[test]
    fn missing_file_is_path_error() {
        let err = load_pdf("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, AppError::Path(_)));
    }

    #[test]
    fn repairs_damaged_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = Vec::new();
        sample_document("Page", 3).unwrap().save_to(&mut bytes).unwrap();
        let offset = find_start_xref(&bytes).unwrap();
        let tail = bytes.windows(9).rposition(|w| w == b"startxref").unwrap();
        bytes.truncate(tail);
        bytes.extend_from_slice(format!("startxref {}%%EOF garbage", offset).as_bytes());
        assert!(Document::load_mem(&bytes).is_err());

        let path = dir.path().join("damaged.pdf");
        fs::write(&path, &bytes).unwrap();
        assert_eq!(load_pdf(&path).unwrap().get_pages().len(), 3);
    }

    #[test]
    fn password_protected_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sample(dir.path(), "in.pdf", "Page", 2).unwrap();
        let locked = dir.path().join("locked.pdf");
        protect_pdf(&input, &locked, "meow", None).unwrap();

        let err = load_pdf(&locked).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: PDF is password protected.");
    }

    #[test]
    fn garbage_is_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();
        assert!(matches!(load_pdf(&path), Err(AppError::Pdf(_))));
    }
}
